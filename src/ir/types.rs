/// Type model and descriptor parsing.
///
/// Types form a closed sum: a primitive kind, a reference to a named class,
/// an array of a non-array element, or void. Descriptors use the compact JVM
/// syntax (`I`, `Ljava/lang/String;`, `[[D`, ...); class names are carried in
/// dotted form everywhere else in the model.

use serde::{Deserialize, Serialize};

/// Primitive value kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimTy {
    Int,
    Long,
    Float,
    Double,
    Byte,
    Char,
    Short,
    Boolean,
}

impl PrimTy {
    /// Descriptor character for this primitive.
    pub fn descriptor_char(&self) -> char {
        match self {
            PrimTy::Int => 'I',
            PrimTy::Long => 'J',
            PrimTy::Float => 'F',
            PrimTy::Double => 'D',
            PrimTy::Byte => 'B',
            PrimTy::Char => 'C',
            PrimTy::Short => 'S',
            PrimTy::Boolean => 'Z',
        }
    }

    /// Source-level keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimTy::Int => "int",
            PrimTy::Long => "long",
            PrimTy::Float => "float",
            PrimTy::Double => "double",
            PrimTy::Byte => "byte",
            PrimTy::Char => "char",
            PrimTy::Short => "short",
            PrimTy::Boolean => "boolean",
        }
    }

    /// The C type this primitive compiles to. Booleans become `short` and
    /// chars become `unsigned short`; there is no dedicated 8/16-bit bool or
    /// UTF-16 char in the target.
    pub fn c_name(&self) -> &'static str {
        match self {
            PrimTy::Int => "int",
            PrimTy::Long => "long",
            PrimTy::Float => "float",
            PrimTy::Double => "double",
            PrimTy::Byte => "char",
            PrimTy::Char => "unsigned short",
            PrimTy::Short => "short",
            PrimTy::Boolean => "short",
        }
    }

    /// Bit width used when saturating shift amounts for this operand type.
    /// Long is deliberately treated as 32 bits: the target arithmetic model
    /// does not assume a true 64-bit wide shift.
    pub fn shift_width(&self) -> u32 {
        match self {
            PrimTy::Byte => 8,
            PrimTy::Short | PrimTy::Char | PrimTy::Boolean => 16,
            PrimTy::Int | PrimTy::Long | PrimTy::Float | PrimTy::Double => 32,
        }
    }
}

/// A model-level type.
///
/// `Array.elem` is never itself an `Array`; multi-dimensional arrays carry
/// their dimension count in `dims`. Use [`Ty::array_of`] to build arrays so
/// nesting collapses.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ty {
    Primitive(PrimTy),
    Reference(String),
    Array { elem: Box<Ty>, dims: u8 },
    Void,
}

impl Ty {
    /// Reference to a dotted class name.
    pub fn reference(name: impl Into<String>) -> Ty {
        Ty::Reference(name.into())
    }

    /// Array of `elem` with `dims` dimensions, collapsing nested arrays.
    pub fn array_of(elem: Ty, dims: u8) -> Ty {
        match elem {
            Ty::Array { elem, dims: inner } => Ty::Array {
                elem,
                dims: dims + inner,
            },
            other => Ty::Array {
                elem: Box::new(other),
                dims,
            },
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Ty::Reference(_))
    }

    /// The class a reference or reference-array type points at, if any.
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            Ty::Reference(name) => Some(name),
            Ty::Array { elem, .. } => elem.referenced_class(),
            _ => None,
        }
    }

    /// Descriptor string in JVM syntax.
    pub fn to_descriptor(&self) -> String {
        match self {
            Ty::Primitive(p) => p.descriptor_char().to_string(),
            Ty::Reference(name) => format!("L{};", name.replace('.', "/")),
            Ty::Array { elem, dims } => {
                let mut out = String::new();
                for _ in 0..*dims {
                    out.push('[');
                }
                out.push_str(&elem.to_descriptor());
                out
            }
            Ty::Void => "V".into(),
        }
    }

    /// Source-level display name, e.g. `java.lang.String[][]`.
    pub fn display_name(&self) -> String {
        match self {
            Ty::Primitive(p) => p.keyword().into(),
            Ty::Reference(name) => name.clone(),
            Ty::Array { elem, dims } => {
                let mut out = elem.display_name();
                for _ in 0..*dims {
                    out.push_str("[]");
                }
                out
            }
            Ty::Void => "void".into(),
        }
    }
}

/// Parse a single type descriptor starting at `pos`. Returns the type and
/// the position just past it.
pub fn parse_type_at(desc: &str, pos: usize) -> Option<(Ty, usize)> {
    let bytes = desc.as_bytes();
    if pos >= bytes.len() {
        return None;
    }
    match bytes[pos] {
        b'B' => Some((Ty::Primitive(PrimTy::Byte), pos + 1)),
        b'C' => Some((Ty::Primitive(PrimTy::Char), pos + 1)),
        b'D' => Some((Ty::Primitive(PrimTy::Double), pos + 1)),
        b'F' => Some((Ty::Primitive(PrimTy::Float), pos + 1)),
        b'I' => Some((Ty::Primitive(PrimTy::Int), pos + 1)),
        b'J' => Some((Ty::Primitive(PrimTy::Long), pos + 1)),
        b'S' => Some((Ty::Primitive(PrimTy::Short), pos + 1)),
        b'Z' => Some((Ty::Primitive(PrimTy::Boolean), pos + 1)),
        b'V' => Some((Ty::Void, pos + 1)),
        b'L' => {
            let semi = desc[pos + 1..].find(';')?;
            let class_name = desc[pos + 1..pos + 1 + semi].replace('/', ".");
            Some((Ty::Reference(class_name), pos + 1 + semi + 1))
        }
        b'[' => {
            let mut dims = 0u8;
            let mut at = pos;
            while at < bytes.len() && bytes[at] == b'[' {
                dims += 1;
                at += 1;
            }
            let (elem, next) = parse_type_at(desc, at)?;
            if matches!(elem, Ty::Void) {
                return None;
            }
            Some((Ty::array_of(elem, dims), next))
        }
        _ => None,
    }
}

/// Parse a full type descriptor string.
pub fn parse_type_descriptor(desc: &str) -> Option<Ty> {
    let (ty, next) = parse_type_at(desc, 0)?;
    if next != desc.len() {
        return None;
    }
    Some(ty)
}

/// Parse a method descriptor, e.g. `(II)V` -> ([int, int], void).
pub fn parse_method_descriptor(desc: &str) -> Option<(Vec<Ty>, Ty)> {
    if !desc.starts_with('(') {
        return None;
    }
    let close = desc.find(')')?;
    let mut params = Vec::new();
    let mut pos = 1;
    while pos < close {
        let (ty, next) = parse_type_at(desc, pos)?;
        if matches!(ty, Ty::Void) {
            return None;
        }
        params.push(ty);
        pos = next;
    }
    let (ret, next) = parse_type_at(desc, close + 1)?;
    if next != desc.len() {
        return None;
    }
    Some((params, ret))
}

/// Last segment of a dotted class name.
pub fn simple_class_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Package of a dotted class name, if it has one.
pub fn package_name(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(pos) => Some(&name[..pos]),
        None => None,
    }
}
