/// Whole-program model: class, method, and field declarations.
///
/// Identity is structural throughout. A [`MethodSig`] or [`FieldSig`] names an
/// element by declaring class + name + descriptor and is what analysis passes
/// key their maps on; two sigs built independently for the same element
/// compare equal.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::body::MethodBody;
use super::types::{parse_method_descriptor, parse_type_descriptor, Ty};

/// The universal base class. Every class without an explicit superclass is
/// treated as extending it, and dispatch falls back to it.
pub const OBJECT_CLASS: &str = "java.lang.Object";

// ---- Identities ----

/// Structural identity of a method: declaring class + name + descriptor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    pub class: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodSig {
    pub fn new(class: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        MethodSig {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Name + descriptor, without the declaring class. Two methods with equal
    /// sub-signatures occupy the same dispatch slot across a hierarchy.
    pub fn sub_signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }

    /// Fully qualified signature string, unique program-wide.
    pub fn full_signature(&self) -> String {
        format!("{}.{}{}", self.class, self.name, self.descriptor)
    }

    /// Same name and descriptor, ignoring the declaring class.
    pub fn matches_sub_signature(&self, other: &MethodSig) -> bool {
        self.name == other.name && self.descriptor == other.descriptor
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.class, self.name, self.descriptor)
    }
}

/// Structural identity of a field.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldSig {
    pub class: String,
    pub name: String,
    pub descriptor: String,
}

impl FieldSig {
    pub fn new(class: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        FieldSig {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn ty(&self) -> Option<Ty> {
        parse_type_descriptor(&self.descriptor)
    }
}

impl fmt::Display for FieldSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.class, self.name, self.descriptor)
    }
}

// ---- Modifiers ----

#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Modifiers(u16);

bitflags! {
    impl Modifiers: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
    }
}

impl Modifiers {
    /// Package-private means none of the three explicit access levels.
    pub fn is_package_private(&self) -> bool {
        !self.intersects(Modifiers::PUBLIC | Modifiers::PRIVATE | Modifiers::PROTECTED)
    }
}

// ---- Declarations ----

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl FieldDecl {
    pub fn sig(&self, class: &str) -> FieldSig {
        FieldSig::new(class, self.name.clone(), self.descriptor.clone())
    }

    pub fn ty(&self) -> Option<Ty> {
        parse_type_descriptor(&self.descriptor)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Declared (checked) exception classes.
    #[serde(default)]
    pub exceptions: Vec<String>,
    /// Absent for native and abstract methods.
    #[serde(default)]
    pub body: Option<MethodBody>,
}

impl MethodDecl {
    pub fn sig(&self, class: &str) -> MethodSig {
        MethodSig::new(class, self.name.clone(), self.descriptor.clone())
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_native(&self) -> bool {
        self.modifiers.contains(Modifiers::NATIVE)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(Modifiers::PRIVATE)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_class_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    pub fn param_types(&self) -> Vec<Ty> {
        parse_method_descriptor(&self.descriptor)
            .map(|(params, _)| params)
            .unwrap_or_default()
    }

    pub fn return_type(&self) -> Ty {
        parse_method_descriptor(&self.descriptor)
            .map(|(_, ret)| ret)
            .unwrap_or(Ty::Void)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    /// Dotted superclass name; `None` only for the universal base class.
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    /// Declared method with this name and descriptor, ignoring inheritance.
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodDecl> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn class_initializer(&self) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.is_class_initializer())
    }
}

// ---- Program ----

/// A closed set of class declarations keyed by name. Classes referenced but
/// not present (library classes outside the model) are phantom; analysis
/// degrades gracefully around them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub classes: BTreeMap<String, ClassDecl>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn add_class(&mut self, class: ClassDecl) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.get(name)
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Direct superclass name. The universal base class defaults in for any
    /// modeled class that declares none.
    pub fn superclass_of(&self, name: &str) -> Option<String> {
        let class = self.class(name)?;
        match &class.superclass {
            Some(s) => Some(s.clone()),
            None if name != OBJECT_CLASS => Some(OBJECT_CLASS.to_string()),
            None => None,
        }
    }

    /// Superclasses from nearest to the root, excluding `name` itself.
    /// Stops at classes outside the model.
    pub fn superclass_chain(&self, name: &str) -> Vec<&ClassDecl> {
        let mut out = Vec::new();
        let mut current = self.superclass_of(name);
        while let Some(super_name) = current {
            match self.class(&super_name) {
                Some(decl) => {
                    out.push(decl);
                    current = self.superclass_of(&super_name);
                }
                None => break,
            }
        }
        out
    }

    /// The declared method a signature names, if its class is modeled and
    /// declares it.
    pub fn method(&self, sig: &MethodSig) -> Option<&MethodDecl> {
        self.class(&sig.class)?.method(&sig.name, &sig.descriptor)
    }

    /// Resolve a signature against the hierarchy: the nearest class at or
    /// above `sig.class` that declares a matching sub-signature.
    pub fn resolve_method(&self, sig: &MethodSig) -> Option<(&ClassDecl, &MethodDecl)> {
        let mut current = Some(sig.class.clone());
        while let Some(name) = current {
            if let Some(class) = self.class(&name) {
                if let Some(method) = class.method(&sig.name, &sig.descriptor) {
                    return Some((class, method));
                }
            }
            current = self.superclass_of(&name);
        }
        None
    }

    pub fn field(&self, sig: &FieldSig) -> Option<&FieldDecl> {
        self.class(&sig.class)?.field(&sig.name)
    }

    /// Classes that list `interface_name` among their direct interfaces.
    pub fn implementers_of(&self, interface_name: &str) -> Vec<&ClassDecl> {
        self.classes
            .values()
            .filter(|c| c.interfaces.iter().any(|i| i == interface_name))
            .collect()
    }

    /// Direct subclasses of `name`.
    pub fn subclasses_of(&self, name: &str) -> Vec<&ClassDecl> {
        self.classes
            .values()
            .filter(|c| {
                c.name != OBJECT_CLASS && self.superclass_of(&c.name).as_deref() == Some(name)
            })
            .collect()
    }

    /// Structural sanity: map keys match declared names, descriptors parse,
    /// and branch/trap targets stay inside their bodies.
    pub fn validate(&self) -> ModelResult<()> {
        for (key, class) in &self.classes {
            if key != &class.name {
                return Err(ModelError::KeyMismatch {
                    key: key.clone(),
                    name: class.name.clone(),
                });
            }
            for field in &class.fields {
                if parse_type_descriptor(&field.descriptor).is_none() {
                    return Err(ModelError::BadDescriptor {
                        owner: format!("{}.{}", class.name, field.name),
                        descriptor: field.descriptor.clone(),
                    });
                }
            }
            for method in &class.methods {
                if parse_method_descriptor(&method.descriptor).is_none() {
                    return Err(ModelError::BadDescriptor {
                        owner: format!("{}.{}", class.name, method.name),
                        descriptor: method.descriptor.clone(),
                    });
                }
                if let Some(body) = &method.body {
                    let len = body.units.len();
                    for (at, unit) in body.units.iter().enumerate() {
                        for target in unit.branch_targets() {
                            if target >= len {
                                return Err(ModelError::BadTarget {
                                    method: method.sig(&class.name).to_string(),
                                    at,
                                    target,
                                });
                            }
                        }
                    }
                    for trap in &body.traps {
                        if trap.begin > trap.end || trap.end > len || trap.handler >= len {
                            return Err(ModelError::BadTrap {
                                method: method.sig(&class.name).to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Stable digest over the model structure, for cache validity checks.
    /// Insensitive to anything but declarations and body sizes.
    pub fn digest(&self) -> u64 {
        const OFFSET: u64 = 0xcbf29ce484222325;
        const PRIME: u64 = 0x100000001b3;
        let mut hash = OFFSET;
        let mut eat = |s: &str| {
            for b in s.bytes() {
                hash ^= b as u64;
                hash = hash.wrapping_mul(PRIME);
            }
            hash ^= 0xff;
            hash = hash.wrapping_mul(PRIME);
        };
        for (name, class) in &self.classes {
            eat(name);
            if let Some(s) = &class.superclass {
                eat(s);
            }
            for i in &class.interfaces {
                eat(i);
            }
            for f in &class.fields {
                eat(&f.name);
                eat(&f.descriptor);
            }
            for m in &class.methods {
                eat(&m.name);
                eat(&m.descriptor);
                let units = m.body.as_ref().map(|b| b.units.len()).unwrap_or(0);
                eat(&units.to_string());
            }
        }
        hash
    }
}

// ---- Errors ----

#[derive(Debug)]
pub enum ModelError {
    KeyMismatch { key: String, name: String },
    BadDescriptor { owner: String, descriptor: String },
    BadTarget { method: String, at: usize, target: usize },
    BadTrap { method: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::KeyMismatch { key, name } => {
                write!(f, "class map key '{}' does not match declared name '{}'", key, name)
            }
            ModelError::BadDescriptor { owner, descriptor } => {
                write!(f, "unparseable descriptor '{}' on {}", descriptor, owner)
            }
            ModelError::BadTarget { method, at, target } => {
                write!(f, "unit {} of {} branches to out-of-range unit {}", at, method, target)
            }
            ModelError::BadTrap { method } => {
                write!(f, "trap region out of range in {}", method)
            }
        }
    }
}

impl Error for ModelError {}

pub type ModelResult<T> = Result<T, ModelError>;
