/// Flat identifier generation.
///
/// Every source-level name collapses to `<prefix><hash>_<readable>`: a
/// one-letter namespace prefix, a 31-bit FNV-1a hash of the full signature
/// rendered in hex, and a sanitized human-readable tail. The hash carries
/// uniqueness (overloads differ by descriptor, so their hashes differ); the
/// tail is only there for people reading the output.
///
/// Method slots hash the *sub-signature* (name + descriptor, no declaring
/// class) so an override in a subclass lands on a member with the same name
/// as its superclass slot. Field members hash the bare field name, which
/// makes a field redeclared under the same name collide with the inherited
/// one on purpose; the instance-struct generator skips the duplicate.
///
/// A context is created per compilation run and queried through `&self`;
/// results are memoized append-only and never change once handed out.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::ir::{simple_class_name, FieldSig, MethodSig, PrimTy, Ty};

// ---- Fixed runtime names ----

/// Header every generated file includes.
pub const RUNTIME_HEADER: &str = "runtime.h";
/// Generic array value type.
pub const ARRAY_TYPE: &str = "RT_ARRAY";
pub const ARRAY_ACCESS: &str = "ARRAY_ACCESS";
pub const ARRAY_LENGTH: &str = "ARRAY_LENGTH";
pub const ARRAY_ALLOCATE: &str = "ARRAY_ALLOCATE";
/// Runtime instance-of helper.
pub const INSTANCEOF_FN: &str = "RT_instanceof";
/// Generic instance pointer.
pub const OBJECT_PTR: &str = "RT_OBJECT";
/// Generic class-structure pointer.
pub const CLASS_PTR: &str = "RT_CLASS_PTR";
/// Type of the global holding the in-flight thrown object.
pub const EXCEPTION_INSTANCE: &str = "_EXCEPTION_INSTANCE";
/// The global holding the in-flight thrown object.
pub const EXCEPTION_ID: &str = "exception_id";
pub const CHAR_ARRAY_TO_STRING: &str = "charArrayToString";
/// Stand-ins for float/double infinities and NaN, defined by the runtime.
pub const MAX_FLOAT: &str = "_MAX_FLOAT";
pub const MAX_DOUBLE: &str = "_MAX_DOUBLE";
/// Runtime bootstrap called from the generated main driver.
pub const RUNTIME_INIT: &str = "RT_init";
/// Prefix of the element-class variables for primitive arrays.
pub const ARRAY_CLASS_PREFIX: &str = "RT_array_";

/// 31-bit FNV-1a over the UTF-8 bytes of `s`. Masked to keep the value a
/// valid positive `long` literal on 32-bit targets.
pub fn hash31(s: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for b in s.bytes() {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash & 0x7fff_ffff
}

/// Replace anything that cannot appear in a C identifier.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Per-run naming context.
#[derive(Debug, Default)]
pub struct NamingContext {
    instance_types: RefCell<BTreeMap<String, String>>,
    class_struct_types: RefCell<BTreeMap<String, String>>,
    class_struct_vars: RefCell<BTreeMap<String, String>>,
    functions: RefCell<BTreeMap<String, String>>,
}

impl NamingContext {
    pub fn new() -> Self {
        NamingContext::default()
    }

    fn memo(
        table: &RefCell<BTreeMap<String, String>>,
        key: &str,
        make: impl FnOnce() -> String,
    ) -> String {
        if let Some(hit) = table.borrow().get(key) {
            return hit.clone();
        }
        let name = make();
        table.borrow_mut().insert(key.to_string(), name.clone());
        name
    }

    /// Instance type of a class. This is a pointer typedef: a value of the
    /// type points at the instance struct of the same tag.
    pub fn instance_type(&self, class: &str) -> String {
        Self::memo(&self.instance_types, class, || {
            format!("i{:x}_{}", hash31(class), sanitize(simple_class_name(class)))
        })
    }

    /// Class-structure struct type of a class.
    pub fn class_struct_type(&self, class: &str) -> String {
        Self::memo(&self.class_struct_types, class, || {
            format!("C{:x}_{}", hash31(class), sanitize(simple_class_name(class)))
        })
    }

    /// The one global variable holding a class's structure.
    pub fn class_struct_var(&self, class: &str) -> String {
        Self::memo(&self.class_struct_vars, class, || {
            format!("V{:x}_{}", hash31(class), sanitize(simple_class_name(class)))
        })
    }

    /// Function that fills in a class's structure at startup.
    pub fn init_function(&self, class: &str) -> String {
        format!("{}_init", self.class_struct_type(class))
    }

    /// Function mapping a sub-signature hash to a method slot's pointer.
    pub fn lookup_function(&self, class: &str) -> String {
        format!("{}_lookup", self.class_struct_type(class))
    }

    /// Function answering run-time type tests against a class's instances.
    pub fn instanceof_function(&self, class: &str) -> String {
        format!("{}_instanceof", self.class_struct_type(class))
    }

    /// Function implementing a method. Hashes the full signature, so
    /// same-named methods on different classes get distinct functions.
    pub fn function_name(&self, sig: &MethodSig) -> String {
        Self::memo(&self.functions, &sig.full_signature(), || {
            format!("f{:x}_{}", hash31(&sig.full_signature()), sanitize(&sig.name))
        })
    }

    /// Member name of a method's slot in the function-pointer table. Stable
    /// across the hierarchy: only name + descriptor feed the hash.
    pub fn slot_name(&self, sig: &MethodSig) -> String {
        format!("m{:x}_{}", hash31(&sig.sub_signature()), sanitize(&sig.name))
    }

    /// Member name of a field. Name-only hash; see the module notes on
    /// deliberate duplicate collision.
    pub fn field_name(&self, sig: &FieldSig) -> String {
        format!("v{:x}_{}", hash31(&sig.name), sanitize(&sig.name))
    }

    /// Generated name of a body-local variable.
    pub fn local_name(&self, local: &str) -> String {
        format!("n{:x}_{}", hash31(local), sanitize(local))
    }

    /// Hash identifying a class or interface at run time.
    pub fn class_hash(&self, class: &str) -> u32 {
        hash31(class)
    }

    /// Hash identifying a method sub-signature for interface lookup.
    pub fn interface_hash(&self, sig: &MethodSig) -> u32 {
        hash31(&sig.sub_signature())
    }

    /// The C type a model type compiles to.
    pub fn c_type(&self, ty: &Ty) -> String {
        match ty {
            Ty::Primitive(p) => p.c_name().to_string(),
            Ty::Reference(class) => self.instance_type(class),
            Ty::Array { .. } => ARRAY_TYPE.to_string(),
            Ty::Void => "void".to_string(),
        }
    }

    /// Element-class expression for array allocation: the instance type for
    /// reference elements, a fixed runtime name per primitive otherwise.
    pub fn array_element_class(&self, elem: &Ty) -> String {
        match elem {
            Ty::Reference(class) => self.instance_type(class),
            Ty::Primitive(p) => format!("{}{}_elem", ARRAY_CLASS_PREFIX, sanitize(p.keyword())),
            // Arrays of arrays store generic pointers.
            Ty::Array { .. } | Ty::Void => format!("{}ref_elem", ARRAY_CLASS_PREFIX),
        }
    }

    /// Per-element size type for array allocation.
    pub fn array_element_size_type(&self, elem: &Ty) -> String {
        match elem {
            Ty::Primitive(p) => p.c_name().to_string(),
            _ => "void*".to_string(),
        }
    }

    // ---- File names ----

    /// Base of every file emitted for a class: the sanitized full name.
    pub fn file_base(&self, class: &str) -> String {
        sanitize(class)
    }

    pub fn header_file(&self, class: &str) -> String {
        format!("{}.h", self.file_base(class))
    }

    /// Forward-declaration stub header.
    pub fn stub_header_file(&self, class: &str) -> String {
        format!("{}_i.h", self.file_base(class))
    }

    pub fn code_file(&self, class: &str) -> String {
        format!("{}.c", self.file_base(class))
    }

    pub fn main_file(&self, class: &str) -> String {
        format!("{}_main.c", self.file_base(class))
    }

    /// Include-guard macro for a class's header.
    pub fn include_guard(&self, class: &str) -> String {
        format!("_{}_h", self.file_base(class))
    }

    /// Include-guard macro for a class's stub header.
    pub fn stub_include_guard(&self, class: &str) -> String {
        format!("_{}_i_h", self.file_base(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_31_bit_and_stable() {
        let h = hash31("java.lang.String");
        assert_eq!(h, hash31("java.lang.String"));
        assert!(h <= 0x7fff_ffff);
        assert_ne!(hash31("a"), hash31("b"));
    }

    #[test]
    fn test_names_are_idempotent_within_a_run() {
        let names = NamingContext::new();
        let sig = MethodSig::new("demo.Greeter", "greet", "(I)V");
        assert_eq!(names.function_name(&sig), names.function_name(&sig));
        assert_eq!(names.instance_type("demo.Greeter"), names.instance_type("demo.Greeter"));
    }

    #[test]
    fn test_fresh_contexts_agree() {
        let a = NamingContext::new();
        let b = NamingContext::new();
        let sig = MethodSig::new("demo.Greeter", "greet", "(I)V");
        assert_eq!(a.function_name(&sig), b.function_name(&sig));
        assert_eq!(a.class_struct_var("demo.Greeter"), b.class_struct_var("demo.Greeter"));
    }

    #[test]
    fn test_slot_name_ignores_declaring_class() {
        let names = NamingContext::new();
        let on_super = MethodSig::new("Animal", "speak", "()V");
        let on_sub = MethodSig::new("Dog", "speak", "()V");
        assert_eq!(names.slot_name(&on_super), names.slot_name(&on_sub));
        // Functions stay distinct though.
        assert_ne!(names.function_name(&on_super), names.function_name(&on_sub));
    }

    #[test]
    fn test_overloads_get_distinct_slots() {
        let names = NamingContext::new();
        let a = MethodSig::new("A", "f", "(I)V");
        let b = MethodSig::new("A", "f", "(J)V");
        assert_ne!(names.slot_name(&a), names.slot_name(&b));
    }

    #[test]
    fn test_field_name_hashes_name_only() {
        let names = NamingContext::new();
        let inherited = FieldSig::new("Animal", "legs", "I");
        let redeclared = FieldSig::new("Dog", "legs", "I");
        assert_eq!(names.field_name(&inherited), names.field_name(&redeclared));
    }

    #[test]
    fn test_prefixes_and_files() {
        let names = NamingContext::new();
        assert!(names.instance_type("demo.Greeter").starts_with('i'));
        assert!(names.class_struct_type("demo.Greeter").starts_with('C'));
        assert!(names.class_struct_var("demo.Greeter").starts_with('V'));
        assert!(names.instance_type("demo.Greeter").ends_with("_Greeter"));
        assert_eq!(names.header_file("demo.Greeter"), "demo_Greeter.h");
        assert_eq!(names.stub_header_file("demo.Greeter"), "demo_Greeter_i.h");
        assert_eq!(names.include_guard("demo.Greeter"), "_demo_Greeter_h");
    }

    #[test]
    fn test_c_type_map() {
        let names = NamingContext::new();
        assert_eq!(names.c_type(&Ty::Primitive(PrimTy::Boolean)), "short");
        assert_eq!(names.c_type(&Ty::Void), "void");
        assert_eq!(
            names.c_type(&Ty::array_of(Ty::Primitive(PrimTy::Int), 2)),
            ARRAY_TYPE
        );
        let reference = names.c_type(&Ty::reference("demo.Greeter"));
        assert_eq!(reference, names.instance_type("demo.Greeter"));
    }

    #[test]
    fn test_array_element_naming() {
        let names = NamingContext::new();
        assert_eq!(
            names.array_element_class(&Ty::Primitive(PrimTy::Char)),
            "RT_array_char_elem"
        );
        assert_eq!(
            names.array_element_size_type(&Ty::Primitive(PrimTy::Char)),
            "unsigned short"
        );
        assert_eq!(
            names.array_element_size_type(&Ty::reference("demo.Greeter")),
            "void*"
        );
    }
}
