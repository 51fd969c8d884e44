/// Per-class C structure layout.
///
/// Every class turns into two structs. The class structure is a single
/// global shared by all instances: metadata, the function-pointer dispatch
/// table, and the static fields. The instance structure is the per-object
/// record, class pointer first so any instance can be read through the
/// runtime's generic object pointer. Compatibility across a hierarchy is
/// positional: a subclass's structs repeat the superclass's members in the
/// same order before adding their own, so superclass-typed code reads a
/// subclass object at the right offsets.

use std::collections::BTreeSet;

use log::debug;

use crate::analysis::Required;
use crate::ir::{
    package_name, parse_method_descriptor, ClassDecl, FieldSig, MethodSig, Modifiers, Program, Ty,
};

use super::method_lists::MethodListBuilder;
use super::names::{NamingContext, CLASS_PTR, OBJECT_PTR};
use super::{GenError, GenResult};

/// Emits the structure declarations and the per-class support functions
/// for one run.
pub struct StructGenerator<'a> {
    program: &'a Program,
    names: &'a NamingContext,
    lists: &'a MethodListBuilder<'a>,
    required: &'a Required,
    single_class: bool,
}

impl<'a> StructGenerator<'a> {
    pub fn new(
        program: &'a Program,
        names: &'a NamingContext,
        lists: &'a MethodListBuilder<'a>,
        required: &'a Required,
        single_class: bool,
    ) -> Self {
        StructGenerator {
            program,
            names,
            lists,
            required,
            single_class,
        }
    }

    fn class(&self, name: &str) -> GenResult<&'a ClassDecl> {
        self.program.class(name).ok_or_else(|| GenError::ClassNotModeled {
            name: name.to_string(),
        })
    }

    /// The modeled superclass codegen may reference, if any. Single-class
    /// compilation never references one.
    pub fn linked_superclass(&self, name: &str) -> Option<String> {
        if self.single_class {
            return None;
        }
        self.program
            .superclass_of(name)
            .filter(|s| self.program.contains_class(s))
    }

    fn field_c_type(&self, sig: &FieldSig) -> String {
        match sig.ty() {
            Some(ty) => self.names.c_type(&ty),
            None => "void*".to_string(),
        }
    }

    /// Return and argument C types of the function implementing a method.
    /// Instance methods take their declaring class's instance type first;
    /// static methods take only their declared parameters.
    pub fn signature_types(&self, entry: &MethodSig) -> (String, Vec<String>) {
        let (params, ret) =
            parse_method_descriptor(&entry.descriptor).unwrap_or((Vec::new(), Ty::Void));
        let is_static = self
            .program
            .method(entry)
            .map(|m| m.is_static())
            .unwrap_or(false);
        let mut args = Vec::new();
        if !is_static {
            args.push(self.names.instance_type(&entry.class));
        }
        args.extend(params.iter().map(|t| self.names.c_type(t)));
        (self.names.c_type(&ret), args)
    }

    /// Prototype line for the function implementing `entry`.
    pub fn function_prototype(&self, entry: &MethodSig) -> String {
        let (ret, args) = self.signature_types(entry);
        let list = if args.is_empty() {
            "void".to_string()
        } else {
            args.join(", ")
        };
        format!("{} {}({});\n", ret, self.names.function_name(entry), list)
    }

    // ---- Forward declarations ----

    /// Tag plus pointer typedef for the instance type. This is all another
    /// header needs to declare variables of the type, so it is the entire
    /// content of the forward-declaration stub header.
    pub fn forward_decls(&self, class: &str) -> String {
        let instance = self.names.instance_type(class);
        format!("struct {instance};\ntypedef struct {instance} *{instance};\n")
    }

    // ---- Class structure ----

    /// One function-pointer member of the dispatch table. The receiver
    /// parameter is typed with the entry's declaring class, so the member
    /// type, the function stored in it, and the call-site receiver cast
    /// all agree.
    fn slot_member(&self, entry: &MethodSig) -> String {
        let (ret, args) = self.signature_types(entry);
        let list = if args.is_empty() {
            "void".to_string()
        } else {
            args.join(", ")
        };
        format!("{} (*{})({})", ret, self.names.slot_name(entry), list)
    }

    fn static_fields(&self, class: &ClassDecl) -> Vec<FieldSig> {
        class
            .fields
            .iter()
            .filter(|f| f.is_static())
            .map(|f| f.sig(&class.name))
            .filter(|sig| self.required.field(sig))
            .collect()
    }

    /// The class-structure type: metadata, dispatch table, static fields.
    pub fn class_struct(&self, name: &str) -> GenResult<String> {
        let class = self.class(name)?;
        let struct_type = self.names.class_struct_type(name);
        let mut out = format!("/* Class structure of {name}. */\n");
        out.push_str(&format!("typedef struct {struct_type} {struct_type};\n"));
        out.push_str(&format!("struct {struct_type} {{\n"));
        out.push_str("    char* name;\n");
        out.push_str("    long instance_size;\n");
        match self.linked_superclass(name) {
            Some(super_name) => out.push_str(&format!(
                "    {}* superclass;\n",
                self.names.class_struct_type(&super_name)
            )),
            None => out.push_str("    void* superclass;\n"),
        }
        out.push_str(&format!("    {CLASS_PTR} array_class;\n"));
        out.push_str("    void* (*lookup)(long);\n");
        out.push_str(&format!(
            "    short (*instance_of)({OBJECT_PTR}* instance, long checked);\n"
        ));
        out.push_str("    struct {\n");
        let table = self.lists.partition(name)?.table();
        if table.is_empty() {
            // An empty struct is not valid C.
            out.push_str("        short _none;\n");
        }
        for entry in &table {
            out.push_str(&format!("        {};\n", self.slot_member(entry)));
        }
        out.push_str("    } methods;\n");
        out.push_str("    struct {\n");
        let statics = self.static_fields(class);
        if statics.is_empty() {
            out.push_str("        short _none;\n");
        }
        for sig in &statics {
            out.push_str(&format!(
                "        {} {};\n",
                self.field_c_type(sig),
                self.names.field_name(sig)
            ));
        }
        out.push_str("    } classvars;\n");
        out.push_str("};\n");
        Ok(out)
    }

    // ---- Instance structure ----

    /// Non-static members of the instance struct in declaration order:
    /// superclass chain root-first, then the class itself, visibility
    /// filtered from the viewpoint of `name`. The first declaration of a
    /// member name wins; a redeclared name is skipped.
    pub fn instance_fields(&self, name: &str) -> GenResult<Vec<FieldSig>> {
        let class = self.class(name)?;
        let mut chain: Vec<&ClassDecl> = Vec::new();
        if !self.single_class {
            chain = self.program.superclass_chain(name);
            chain.reverse();
        }
        chain.push(class);

        let own_package = package_name(name);
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for decl in chain {
            let inherited = decl.name != name;
            for field in &decl.fields {
                if field.is_static() {
                    continue;
                }
                if inherited {
                    if field.modifiers.contains(Modifiers::PRIVATE) {
                        continue;
                    }
                    if field.modifiers.is_package_private()
                        && package_name(&decl.name) != own_package
                    {
                        continue;
                    }
                }
                let sig = field.sig(&decl.name);
                if !self.required.field(&sig) {
                    continue;
                }
                if !seen.insert(self.names.field_name(&sig)) {
                    debug!("field {} redeclares an inherited member, skipped", sig);
                    continue;
                }
                out.push(sig);
            }
        }
        Ok(out)
    }

    /// The instance-structure type. Class pointer first, then fields.
    pub fn instance_struct(&self, name: &str) -> GenResult<String> {
        let instance = self.names.instance_type(name);
        let mut out = format!("/* An instance of {name}. */\n");
        out.push_str(&format!("struct {instance} {{\n"));
        out.push_str(&format!(
            "    {}* class;\n",
            self.names.class_struct_type(name)
        ));
        for sig in self.instance_fields(name)? {
            out.push_str(&format!(
                "    {} {};\n",
                self.field_c_type(&sig),
                self.names.field_name(&sig)
            ));
        }
        out.push_str("};\n");
        Ok(out)
    }

    // ---- Support functions ----

    /// Run-time type test: the class's own hash, each direct interface,
    /// then the superclass's helper. The root answers no.
    pub fn instanceof_function(&self, name: &str) -> GenResult<String> {
        let class = self.class(name)?;
        let mut out = format!("/* Run-time type check against {name}. */\n");
        out.push_str(&format!(
            "short {}({OBJECT_PTR}* instance, long checked) {{\n",
            self.names.instanceof_function(name)
        ));
        out.push_str(&format!(
            "    if (checked == {}) return 1;\n",
            self.names.class_hash(name)
        ));
        for interface in &class.interfaces {
            out.push_str(&format!(
                "    if (checked == {}) return 1;\n",
                self.names.class_hash(interface)
            ));
        }
        match self.linked_superclass(name) {
            Some(super_name) => out.push_str(&format!(
                "    return {}(instance, checked);\n",
                self.names.instanceof_function(&super_name)
            )),
            None => out.push_str("    return 0;\n"),
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Interface dispatch: map a sub-signature hash to the matching slot's
    /// function pointer. Unknown hashes defer to the superclass.
    pub fn lookup_function(&self, name: &str) -> GenResult<String> {
        let var = self.names.class_struct_var(name);
        let mut out = format!("/* Interface method lookup for {name}. */\n");
        out.push_str(&format!(
            "void* {}(long hash) {{\n",
            self.names.lookup_function(name)
        ));
        out.push_str("    switch (hash) {\n");
        for entry in self.lists.partition(name)?.inheritable() {
            let is_static = self
                .program
                .method(&entry)
                .map(|m| m.is_static())
                .unwrap_or(false);
            if is_static {
                continue;
            }
            out.push_str(&format!(
                "        case {}: return (void*){}.methods.{};\n",
                self.names.interface_hash(&entry),
                var,
                self.names.slot_name(&entry)
            ));
        }
        match self.linked_superclass(name) {
            Some(super_name) => out.push_str(&format!(
                "        default: return {}(hash);\n",
                self.names.lookup_function(&super_name)
            )),
            None => out.push_str("        default: return NULL;\n"),
        }
        out.push_str("    }\n");
        out.push_str("}\n");
        Ok(out)
    }

    /// Startup fill of the class-structure global. Slots whose method has
    /// no function behind it (abstract declarations) stay NULL.
    pub fn init_function(&self, name: &str) -> GenResult<String> {
        self.class(name)?;
        let var = self.names.class_struct_var(name);
        let mut out = format!("/* Fill in the class structure of {name}. */\n");
        out.push_str(&format!(
            "void {}(void) {{\n",
            self.names.init_function(name)
        ));
        out.push_str(&format!("    {var}.name = \"{name}\";\n"));
        out.push_str(&format!(
            "    {var}.instance_size = sizeof(struct {});\n",
            self.names.instance_type(name)
        ));
        match self.linked_superclass(name) {
            Some(super_name) => out.push_str(&format!(
                "    {var}.superclass = &{};\n",
                self.names.class_struct_var(&super_name)
            )),
            None => out.push_str(&format!("    {var}.superclass = NULL;\n")),
        }
        out.push_str(&format!("    {var}.array_class = NULL;\n"));
        out.push_str(&format!(
            "    {var}.lookup = {};\n",
            self.names.lookup_function(name)
        ));
        out.push_str(&format!(
            "    {var}.instance_of = {};\n",
            self.names.instanceof_function(name)
        ));
        for entry in self.lists.partition(name)?.table() {
            let decl = match self.program.method(&entry) {
                Some(d) => d,
                None => {
                    debug!("slot {} has no modeled declaration, left NULL", entry);
                    continue;
                }
            };
            if decl.body.is_none() && !decl.is_native() {
                continue;
            }
            out.push_str(&format!(
                "    {var}.methods.{} = {};\n",
                self.names.slot_name(&entry),
                self.names.function_name(&entry)
            ));
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Classes whose types the structure declarations mention: field types
    /// and method-table signature types. The class itself is included.
    pub fn referenced_types(&self, name: &str) -> GenResult<BTreeSet<String>> {
        let class = self.class(name)?;
        let mut out = BTreeSet::new();
        out.insert(name.to_string());
        for sig in self.instance_fields(name)? {
            if let Some(c) = sig.ty().as_ref().and_then(|t| t.referenced_class()) {
                out.insert(c.to_string());
            }
        }
        for sig in self.static_fields(class) {
            if let Some(c) = sig.ty().as_ref().and_then(|t| t.referenced_class()) {
                out.insert(c.to_string());
            }
        }
        for entry in self.lists.partition(name)?.table() {
            out.insert(entry.class.clone());
            let (params, ret) =
                parse_method_descriptor(&entry.descriptor).unwrap_or((Vec::new(), Ty::Void));
            for ty in params.iter().chain(std::iter::once(&ret)) {
                if let Some(c) = ty.referenced_class() {
                    out.insert(c.to_string());
                }
            }
        }
        Ok(out)
    }

    /// Methods whose functions live in this class's code file: its own
    /// table entries plus the class initializer. Inherited entries are
    /// defined by their declaring class.
    pub fn declared_entries(&self, name: &str) -> GenResult<Vec<MethodSig>> {
        let partition = self.lists.partition(name)?;
        let mut out: Vec<MethodSig> = partition
            .table()
            .into_iter()
            .filter(|entry| entry.class == name)
            .collect();
        if let Some(clinit) = &partition.class_initializer {
            out.push(clinit.clone());
        }
        Ok(out)
    }

    /// Extern declarations a header exposes to other classes' code.
    pub fn externs(&self, name: &str) -> GenResult<String> {
        self.class(name)?;
        let struct_type = self.names.class_struct_type(name);
        let mut out = format!(
            "extern {struct_type} {};\n",
            self.names.class_struct_var(name)
        );
        out.push_str(&format!("void {}(void);\n", self.names.init_function(name)));
        out.push_str(&format!(
            "void* {}(long hash);\n",
            self.names.lookup_function(name)
        ));
        out.push_str(&format!(
            "short {}({OBJECT_PTR}* instance, long checked);\n",
            self.names.instanceof_function(name)
        ));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDecl, MethodDecl};

    fn method(name: &str, descriptor: &str, modifiers: Modifiers) -> MethodDecl {
        MethodDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers,
            exceptions: vec![],
            body: Some(Default::default()),
        }
    }

    fn abstract_method(name: &str, descriptor: &str) -> MethodDecl {
        MethodDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT,
            exceptions: vec![],
            body: None,
        }
    }

    fn field(name: &str, descriptor: &str, modifiers: Modifiers) -> FieldDecl {
        FieldDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers,
        }
    }

    fn animals() -> Program {
        let mut program = Program::new();
        program.add_class(ClassDecl {
            name: "Animal".into(),
            superclass: None,
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![
                field("name", "I", Modifiers::PUBLIC),
                field("secret", "J", Modifiers::PRIVATE),
                field("count", "I", Modifiers::PUBLIC | Modifiers::STATIC),
            ],
            methods: vec![
                method("<init>", "()V", Modifiers::PUBLIC),
                method("speak", "()V", Modifiers::PUBLIC),
                abstract_method("roam", "()V"),
            ],
        });
        program.add_class(ClassDecl {
            name: "Dog".into(),
            superclass: Some("Animal".into()),
            interfaces: vec!["Pet".into()],
            modifiers: Modifiers::PUBLIC,
            fields: vec![
                field("name", "I", Modifiers::PUBLIC),
                field("age", "S", Modifiers::PUBLIC),
            ],
            methods: vec![
                method("<init>", "()V", Modifiers::PUBLIC),
                method("fetch", "()V", Modifiers::PRIVATE),
            ],
        });
        program.add_class(ClassDecl {
            name: "Pet".into(),
            superclass: None,
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT,
            fields: vec![],
            methods: vec![abstract_method("pat", "()V")],
        });
        program
    }

    macro_rules! generator {
        ($gen:ident, $names:ident, $program:expr) => {
            let program = $program;
            let $names = NamingContext::new();
            let required = Required::everything();
            let lists = MethodListBuilder::new(&program, &required);
            let $gen = StructGenerator::new(&program, &$names, &lists, &required, false);
        };
    }

    #[test]
    fn test_class_struct_has_fixed_members_and_table() {
        generator!(gen, names, animals());
        let text = gen.class_struct("Animal").unwrap();
        assert!(text.starts_with("/* Class structure of Animal. */\n"));
        assert!(text.contains(&format!(
            "typedef struct {0} {0};\n",
            names.class_struct_type("Animal")
        )));
        assert!(text.contains("    char* name;\n"));
        assert!(text.contains("    long instance_size;\n"));
        // Animal's superclass is outside the model.
        assert!(text.contains("    void* superclass;\n"));
        assert!(text.contains("    RT_CLASS_PTR array_class;\n"));
        assert!(text.contains("    void* (*lookup)(long);\n"));
        assert!(text.contains("    short (*instance_of)(RT_OBJECT* instance, long checked);\n"));
        let speak = MethodSig::new("Animal", "speak", "()V");
        assert!(text.contains(&format!(
            "        void (*{})({});\n",
            names.slot_name(&speak),
            names.instance_type("Animal")
        )));
        // The static field lands in classvars, not in the instance struct.
        let count = FieldSig::new("Animal", "count", "I");
        assert!(text.contains(&format!("        int {};\n", names.field_name(&count))));
    }

    #[test]
    fn test_inherited_slot_keeps_superclass_receiver_type() {
        generator!(gen, names, animals());
        let text = gen.class_struct("Dog").unwrap();
        // Dog does not override speak, so its slot still takes an Animal.
        let speak = MethodSig::new("Animal", "speak", "()V");
        assert!(text.contains(&format!(
            "        void (*{})({});\n",
            names.slot_name(&speak),
            names.instance_type("Animal")
        )));
        // The modeled superclass is referenced by type.
        assert!(text.contains(&format!(
            "    {}* superclass;\n",
            names.class_struct_type("Animal")
        )));
    }

    #[test]
    fn test_instance_struct_orders_and_dedups_fields() {
        generator!(gen, names, animals());
        let fields = gen.instance_fields("Dog").unwrap();
        // Animal.name comes first; Dog's redeclared name is dropped; the
        // private and static superclass fields never appear.
        assert_eq!(
            fields,
            vec![
                FieldSig::new("Animal", "name", "I"),
                FieldSig::new("Dog", "age", "S"),
            ]
        );

        let text = gen.instance_struct("Dog").unwrap();
        assert!(text.starts_with("/* An instance of Dog. */\n"));
        assert!(text.contains(&format!(
            "    {}* class;\n",
            names.class_struct_type("Dog")
        )));
        let class_ptr = text.find("* class;").unwrap();
        let name_member = text
            .find(&names.field_name(&FieldSig::new("Animal", "name", "I")))
            .unwrap();
        let age_member = text
            .find(&names.field_name(&FieldSig::new("Dog", "age", "S")))
            .unwrap();
        assert!(class_ptr < name_member && name_member < age_member);
    }

    #[test]
    fn test_package_private_fields_stay_in_their_package() {
        let mut program = Program::new();
        program.add_class(ClassDecl {
            name: "pkg.Base".into(),
            superclass: None,
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![
                field("shared", "I", Modifiers::empty()),
                field("open", "I", Modifiers::PROTECTED),
            ],
            methods: vec![],
        });
        program.add_class(ClassDecl {
            name: "pkg.Near".into(),
            superclass: Some("pkg.Base".into()),
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![],
            methods: vec![],
        });
        program.add_class(ClassDecl {
            name: "far.Away".into(),
            superclass: Some("pkg.Base".into()),
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![],
            methods: vec![],
        });
        generator!(gen, _names, program);
        let near: Vec<String> = gen
            .instance_fields("pkg.Near")
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(near, vec!["shared".to_string(), "open".to_string()]);
        let away: Vec<String> = gen
            .instance_fields("far.Away")
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(away, vec!["open".to_string()]);
    }

    #[test]
    fn test_instanceof_checks_self_then_interfaces_then_superclass() {
        generator!(gen, names, animals());
        let text = gen.instanceof_function("Dog").unwrap();
        assert!(text.contains(&format!(
            "short {}(RT_OBJECT* instance, long checked) {{\n",
            names.instanceof_function("Dog")
        )));
        let own = text
            .find(&format!("checked == {}", names.class_hash("Dog")))
            .unwrap();
        let iface = text
            .find(&format!("checked == {}", names.class_hash("Pet")))
            .unwrap();
        let defer = text
            .find(&format!(
                "return {}(instance, checked);",
                names.instanceof_function("Animal")
            ))
            .unwrap();
        assert!(own < iface && iface < defer);

        // Animal has no modeled superclass to defer to.
        let root = gen.instanceof_function("Animal").unwrap();
        assert!(root.ends_with("    return 0;\n}\n"));
    }

    #[test]
    fn test_lookup_switches_on_hash_and_defers_up() {
        generator!(gen, names, animals());
        let text = gen.lookup_function("Dog").unwrap();
        let speak = MethodSig::new("Animal", "speak", "()V");
        assert!(text.contains("    switch (hash) {\n"));
        assert!(text.contains(&format!(
            "        case {}: return (void*){}.methods.{};\n",
            names.interface_hash(&speak),
            names.class_struct_var("Dog"),
            names.slot_name(&speak)
        )));
        assert!(text.contains(&format!(
            "        default: return {}(hash);\n",
            names.lookup_function("Animal")
        )));

        let root = gen.lookup_function("Animal").unwrap();
        assert!(root.contains("        default: return NULL;\n"));
    }

    #[test]
    fn test_init_fills_metadata_and_skips_abstract_slots() {
        generator!(gen, names, animals());
        let text = gen.init_function("Dog").unwrap();
        let var = names.class_struct_var("Dog");
        assert!(text.contains(&format!("    {var}.name = \"Dog\";\n")));
        assert!(text.contains(&format!(
            "    {var}.instance_size = sizeof(struct {});\n",
            names.instance_type("Dog")
        )));
        assert!(text.contains(&format!(
            "    {var}.superclass = &{};\n",
            names.class_struct_var("Animal")
        )));
        assert!(text.contains(&format!(
            "    {var}.lookup = {};\n",
            names.lookup_function("Dog")
        )));
        assert!(text.contains(&format!(
            "    {var}.instance_of = {};\n",
            names.instanceof_function("Dog")
        )));
        // speak is inherited from Animal, so its slot points at Animal's
        // function; the abstract roam slot is not assigned at all.
        let speak = MethodSig::new("Animal", "speak", "()V");
        assert!(text.contains(&format!(
            "    {var}.methods.{} = {};\n",
            names.slot_name(&speak),
            names.function_name(&speak)
        )));
        let roam = MethodSig::new("Animal", "roam", "()V");
        assert!(!text.contains(&format!("{var}.methods.{} =", names.slot_name(&roam))));
    }

    #[test]
    fn test_single_class_mode_stands_alone() {
        let program = animals();
        let names = NamingContext::new();
        let required = Required::everything();
        let lists = MethodListBuilder::new(&program, &required);
        let gen = StructGenerator::new(&program, &names, &lists, &required, true);

        let text = gen.class_struct("Dog").unwrap();
        assert!(text.contains("    void* superclass;\n"));
        let init = gen.init_function("Dog").unwrap();
        assert!(init.contains(&format!(
            "    {}.superclass = NULL;\n",
            names.class_struct_var("Dog")
        )));
        let fields = gen.instance_fields("Dog").unwrap();
        assert_eq!(fields, vec![
            FieldSig::new("Dog", "name", "I"),
            FieldSig::new("Dog", "age", "S"),
        ]);
    }

    #[test]
    fn test_forward_decls_and_externs() {
        generator!(gen, names, animals());
        let instance = names.instance_type("Dog");
        assert_eq!(
            gen.forward_decls("Dog"),
            format!("struct {instance};\ntypedef struct {instance} *{instance};\n")
        );
        let text = gen.externs("Dog").unwrap();
        assert!(text.contains(&format!(
            "extern {} {};\n",
            names.class_struct_type("Dog"),
            names.class_struct_var("Dog")
        )));
        assert!(text.contains(&format!("void {}(void);\n", names.init_function("Dog"))));
        assert!(text.contains(&format!(
            "void* {}(long hash);\n",
            names.lookup_function("Dog")
        )));
    }

    #[test]
    fn test_prototype_covers_static_and_instance_methods() {
        let mut program = animals();
        program
            .classes
            .get_mut("Dog")
            .unwrap()
            .methods
            .push(method("count", "(I)I", Modifiers::PUBLIC | Modifiers::STATIC));
        generator!(gen, names, program);
        let stat = MethodSig::new("Dog", "count", "(I)I");
        assert_eq!(
            gen.function_prototype(&stat),
            format!("int {}(int);\n", names.function_name(&stat))
        );
        let init = MethodSig::new("Dog", "<init>", "()V");
        assert_eq!(
            gen.function_prototype(&init),
            format!(
                "void {}({});\n",
                names.function_name(&init),
                names.instance_type("Dog")
            )
        );
    }
}
