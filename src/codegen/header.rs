/// Per-class header emission.
///
/// Each class gets two headers. The stub (`_i.h`) carries only the
/// instance-type forward declaration and exists to break include cycles:
/// mutually referencing classes include each other's stubs, never each
/// other's full headers. The full header (`.h`) pulls in its own stub,
/// the superclass's full header (the class structure names its type), and
/// stubs for everything else it mentions, then declares the two structures,
/// the externs, and prototypes for the functions the code file defines.
///
/// Single-class compilation includes nothing but the runtime header;
/// foreign types collapse to inline forward declarations so the output
/// stands alone.

use std::collections::BTreeSet;

use crate::ir::Program;

use super::names::{NamingContext, RUNTIME_HEADER};
use super::structs::StructGenerator;
use super::GenResult;

pub struct HeaderGenerator<'a> {
    program: &'a Program,
    names: &'a NamingContext,
    structs: &'a StructGenerator<'a>,
    single_class: bool,
}

impl<'a> HeaderGenerator<'a> {
    pub fn new(
        program: &'a Program,
        names: &'a NamingContext,
        structs: &'a StructGenerator<'a>,
        single_class: bool,
    ) -> Self {
        HeaderGenerator {
            program,
            names,
            structs,
            single_class,
        }
    }

    /// The forward-declaration stub. Anything that only holds a pointer to
    /// an instance includes this instead of the full header.
    pub fn stub(&self, name: &str) -> String {
        let guard = self.names.stub_include_guard(name);
        let mut out = format!(
            "/* Forward declarations for class {name}. Generated by class2c; do not edit. */\n\n"
        );
        out.push_str(&format!("#ifndef {guard}\n"));
        out.push_str(&format!("#define {guard}\n\n"));
        out.push_str(&self.structs.forward_decls(name));
        out.push_str(&format!("\n#endif /* {guard} */\n"));
        out
    }

    /// Modeled classes the header must make visible besides the class
    /// itself and its superclass.
    fn stub_includes(&self, name: &str) -> GenResult<BTreeSet<String>> {
        let mut classes = self.structs.referenced_types(name)?;
        classes.remove(name);
        if let Some(super_name) = self.structs.linked_superclass(name) {
            classes.remove(&super_name);
        }
        // A class outside the model has no header to include; its absence
        // surfaces in the native build, not here.
        classes.retain(|c| self.program.contains_class(c));
        Ok(classes)
    }

    /// The full header: structures, externs, and method prototypes.
    pub fn header(&self, name: &str) -> GenResult<String> {
        let guard = self.names.include_guard(name);
        let mut out =
            format!("/* Declarations for class {name}. Generated by class2c; do not edit. */\n\n");
        out.push_str(&format!("#ifndef {guard}\n"));
        out.push_str(&format!("#define {guard}\n\n"));
        out.push_str(&format!("#include \"{RUNTIME_HEADER}\"\n"));

        if self.single_class {
            out.push_str("\n");
            out.push_str(&self.structs.forward_decls(name));
            let foreign: Vec<String> = self
                .structs
                .referenced_types(name)?
                .into_iter()
                .filter(|c| c != name)
                .collect();
            if !foreign.is_empty() {
                out.push_str("\n/* Types compiled separately. */\n");
                for class in foreign {
                    out.push_str(&self.structs.forward_decls(&class));
                }
            }
        } else {
            out.push_str(&format!(
                "#include \"{}\"\n",
                self.names.stub_header_file(name)
            ));
            if let Some(super_name) = self.structs.linked_superclass(name) {
                out.push_str(&format!(
                    "#include \"{}\"\n",
                    self.names.header_file(&super_name)
                ));
            }
            for class in self.stub_includes(name)? {
                out.push_str(&format!(
                    "#include \"{}\"\n",
                    self.names.stub_header_file(&class)
                ));
            }
        }

        out.push_str("\n");
        out.push_str(&self.structs.class_struct(name)?);
        out.push_str("\n");
        out.push_str(&self.structs.instance_struct(name)?);
        out.push_str("\n");
        out.push_str(&self.structs.externs(name)?);

        let entries = self.structs.declared_entries(name)?;
        if !entries.is_empty() {
            out.push_str(&format!("\n/* Methods declared by {name}. */\n"));
            for entry in &entries {
                out.push_str(&self.structs.function_prototype(entry));
            }
        }

        out.push_str(&format!("\n#endif /* {guard} */\n"));
        Ok(out)
    }
}
