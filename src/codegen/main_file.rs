/// Entry-driver emission (`_main.c`).
///
/// The driver boots the runtime, fills in every class structure superclass
/// first, runs the reachable static initializers in the same order, turns
/// the command line into a string array, and hands control to the entry
/// method.

use crate::analysis::Required;
use crate::ir::{MethodSig, Program};

use super::method_lists::MethodListBuilder;
use super::names::{
    NamingContext, ARRAY_ACCESS, ARRAY_ALLOCATE, ARRAY_TYPE, CHAR_ARRAY_TO_STRING, CLASS_PTR,
    RUNTIME_HEADER, RUNTIME_INIT,
};
use super::{GenError, GenResult};

const STRING_CLASS: &str = "java.lang.String";
const ENTRY_NAME: &str = "main";
const ENTRY_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

pub struct MainFileGenerator<'a> {
    program: &'a Program,
    names: &'a NamingContext,
    lists: &'a MethodListBuilder<'a>,
    required: &'a Required,
}

impl<'a> MainFileGenerator<'a> {
    pub fn new(
        program: &'a Program,
        names: &'a NamingContext,
        lists: &'a MethodListBuilder<'a>,
        required: &'a Required,
    ) -> Self {
        MainFileGenerator {
            program,
            names,
            lists,
            required,
        }
    }

    /// Classes ordered so every superclass precedes its subclasses; ties
    /// break by name to keep output stable.
    fn init_order(&self, classes: &[String]) -> Vec<String> {
        let mut order = classes.to_vec();
        order.sort_by(|a, b| {
            let depth_a = self.program.superclass_chain(a).len();
            let depth_b = self.program.superclass_chain(b).len();
            depth_a.cmp(&depth_b).then_with(|| a.cmp(b))
        });
        order
    }

    /// The whole `_main.c` for an entry class, covering `classes` (the
    /// reachable set).
    pub fn main_file(&self, entry_class: &str, classes: &[String]) -> GenResult<String> {
        let entry = MethodSig::new(entry_class, ENTRY_NAME, ENTRY_DESCRIPTOR);
        if self.program.method(&entry).is_none() {
            return Err(GenError::MissingEntryPoint {
                class: entry_class.to_string(),
            });
        }
        let order = self.init_order(classes);

        let mut out = format!(
            "/* Entry point through {entry_class}. Generated by class2c; do not edit. */\n\n"
        );
        out.push_str("#include <stdlib.h>\n\n");
        out.push_str(&format!("#include \"{RUNTIME_HEADER}\"\n"));
        for class in &order {
            out.push_str(&format!("#include \"{}\"\n", self.names.header_file(class)));
        }

        out.push_str("\nint main(int argc, char** argv) {\n");
        let marshal = self.program.contains_class(STRING_CLASS);
        if marshal {
            out.push_str("    long i;\n");
        }
        out.push_str(&format!("    {ARRAY_TYPE} args;\n\n"));
        out.push_str(&format!("    {RUNTIME_INIT}();\n\n"));

        out.push_str("    /* Class structures, superclasses first. */\n");
        for class in &order {
            out.push_str(&format!("    {}();\n", self.names.init_function(class)));
        }

        let mut clinits = String::new();
        for class in &order {
            if let Some(clinit) = &self.lists.partition(class)?.class_initializer {
                if self.required.method(clinit) {
                    clinits.push_str(&format!("    {}();\n", self.names.function_name(clinit)));
                }
            }
        }
        if !clinits.is_empty() {
            out.push_str("\n    /* Static initializers. */\n");
            out.push_str(&clinits);
        }
        out.push_str("\n");

        if marshal {
            let elem = self.names.instance_type(STRING_CLASS);
            out.push_str("    /* Marshal the command line. */\n");
            out.push_str(&format!(
                "    args = ({ARRAY_TYPE}){ARRAY_ALLOCATE}(({CLASS_PTR}) malloc(sizeof({elem})), \
                 sizeof(void*), 1, 1, (long)(argc - 1));\n"
            ));
            out.push_str("    for (i = 0; i < (long)(argc - 1); i++) {\n");
            out.push_str(&format!(
                "        {ARRAY_ACCESS}(({ARRAY_TYPE})args, {elem}, (long)i) = \
                 {CHAR_ARRAY_TO_STRING}(argv[i + 1]);\n"
            ));
            out.push_str("    }\n\n");
        } else {
            out.push_str("    /* No string class in the model; the command line stays behind. */\n");
            out.push_str("    args = 0;\n\n");
        }

        out.push_str(&format!(
            "    {}(({ARRAY_TYPE}) args);\n\n",
            self.names.function_name(&entry)
        ));
        out.push_str("    return 0;\n");
        out.push_str("}\n");
        Ok(out)
    }
}
