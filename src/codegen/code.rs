/// Per-class code file emission.
///
/// A code file carries, in order: the class-structure variable definition,
/// the run-time type check and interface lookup functions, one function per
/// method the class declares, and the class-structure initialization
/// function. Includes are computed by scanning the method bodies for every
/// class they mention, so lowering itself never tracks includes.

use std::collections::BTreeSet;

use log::debug;

use crate::ir::{
    parse_method_descriptor, IdentityRef, MethodDecl, MethodSig, Program, Ty, Unit, Value,
};

use super::lower::{LowerEnv, MethodLowerer};
use super::method_lists::MethodListBuilder;
use super::names::NamingContext;
use super::overrides::OverrideScanner;
use super::structs::StructGenerator;
use super::GenResult;

pub struct CodeGenerator<'a> {
    program: &'a Program,
    names: &'a NamingContext,
    lists: &'a MethodListBuilder<'a>,
    structs: &'a StructGenerator<'a>,
    overrides: &'a OverrideScanner<'a>,
    single_class: bool,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(
        program: &'a Program,
        names: &'a NamingContext,
        lists: &'a MethodListBuilder<'a>,
        structs: &'a StructGenerator<'a>,
        overrides: &'a OverrideScanner<'a>,
        single_class: bool,
    ) -> Self {
        CodeGenerator {
            program,
            names,
            lists,
            structs,
            overrides,
            single_class,
        }
    }

    /// Heading of a function definition, formals named after the locals the
    /// body binds with identity units.
    fn function_heading(&self, sig: &MethodSig, decl: &MethodDecl) -> String {
        let (params, ret) =
            parse_method_descriptor(&sig.descriptor).unwrap_or((Vec::new(), Ty::Void));
        let body = decl.body.as_ref();
        let mut args = Vec::new();
        if !decl.is_static() {
            let this = body
                .and_then(|b| b.this_local())
                .map(|l| self.names.local_name(l))
                .unwrap_or_else(|| "p_this".to_string());
            args.push(format!("{} {}", self.names.instance_type(&sig.class), this));
        }
        for (i, ty) in params.iter().enumerate() {
            let name = body
                .and_then(|b| b.parameter_local(i as u16))
                .map(|l| self.names.local_name(l))
                .unwrap_or_else(|| format!("p{i}"));
            args.push(format!("{} {}", self.names.c_type(ty), name));
        }
        let list = if args.is_empty() {
            "void".to_string()
        } else {
            args.join(", ")
        };
        format!(
            "{} {}({})",
            self.names.c_type(&ret),
            self.names.function_name(sig),
            list
        )
    }

    /// One function definition, or the `#include` that replaces it.
    fn function_definition(
        &self,
        env: &LowerEnv<'a>,
        sig: &MethodSig,
        decl: &MethodDecl,
    ) -> GenResult<String> {
        if let Some(path) = self.overrides.method_file(sig) {
            return Ok(format!(
                "/* Hand-written body of {}. */\n#include \"{}\"\n",
                sig,
                path.display()
            ));
        }
        let heading = self.function_heading(sig, decl);
        let body = match &decl.body {
            Some(b) => b,
            None => {
                // Native with no replacement file: an empty shell keeps the
                // build linking. Calling it is a model gap, not ours.
                let ret = decl.return_type();
                let mut out = format!("/* No modeled body for {}. */\n{} {{\n", sig, heading);
                if ret != Ty::Void {
                    out.push_str(&format!("    return ({})0;\n", self.names.c_type(&ret)));
                }
                out.push_str("}\n");
                return Ok(out);
            }
        };

        let lowerer = MethodLowerer::new(env, sig, body);
        let mut out = format!("{} {{\n", heading);
        // Identity-bound locals are the formals; everything else needs a
        // declaration.
        let formals: BTreeSet<&str> = body
            .units
            .iter()
            .filter_map(|unit| match unit {
                Unit::Identity {
                    local,
                    rhs: IdentityRef::This | IdentityRef::Parameter(_),
                } => Some(local.as_str()),
                _ => None,
            })
            .collect();
        let mut decls = String::new();
        for local in &body.locals {
            if formals.contains(local.name.as_str()) {
                continue;
            }
            decls.push_str(&format!(
                "    {} {};\n",
                self.names.c_type(&local.ty),
                self.names.local_name(&local.name)
            ));
        }
        if lowerer.manages_exceptions() {
            decls.push_str("    jmp_buf caller_env;\n");
            decls.push_str("    long caller_epc;\n");
        }
        if !decls.is_empty() {
            out.push_str(&decls);
            out.push_str("\n");
        }
        out.push_str(&lowerer.lower_body()?);
        out.push_str("}\n");
        Ok(out)
    }

    /// Modeled classes the bodies mention; their full headers get included.
    fn body_references(&self, name: &str) -> GenResult<BTreeSet<String>> {
        let mut out = BTreeSet::new();
        if let Some(super_name) = self.structs.linked_superclass(name) {
            out.insert(super_name);
        }
        for entry in self.structs.declared_entries(name)? {
            let decl = match self.program.method(&entry) {
                Some(d) => d,
                None => continue,
            };
            let body = match &decl.body {
                Some(b) => b,
                None => continue,
            };
            // Replaced text is opaque; its includes are its own business.
            if self.overrides.method_file(&entry).is_some() {
                continue;
            }
            for local in &body.locals {
                if let Some(c) = local.ty.referenced_class() {
                    out.insert(c.to_string());
                }
            }
            for unit in &body.units {
                for value in unit.values() {
                    value.for_each(&mut |v| collect_value_classes(v, &mut out));
                }
            }
        }
        out.remove(name);
        out.retain(|c| self.program.contains_class(c));
        Ok(out)
    }

    /// The complete code file for one class.
    pub fn code(&self, name: &str) -> GenResult<String> {
        let mut out = format!("/* Code for class {name}. Generated by class2c; do not edit. */\n\n");
        if let Some(path) = self.overrides.class_file(name) {
            out.push_str("/* Hand-written replacement. */\n");
            out.push_str(&format!("#include \"{}\"\n", path.display()));
            return Ok(out);
        }

        out.push_str("#include <stdlib.h>\n");
        out.push_str("#include <string.h>\n");
        out.push_str("#include <setjmp.h>\n\n");
        out.push_str(&format!("#include \"{}\"\n", self.names.header_file(name)));
        if !self.single_class {
            for class in self.body_references(name)? {
                out.push_str(&format!("#include \"{}\"\n", self.names.header_file(&class)));
            }
        }
        out.push_str("\n");

        out.push_str(&format!("/* The class structure of {name}. */\n"));
        out.push_str(&format!(
            "{} {};\n\n",
            self.names.class_struct_type(name),
            self.names.class_struct_var(name)
        ));
        out.push_str(&self.structs.instanceof_function(name)?);
        out.push_str("\n");
        out.push_str(&self.structs.lookup_function(name)?);
        out.push_str("\n");

        let env = LowerEnv {
            program: self.program,
            names: self.names,
            lists: self.lists,
            single_class: self.single_class,
        };
        for entry in self.structs.declared_entries(name)? {
            let decl = match self.program.method(&entry) {
                Some(d) => d,
                None => {
                    debug!("method {} has no declaration, no function emitted", entry);
                    continue;
                }
            };
            out.push_str(&self.function_definition(&env, &entry, decl)?);
            out.push_str("\n");
        }

        out.push_str(&self.structs.init_function(name)?);
        Ok(out)
    }
}

fn collect_value_classes(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::InstanceField { field, .. } | Value::StaticField { field } => {
            out.insert(field.class.clone());
            if let Some(c) = field.ty().as_ref().and_then(|t| t.referenced_class()) {
                out.insert(c.to_string());
            }
        }
        Value::Invoke(invoke) => {
            out.insert(invoke.method.class.clone());
            if let Some((params, ret)) = parse_method_descriptor(&invoke.method.descriptor) {
                for ty in params.iter().chain(std::iter::once(&ret)) {
                    if let Some(c) = ty.referenced_class() {
                        out.insert(c.to_string());
                    }
                }
            }
        }
        Value::New { class } => {
            out.insert(class.clone());
        }
        Value::Cast { ty, .. } | Value::InstanceOf { check: ty, .. } => {
            if let Some(c) = ty.referenced_class() {
                out.insert(c.to_string());
            }
        }
        Value::NewArray { elem, .. } => {
            if let Some(c) = elem.referenced_class() {
                out.insert(c.to_string());
            }
        }
        Value::StringConst(_) => {
            out.insert("java.lang.String".to_string());
        }
        _ => {}
    }
}
