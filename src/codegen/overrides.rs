/// Hand-written body discovery.
///
/// A method's generated body can be replaced wholesale: dropping a file
/// named after its generated function (`<function name>.c`) into the
/// override directory makes the code file emit an `#include` of it instead
/// of lowering the modeled body. A file named after a class's file base
/// (`<file base>.c`) replaces that class's whole code file the same way.
/// Discovered replacements also become pruning leaves, because a
/// replacement's callees are invisible to the model.

use std::path::{Path, PathBuf};

use log::info;

use crate::analysis::OverrideSet;
use crate::ir::{MethodSig, Program};

use super::names::NamingContext;

pub struct OverrideScanner<'a> {
    names: &'a NamingContext,
    dir: Option<PathBuf>,
}

impl<'a> OverrideScanner<'a> {
    pub fn new(names: &'a NamingContext, dir: Option<&Path>) -> Self {
        OverrideScanner {
            names,
            dir: dir.map(Path::to_path_buf),
        }
    }

    /// The replacement file for one method, if it exists.
    pub fn method_file(&self, sig: &MethodSig) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!("{}.c", self.names.function_name(sig)));
        path.is_file().then_some(path)
    }

    /// The replacement file for a whole class, if it exists.
    pub fn class_file(&self, class: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!("{}.c", self.names.file_base(class)));
        path.is_file().then_some(path)
    }

    /// Probe every declared method and class of the model. The result
    /// feeds pruning before any code is emitted.
    pub fn collect(&self, program: &Program) -> OverrideSet {
        let mut set = OverrideSet::new();
        if self.dir.is_none() {
            return set;
        }
        for (name, class) in &program.classes {
            if self.class_file(name).is_some() {
                info!("class {} replaced by a hand-written body", name);
                set.add_class(name.clone());
            }
            for method in &class.methods {
                let sig = method.sig(name);
                if self.method_file(&sig).is_some() {
                    info!("method {} replaced by a hand-written body", sig);
                    set.add_method(sig);
                }
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ClassDecl, MethodDecl, Modifiers};

    fn program() -> Program {
        let mut program = Program::new();
        program.add_class(ClassDecl {
            name: "demo.Main".into(),
            superclass: None,
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![],
            methods: vec![MethodDecl {
                name: "print".into(),
                descriptor: "()V".into(),
                modifiers: Modifiers::PUBLIC | Modifiers::NATIVE,
                exceptions: vec![],
                body: None,
            }],
        });
        program
    }

    #[test]
    fn test_no_directory_means_no_overrides() {
        let names = NamingContext::new();
        let scanner = OverrideScanner::new(&names, None);
        assert!(scanner.collect(&program()).is_empty());
        let sig = MethodSig::new("demo.Main", "print", "()V");
        assert_eq!(scanner.method_file(&sig), None);
    }

    #[test]
    fn test_method_and_class_files_are_discovered() {
        let names = NamingContext::new();
        let dir = tempfile::tempdir().unwrap();
        let sig = MethodSig::new("demo.Main", "print", "()V");
        let method_path = dir
            .path()
            .join(format!("{}.c", names.function_name(&sig)));
        std::fs::write(&method_path, "/* hand-written */\n").unwrap();
        let class_path = dir
            .path()
            .join(format!("{}.c", names.file_base("demo.Main")));
        std::fs::write(&class_path, "/* hand-written */\n").unwrap();

        let scanner = OverrideScanner::new(&names, Some(dir.path()));
        assert_eq!(scanner.method_file(&sig), Some(method_path));
        assert_eq!(scanner.class_file("demo.Main"), Some(class_path));

        let set = scanner.collect(&program());
        assert!(set.method_overridden(&sig));
        assert!(set.class_overridden("demo.Main"));
        assert!(!set.class_overridden("demo.Other"));
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let names = NamingContext::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let scanner = OverrideScanner::new(&names, Some(dir.path()));
        assert!(scanner.collect(&program()).is_empty());
    }
}
