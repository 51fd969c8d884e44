/// Call-graph oracle: who can an invocation reach?
///
/// The pruner consults this through the [`CallGraph`] trait so the dispatch
/// analysis is swappable; [`ClassHierarchyGraph`] is the built-in
/// implementation, a plain class-hierarchy analysis over the model. It
/// over-approximates virtual and interface dispatch by the receiver's
/// declared type cone, which is sound for pruning (reachable code is never
/// dropped) at the cost of keeping some unreachable overrides alive.

use std::collections::BTreeSet;

use crate::ir::{InvokeExpr, InvokeKind, MethodBody, MethodSig, Program};

/// Answers dispatch questions for the pruner.
pub trait CallGraph {
    /// Possible concrete targets of one call site. Targets are returned with
    /// their *declaring* class filled in where resolution succeeds; a target
    /// that cannot be resolved inside the model is returned as written so the
    /// caller can report it.
    fn call_targets(&self, invoke: &InvokeExpr) -> Vec<MethodSig>;

    /// Every target of every call site in `body`, deduplicated, in a stable
    /// order.
    fn successors_of(&self, body: &MethodBody) -> Vec<MethodSig> {
        let mut out = BTreeSet::new();
        for unit in &body.units {
            for value in unit.values() {
                value.for_each(&mut |v| {
                    if let crate::ir::Value::Invoke(invoke) = v {
                        out.extend(self.call_targets(invoke));
                    }
                });
            }
            if let Some(invoke) = unit.invoke_expr() {
                out.extend(self.call_targets(invoke));
            }
        }
        out.into_iter().collect()
    }
}

/// Class-hierarchy analysis over the program model.
pub struct ClassHierarchyGraph<'p> {
    program: &'p Program,
}

impl<'p> ClassHierarchyGraph<'p> {
    pub fn new(program: &'p Program) -> Self {
        ClassHierarchyGraph { program }
    }

    /// `base` plus every transitive subclass of it that is in the model.
    fn cone_of(&self, base: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut work = vec![base.to_string()];
        let mut seen = BTreeSet::new();
        while let Some(name) = work.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            for sub in self.program.subclasses_of(&name) {
                work.push(sub.name.clone());
            }
            out.push(name);
        }
        out
    }

    /// Resolve a sub-signature starting at `class`, walking up the chain.
    fn resolve_at(&self, class: &str, sig: &MethodSig) -> Option<MethodSig> {
        let probe = MethodSig::new(class, sig.name.clone(), sig.descriptor.clone());
        self.program
            .resolve_method(&probe)
            .map(|(decl_class, method)| method.sig(&decl_class.name))
    }

    /// Classes that implement `interface_name`, directly or by extending an
    /// implementer.
    fn implementing_cone(&self, interface_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        for direct in self.program.implementers_of(interface_name) {
            out.extend(self.cone_of(&direct.name));
        }
        out
    }
}

impl CallGraph for ClassHierarchyGraph<'_> {
    fn call_targets(&self, invoke: &InvokeExpr) -> Vec<MethodSig> {
        let sig = &invoke.method;
        let mut out = BTreeSet::new();
        match invoke.kind {
            InvokeKind::Static | InvokeKind::Special => {
                out.insert(self.resolve_at(&sig.class, sig).unwrap_or_else(|| sig.clone()));
            }
            InvokeKind::Virtual => {
                let mut any = false;
                for class in self.cone_of(&sig.class) {
                    if let Some(target) = self.resolve_at(&class, sig) {
                        out.insert(target);
                        any = true;
                    }
                }
                if !any {
                    out.insert(sig.clone());
                }
            }
            InvokeKind::Interface => {
                let mut any = false;
                for class in self.implementing_cone(&sig.class) {
                    if let Some(target) = self.resolve_at(&class, sig) {
                        out.insert(target);
                        any = true;
                    }
                }
                if !any {
                    out.insert(sig.clone());
                }
            }
        }
        out.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ClassDecl, MethodDecl, Modifiers};

    fn method(name: &str, descriptor: &str) -> MethodDecl {
        MethodDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers: Modifiers::PUBLIC,
            exceptions: vec![],
            body: Some(Default::default()),
        }
    }

    fn hierarchy() -> Program {
        let mut program = Program::new();
        program.add_class(ClassDecl {
            name: "Animal".into(),
            superclass: None,
            interfaces: vec!["Audible".into()],
            modifiers: Modifiers::PUBLIC,
            fields: vec![],
            methods: vec![method("speak", "()V")],
        });
        program.add_class(ClassDecl {
            name: "Dog".into(),
            superclass: Some("Animal".into()),
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![],
            methods: vec![method("speak", "()V")],
        });
        program.add_class(ClassDecl {
            name: "Puppy".into(),
            superclass: Some("Dog".into()),
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC,
            fields: vec![],
            methods: vec![],
        });
        program.add_class(ClassDecl {
            name: "Audible".into(),
            superclass: None,
            interfaces: vec![],
            modifiers: Modifiers::PUBLIC | Modifiers::INTERFACE,
            fields: vec![],
            methods: vec![method("speak", "()V")],
        });
        program
    }

    fn virtual_call(class: &str) -> InvokeExpr {
        InvokeExpr {
            kind: InvokeKind::Virtual,
            base: Some(Box::new(crate::ir::Value::Local("x".into()))),
            method: MethodSig::new(class, "speak", "()V"),
            args: vec![],
        }
    }

    #[test]
    fn test_virtual_targets_cover_the_cone() {
        let program = hierarchy();
        let graph = ClassHierarchyGraph::new(&program);
        let targets = graph.call_targets(&virtual_call("Animal"));
        assert_eq!(
            targets,
            vec![
                MethodSig::new("Animal", "speak", "()V"),
                MethodSig::new("Dog", "speak", "()V"),
            ]
        );
    }

    #[test]
    fn test_virtual_on_leaf_resolves_to_nearest_override() {
        let program = hierarchy();
        let graph = ClassHierarchyGraph::new(&program);
        let targets = graph.call_targets(&virtual_call("Puppy"));
        assert_eq!(targets, vec![MethodSig::new("Dog", "speak", "()V")]);
    }

    #[test]
    fn test_interface_targets_cover_implementers() {
        let program = hierarchy();
        let graph = ClassHierarchyGraph::new(&program);
        let call = InvokeExpr {
            kind: InvokeKind::Interface,
            base: Some(Box::new(crate::ir::Value::Local("x".into()))),
            method: MethodSig::new("Audible", "speak", "()V"),
            args: vec![],
        };
        let targets = graph.call_targets(&call);
        assert_eq!(
            targets,
            vec![
                MethodSig::new("Animal", "speak", "()V"),
                MethodSig::new("Dog", "speak", "()V"),
            ]
        );
    }

    #[test]
    fn test_unresolvable_target_is_returned_as_written() {
        let program = hierarchy();
        let graph = ClassHierarchyGraph::new(&program);
        let call = InvokeExpr {
            kind: InvokeKind::Static,
            base: None,
            method: MethodSig::new("Missing", "f", "()V"),
            args: vec![],
        };
        assert_eq!(graph.call_targets(&call), vec![MethodSig::new("Missing", "f", "()V")]);
    }
}
