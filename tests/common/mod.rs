//! Shared program-builder helpers. Each test file uses a subset.
#![allow(dead_code)]

use class2c::ir::{
    ClassDecl, FieldDecl, FieldSig, IdentityRef, InvokeExpr, InvokeKind, Local, MethodBody,
    MethodDecl, MethodSig, Modifiers, Program, Ty, Unit, Value,
};

pub struct ClassBuilder {
    decl: ClassDecl,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            decl: ClassDecl {
                name: name.into(),
                superclass: None,
                interfaces: vec![],
                modifiers: Modifiers::PUBLIC,
                fields: vec![],
                methods: vec![],
            },
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.decl.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.decl.interfaces.push(interface.into());
        self
    }

    pub fn interface(mut self) -> Self {
        self.decl.modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
        self
    }

    pub fn field(mut self, name: &str, descriptor: &str, modifiers: Modifiers) -> Self {
        self.decl.fields.push(FieldDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers,
        });
        self
    }

    /// A bodied method with no declared locals.
    pub fn method(
        mut self,
        name: &str,
        descriptor: &str,
        modifiers: Modifiers,
        units: Vec<Unit>,
    ) -> Self {
        self.decl.methods.push(MethodDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers,
            exceptions: vec![],
            body: Some(MethodBody {
                locals: vec![],
                units,
                traps: vec![],
            }),
        });
        self
    }

    pub fn method_with_body(
        mut self,
        name: &str,
        descriptor: &str,
        modifiers: Modifiers,
        body: MethodBody,
    ) -> Self {
        self.decl.methods.push(MethodDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers,
            exceptions: vec![],
            body: Some(body),
        });
        self
    }

    pub fn abstract_method(mut self, name: &str, descriptor: &str) -> Self {
        self.decl.methods.push(MethodDecl {
            name: name.into(),
            descriptor: descriptor.into(),
            modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT,
            exceptions: vec![],
            body: None,
        });
        self
    }

    pub fn add_to(self, program: &mut Program) {
        program.add_class(self.decl);
    }
}

// --- Signature and body shorthands ---

pub fn msig(class: &str, name: &str, descriptor: &str) -> MethodSig {
    MethodSig::new(class, name, descriptor)
}

pub fn fsig(class: &str, name: &str, descriptor: &str) -> FieldSig {
    FieldSig::new(class, name, descriptor)
}

pub fn local(name: &str, descriptor: &str) -> Local {
    Local {
        name: name.into(),
        ty: class2c::ir::parse_type_descriptor(descriptor)
            .unwrap_or_else(|| panic!("bad descriptor {descriptor}")),
    }
}

pub fn this_ident(name: &str) -> Unit {
    Unit::Identity {
        local: name.into(),
        rhs: IdentityRef::This,
    }
}

pub fn param_ident(name: &str, index: u16) -> Unit {
    Unit::Identity {
        local: name.into(),
        rhs: IdentityRef::Parameter(index),
    }
}

pub fn ret() -> Unit {
    Unit::Return(None)
}

pub fn call_static(class: &str, name: &str, descriptor: &str, args: Vec<Value>) -> Unit {
    Unit::Invoke(InvokeExpr {
        kind: InvokeKind::Static,
        base: None,
        method: msig(class, name, descriptor),
        args,
    })
}

pub fn call_virtual(base: Value, class: &str, name: &str, descriptor: &str, args: Vec<Value>) -> Unit {
    Unit::Invoke(InvokeExpr {
        kind: InvokeKind::Virtual,
        base: Some(Box::new(base)),
        method: msig(class, name, descriptor),
        args,
    })
}

pub fn assign_local(name: &str, rhs: Value) -> Unit {
    Unit::Assign {
        lhs: Value::Local(name.into()),
        rhs,
    }
}

/// Modifier shorthand for the `public static void main(String[])` shape.
pub fn entry_modifiers() -> Modifiers {
    Modifiers::PUBLIC | Modifiers::STATIC
}

/// Reference type shorthand for locals and casts.
pub fn ref_ty(class: &str) -> Ty {
    Ty::reference(class)
}
