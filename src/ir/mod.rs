//! In-memory program model: types, declarations, and method bodies.

pub mod body;
pub mod program;
pub mod types;

pub use body::{
    BinOp, CmpKind, CondOp, IdentityRef, InvokeExpr, InvokeKind, Local, MethodBody, TrapRegion,
    Unit, UnitId, Value,
};
pub use program::{
    ClassDecl, FieldDecl, FieldSig, MethodDecl, MethodSig, ModelError, ModelResult, Modifiers,
    Program, OBJECT_CLASS,
};
pub use types::{
    parse_method_descriptor, parse_type_descriptor, package_name, simple_class_name, PrimTy, Ty,
};
