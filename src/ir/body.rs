/// Method body model: an ordered list of three-address control-flow units.
///
/// Bodies arrive already linearized (one unit per statement, operands are
/// locals or constants, branches are unit indices). This mirrors the shape a
/// bytecode front end produces after stack elimination; nothing here assumes
/// a particular front end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::program::{FieldSig, MethodSig};
use super::types::{parse_method_descriptor, PrimTy, Ty};

/// Index of a unit within its method body.
pub type UnitId = usize;

/// A typed local slot. Parameters and `this` are ordinary locals bound by
/// identity units at the top of the body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    pub ty: Ty,
}

/// Binary operators on locals/constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
}

impl BinOp {
    /// C token, for the operators that lower to plain infix C. Shifts never
    /// take this path (they need width saturation).
    pub fn c_token(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>",
        }
    }
}

/// Three-way comparison kinds (all produce -1/0/1 as an int).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpKind {
    Cmp,
    Cmpl,
    Cmpg,
}

/// Branch conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CondOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CondOp {
    pub fn c_token(&self) -> &'static str {
        match self {
            CondOp::Eq => "==",
            CondOp::Ne => "!=",
            CondOp::Lt => "<",
            CondOp::Le => "<=",
            CondOp::Gt => ">",
            CondOp::Ge => ">=",
        }
    }
}

/// Invocation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvokeKind {
    Virtual,
    Interface,
    Special,
    Static,
}

/// A method invocation, as either a statement or the right side of an
/// assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    /// Receiver; `None` for static calls.
    pub base: Option<Box<Value>>,
    pub method: MethodSig,
    pub args: Vec<Value>,
}

/// Special right-hand sides of identity units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityRef {
    This,
    Parameter(u16),
    CaughtException,
}

/// A value-producing expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    // --- Constants ---
    IntConst(i32),
    LongConst(i64),
    FloatConst(f32),
    DoubleConst(f64),
    StringConst(String),
    NullConst,

    // --- Variables and member access ---
    Local(String),
    InstanceField { base: Box<Value>, field: FieldSig },
    StaticField { field: FieldSig },
    ArrayRef { base: Box<Value>, index: Box<Value> },

    // --- Operations ---
    Binary { op: BinOp, left: Box<Value>, right: Box<Value> },
    Compare { kind: CmpKind, left: Box<Value>, right: Box<Value> },
    Cond { op: CondOp, left: Box<Value>, right: Box<Value> },
    Neg(Box<Value>),
    Cast { ty: Ty, value: Box<Value> },
    InstanceOf { value: Box<Value>, check: Ty },
    Len(Box<Value>),

    // --- Allocation ---
    New { class: String },
    /// One `sizes` entry per filled dimension; `elem` may itself be an array
    /// type when only the outer dimensions are allocated.
    NewArray { elem: Ty, dims: u8, sizes: Vec<Value> },

    // --- Calls ---
    Invoke(InvokeExpr),
}

impl Value {
    /// Pre-order walk over this value and every nested value.
    pub fn for_each(&self, f: &mut impl FnMut(&Value)) {
        f(self);
        match self {
            Value::InstanceField { base, .. } => base.for_each(f),
            Value::ArrayRef { base, index } => {
                base.for_each(f);
                index.for_each(f);
            }
            Value::Binary { left, right, .. }
            | Value::Compare { left, right, .. }
            | Value::Cond { left, right, .. } => {
                left.for_each(f);
                right.for_each(f);
            }
            Value::Neg(v) | Value::Cast { value: v, .. } | Value::InstanceOf { value: v, .. } | Value::Len(v) => {
                v.for_each(f)
            }
            Value::NewArray { sizes, .. } => {
                for s in sizes {
                    s.for_each(f);
                }
            }
            Value::Invoke(invoke) => {
                if let Some(base) = &invoke.base {
                    base.for_each(f);
                }
                for a in &invoke.args {
                    a.for_each(f);
                }
            }
            _ => {}
        }
    }

    /// Static type of this value, given the enclosing body's local types.
    /// `None` for null (the null constant is untyped) and for locals the body
    /// never declared.
    pub fn static_ty(&self, locals: &BTreeMap<String, Ty>) -> Option<Ty> {
        match self {
            Value::IntConst(_) => Some(Ty::Primitive(PrimTy::Int)),
            Value::LongConst(_) => Some(Ty::Primitive(PrimTy::Long)),
            Value::FloatConst(_) => Some(Ty::Primitive(PrimTy::Float)),
            Value::DoubleConst(_) => Some(Ty::Primitive(PrimTy::Double)),
            Value::StringConst(_) => Some(Ty::reference("java.lang.String")),
            Value::NullConst => None,
            Value::Local(name) => locals.get(name).cloned(),
            Value::InstanceField { field, .. } | Value::StaticField { field } => {
                super::types::parse_type_descriptor(&field.descriptor)
            }
            Value::ArrayRef { base, .. } => match base.static_ty(locals)? {
                Ty::Array { elem, dims: 1 } => Some(*elem),
                Ty::Array { elem, dims } => Some(Ty::Array { elem, dims: dims - 1 }),
                _ => None,
            },
            Value::Binary { left, .. } => left.static_ty(locals),
            Value::Compare { .. } => Some(Ty::Primitive(PrimTy::Int)),
            Value::Cond { .. } => Some(Ty::Primitive(PrimTy::Boolean)),
            Value::Neg(v) => v.static_ty(locals),
            Value::Cast { ty, .. } => Some(ty.clone()),
            Value::InstanceOf { .. } => Some(Ty::Primitive(PrimTy::Boolean)),
            Value::Len(_) => Some(Ty::Primitive(PrimTy::Int)),
            Value::New { class } => Some(Ty::reference(class.clone())),
            Value::NewArray { elem, dims, .. } => Some(Ty::array_of(elem.clone(), *dims)),
            Value::Invoke(invoke) => {
                let (_, ret) = parse_method_descriptor(&invoke.method.descriptor)?;
                Some(ret)
            }
        }
    }
}

/// One control-flow unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Unit {
    /// `lhs = rhs`. The left side is a local, field ref, or array ref.
    Assign { lhs: Value, rhs: Value },
    /// Binds a local to `this`, a parameter, or the caught exception.
    Identity { local: String, rhs: IdentityRef },
    If { cond: Value, target: UnitId },
    Goto { target: UnitId },
    Invoke(InvokeExpr),
    Return(Option<Value>),
    LookupSwitch { key: Value, cases: Vec<(i64, UnitId)>, default: UnitId },
    TableSwitch { key: Value, low: i64, targets: Vec<UnitId>, default: UnitId },
    Throw(Value),
    Nop,
    // Unsupported in the target; lowered to placeholder comments.
    EnterMonitor(Value),
    ExitMonitor(Value),
    Ret,
    Breakpoint,
}

impl Unit {
    /// Units this one can branch to (fall-through excluded).
    pub fn branch_targets(&self) -> Vec<UnitId> {
        match self {
            Unit::If { target, .. } | Unit::Goto { target } => vec![*target],
            Unit::LookupSwitch { cases, default, .. } => {
                let mut out: Vec<UnitId> = cases.iter().map(|(_, t)| *t).collect();
                out.push(*default);
                out
            }
            Unit::TableSwitch { targets, default, .. } => {
                let mut out = targets.clone();
                out.push(*default);
                out
            }
            _ => vec![],
        }
    }

    /// Top-level operand values of this unit.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Unit::Assign { lhs, rhs } => vec![lhs, rhs],
            Unit::If { cond, .. } => vec![cond],
            Unit::Invoke(invoke) => {
                let mut out: Vec<&Value> = Vec::new();
                if let Some(base) = &invoke.base {
                    out.push(base);
                }
                out.extend(invoke.args.iter());
                out
            }
            Unit::LookupSwitch { key, .. } | Unit::TableSwitch { key, .. } => vec![key],
            Unit::Throw(v) | Unit::EnterMonitor(v) | Unit::ExitMonitor(v) => vec![v],
            Unit::Return(Some(v)) => vec![v],
            _ => vec![],
        }
    }

    /// The invocation this unit performs directly, if any.
    pub fn invoke_expr(&self) -> Option<&InvokeExpr> {
        match self {
            Unit::Invoke(invoke) => Some(invoke),
            Unit::Assign { rhs: Value::Invoke(invoke), .. } => Some(invoke),
            _ => None,
        }
    }

    /// Short kind tag used in placeholder comments and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Unit::Assign { .. } => "AssignStmt",
            Unit::Identity { .. } => "IdentityStmt",
            Unit::If { .. } => "IfStmt",
            Unit::Goto { .. } => "GotoStmt",
            Unit::Invoke(_) => "InvokeStmt",
            Unit::Return(_) => "ReturnStmt",
            Unit::LookupSwitch { .. } => "LookupSwitchStmt",
            Unit::TableSwitch { .. } => "TableSwitchStmt",
            Unit::Throw(_) => "ThrowStmt",
            Unit::Nop => "NopStmt",
            Unit::EnterMonitor(_) => "EnterMonitorStmt",
            Unit::ExitMonitor(_) => "ExitMonitorStmt",
            Unit::Ret => "RetStmt",
            Unit::Breakpoint => "BreakpointStmt",
        }
    }
}

/// A protected region: units in `[begin, end)` are covered by `handler` for
/// throwables assignable to `exception`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapRegion {
    pub begin: UnitId,
    pub end: UnitId,
    pub handler: UnitId,
    pub exception: String,
}

/// A complete method body.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodBody {
    pub locals: Vec<Local>,
    pub units: Vec<Unit>,
    pub traps: Vec<TrapRegion>,
}

impl MethodBody {
    /// Local-name to type map, for static typing during lowering.
    pub fn local_types(&self) -> BTreeMap<String, Ty> {
        self.locals
            .iter()
            .map(|l| (l.name.clone(), l.ty.clone()))
            .collect()
    }

    /// The local bound to `this`, if the body has one.
    pub fn this_local(&self) -> Option<&str> {
        self.units.iter().find_map(|u| match u {
            Unit::Identity { local, rhs: IdentityRef::This } => Some(local.as_str()),
            _ => None,
        })
    }

    /// The local bound to parameter `index`, if the body has one.
    pub fn parameter_local(&self, index: u16) -> Option<&str> {
        self.units.iter().find_map(|u| match u {
            Unit::Identity { local, rhs: IdentityRef::Parameter(i) } if *i == index => {
                Some(local.as_str())
            }
            _ => None,
        })
    }

    /// Every unit index that some unit or trap targets. These become labels.
    pub fn label_targets(&self) -> Vec<UnitId> {
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        for unit in &self.units {
            for t in unit.branch_targets() {
                if seen.insert(t) {
                    out.push(t);
                }
            }
        }
        for trap in &self.traps {
            if seen.insert(trap.handler) {
                out.push(trap.handler);
            }
        }
        out
    }
}
