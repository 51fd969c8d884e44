/// Statement and expression lowering.
///
/// Lowering is a recursive descent over body values and units. Every visit
/// returns a fragment of target text; statement lowering composes operand
/// fragments with its own syntax into finished source lines. Constructs the
/// target cannot express become placeholder comments instead of errors, so
/// one odd statement never sinks a whole class. The hard failures are a
/// branch to a unit that was never registered as a label and a body that
/// references a local its method never declared.
///
/// Arithmetic follows the target model: `int` literals saturate at +/-32767,
/// `long` literals at +/-2147483647, NaN and the infinities collapse to the
/// runtime's `_MAX_FLOAT`/`_MAX_DOUBLE` stand-ins, and shift amounts are
/// saturated and wrapped to the operand width.

use std::cell::Cell;
use std::collections::BTreeMap;

use log::debug;

use crate::ir::{
    parse_method_descriptor, BinOp, IdentityRef, InvokeExpr, InvokeKind, MethodBody, MethodSig,
    Program, Ty, Unit, UnitId, Value, OBJECT_CLASS,
};

use super::exceptions::ExceptionTracker;
use super::method_lists::MethodListBuilder;
use super::names::{
    NamingContext, ARRAY_ACCESS, ARRAY_ALLOCATE, ARRAY_LENGTH, ARRAY_TYPE, CHAR_ARRAY_TO_STRING,
    CLASS_PTR, EXCEPTION_ID, EXCEPTION_INSTANCE, INSTANCEOF_FN, MAX_DOUBLE, MAX_FLOAT, OBJECT_PTR,
};
use super::{GenError, GenResult};

/// Literal bounds of the target arithmetic model.
const INT_LIMIT: i32 = 32767;
const LONG_LIMIT: i64 = 2147483647;

/// Everything lowering needs that is shared across methods.
pub struct LowerEnv<'a> {
    pub program: &'a Program,
    pub names: &'a NamingContext,
    pub lists: &'a MethodListBuilder<'a>,
    pub single_class: bool,
}

/// Lowers one method body. Holds the per-method state: local types, the
/// label table, and the protected-region tracker.
pub struct MethodLowerer<'a> {
    env: &'a LowerEnv<'a>,
    sig: MethodSig,
    body: &'a MethodBody,
    locals: BTreeMap<String, Ty>,
    labels: BTreeMap<UnitId, String>,
    tracker: ExceptionTracker,
    return_type: Ty,
    indent: Cell<usize>,
}

impl<'a> MethodLowerer<'a> {
    pub fn new(env: &'a LowerEnv<'a>, sig: &MethodSig, body: &'a MethodBody) -> Self {
        let labels = body
            .label_targets()
            .into_iter()
            .enumerate()
            .map(|(i, unit)| (unit, format!("label{i}")))
            .collect();
        let return_type = parse_method_descriptor(&sig.descriptor)
            .map(|(_, ret)| ret)
            .unwrap_or(Ty::Void);
        MethodLowerer {
            env,
            sig: sig.clone(),
            body,
            locals: body.local_types(),
            labels,
            tracker: ExceptionTracker::build(body),
            return_type,
            indent: Cell::new(1),
        }
    }

    pub fn tracker(&self) -> &ExceptionTracker {
        &self.tracker
    }

    /// True when this body carries protected regions and the run compiles
    /// them. Single-class builds skip exception management entirely.
    pub fn manages_exceptions(&self) -> bool {
        self.tracker.has_traps() && !self.env.single_class
    }

    fn ind(&self) -> String {
        "    ".repeat(self.indent.get())
    }

    fn label_of(&self, target: UnitId) -> GenResult<&str> {
        self.labels
            .get(&target)
            .map(String::as_str)
            .ok_or_else(|| GenError::UnknownBranchTarget {
                method: self.sig.full_signature(),
                target,
            })
    }

    fn c_type_of(&self, value: &Value) -> Option<String> {
        value
            .static_ty(&self.locals)
            .map(|ty| self.env.names.c_type(&ty))
    }

    // ---------------------------------------------------------------------
    // Values

    pub fn lower_value(&self, value: &Value) -> String {
        let names = self.env.names;
        match value {
            Value::IntConst(c) => (*c).clamp(-INT_LIMIT, INT_LIMIT).to_string(),
            Value::LongConst(c) => (*c).clamp(-LONG_LIMIT, LONG_LIMIT).to_string(),
            Value::FloatConst(c) => {
                if c.is_nan() || *c == f32::INFINITY {
                    format!("((float) {MAX_FLOAT})")
                } else if *c == f32::NEG_INFINITY {
                    format!("((float) -{MAX_FLOAT})")
                } else {
                    format!("((float) {c})")
                }
            }
            Value::DoubleConst(c) => {
                if c.is_nan() || *c == f64::INFINITY {
                    format!("((double){MAX_DOUBLE})")
                } else if *c == f64::NEG_INFINITY {
                    format!("((double)-{MAX_DOUBLE})")
                } else {
                    format!("((double){c})")
                }
            }
            Value::StringConst(s) => {
                format!("{}(\"{}\")", CHAR_ARRAY_TO_STRING, escape_c_string(s))
            }
            Value::NullConst => "NULL".to_string(),
            Value::Local(name) => names.local_name(name),
            Value::InstanceField { base, field } => {
                format!("{}->{}", self.lower_value(base), names.field_name(field))
            }
            Value::StaticField { field } => format!(
                "{}.classvars.{}",
                names.class_struct_var(&field.class),
                names.field_name(field)
            ),
            Value::ArrayRef { base, index } => {
                let base_cast = self
                    .c_type_of(base)
                    .unwrap_or_else(|| ARRAY_TYPE.to_string());
                let elem = self
                    .c_type_of(value)
                    .unwrap_or_else(|| "long".to_string());
                format!(
                    "{}(({}){}, {}, (long){})",
                    ARRAY_ACCESS,
                    base_cast,
                    self.lower_value(base),
                    elem,
                    self.lower_value(index)
                )
            }
            Value::Binary { op, left, right } => match op {
                BinOp::Shl | BinOp::Shr | BinOp::Ushr => self.lower_shift(*op, left, right),
                _ => self.lower_infix(op.c_token(), left, right),
            },
            Value::Compare { left, right, .. } => {
                let a = self.lower_value(left);
                let b = self.lower_value(right);
                format!("(({a} > {b}) ?  1 : (({a} < {b}) ?  -1 : 0))")
            }
            Value::Cond { op, left, right } => self.lower_infix(op.c_token(), left, right),
            Value::Neg(v) => format!("-{}", self.lower_value(v)),
            Value::Cast { ty, value } => match value.as_ref() {
                Value::Local(name) => {
                    format!("({}){}", self.env.names.c_type(ty), names.local_name(name))
                }
                // A null or compound operand has no meaningful target cast.
                _ => unhandled_expression("CastExpr"),
            },
            Value::InstanceOf { value, check } => match check.referenced_class() {
                Some(class) => format!(
                    "{}(({}*){}, {})",
                    INSTANCEOF_FN,
                    OBJECT_PTR,
                    self.lower_value(value),
                    names.class_hash(class)
                ),
                None => unexpected_case(
                    "InstanceOfExpr",
                    "Only reference types are supported for 'instanceof'",
                ),
            },
            Value::Len(v) => format!("{}({})", ARRAY_LENGTH, self.lower_value(v)),
            Value::New { class } => {
                format!("( malloc(sizeof(struct {})))", names.instance_type(class))
            }
            Value::NewArray { elem, dims, sizes } => self.lower_array_allocation(elem, *dims, sizes),
            Value::Invoke(invoke) => self.lower_invoke(invoke),
        }
    }

    /// Plain infix operation. The right operand is cast to the left
    /// operand's type so mixed-width operands do not trip the C compiler.
    fn lower_infix(&self, token: &str, left: &Value, right: &Value) -> String {
        let cast = self
            .c_type_of(left)
            .map(|t| format!("({t})"))
            .unwrap_or_default();
        format!(
            "{} {} {}{}",
            self.lower_value(left),
            token,
            cast,
            self.lower_value(right)
        )
    }

    /// Shifts saturate: an amount past the operand width yields zero for
    /// left and unsigned-right shifts, and the amount is wrapped with `%`
    /// otherwise. Signed right shifts spell out sign extension because `>>`
    /// on negative values is implementation-defined in the target.
    fn lower_shift(&self, op: BinOp, left: &Value, right: &Value) -> String {
        let n = self.lower_value(left);
        let s = self.lower_value(right);
        let width = match left.static_ty(&self.locals) {
            Some(Ty::Primitive(p)) => p.shift_width(),
            _ => 32,
        };
        let max: i64 = (1i64 << (width - 1)) - 1;
        let w = width - 1;
        match op {
            BinOp::Shl => format!("({s} <= {w}) ? ({n} << ({s}%{w})):0"),
            BinOp::Shr => format!(
                "({s} <= {w}) ? (({n} > 0)? ({n} >> ({s} % {w})): \
                 ( ( -((-({n})) >> (({s} % {w})))) - 1) ): 0"
            ),
            BinOp::Ushr => {
                // A zero shift changes nothing; skip the fill arithmetic.
                if matches!(right, Value::IntConst(0)) {
                    return n;
                }
                format!(
                    "({s} <= {w})? (({n} > 0)? ({n} >> ({s} % {w})): \
                     (((( - ({n})) >> (({s} -1 )%{w})) | \
                     (((unsigned long) {max})>>({s}- 1))) - ((-({n})) >> {s}))): 0"
                )
            }
            _ => unreachable!("not a shift operator"),
        }
    }

    fn lower_array_allocation(&self, elem: &Ty, dims: u8, sizes: &[Value]) -> String {
        let names = self.env.names;
        let size_code = sizes
            .iter()
            .map(|s| self.lower_value(s))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}(({}) malloc(sizeof({})), sizeof({}), {}, {}, {})",
            ARRAY_ALLOCATE,
            CLASS_PTR,
            names.array_element_class(elem),
            names.array_element_size_type(elem),
            dims,
            sizes.len(),
            size_code
        )
    }

    // ---------------------------------------------------------------------
    // Invocations

    fn lower_invoke(&self, invoke: &InvokeExpr) -> String {
        match invoke.kind {
            InvokeKind::Static => format!(
                "{}({})",
                self.env.names.function_name(&invoke.method),
                self.arguments(invoke, 0)
            ),
            InvokeKind::Virtual => self.lower_instance_invoke(invoke),
            InvokeKind::Interface => self.lower_interface_invoke(invoke),
            InvokeKind::Special => self.lower_special_invoke(invoke),
        }
    }

    /// Argument list with one `(type) ` cast per argument, matching the
    /// callee's declared parameter types. `previous` counts arguments
    /// already emitted by the caller (the receiver), so a non-zero value
    /// makes even the first argument comma-prefixed.
    fn arguments(&self, invoke: &InvokeExpr, previous: usize) -> String {
        let params = parse_method_descriptor(&invoke.method.descriptor)
            .map(|(params, _)| params)
            .unwrap_or_default();
        let mut out = String::new();
        let mut count = previous;
        for (i, arg) in invoke.args.iter().enumerate() {
            if count > 0 {
                out.push_str(", ");
            }
            count += 1;
            if let Some(param) = params.get(i) {
                out.push_str(&format!("({}) ", self.env.names.c_type(param)));
            }
            out.push_str(&self.lower_value(arg));
        }
        out
    }

    /// Receiver cast for a table call. If the sub-signature occupies an
    /// inherited slot of `declaring`, the cast names the ancestor class that
    /// owns the slot, so the function pointer's first-parameter type lines
    /// up; otherwise it names `declaring` itself.
    fn receiver_cast(&self, declaring: &str, method: &MethodSig, fallback_tag: &str) -> String {
        let names = self.env.names;
        if let Ok(partition) = self.env.lists.partition(declaring) {
            if let Some(entry) = partition.inherited_match(method) {
                return format!(
                    "({}/* inherited cast */)",
                    names.instance_type(&entry.class)
                );
            }
        }
        format!(
            "({}/* {} cast */)",
            names.instance_type(declaring),
            fallback_tag
        )
    }

    /// Virtual dispatch through the receiver's class structure:
    /// `base->class->methods.<slot>(<cast>base, args)`.
    fn lower_instance_invoke(&self, invoke: &InvokeExpr) -> String {
        let base = match &invoke.base {
            Some(base) => self.lower_value(base),
            None => {
                return unexpected_case("VirtualInvokeExpr", "Instance call with no receiver")
            }
        };

        // A sub-signature also declared by the root class dispatches through
        // the slot of the receiver's static class, not the root's: the first
        // table parameter is the most-derived declarer.
        let mut declaring = invoke.method.class.clone();
        if invoke.kind == InvokeKind::Virtual {
            let root_declares = self
                .env
                .program
                .class(OBJECT_CLASS)
                .and_then(|c| c.method(&invoke.method.name, &invoke.method.descriptor))
                .is_some();
            if root_declares {
                if let Some(Ty::Reference(receiver)) = invoke
                    .base
                    .as_deref()
                    .and_then(|b| b.static_ty(&self.locals))
                {
                    declaring = receiver;
                }
            }
        }

        let cast = self.receiver_cast(&declaring, &invoke.method, "default");
        format!(
            "{}->class->methods.{}({}{}{})",
            base,
            self.env.names.slot_name(&invoke.method),
            cast,
            base,
            self.arguments(invoke, 1)
        )
    }

    /// Interface dispatch goes through the class structure's hash lookup,
    /// through a generic function pointer cast.
    fn lower_interface_invoke(&self, invoke: &InvokeExpr) -> String {
        let base = match &invoke.base {
            Some(base) => self.lower_value(base),
            None => {
                return unexpected_case("InterfaceInvokeExpr", "Instance call with no receiver")
            }
        };
        let ret = parse_method_descriptor(&invoke.method.descriptor)
            .map(|(_, ret)| self.env.names.c_type(&ret))
            .unwrap_or_else(|| "void".to_string());
        format!(
            "(({} (*) (void*, ...))({}->class->lookup({})))( {}{})",
            ret,
            base,
            self.env.names.interface_hash(&invoke.method),
            base,
            self.arguments(invoke, 1)
        )
    }

    /// Special invocation covers private calls, same-class constructor
    /// chaining, and superclass calls. Only the direct-superclass form needs
    /// its own shape (a class-structure call that bypasses the receiver's
    /// table); the same-class forms reduce to ordinary instance dispatch.
    fn lower_special_invoke(&self, invoke: &InvokeExpr) -> String {
        let names = self.env.names;
        let method = &invoke.method;
        let declaring = method.class.as_str();

        let declaring_is_interface = self
            .env
            .program
            .class(declaring)
            .map_or(false, |c| c.is_interface());
        let mut cast = if declaring_is_interface {
            String::new()
        } else {
            format!("({}/* actual cast */)", names.instance_type(declaring))
        };
        if let Ok(partition) = self.env.lists.partition(declaring) {
            if let Some(entry) = partition.inherited_match(method) {
                cast = format!("({}/* inherited cast */)", names.instance_type(&entry.class));
            }
        }

        let base_class = match invoke
            .base
            .as_deref()
            .and_then(|b| b.static_ty(&self.locals))
        {
            Some(Ty::Reference(class)) => class,
            _ => return unexpected_case("SpecialInvokeExpr", "Reference receiver type expected"),
        };

        if base_class == declaring {
            let is_static = self
                .env
                .program
                .resolve_method(method)
                .map_or(false, |(_, decl)| decl.is_static());
            if is_static {
                return unexpected_case("SpecialInvokeExpr", "Non-static method expected");
            }
            return self.lower_instance_invoke(invoke);
        }

        if self.env.program.superclass_of(&base_class).as_deref() != Some(declaring) {
            return unexpected_case(
                "SpecialInvokeExpr",
                "Expected method class to be superclass of base",
            );
        }

        // Single-class builds have no superclass structure to call into.
        if self.env.single_class {
            return String::new();
        }

        let base = match &invoke.base {
            Some(base) => self.lower_value(base),
            None => {
                return unexpected_case("SpecialInvokeExpr", "Instance call with no receiver")
            }
        };
        format!(
            "{}.methods.{}({}{}{})",
            names.class_struct_var(declaring),
            names.slot_name(method),
            cast,
            base,
            self.arguments(invoke, 1)
        )
    }

    // ---------------------------------------------------------------------
    // Units

    /// Lower one unit to finished source text: indented, terminated, one or
    /// more lines. Units with nothing to say still produce an empty
    /// statement so a label in front of them stays attached to something.
    pub fn lower_unit(&self, unit: &Unit) -> GenResult<String> {
        let ind = self.ind();
        Ok(match unit {
            Unit::Assign { lhs, rhs } => format!("{}{};\n", ind, self.lower_assign(lhs, rhs)),
            Unit::Identity { local, rhs } => match rhs {
                // Bound by the function header.
                IdentityRef::This | IdentityRef::Parameter(_) => format!("{ind};\n"),
                IdentityRef::CaughtException => {
                    let cast = self
                        .locals
                        .get(local)
                        .map(|ty| format!("({})", self.env.names.c_type(ty)))
                        .unwrap_or_default();
                    format!(
                        "{}{} = {}{};\n",
                        ind,
                        self.env.names.local_name(local),
                        cast,
                        EXCEPTION_ID
                    )
                }
            },
            Unit::If { cond, target } => format!(
                "{}if ({}) goto {};\n",
                ind,
                self.lower_value(cond),
                self.label_of(*target)?
            ),
            Unit::Goto { target } => format!("{}goto {};\n", ind, self.label_of(*target)?),
            Unit::Invoke(invoke) => {
                let code = self.lower_invoke(invoke);
                if code.is_empty() {
                    format!("{ind};\n")
                } else {
                    format!("{ind}{code};\n")
                }
            }
            Unit::Return(op) => self.lower_return(op.as_ref()),
            Unit::LookupSwitch {
                key,
                cases,
                default,
            } => {
                let mut out = format!("{}switch ({}) {{\n", ind, self.lower_value(key));
                let inner = "    ".repeat(self.indent.get() + 1);
                for (value, target) in cases {
                    let clamped = (*value).clamp(-LONG_LIMIT, LONG_LIMIT);
                    if clamped != *value {
                        out.push_str(&format!(
                            "{inner}/* Warning: case value out of range of long: truncated */\n"
                        ));
                    }
                    out.push_str(&format!(
                        "{}case {}: goto {};\n",
                        inner,
                        clamped,
                        self.label_of(*target)?
                    ));
                }
                out.push_str(&format!(
                    "{}default: goto {};\n",
                    inner,
                    self.label_of(*default)?
                ));
                out.push_str(&format!("{ind}}}\n"));
                out
            }
            Unit::TableSwitch {
                key,
                low,
                targets,
                default,
            } => {
                let mut out = format!("{}switch ({}) {{\n", ind, self.lower_value(key));
                let inner = "    ".repeat(self.indent.get() + 1);
                for (i, target) in targets.iter().enumerate() {
                    out.push_str(&format!(
                        "{}case {}: goto {};\n",
                        inner,
                        low + i as i64,
                        self.label_of(*target)?
                    ));
                }
                out.push_str(&format!(
                    "{}default: goto {};\n",
                    inner,
                    self.label_of(*default)?
                ));
                out.push_str(&format!("{ind}}}\n"));
                out
            }
            Unit::Throw(op) => {
                let thrown = op
                    .static_ty(&self.locals)
                    .map(|ty| ty.display_name())
                    .unwrap_or_else(|| "java.lang.Object".to_string());
                format!(
                    "{ind}/* Throw exception of type {} */\n\
                     {ind}{} = ({}){};\n\
                     {ind}longjmp(env, epc);\n",
                    thrown,
                    EXCEPTION_ID,
                    EXCEPTION_INSTANCE,
                    self.lower_value(op)
                )
            }
            Unit::Nop => format!("{ind};\n"),
            Unit::EnterMonitor(_) | Unit::ExitMonitor(_) | Unit::Ret | Unit::Breakpoint => {
                debug!("{}: no lowering for {}", self.sig, unit.kind_name());
                format!("{}{};\n", ind, unhandled_statement(unit.kind_name()))
            }
        })
    }

    fn lower_assign(&self, lhs: &Value, rhs: &Value) -> String {
        let rhs_code = self.lower_value(rhs);
        let lhs_code = self.lower_value(lhs);

        // The left side's type bridges any width difference; an interface
        // call result arrives through a varargs pointer, where a bare short
        // would be promoted anyway, so it is taken as long.
        let mut cast = self.c_type_of(lhs).unwrap_or_default();
        let interface_rhs = matches!(rhs, Value::Invoke(i) if i.kind == InvokeKind::Interface);
        if interface_rhs && cast == "short" {
            cast = "long".to_string();
        }
        let cast = if cast.is_empty() {
            String::new()
        } else {
            format!("({cast})")
        };

        let mut code = format!("{lhs_code} = {cast}{rhs_code}");
        if let Value::New { class } = rhs {
            // A fresh instance knows its class from here on.
            code.push_str(&format!(
                ";\n{}{}->class = &{}",
                self.ind(),
                lhs_code,
                self.env.names.class_struct_var(class)
            ));
        }
        code
    }

    fn lower_return(&self, op: Option<&Value>) -> String {
        let ind = self.ind();
        let mut out = String::from("\n");
        if self.manages_exceptions() {
            out.push_str(&format!(
                "{ind}memcpy(env, caller_env, sizeof(jmp_buf));\n{ind}epc = caller_epc;\n"
            ));
        }
        match op {
            Some(value) => out.push_str(&format!(
                "{}return ({}){};\n",
                ind,
                self.env.names.c_type(&self.return_type),
                self.lower_value(value)
            )),
            None => out.push_str(&format!("{ind}return ;\n")),
        }
        out
    }

    // ---------------------------------------------------------------------
    // Whole bodies

    /// All units in order, with labels and protected-region counter updates
    /// in front of the units they belong to. Labels precede the updates so a
    /// jump to a unit still lands on the correct region state.
    pub fn lower_units(&self) -> GenResult<String> {
        let mut out = String::new();
        for (id, unit) in self.body.units.iter().enumerate() {
            if let Some(label) = self.labels.get(&id) {
                out.push_str(&format!("{}{}:\n", self.ind(), label));
            }
            if self.manages_exceptions() {
                for &epc in self.tracker.transitions_at(id) {
                    out.push_str(&format!("{}epc = {};\n", self.ind(), epc));
                }
            }
            out.push_str(&self.lower_unit(unit)?);
        }
        Ok(out)
    }

    /// Every local the body reads, writes, or binds must be in its local
    /// table; anything else is malformed front-end output.
    fn check_locals(&self) -> GenResult<()> {
        let mut referenced = Vec::new();
        for unit in &self.body.units {
            if let Unit::Identity { local, .. } = unit {
                referenced.push(local.clone());
            }
            for value in unit.values() {
                value.for_each(&mut |v| {
                    if let Value::Local(name) = v {
                        referenced.push(name.clone());
                    }
                });
            }
        }
        for local in referenced {
            if !self.locals.contains_key(&local) {
                return Err(GenError::UnknownLocal {
                    method: self.sig.full_signature(),
                    local,
                });
            }
        }
        Ok(())
    }

    /// The complete body interior. Bodies without protected regions are the
    /// unit walk alone; bodies with them get the jump context saved, units
    /// inside a `setjmp` arm, and a dispatch arm that tests the regions
    /// active at the recorded counter, innermost first, then re-throws.
    pub fn lower_body(&self) -> GenResult<String> {
        self.check_locals()?;
        if !self.manages_exceptions() {
            return self.lower_units();
        }

        let mut out = String::new();
        out.push_str("    /* Save the caller's jump context. */\n");
        out.push_str("    memcpy(caller_env, env, sizeof(jmp_buf));\n");
        out.push_str("    caller_epc = epc;\n");
        out.push_str("    epc = 0;\n\n");
        out.push_str("    if (setjmp(env) == 0) {\n");

        self.indent.set(2);
        let units = self.lower_units();
        self.indent.set(1);
        out.push_str(&units?);

        out.push_str("    }\n");
        out.push_str("    else {\n");
        out.push_str("        switch (epc) {\n");
        for epc in self.tracker.dispatch_points() {
            out.push_str(&format!("        case {epc}:\n"));
            for &trap_index in self.tracker.active_at(epc) {
                let trap = self.tracker.trap(trap_index);
                out.push_str(&format!(
                    "            if ({}(({}*){}, {})) goto {};\n",
                    INSTANCEOF_FN,
                    OBJECT_PTR,
                    EXCEPTION_ID,
                    self.env.names.class_hash(&trap.exception),
                    self.label_of(trap.handler)?
                ));
            }
            out.push_str("            break;\n");
        }
        out.push_str("        }\n\n");
        out.push_str("        /* Not handled here; hand it to the caller. */\n");
        out.push_str("        memcpy(env, caller_env, sizeof(jmp_buf));\n");
        out.push_str("        epc = caller_epc;\n");
        out.push_str("        longjmp(env, epc);\n");
        out.push_str("    }\n");
        Ok(out)
    }
}

// -------------------------------------------------------------------------
// Placeholders

fn unhandled_statement(kind: &str) -> String {
    format!("/*UNHANDLED STATEMENT: {kind}*/")
}

fn unhandled_expression(kind: &str) -> String {
    format!("epc++; epc-- /*UNHANDLED EXPRESSION HERE:{kind}*/")
}

fn unexpected_case(kind: &str, message: &str) -> String {
    format!("epc++ /* UNEXPECTED CASE {kind} :{message} */; epc--")
}

/// Escape a literal for inclusion in target source. Backslashes, quotes,
/// newlines, NULs, and carriage returns all have to be spelled out.
fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\0' => out.push_str("\\0"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
