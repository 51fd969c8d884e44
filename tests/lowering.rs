mod common;

use class2c::analysis::Required;
use class2c::codegen::code::CodeGenerator;
use class2c::codegen::method_lists::MethodListBuilder;
use class2c::codegen::overrides::OverrideScanner;
use class2c::codegen::structs::StructGenerator;
use class2c::codegen::NamingContext;
use class2c::ir::{
    BinOp, CondOp, InvokeExpr, InvokeKind, Local, MethodBody, Modifiers, PrimTy, Program, Ty,
    Unit, Value,
};

use common::*;

// --- Helpers ---

/// Emit the full code file for one class, returning the text together with
/// the naming context that produced it so assertions can ask for names.
fn emit(program: &Program, class: &str) -> (String, NamingContext) {
    let names = NamingContext::new();
    let text = {
        let required = Required::everything();
        let lists = MethodListBuilder::new(program, &required);
        let structs = StructGenerator::new(program, &names, &lists, &required, false);
        let overrides = OverrideScanner::new(&names, None);
        let gen = CodeGenerator::new(program, &names, &lists, &structs, &overrides, false);
        gen.code(class)
            .unwrap_or_else(|e| panic!("code emission failed: {e}"))
    };
    (text, names)
}

fn body(locals: Vec<Local>, units: Vec<Unit>) -> MethodBody {
    MethodBody {
        locals,
        units,
        traps: vec![],
    }
}

fn use_local(name: &str) -> Value {
    Value::Local(name.into())
}

// --- Tests ---

#[test]
fn test_function_formals_come_from_identity_units() {
    let mut program = Program::new();
    ClassBuilder::new("Calc")
        .method_with_body(
            "add",
            "(II)I",
            Modifiers::PUBLIC,
            body(
                vec![
                    local("this0", "LCalc;"),
                    local("a", "I"),
                    local("b", "I"),
                    local("c", "I"),
                ],
                vec![
                    this_ident("this0"),
                    param_ident("a", 0),
                    param_ident("b", 1),
                    assign_local(
                        "c",
                        Value::Binary {
                            op: BinOp::Add,
                            left: Box::new(use_local("a")),
                            right: Box::new(use_local("b")),
                        },
                    ),
                    Unit::Return(Some(use_local("c"))),
                ],
            ),
        )
        .add_to(&mut program);

    let (text, names) = emit(&program, "Calc");
    let f = names.function_name(&msig("Calc", "add", "(II)I"));
    let receiver = names.instance_type("Calc");
    let n_this = names.local_name("this0");
    let n_a = names.local_name("a");
    let n_b = names.local_name("b");
    let n_c = names.local_name("c");

    assert!(
        text.contains(&format!(
            "int {f}({receiver} {n_this}, int {n_a}, int {n_b}) {{\n"
        )),
        "heading missing in:\n{text}"
    );
    // Only the unbound local gets a declaration; formals never do.
    assert!(text.contains(&format!("    int {n_c};\n")));
    assert!(!text.contains(&format!("    int {n_a};\n")));
    assert!(!text.contains(&format!("    {receiver} {n_this};\n")));
    // The right operand and the stored value both take the target type.
    assert!(text.contains(&format!("    {n_c} = (int){n_a} + (int){n_b};\n")));
    assert!(text.contains(&format!("    return (int){n_c};\n")));
}

#[test]
fn test_static_functions_drop_the_receiver() {
    let mut program = Program::new();
    ClassBuilder::new("Calc")
        .method(
            "zero",
            "()I",
            entry_modifiers(),
            vec![Unit::Return(Some(Value::IntConst(0)))],
        )
        .method(
            "scale",
            "(I)I",
            entry_modifiers(),
            vec![Unit::Return(Some(Value::IntConst(1)))],
        )
        .add_to(&mut program);

    let (text, names) = emit(&program, "Calc");
    let zero = names.function_name(&msig("Calc", "zero", "()I"));
    let scale = names.function_name(&msig("Calc", "scale", "(I)I"));

    assert!(text.contains(&format!("int {zero}(void) {{\n")));
    // No identity unit binds the parameter, so its name is positional.
    assert!(text.contains(&format!("int {scale}(int p0) {{\n")));
}

#[test]
fn test_array_macros_spell_out_element_shapes() {
    let mut program = Program::new();
    ClassBuilder::new("Buf")
        .method_with_body(
            "fill",
            "(I)V",
            entry_modifiers(),
            body(
                vec![local("n", "I"), local("arr", "[I"), local("len", "I")],
                vec![
                    param_ident("n", 0),
                    assign_local(
                        "arr",
                        Value::NewArray {
                            elem: Ty::Primitive(PrimTy::Int),
                            dims: 1,
                            sizes: vec![use_local("n")],
                        },
                    ),
                    Unit::Assign {
                        lhs: Value::ArrayRef {
                            base: Box::new(use_local("arr")),
                            index: Box::new(Value::IntConst(0)),
                        },
                        rhs: Value::IntConst(7),
                    },
                    assign_local("len", Value::Len(Box::new(use_local("arr")))),
                    ret(),
                ],
            ),
        )
        .add_to(&mut program);

    let (text, names) = emit(&program, "Buf");
    let n = names.local_name("n");
    let arr = names.local_name("arr");
    let len = names.local_name("len");

    assert!(
        text.contains(&format!(
            "    {arr} = (RT_ARRAY)ARRAY_ALLOCATE((RT_CLASS_PTR) \
             malloc(sizeof(RT_array_int_elem)), sizeof(int), 1, 1, {n});\n"
        )),
        "allocation missing in:\n{text}"
    );
    assert!(text.contains(&format!(
        "    ARRAY_ACCESS((RT_ARRAY){arr}, int, (long)0) = (int)7;\n"
    )));
    assert!(text.contains(&format!("    {len} = (int)ARRAY_LENGTH({arr});\n")));
}

#[test]
fn test_instanceof_compares_the_class_hash() {
    let mut program = Program::new();
    ClassBuilder::new("Animal")
        .method("<init>", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);
    ClassBuilder::new("Dog")
        .extends("Animal")
        .method("<init>", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);
    ClassBuilder::new("Check")
        .method_with_body(
            "probe",
            "(LAnimal;)I",
            entry_modifiers(),
            body(
                vec![local("x", "LAnimal;"), local("flag", "Z")],
                vec![
                    param_ident("x", 0),
                    assign_local(
                        "flag",
                        Value::InstanceOf {
                            value: Box::new(use_local("x")),
                            check: ref_ty("Dog"),
                        },
                    ),
                    Unit::Return(Some(use_local("flag"))),
                ],
            ),
        )
        .add_to(&mut program);

    let (text, names) = emit(&program, "Check");
    let x = names.local_name("x");
    let flag = names.local_name("flag");
    let hash = names.class_hash("Dog");

    assert!(
        text.contains(&format!(
            "    {flag} = (short)RT_instanceof((RT_OBJECT*){x}, {hash});\n"
        )),
        "instanceof missing in:\n{text}"
    );
    // Classes the body mentions get their full headers included.
    assert!(text.contains("#include \"Dog.h\"\n"));
    assert!(text.contains("#include \"Animal.h\"\n"));
}

#[test]
fn test_virtual_dispatch_casts_to_the_slot_entry() {
    let mut program = Program::new();
    ClassBuilder::new("Animal")
        .method("speak", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);
    ClassBuilder::new("Dog")
        .extends("Animal")
        .method("speak", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);
    ClassBuilder::new("Kennel")
        .method_with_body(
            "walk",
            "(LDog;LAnimal;)V",
            entry_modifiers(),
            body(
                vec![local("d", "LDog;"), local("any", "LAnimal;")],
                vec![
                    param_ident("d", 0),
                    param_ident("any", 1),
                    call_virtual(use_local("d"), "Dog", "speak", "()V", vec![]),
                    call_virtual(use_local("any"), "Animal", "speak", "()V", vec![]),
                    call_static(
                        "Kennel",
                        "log",
                        "(IJ)V",
                        vec![Value::IntConst(3), Value::LongConst(4)],
                    ),
                    ret(),
                ],
            ),
        )
        .method("log", "(IJ)V", entry_modifiers(), vec![ret()])
        .add_to(&mut program);

    let (text, names) = emit(&program, "Kennel");
    let d = names.local_name("d");
    let any = names.local_name("any");
    let slot = names.slot_name(&msig("Dog", "speak", "()V"));
    let i_dog = names.instance_type("Dog");
    let i_animal = names.instance_type("Animal");
    let log = names.function_name(&msig("Kennel", "log", "(IJ)V"));

    // Dog overrides speak, so Dog's table entry owns the slot and the
    // receiver cast follows it.
    assert!(
        text.contains(&format!(
            "    {d}->class->methods.{slot}(({i_dog}/* inherited cast */){d});\n"
        )),
        "dog dispatch missing in:\n{text}"
    );
    assert!(text.contains(&format!(
        "    {any}->class->methods.{slot}(({i_animal}/* default cast */){any});\n"
    )));
    // Static call: one cast per argument, from the callee's descriptor.
    assert!(text.contains(&format!("    {log}((int) 3, (long) 4);\n")));
}

#[test]
fn test_new_assignment_stamps_the_class_pointer() {
    let mut program = Program::new();
    ClassBuilder::new("Dog")
        .method("<init>", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);
    ClassBuilder::new("Pound")
        .method_with_body(
            "adopt",
            "()V",
            entry_modifiers(),
            body(
                vec![local("d", "LDog;")],
                vec![
                    assign_local(
                        "d",
                        Value::New {
                            class: "Dog".into(),
                        },
                    ),
                    Unit::Invoke(InvokeExpr {
                        kind: InvokeKind::Special,
                        base: Some(Box::new(use_local("d"))),
                        method: msig("Dog", "<init>", "()V"),
                        args: vec![],
                    }),
                    ret(),
                ],
            ),
        )
        .add_to(&mut program);

    let (text, names) = emit(&program, "Pound");
    let d = names.local_name("d");
    let i_dog = names.instance_type("Dog");
    let v_dog = names.class_struct_var("Dog");
    let ctor_slot = names.slot_name(&msig("Dog", "<init>", "()V"));

    assert!(
        text.contains(&format!(
            "    {d} = ({i_dog})( malloc(sizeof(struct {i_dog})));\n    {d}->class = &{v_dog};\n"
        )),
        "allocation missing in:\n{text}"
    );
    // A same-class constructor call reduces to ordinary table dispatch.
    assert!(text.contains(&format!(
        "    {d}->class->methods.{ctor_slot}(({i_dog}/* default cast */){d});\n"
    )));
}

#[test]
fn test_branches_and_switches_share_the_label_table() {
    let mut program = Program::new();
    ClassBuilder::new("Picker")
        .method_with_body(
            "pick",
            "(I)I",
            entry_modifiers(),
            body(
                vec![local("k", "I")],
                vec![
                    param_ident("k", 0),
                    Unit::If {
                        cond: Value::Cond {
                            op: CondOp::Eq,
                            left: Box::new(use_local("k")),
                            right: Box::new(Value::IntConst(9)),
                        },
                        target: 5,
                    },
                    Unit::TableSwitch {
                        key: use_local("k"),
                        low: 5,
                        targets: vec![4, 5],
                        default: 3,
                    },
                    Unit::Return(Some(Value::IntConst(0))),
                    Unit::Return(Some(Value::IntConst(1))),
                    Unit::Return(Some(Value::IntConst(2))),
                ],
            ),
        )
        .add_to(&mut program);

    let (text, names) = emit(&program, "Picker");
    let k = names.local_name("k");

    // Labels are handed out in first-seen order: the If names unit 5 first.
    assert!(text.contains(&format!("    if ({k} == (int)9) goto label0;\n")));
    let switch = format!(
        "    switch ({k}) {{\n        case 5: goto label1;\n        case 6: goto label0;\n        default: goto label2;\n    }}\n"
    );
    assert!(text.contains(&switch), "switch block missing in:\n{text}");
    for label in ["label0", "label1", "label2"] {
        assert!(
            text.contains(&format!("    {label}:\n")),
            "{label} missing in:\n{text}"
        );
    }
}

#[test]
fn test_code_file_sections_arrive_in_order() {
    let mut program = Program::new();
    ClassBuilder::new("Animal")
        .method("speak", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);
    ClassBuilder::new("Dog")
        .extends("Animal")
        .method("speak", "()V", Modifiers::PUBLIC, vec![ret()])
        .add_to(&mut program);

    let (text, names) = emit(&program, "Dog");
    assert!(text.starts_with("/* Code for class Dog. Generated by class2c; do not edit. */\n"));

    let pos = |needle: &str| {
        text.find(needle)
            .unwrap_or_else(|| panic!("missing {needle:?} in:\n{text}"))
    };
    assert!(pos("#include <stdlib.h>") < pos("#include \"Dog.h\""));
    // The superclass rides along as a full header include.
    assert!(text.contains("#include \"Animal.h\"\n"));

    let var_def = format!(
        "{} {};\n",
        names.class_struct_type("Dog"),
        names.class_struct_var("Dog")
    );
    let instance_of = format!("short {}(", names.instanceof_function("Dog"));
    let lookup = format!("void* {}(", names.lookup_function("Dog"));
    let init = format!("void {}(void) {{", names.init_function("Dog"));
    let speak = format!("{}(", names.function_name(&msig("Dog", "speak", "()V")));

    assert!(pos(&var_def) < pos(&instance_of));
    assert!(pos(&instance_of) < pos(&lookup));
    assert!(pos(&lookup) < pos(&speak));
    assert!(pos(&speak) < pos(&init));
}
