use civic_compiler::compile_to_assembly;

// ── For-loop lowering ────────────────────────────────────────────────────

#[test]
fn for_loop_hoists_three_induction_slots() {
    let source = "int sum() {\n    int total;\n    total = 0;\n    for (int i = 0, 5, 2) {\n        total = total + i;\n    }\n    return total;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    // total + counter + upper bound + step
    assert!(asm.contains("\tesr 4\n"), "{asm}");
    // canonicalized into a guarded do-while over a ternary condition
    assert!(asm.contains("_do_while:\n"), "{asm}");
    assert!(asm.contains("_false_expr:\n"), "{asm}");
}

#[test]
fn for_loop_defaults_to_step_one() {
    let source = "int count() {\n    int n;\n    n = 0;\n    for (int i = 0, 3) {\n        n = n + 1;\n    }\n    return n;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tesr 4\n"), "{asm}");
}

#[test]
fn sibling_for_loops_reusing_a_counter_name_compile() {
    let source = "int f() {\n    int n;\n    n = 0;\n    for (int i = 0, 3) {\n        n = n + i;\n    }\n    for (int i = 0, 4) {\n        n = n + i;\n    }\n    return n;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    // one slot for n, three per loop instance
    assert!(asm.contains("\tesr 7\n"), "{asm}");
}

#[test]
fn nested_for_loops_reusing_a_counter_name_compile() {
    let source = "int f() {\n    int n;\n    n = 0;\n    for (int i = 0, 3) {\n        for (int i = 0, 4) {\n            n = n + i;\n        }\n    }\n    return n;\n}\n";
    compile_to_assembly(source).expect("nested loops with one counter name must compile");
}

#[test]
fn descending_loop_condition_compares_downwards() {
    let source = "int f() {\n    int n;\n    n = 0;\n    for (int i = 10, 0, -1) {\n        n = n + 1;\n    }\n    return n;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    // step > 0 guard plus both comparison directions
    assert!(asm.contains("\tigt\n"), "{asm}");
    assert!(asm.contains("\tilt\n"), "{asm}");
    assert!(asm.contains("\tiloadc_m1\n"), "{asm}");
}

// ── Boolean operator rewrite ─────────────────────────────────────────────

#[test]
fn and_short_circuits_over_the_second_operand() {
    let source =
        "bool check() {\n    return true;\n}\nbool f(bool a) {\n    return a && check();\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    // the call must sit behind the false-branch of the ternary
    let branch = asm.find("branch_f").expect("has a branch");
    let call = asm.find("jsr 0 check").expect("has the call");
    assert!(branch < call, "{asm}");
    assert!(asm.contains("\tbloadc_f\n"), "{asm}");
}

#[test]
fn or_short_circuits_over_the_second_operand() {
    let source =
        "bool check() {\n    return true;\n}\nbool f(bool a) {\n    return a || check();\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    let branch = asm.find("branch_f").expect("has a branch");
    let call = asm.find("jsr 0 check").expect("has the call");
    assert!(branch < call, "{asm}");
    assert!(asm.contains("\tbloadc_t\n"), "{asm}");
}

#[test]
fn no_boolean_opcodes_survive_lowering() {
    let source = "bool f(bool a, bool b) {\n    return a && b || !a;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    // only bnot remains; && and || have no opcodes
    assert!(asm.contains("\tbnot\n"), "{asm}");
    assert!(asm.contains("_false_expr:\n"), "{asm}");
}

// ── Cast rewrite ─────────────────────────────────────────────────────────

#[test]
fn bool_from_int_cast_becomes_comparison() {
    let source = "bool f(int x) {\n    return (bool) x;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tine\n"), "{asm}");
    assert!(!asm.contains("f2i"), "{asm}");
}

#[test]
fn int_from_bool_cast_becomes_ternary() {
    let source = "int f(bool b) {\n    return (int) b;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("_false_expr:\n"), "{asm}");
    assert!(!asm.contains("i2f"), "{asm}");
    assert!(!asm.contains("f2i"), "{asm}");
}

#[test]
fn float_from_bool_cast_selects_float_constants() {
    let source = "float f(bool b) {\n    return (float) b;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tfloadc 0\n"), "{asm}");
    assert!(asm.contains(".const float 1\n"), "{asm}");
}

// ── Initializer separation ───────────────────────────────────────────────

#[test]
fn global_initializers_collect_into_init_in_source_order() {
    let source = "int a = 1;\nint b = 2;\nint f() {\n    return a + b;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("__init:\n"), "{asm}");
    let store_a = asm.find("istoreg 0").expect("stores a");
    let store_b = asm.find("istoreg 1").expect("stores b");
    assert!(store_a < store_b, "{asm}");
}

#[test]
fn local_initializer_splits_into_declaration_and_assignment() {
    let source = "int f() {\n    int x = 7;\n    return x;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tesr 1\n"), "{asm}");
    assert!(asm.contains("\tistore 0\n"), "{asm}");
}
