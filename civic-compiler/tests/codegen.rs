use civic_compiler::compile_to_assembly;

// ── Frame addressing ─────────────────────────────────────────────────────

#[test]
fn same_frame_access_uses_local_loads() {
    let source = "int add(int a, int b) {\n    return a + b;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("add:\n"), "{asm}");
    assert!(asm.contains("\tesr 0\n"), "{asm}");
    assert!(asm.contains("\tiload_0\n"), "{asm}");
    assert!(asm.contains("\tiload_1\n"), "{asm}");
    assert!(asm.contains("\tiadd\n"), "{asm}");
    assert!(asm.contains("\tireturn\n"), "{asm}");
}

#[test]
fn doubly_nested_read_uses_relative_load_two_levels() {
    let source = r#"
int outer() {
    int x;
    int middle() {
        int inner() {
            return x;
        }
        return inner();
    }
    x = 41;
    return middle();
}
"#;
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tiloadn 2 0\n"), "{asm}");
}

#[test]
fn outer_assignment_uses_relative_store() {
    let source = r#"
int outer() {
    int x;
    void set() {
        x = 7;
    }
    x = 0;
    set();
    return x;
}
"#;
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tistoren 1 0\n"), "{asm}");
}

// ── Call addressing ──────────────────────────────────────────────────────

#[test]
fn top_level_calls_use_global_scope() {
    let source = "int g() { return 1; }\nint f() { return g(); }\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tisrg\n"), "{asm}");
    assert!(asm.contains("\tjsr 0 g\n"), "{asm}");
}

#[test]
fn call_to_directly_nested_child_uses_local_scope() {
    let source = r#"
int outer() {
    int child() {
        return 1;
    }
    return child();
}
"#;
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tisrl\n"), "{asm}");
}

#[test]
fn nested_direct_recursion_uses_current_scope() {
    let source = r#"
int wrap() {
    int fact(int n) {
        if (n <= 1) {
            return 1;
        }
        return n * fact(n - 1);
    }
    return fact(5);
}
"#;
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tisr\n"), "{asm}");
    assert!(asm.contains("\tjsr 1 wrap__fact\n"), "{asm}");
}

#[test]
fn statement_call_pops_unused_result() {
    let source = "int g() { return 1; }\nvoid f() {\n    g();\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tipop\n"), "{asm}");
    assert!(asm.contains("\treturn\n"), "{asm}");
}

// ── Nested-function flattening ───────────────────────────────────────────

#[test]
fn nested_functions_get_mangled_labels() {
    let source = r#"
int outer() {
    int middle() {
        int inner() {
            return 1;
        }
        return inner();
    }
    return middle();
}
"#;
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("outer__middle:\n"), "{asm}");
    assert!(asm.contains("outer__middle__inner:\n"), "{asm}");
    assert!(asm.contains("\tjsr 0 outer__middle__inner\n"), "{asm}");
}

// ── Constants ────────────────────────────────────────────────────────────

#[test]
fn constants_are_deduplicated() {
    let source = "int f() {\n    int x;\n    int y;\n    x = 5;\n    y = 5;\n    return x + y;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    let entries = asm.matches(".const int 5").count();
    assert_eq!(entries, 1, "{asm}");
    assert!(asm.contains("\tiloadc 0\n"), "{asm}");
}

#[test]
fn minus_one_uses_dedicated_encoding() {
    let source = "int f() {\n    return -1;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tiloadc_m1\n"), "{asm}");
    assert!(!asm.contains(".const int -1"), "{asm}");
}

#[test]
fn bool_constants_have_dedicated_encodings() {
    let source = "bool f() {\n    return true;\n}\nbool g() {\n    return false;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tbloadc_t\n"), "{asm}");
    assert!(asm.contains("\tbloadc_f\n"), "{asm}");
}

#[test]
fn float_constants_go_through_the_pool() {
    let source = "float f() {\n    return 1.5;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tfloadc 0\n"), "{asm}");
    assert!(asm.contains(".const float 1.5\n"), "{asm}");
}

// ── Control flow shape ───────────────────────────────────────────────────

#[test]
fn if_else_labels() {
    let source = "int f(int x) {\n    if (x > 0) {\n        x = 1;\n    } else {\n        x = 2;\n    }\n    return x;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tigt\n"), "{asm}");
    assert!(asm.contains("\tbranch_f 0_else\n"), "{asm}");
    assert!(asm.contains("\tjump 0_end\n"), "{asm}");
    assert!(asm.contains("0_else:\n"), "{asm}");
    assert!(asm.contains("0_end:\n"), "{asm}");
}

#[test]
fn while_becomes_guarded_do_while() {
    let source = "int f() {\n    int i;\n    i = 0;\n    while (i < 3) {\n        i = i + 1;\n    }\n    return i;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("1_do_while:\n"), "{asm}");
    assert!(asm.contains("\tbranch_t 1_do_while\n"), "{asm}");
    assert!(asm.contains("\tbranch_f 0_else\n"), "{asm}");
}

// ── Globals, imports, exports ────────────────────────────────────────────

#[test]
fn globals_are_declared_and_initialized_in_init() {
    let source = "int g = 3;\nint f() {\n    return g;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("__init:\n"), "{asm}");
    assert!(asm.contains("\tistoreg 0\n"), "{asm}");
    assert!(asm.contains("\tiloadg 0\n"), "{asm}");
    assert!(asm.contains(".global int\n"), "{asm}");
}

#[test]
fn extern_functions_are_imported_and_called_by_index() {
    let source = "extern int rand();\nint f() {\n    return rand();\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains(".import \"rand\" int\n"), "{asm}");
    assert!(asm.contains("\tisrg\n"), "{asm}");
    assert!(asm.contains("\tjsre 0\n"), "{asm}");
    assert!(!asm.contains("\tjsr 0 rand\n"), "{asm}");
}

#[test]
fn exported_function_gets_export_directive() {
    let source = "export int main() {\n    return 0;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains(".export \"main\" int main\n"), "{asm}");
}

#[test]
fn extern_global_reads_become_getter_calls() {
    let source = "extern int g;\nint f() {\n    return g;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains(".import \"_get_g\" int\n"), "{asm}");
    assert!(asm.contains(".import \"_set_g\" void int\n"), "{asm}");
    assert!(asm.contains("\tjsre 0\n"), "{asm}");
    assert!(!asm.contains("iloadg"), "{asm}");
}

#[test]
fn extern_global_writes_become_setter_calls() {
    let source = "extern int g;\nvoid f() {\n    g = 4;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tjsre 1\n"), "{asm}");
    assert!(!asm.contains("istoreg"), "{asm}");
}

#[test]
fn exported_global_gets_accessor_pair() {
    let source = "export int g = 3;\nint f() {\n    return g;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("_get_g:\n"), "{asm}");
    assert!(asm.contains("_set_g:\n"), "{asm}");
    assert!(asm.contains(".export \"_get_g\" int _get_g\n"), "{asm}");
    assert!(asm.contains(".export \"_set_g\" void int _set_g\n"), "{asm}");
    // Own-module access stays direct.
    assert!(asm.contains("\tiloadg 0\n"), "{asm}");
}

// ── Arrays ───────────────────────────────────────────────────────────────

#[test]
fn local_array_allocation_and_access() {
    let source = "int f() {\n    int a[3];\n    a[0] = 7;\n    return a[0];\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tesr 1\n"), "{asm}");
    assert!(asm.contains("\tinewa 1\n"), "{asm}");
    assert!(asm.contains("\tastore 0\n"), "{asm}");
    assert!(asm.contains("\tistorea\n"), "{asm}");
    assert!(asm.contains("\tiloada\n"), "{asm}");
}

#[test]
fn array_argument_passes_the_reference() {
    let source = "int first(int v[n]) {\n    return v[0];\n}\nint f(int a[n]) {\n    return first(a);\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\taload_0\n"), "{asm}");
    assert!(asm.contains("\tiloada\n"), "{asm}");
}

// ── Casts ────────────────────────────────────────────────────────────────

#[test]
fn numeric_casts_emit_conversion_instructions() {
    let source = "float f(int x) {\n    return (float) x;\n}\nint g(float y) {\n    return (int) y;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\ti2f\n"), "{asm}");
    assert!(asm.contains("\tf2i\n"), "{asm}");
}

#[test]
fn float_arithmetic_selects_float_opcodes() {
    let source = "float f(float a, float b) {\n    return a * b;\n}\n";
    let asm = compile_to_assembly(source).expect("compiles");
    assert!(asm.contains("\tfload_0\n"), "{asm}");
    assert!(asm.contains("\tfload_1\n"), "{asm}");
    assert!(asm.contains("\tfmul\n"), "{asm}");
    assert!(asm.contains("\tfreturn\n"), "{asm}");
}
