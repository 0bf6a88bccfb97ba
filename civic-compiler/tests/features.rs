use civic_compiler::compile_to_assembly;

// ── Representative programs ──────────────────────────────────────────────
// Whole-language samples that must compile front to back.

#[test]
fn factorial_with_nested_helper() {
    let source = r#"
export int factorial(int n) {
    int go(int acc, int i) {
        if (i <= 1) {
            return acc;
        }
        return go(acc * i, i - 1);
    }
    return go(1, n);
}
"#;
    let asm = compile_to_assembly(source).expect("factorial sample must compile");
    assert!(asm.contains("factorial:\n"), "{asm}");
    assert!(asm.contains("factorial__go:\n"), "{asm}");
    assert!(asm.contains("\tisr\n"), "{asm}");
    assert!(asm.contains(".export \"factorial\" int int factorial\n"), "{asm}");
}

#[test]
fn globals_loops_and_casts() {
    let source = r#"
int limit = 10;
float scale = 1.5;

export float accumulate() {
    float total = 0.0;
    for (int i = 0, limit) {
        total = total + (float) i * scale;
    }
    return total;
}
"#;
    let asm = compile_to_assembly(source).expect("sample must compile");
    assert!(asm.contains("__init:\n"), "{asm}");
    assert!(asm.contains("\ti2f\n"), "{asm}");
    assert!(asm.contains("\tfmul\n"), "{asm}");
    assert!(asm.contains(".global int\n"), "{asm}");
    assert!(asm.contains(".global float\n"), "{asm}");
}

#[test]
fn module_with_imports_and_exports() {
    let source = r#"
extern void print(int value);
extern int threshold;

export void report(int x) {
    if (x > threshold) {
        print(x);
    }
}
"#;
    let asm = compile_to_assembly(source).expect("sample must compile");
    assert!(asm.contains(".import \"print\" void int\n"), "{asm}");
    assert!(asm.contains(".import \"_get_threshold\" int\n"), "{asm}");
    assert!(asm.contains(".export \"report\" void int report\n"), "{asm}");
    assert!(asm.contains("\tjsre 0\n"), "{asm}");
}

#[test]
fn do_while_loop() {
    let source = r#"
int countdown(int n) {
    do {
        n = n - 1;
    } while (n > 0);
    return n;
}
"#;
    let asm = compile_to_assembly(source).expect("sample must compile");
    assert!(asm.contains("0_do_while:\n"), "{asm}");
    assert!(asm.contains("\tbranch_t 0_do_while\n"), "{asm}");
}

#[test]
fn bubble_sort_over_a_global_array() {
    let source = r#"
int data[5];

export void sort(int n) {
    for (int i = 0, n - 1) {
        for (int j = 0, n - i - 1) {
            if (data[j] > data[j + 1]) {
                int tmp = data[j];
                data[j] = data[j + 1];
                data[j + 1] = tmp;
            }
        }
    }
}
"#;
    let asm = compile_to_assembly(source).expect("sample must compile");
    assert!(asm.contains("\tinewa 1\n"), "{asm}");
    assert!(asm.contains("\tastoreg 0\n"), "{asm}");
    assert!(asm.contains("\taloadg 0\n"), "{asm}");
    assert!(asm.contains("\tistorea\n"), "{asm}");
    assert!(asm.contains("\tiloada\n"), "{asm}");
}

#[test]
fn ternary_conditions_preserve_branch_shape() {
    let source = r#"
bool both(bool a, bool b) {
    return a && b;
}

bool either(bool a, bool b) {
    return a || b;
}
"#;
    let asm = compile_to_assembly(source).expect("sample must compile");
    assert!(asm.contains("\tbranch_f 0_false_expr\n"), "{asm}");
    assert!(asm.contains("\tbranch_f 1_false_expr\n"), "{asm}");
    assert!(asm.contains("\tbreturn\n"), "{asm}");
}

#[test]
fn empty_void_function_gets_void_return() {
    let asm = compile_to_assembly("void noop() { }\n").expect("sample must compile");
    assert!(asm.contains("noop:\n"), "{asm}");
    assert!(asm.contains("\tesr 0\n"), "{asm}");
    assert!(asm.contains("\treturn\n"), "{asm}");
}
