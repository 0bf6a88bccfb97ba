use civic_compiler::{check, CompileError, Diagnostic};

// ── Helpers ──────────────────────────────────────────────────────────────

fn diagnostics(source: &str) -> Vec<Diagnostic> {
    match check(source) {
        Err(CompileError::Semantic { diagnostics }) => diagnostics,
        Ok(()) => panic!("expected semantic errors, but analysis succeeded"),
        Err(other) => panic!("expected semantic errors, got: {other}"),
    }
}

fn single_diagnostic(source: &str) -> Diagnostic {
    let all = diagnostics(source);
    assert_eq!(all.len(), 1, "expected exactly one diagnostic, got: {all:?}");
    all.into_iter().next().unwrap()
}

// ── Redefinition and shadowing ───────────────────────────────────────────

#[test]
fn sibling_redefinition_is_reported_once() {
    let d = single_diagnostic("int g;\nint g;\n");
    assert!(d.message.contains("redefinition of 'g'"), "{}", d.message);
}

#[test]
fn function_redefinition() {
    let d = single_diagnostic("int f() { return 1; }\nint f() { return 2; }\n");
    assert!(d.message.contains("redefinition of 'f'"), "{}", d.message);
}

#[test]
fn shadowing_in_nested_scope_is_allowed() {
    let source = "int g;\nint f() {\n    int g;\n    g = 1;\n    return g;\n}\n";
    check(source).expect("shadowing an outer scope must succeed");
}

#[test]
fn duplicate_parameter_names() {
    let d = single_diagnostic("int f(int a, int a) { return a; }\n");
    assert!(
        d.message.contains("redefinition of parameter 'a'"),
        "{}",
        d.message
    );
}

// ── Name resolution ──────────────────────────────────────────────────────

#[test]
fn unknown_identifier_position() {
    let d = single_diagnostic("int f() {\n    return y;\n}\n");
    assert!(d.message.contains("unknown identifier 'y'"), "{}", d.message);
    assert_eq!(d.line, 2);
    assert_eq!(d.col, 12);
}

#[test]
fn unknown_function() {
    let d = single_diagnostic("int f() {\n    return g();\n}\n");
    assert!(d.message.contains("unknown function 'g'"), "{}", d.message);
}

#[test]
fn forward_call_to_sibling_is_allowed() {
    let source = "int f() { return g(); }\nint g() { return 1; }\n";
    check(source).expect("forward references to siblings must resolve");
}

// ── Types ────────────────────────────────────────────────────────────────

#[test]
fn binary_operand_types_must_match() {
    let d = single_diagnostic("int f(int a, float b) {\n    return a + b;\n}\n");
    assert!(d.message.contains("operand types differ"), "{}", d.message);
    // The diagnostic points at the left operand.
    assert_eq!(d.line, 2);
    assert_eq!(d.col, 12);
}

#[test]
fn modulo_requires_numeric_operands() {
    let d = single_diagnostic("bool f(bool a, bool b) {\n    return a % b;\n}\n");
    assert!(
        d.message.contains("requires numeric operands"),
        "{}",
        d.message
    );
}

#[test]
fn condition_must_be_bool() {
    let d = single_diagnostic("int f(int x) {\n    if (x) { return 1; }\n    return 0;\n}\n");
    assert!(
        d.message.contains("condition must be of type bool"),
        "{}",
        d.message
    );
}

#[test]
fn assignment_type_mismatch() {
    let d = single_diagnostic("int f() {\n    int x;\n    x = true;\n    return x;\n}\n");
    assert!(
        d.message.contains("incompatible types in assignment to 'x'"),
        "{}",
        d.message
    );
}

#[test]
fn unresolved_identifier_does_not_cascade() {
    // `y` is unknown; the addition must not also report a type mismatch.
    let d = single_diagnostic("int f(int x) {\n    return x + y;\n}\n");
    assert!(d.message.contains("unknown identifier 'y'"), "{}", d.message);
}

// ── Calls ────────────────────────────────────────────────────────────────

#[test]
fn argument_count_mismatch() {
    let source = "int add(int a, int b) { return a + b; }\nint f() { return add(1); }\n";
    let d = single_diagnostic(source);
    assert!(
        d.message.contains("expects 2 argument(s), got 1"),
        "{}",
        d.message
    );
}

#[test]
fn argument_type_mismatch() {
    let source = "int twice(int a) { return a + a; }\nint f() { return twice(true); }\n";
    let d = single_diagnostic(source);
    assert!(
        d.message.contains("argument 1 of 'twice' must be of type int"),
        "{}",
        d.message
    );
}

#[test]
fn incompatible_array_dimensions() {
    let source = "void use(int v[n]) { }\nvoid caller(int a[m]) {\n    use(a);\n}\n";
    let d = single_diagnostic(source);
    assert!(
        d.message.contains("incompatible array dimensions"),
        "{}",
        d.message
    );
}

#[test]
fn matching_array_dimensions_are_allowed() {
    let source = "void use(int v[n]) { }\nvoid caller(int a[n]) {\n    use(a);\n}\n";
    check(source).expect("matching dimension names must be compatible");
}

// ── Returns ──────────────────────────────────────────────────────────────

#[test]
fn missing_return_statement() {
    let d = single_diagnostic("int f() {\n    int x;\n    x = 1;\n}\n");
    assert!(
        d.message.contains("missing return statement"),
        "{}",
        d.message
    );
    // Reported at the function's own position.
    assert_eq!(d.line, 1);
    assert_eq!(d.col, 1);
}

#[test]
fn void_function_cannot_return_a_value() {
    let d = single_diagnostic("void f() {\n    return 1;\n}\n");
    assert!(d.message.contains("cannot return a value"), "{}", d.message);
}

#[test]
fn return_type_must_match() {
    let d = single_diagnostic("int f() {\n    return true;\n}\n");
    assert!(
        d.message.contains("return type does not match"),
        "{}",
        d.message
    );
}

// ── Immutability ─────────────────────────────────────────────────────────

#[test]
fn loop_counter_is_immutable() {
    let source = "int f() {\n    for (int i = 0, 10) {\n        i = 5;\n    }\n    return 0;\n}\n";
    let d = single_diagnostic(source);
    assert!(d.message.contains("immutable"), "{}", d.message);
}

// ── Global initialization order ──────────────────────────────────────────

#[test]
fn global_initializer_cannot_reference_later_global() {
    let d = single_diagnostic("int a = b;\nint b = 3;\n");
    assert!(
        d.message.contains("global 'b' used before its declaration"),
        "{}",
        d.message
    );
}

#[test]
fn global_initializer_cannot_reference_itself() {
    let d = single_diagnostic("int a = a;\n");
    assert!(
        d.message.contains("global 'a' used before its declaration"),
        "{}",
        d.message
    );
}

#[test]
fn global_initializer_may_reference_earlier_global() {
    check("int a = 3;\nint b = a;\n").expect("earlier globals are initialized first");
}

// ── Accumulation ─────────────────────────────────────────────────────────

#[test]
fn multiple_errors_accumulate() {
    let source = "int f() {\n    return y;\n}\nint g() {\n    return z;\n}\n";
    let all = diagnostics(source);
    assert_eq!(all.len(), 2, "{all:?}");
}

#[test]
fn diagnostics_format_with_position() {
    let d = single_diagnostic("int f() {\n    return y;\n}\n");
    let text = d.to_string();
    assert!(
        text.starts_with("Error at line 2 column 12: "),
        "unexpected format: {text}"
    );
}

// ── Fatal frontend errors ────────────────────────────────────────────────

#[test]
fn integer_literal_overflow_is_fatal() {
    let err = check("int f() {\n    return 2147483648;\n}\n").unwrap_err();
    match err {
        CompileError::Lexical(lexical) => {
            assert!(lexical.to_string().contains("integer literal overflow"));
        }
        other => panic!("expected a lexical error, got: {other}"),
    }
}

#[test]
fn grammar_violation_is_fatal() {
    let err = check("int f( {\n}\n").unwrap_err();
    assert!(
        matches!(err, CompileError::Parse { .. }),
        "expected a parse error, got: {err}"
    );
}

#[test]
fn parse_error_carries_position() {
    let err = check("int f() {\n    int x = ;\n}\n").unwrap_err();
    match err {
        CompileError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected a parse error, got: {other}"),
    }
}
