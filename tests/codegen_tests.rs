//! C emitter tests

fn transpile(source: &str) -> String {
    comet::transpile(source).unwrap().c_source
}

#[test]
fn test_emit_minimal_main() {
    let output = transpile("fn main() -> int { }\n");

    assert!(output.contains("int32_t main() {"), "{output}");
    assert!(output.contains("#include \"sys/types.h\"\n"), "{output}");
    // Empty body
    assert!(output.contains("main() {\n}\n"), "{output}");
}

#[test]
fn test_emit_includes_come_first() {
    let output = transpile("fn main() -> int { }\n");
    assert!(output.starts_with("#include"), "{output}");
}

#[test]
fn test_emit_variable_and_trailing_expression() {
    let output = transpile("fn f() -> int32 { var x : int32 = 1 + 2 * 3 ; x }\n");

    assert!(output.contains("    int32_t x = 1+2*3;\n"), "{output}");
    assert!(output.contains("    x;\n"), "{output}");
    // Scalar locals are not freed
    assert!(!output.contains("free("), "{output}");
}

#[test]
fn test_emit_parallel_declaration_in_order() {
    let output = transpile("var (a, b) : (int32, int64) = (1, 2)\n");

    assert!(output.contains("int32_t a = 1;\nint64_t b = 2;\n"), "{output}");
}

#[test]
fn test_emit_precedence() {
    let flat = transpile("var x : int32 = 1 + 2 * 3\n");
    assert!(flat.contains("1+2*3"), "{flat}");
    assert!(!flat.contains("(1+2*3)"), "{flat}");

    let grouped = transpile("var x : int32 = (1 + 2) * 3\n");
    assert!(grouped.contains("(1+2)*3"), "{grouped}");
}

#[test]
fn test_emit_constant_declaration() {
    let output = transpile("const x : int32 = 5\n");
    assert!(output.contains("const int32_t x = 5;"), "{output}");
}

#[test]
fn test_emit_declaration_without_initializer() {
    let output = transpile("var x : int32\nx = 1\n");

    assert!(output.contains("int32_t x;\n"), "{output}");
    assert!(output.contains("x = 1;\n"), "{output}");
}

#[test]
fn test_emit_multi_return_struct() {
    let output = transpile("fn pair() -> (int32, int64) { }\n");

    let expected = "struct Return_Comet_INTERNAL_pair {\n    int32_t type0;\n    int64_t type1;\n};\n";
    assert!(output.contains(expected), "{output}");
    assert!(
        output.contains("struct Return_Comet_INTERNAL_pair pair() {"),
        "{output}"
    );

    // The struct is prepended before the function definition
    let struct_at = output.find(expected).unwrap();
    let fn_at = output.find("pair() {").unwrap();
    assert!(struct_at < fn_at);
}

#[test]
fn test_emit_native_import_and_declaration() {
    let output = transpile("import native \"stdio.h\"\nfn native printf(string..?) -> int\n");

    assert!(output.contains("#include \"stdio.h\"\n"), "{output}");
    assert!(output.contains("int32_t printf(...);"), "{output}");
    assert!(!output.contains("printf(...) {"), "{output}");
}

#[test]
fn test_emit_source_import_is_silent() {
    let output = transpile("import \"core\"\n");
    assert!(!output.contains("core"), "{output}");
}

#[test]
fn test_emit_boolean_struct_and_bitfield_access() {
    let output = transpile("var b : bool = true\nb = false\n");

    assert!(
        output.contains("struct Comet_INTERNAL_boolean {\n    unsigned int value : 1;\n};\n"),
        "{output}"
    );
    assert!(
        output.contains("struct Comet_INTERNAL_boolean b = { value: 1 };"),
        "{output}"
    );
    assert!(output.contains("b.value = 0;"), "{output}");
}

#[test]
fn test_emit_boolean_struct_only_once() {
    let output = transpile("var (a, b) : (bool, bool) = (true, false)\n");

    let first = output.find("struct Comet_INTERNAL_boolean {").unwrap();
    let rest = &output[first + 1..];
    assert!(
        !rest.contains("struct Comet_INTERNAL_boolean {\n    unsigned"),
        "{output}"
    );
}

#[test]
fn test_emit_free_for_allocated_strings() {
    let output = transpile("fn f() { var msg : string = \"hi\" ; msg }\n");

    assert!(output.contains("#include \"stdlib.h\"\n"), "{output}");
    assert!(output.contains("string msg = \"hi\";"), "{output}");
    assert!(output.contains("    free(msg);\n"), "{output}");
}

#[test]
fn test_emit_call_statement_with_arguments() {
    let source = "import native \"stdio.h\"\nfn native printf(string..?) -> int\nfn main() -> int { printf(\"hi\", 1) }\n";
    let output = transpile(source);

    assert!(output.contains("    printf(\"hi\", 1);\n"), "{output}");
}

#[test]
fn test_emit_call_expression() {
    let source = "fn one() -> int32 { var x : int32 = 1 ; x }\nvar y = one()\n";
    let output = transpile(source);

    assert!(output.contains("int32_t y = one();"), "{output}");
}

#[test]
fn test_emit_function_parameters() {
    let output = transpile("fn add(int32 a, int32 b) -> int32 { a + b }\n");

    assert!(
        output.contains("int32_t add(int32_t a, int32_t b) {"),
        "{output}"
    );
    assert!(output.contains("    a+b;\n"), "{output}");
}

#[test]
fn test_emit_indentation_of_nested_scopes() {
    let source = "fn f() {\nvar x : int32 = 1\n{\nvar y : int32 = x\ny\n}\n}\n";
    let output = transpile(source);

    assert!(output.contains("    int32_t x = 1;\n"), "{output}");
    assert!(output.contains("    {\n"), "{output}");
    assert!(output.contains("        int32_t y = x;\n"), "{output}");
    assert!(output.contains("        y;\n"), "{output}");
    assert!(output.contains("    }\n"), "{output}");
}

#[test]
fn test_emit_preserves_declaration_order() {
    let source = "fn a() { }\nfn b() { }\nvar x : int32 = 1\n";
    let output = transpile(source);

    let a_at = output.find("void a()").unwrap();
    let b_at = output.find("void b()").unwrap();
    let x_at = output.find("int32_t x").unwrap();
    assert!(a_at < b_at && b_at < x_at, "{output}");
}

#[test]
fn test_emit_float_and_double_types() {
    let output = transpile("var (f, d) : (float32, float64) = (1.5, 2.5)\n");

    assert!(output.contains("float f = 1.5;"), "{output}");
    assert!(output.contains("double d = 2.5;"), "{output}");
}
