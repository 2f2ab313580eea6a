use omgidl_core::{ConstType, ConstValue, IntKind};
use omgidl_parser::{ParserConfig, parse_str};
use omgidl_semantic::{Analysis, AnalysisConfig, TypeKind, analyze};

fn analyze_text(text: &str) -> Analysis {
    let out = parse_str(text, &ParserConfig::default());
    assert!(
        !out.diagnostics.has_errors(),
        "unexpected syntax errors: {:?}",
        out.diagnostics
    );
    let mut spec = out.specification;
    analyze(&mut spec, &AnalysisConfig::default())
}

fn analyze_clean(text: &str) -> Analysis {
    let analysis = analyze_text(text);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    analysis
}

fn constant(analysis: &Analysis, name: &str) -> ConstValue {
    match analysis.model.get_by_name(name).map(|e| &e.kind) {
        Some(TypeKind::Const(c)) => c.value.clone(),
        other => panic!("expected constant `{name}`, got {other:?}"),
    }
}

/// The single error message a document produces.
fn single_error(text: &str) -> String {
    let analysis = analyze_text(text);
    let errors: Vec<_> = analysis.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1, "{:?}", analysis.diagnostics);
    errors[0].message.clone()
}

// ── integer arithmetic ────────────────────────────────────────────────────────

#[test]
fn operator_precedence() {
    let analysis = analyze_clean(
        r#"
const long X = 10 + 5 * 2;
const long Y = (10 + 5) * 2;
const long Z = 20 - 5 - 3;
const long W = 1 | 2 ^ 3 & 4 << 1;
const long M = -7 % 3;
"#,
    );
    assert_eq!(constant(&analysis, "X"), ConstValue::Int(20));
    assert_eq!(constant(&analysis, "Y"), ConstValue::Int(30));
    assert_eq!(constant(&analysis, "Z"), ConstValue::Int(12));
    assert_eq!(constant(&analysis, "W"), ConstValue::Int(3));
    assert_eq!(constant(&analysis, "M"), ConstValue::Int(-1));
}

#[test]
fn constants_through_typedefs_and_references() {
    let analysis = analyze_clean(
        r#"
typedef long Len;
typedef Len Size;
const Size N = 4;
const long M = N * 2 + (1 << 3);
"#,
    );
    assert_eq!(constant(&analysis, "M"), ConstValue::Int(16));
    let Some(TypeKind::Const(n)) = analysis.model.get_by_name("N").map(|e| &e.kind) else {
        panic!("`N` is not a constant");
    };
    assert_eq!(n.ty, ConstType::Integer(IntKind::I32));
}

#[test]
fn radix_literals() {
    let analysis = analyze_clean("const unsigned long H = 0xF0 | 010;");
    assert_eq!(constant(&analysis, "H"), ConstValue::Int(248));
}

#[test]
fn signed_minimum_and_unsigned_maximum() {
    let analysis = analyze_clean(
        r#"
const int8 SMALL = -128;
const long long MIN = -9223372036854775807 - 1;
const unsigned long long MAX = 0xFFFFFFFFFFFFFFFF;
"#,
    );
    assert_eq!(constant(&analysis, "SMALL"), ConstValue::Int(-128));
    assert_eq!(constant(&analysis, "MIN"), ConstValue::Int(i128::from(i64::MIN)));
    assert_eq!(constant(&analysis, "MAX"), ConstValue::Int(i128::from(u64::MAX)));
}

#[test]
fn complement_depends_on_signedness() {
    let analysis = analyze_clean(
        r#"
const unsigned short U = ~0;
const short S = ~0;
"#,
    );
    assert_eq!(constant(&analysis, "U"), ConstValue::Int(65535));
    assert_eq!(constant(&analysis, "S"), ConstValue::Int(-1));
}

#[test]
fn array_dimensions_from_constants() {
    let analysis = analyze_clean(
        r#"
const long N = 3;
struct S { long a[N][N + 1]; };
"#,
    );
    let Some(TypeKind::Struct(layout)) = analysis.model.get_by_name("S").map(|e| &e.kind) else {
        panic!("`S` is not a struct");
    };
    assert_eq!(layout.fields[0].dims, vec![3, 4]);
}

// ── other constant types ──────────────────────────────────────────────────────

#[test]
fn non_integer_constants() {
    let analysis = analyze_clean(
        r#"
const string S = "a" "b";
const wstring W = L"w";
const double D = 1.5 * 2;
const float F = 3;
const boolean T = TRUE;
const char C = 'x';
const wchar WC = 'y';
const fixed FX = 1.25d;
"#,
    );
    assert_eq!(constant(&analysis, "S"), ConstValue::String("ab".into()));
    assert_eq!(constant(&analysis, "W"), ConstValue::WString("w".into()));
    assert_eq!(constant(&analysis, "D"), ConstValue::Float(3.0));
    assert_eq!(constant(&analysis, "F"), ConstValue::Float(3.0));
    assert_eq!(constant(&analysis, "T"), ConstValue::Bool(true));
    assert_eq!(constant(&analysis, "C"), ConstValue::Char('x'));
    assert_eq!(constant(&analysis, "WC"), ConstValue::WChar('y'));
    assert_eq!(constant(&analysis, "FX"), ConstValue::Fixed(1.25));
}

// ── errors ────────────────────────────────────────────────────────────────────

#[test]
fn use_before_definition() {
    let analysis = analyze_text("const long A = B; const long B = 1;");
    let messages: Vec<_> = analysis.diagnostics.iter().map(|d| &d.message).collect();
    assert_eq!(messages, vec!["constant `B` is used before its definition"]);
    assert!(analysis.model.get_by_name("A").is_none());
    assert_eq!(constant(&analysis, "B"), ConstValue::Int(1));
}

#[test]
fn overflow_and_range() {
    assert_eq!(
        single_error("const octet O = 255 + 1;"),
        "integer overflow in uint8 constant expression"
    );
    assert_eq!(
        single_error("const short S = 40000;"),
        "value 40000 does not fit in int16"
    );
    assert_eq!(
        single_error("const long S = 1 << 32;"),
        "shift amount 32 is out of range for int32"
    );
}

#[test]
fn division_by_zero() {
    assert_eq!(
        single_error("const long Z = 1 / (2 - 2);"),
        "division by zero in constant expression"
    );
    assert_eq!(
        single_error("const double D = 1.0 / 0.0;"),
        "division by zero in constant expression"
    );
}

#[test]
fn failed_constants_do_not_cascade() {
    let message = single_error(
        r#"
const long A = 1 / 0;
const long B = A + 1;
struct S { long arr[A]; sequence<long, B> seq; };
"#,
    );
    assert_eq!(message, "division by zero in constant expression");
}

#[test]
fn type_mismatches() {
    assert_eq!(
        single_error("const long L = 1.5;"),
        "floating-point literal cannot be used in a int32 constant"
    );
    assert_eq!(
        single_error("const boolean B = 1;"),
        "integer literal cannot be used in a boolean constant"
    );
    assert_eq!(
        single_error("const string S = \"a\" + \"b\";"),
        "operator `+` is not defined for string operands"
    );
    assert_eq!(
        single_error("const double M = 5.0 % 2.0;"),
        "operator `%` is not defined for floating-point operands"
    );
}

#[test]
fn struct_is_not_a_constant_type() {
    let message = single_error("struct P { long x; }; const P c = 1;");
    assert!(
        message.ends_with("is not a valid type for constant `c`"),
        "{message}"
    );
}
