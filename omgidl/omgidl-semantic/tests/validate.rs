use omgidl_parser::{ParserConfig, parse_str};
use omgidl_semantic::{AnalysisConfig, analyze, build_scopes, resolve, validate};

fn errors(text: &str) -> Vec<String> {
    let out = parse_str(text, &ParserConfig::default());
    assert!(
        !out.diagnostics.has_errors(),
        "unexpected syntax errors: {:?}",
        out.diagnostics
    );
    let mut spec = out.specification;
    let analysis = analyze(&mut spec, &AnalysisConfig::default());
    analysis
        .diagnostics
        .errors()
        .map(|d| d.message.clone())
        .collect()
}

fn assert_valid(text: &str) {
    let errors = errors(text);
    assert!(errors.is_empty(), "{errors:?}");
}

// ── unions ────────────────────────────────────────────────────────────────────

#[test]
fn well_formed_unions() {
    assert_valid(
        r#"
enum K { RED, GREEN, BLUE };
typedef long Disc;
union ByLong switch (long) { case 1: case 2: long a; case 3: double b; default: string c; };
union ByEnum switch (K) { case RED: long a; case K::GREEN: double b; };
union ByBool switch (boolean) { case TRUE: long a; case FALSE: double b; };
union ByChar switch (char) { case 'a': long a; default: long b; };
union ByAlias switch (Disc) { case 1: long a; };
"#,
    );
}

#[test]
fn duplicate_case_label_is_one_error() {
    let errors = errors("union U switch (long) { case 1: long a; case 1: double b; };");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(
        errors[0].starts_with("duplicate case label `1` in union `U`"),
        "{}",
        errors[0]
    );
}

#[test]
fn labels_compare_by_value() {
    let errors = errors(
        r#"
const long ONE = 1;
union U switch (long) { case 0x1: long a; case ONE: double b; };
"#,
    );
    assert_eq!(errors.len(), 1, "{errors:?}");
}

#[test]
fn more_than_one_default() {
    let errors =
        errors("union U switch (long) { case 1: long a; default: long b; default: long c; };");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].starts_with("union `U` has more than one default case"));
}

#[test]
fn invalid_discriminant_type() {
    let errors = errors("union U switch (double) { case 1: long a; };");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(
        errors[0].starts_with("`double` cannot discriminate union `U`"),
        "{}",
        errors[0]
    );
}

#[test]
fn labels_must_fit_the_discriminant() {
    assert_eq!(
        errors("union U switch (octet) { case 300: long a; };"),
        vec!["value 300 does not fit in uint8"]
    );

    let errors = errors(
        r#"
enum J { X, Y };
enum K { A, B };
union U switch (K) { case X: long a; };
"#,
    );
    assert_eq!(errors, vec!["`X` (enum J) cannot be used in a enum K constant"]);
}

#[test]
fn labels_are_checked_through_a_later_typedef() {
    let mut errors = errors(
        r#"
union U switch (Disc) { case 1: long a; case 1: double b; case 300000000000: long c; };
typedef long Disc;
"#,
    );
    errors.sort();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[0].starts_with("duplicate case label `1` in union `U`"), "{errors:?}");
    assert_eq!(errors[1], "value 300000000000 does not fit in int32");
}

// ── sizes ─────────────────────────────────────────────────────────────────────

#[test]
fn sizes_must_be_positive() {
    let errors = errors(
        r#"
struct S {
  sequence<long, 0> s;
  string<-1> t;
  long a[0];
  map<long, string, 2> ok;
};
"#,
    );
    assert_eq!(
        errors,
        vec![
            "sequence bound must be positive, found 0",
            "string bound must be positive, found -1",
            "array dimension must be positive, found 0",
        ]
    );
}

#[test]
fn fixed_point_limits() {
    let errors = errors("typedef fixed<40, 2> F; typedef fixed<5, 7> G; typedef fixed<31, 31> H;");
    assert_eq!(
        errors,
        vec![
            "fixed-point digits must be in 1..=31, found 40",
            "fixed-point scale must be in 0..=5, found 7",
        ]
    );
}

// ── bitsets and bitmasks ──────────────────────────────────────────────────────

#[test]
fn bitfield_widths() {
    let errors = errors(
        r#"
bitset B {
  bitfield<0> a;
  bitfield<9, octet> b;
  bitfield<65> c;
  bitfield<1, boolean> d;
};
"#,
    );
    assert_eq!(
        errors,
        vec![
            "bitfield width 0 is out of range 1..=64",
            "bitfield width 9 is out of range 1..=8",
            "bitfield width 65 is out of range 1..=64",
        ]
    );
}

#[test]
fn bitset_total_width() {
    assert_eq!(
        errors("bitset W { bitfield<40> a; bitfield<30> b; };"),
        vec!["bitset `W` spans 70 bits, more than 64"]
    );
    assert_eq!(
        errors("bitset A { bitfield<40> a; }; bitset B : A { bitfield<30> b; };"),
        vec!["bitset `B` spans 70 bits, more than 64"]
    );
    assert_valid("bitset A { bitfield<40> a; }; bitset B : A { bitfield<24> b; };");
}

#[test]
fn bitmask_positions() {
    let errors = errors(
        r#"
@bit_bound(8)
bitmask M { @position(3) A, B, @position(3) C, @position(9) D };
"#,
    );
    assert_eq!(
        errors,
        vec![
            "`A` and `C` both use bit 3 of bitmask `M`",
            "position 9 of `D` is outside bitmask `M` (bit bound 8)",
        ]
    );
}

#[test]
fn bit_bounds() {
    assert_eq!(
        errors("@bit_bound(65) bitmask M { A };"),
        vec!["@bit_bound(65) is out of range 1..=64"]
    );
    assert_eq!(
        errors("@bit_bound(1) enum E { A, B, C };"),
        vec!["enum `E` has 3 enumerators, more than @bit_bound(1) can hold"]
    );
    assert_valid("@bit_bound(2) enum E { A, B, C, D };");
}

// ── inheritance ───────────────────────────────────────────────────────────────

#[test]
fn bases_must_have_the_right_kind() {
    assert_eq!(
        errors("enum E { A }; struct S : E { long x; };"),
        vec!["base of struct `S` must be a struct, found enum `E`"]
    );
    assert_eq!(
        errors("struct S { long x; }; bitset B : S { bitfield<3> a; };"),
        vec!["base of bitset `B` must be a bitset, found struct `S`"]
    );
}

// ── collection ────────────────────────────────────────────────────────────────

#[test]
fn independent_problems_are_all_reported() {
    let errors = errors(
        r#"
struct A { long x; long x; };
union U switch (long) { case 1: long a; case 1: long b; };
struct B { sequence<long, 0> s; };
bitset C { bitfield<70> f; };
"#,
    );
    assert_eq!(errors.len(), 4, "{errors:?}");
}

#[test]
fn validation_is_repeatable() {
    let out = parse_str(
        "struct A { long x; long x; }; union U switch (float) { case 1: long a; };",
        &ParserConfig::default(),
    );
    let mut spec = out.specification;
    let (mut symbols, scope_errors) = build_scopes(&spec);
    assert!(scope_errors.is_empty(), "{scope_errors:?}");
    let resolve_errors = resolve(&mut spec, &mut symbols);
    assert!(resolve_errors.is_empty(), "{resolve_errors:?}");

    let snapshot = spec.clone();
    let config = AnalysisConfig::default();
    let first = validate(&spec, &symbols, &config);
    let second = validate(&spec, &symbols, &config);
    assert_eq!(first.len(), 2, "{first:?}");
    assert_eq!(first, second);
    assert_eq!(spec, snapshot);
}
