use omgidl_core::ConstValue;
use omgidl_parser::{ParserConfig, parse_str};
use omgidl_semantic::{
    Analysis, AnalysisConfig, DefState, ResolvedType, TypeKind, analyze,
};

fn analyze_with(text: &str, config: &AnalysisConfig) -> Analysis {
    let out = parse_str(text, &ParserConfig::default());
    assert!(
        !out.diagnostics.has_errors(),
        "unexpected syntax errors: {:?}",
        out.diagnostics
    );
    let mut spec = out.specification;
    analyze(&mut spec, config)
}

fn analyze_text(text: &str) -> Analysis {
    analyze_with(text, &AnalysisConfig::default())
}

fn messages(analysis: &Analysis) -> Vec<String> {
    analysis
        .diagnostics
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

fn field_type(analysis: &Analysis, owner: &str, field: &str) -> ResolvedType {
    let entry = analysis
        .model
        .get_by_name(owner)
        .unwrap_or_else(|| panic!("no entry for `{owner}`"));
    let TypeKind::Struct(layout) = &entry.kind else {
        panic!("`{owner}` is not a struct: {:?}", entry.kind);
    };
    layout
        .fields
        .iter()
        .find(|f| f.name == field)
        .unwrap_or_else(|| panic!("no field `{field}` in `{owner}`"))
        .ty
        .clone()
}

fn named(analysis: &Analysis, path: &str) -> ResolvedType {
    let id = analysis
        .symbols
        .resolve_path(path)
        .unwrap_or_else(|| panic!("`{path}` is not declared"));
    ResolvedType::Named(id)
}

// ── resolution ────────────────────────────────────────────────────────────────

#[test]
fn nearest_enclosing_scope_wins() {
    let analysis = analyze_text(
        r#"
module A {
  struct S { long a; };
  module B {
    struct S { long b; };
    struct U {
      S inner;
      A::S outer;
      ::A::B::S absolute;
    };
  };
};
"#,
    );
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(field_type(&analysis, "A::B::U", "inner"), named(&analysis, "A::B::S"));
    assert_eq!(field_type(&analysis, "A::B::U", "outer"), named(&analysis, "A::S"));
    assert_eq!(
        field_type(&analysis, "A::B::U", "absolute"),
        named(&analysis, "A::B::S")
    );
}

#[test]
fn first_match_stops_the_outward_search() {
    let analysis = analyze_text(
        r#"
module X { struct T { long t; }; };
module A {
  module X { const long Z = 0; };
  struct R { X::T t; };
};
"#,
    );
    assert_eq!(messages(&analysis), vec!["`T` is not declared in `A::X`"]);
    assert_eq!(
        field_type(&analysis, "A::R", "t"),
        ResolvedType::Unresolved("X::T".into())
    );
}

#[test]
fn reopened_modules_share_one_scope() {
    let analysis = analyze_text(
        r#"
module M { struct A { long x; }; };
module M { struct B { A a; }; };
"#,
    );
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(field_type(&analysis, "M::B", "a"), named(&analysis, "M::A"));
}

#[test]
fn unresolved_and_non_type_names() {
    let analysis = analyze_text(
        r#"
const long N = 3;
struct S { Missing m; N n; };
"#,
    );
    let messages = messages(&analysis);
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert_eq!(messages[0], "cannot resolve `Missing`");
    assert!(messages[1].starts_with("`N` is not a type"), "{}", messages[1]);
    assert_eq!(
        field_type(&analysis, "S", "m"),
        ResolvedType::Unresolved("Missing".into())
    );
}

// ── forward declarations ──────────────────────────────────────────────────────

#[test]
fn forward_declaration_is_completed_in_place() {
    let analysis = analyze_text(
        r#"
struct Node;
struct List { sequence<Node> items; };
struct Node { long value; };
"#,
    );
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);

    let node = named(&analysis, "Node");
    let ResolvedType::Named(id) = node else {
        unreachable!()
    };
    assert_eq!(analysis.symbols.get(id).state, DefState::Defined);
    assert_eq!(
        field_type(&analysis, "List", "items"),
        ResolvedType::Sequence {
            elem: Box::new(ResolvedType::Named(id)),
            bound: None,
        }
    );
    assert!(matches!(
        analysis.model.get(id).map(|e| &e.kind),
        Some(TypeKind::Struct(_))
    ));
}

#[test]
fn dangling_forward_is_a_warning_by_default() {
    let text = "struct Opaque; struct Holder { sequence<Opaque> items; };";

    let analysis = analyze_text(text);
    assert_eq!(analysis.diagnostics.error_count(), 0);
    assert_eq!(analysis.diagnostics.warning_count(), 1);
    assert_eq!(
        analysis.diagnostics[0].message,
        "struct `Opaque` is forward-declared but never defined"
    );
    assert!(matches!(
        analysis.model.get_by_name("Opaque").map(|e| &e.kind),
        Some(TypeKind::Opaque("forward declaration"))
    ));

    let strict = AnalysisConfig {
        dangling_forward_as_error: true,
    };
    let analysis = analyze_with(text, &strict);
    assert_eq!(analysis.diagnostics.error_count(), 1);
}

#[test]
fn forward_kind_must_match_definition() {
    let analysis = analyze_text("union X; struct X { long a; };");
    assert_eq!(analysis.diagnostics.error_count(), 1);
    assert!(
        analysis.diagnostics.errors().any(|d| d
            .message
            .contains("was forward-declared as union but is defined as struct")),
        "{:?}",
        analysis.diagnostics
    );
    // The union forward was never completed.
    assert_eq!(analysis.diagnostics.warning_count(), 1);
}

#[test]
fn repeated_forward_declarations_are_allowed() {
    let analysis = analyze_text("struct A; struct A; struct A { long x; }; struct A;");
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
}

// ── duplicates ────────────────────────────────────────────────────────────────

#[test]
fn duplicate_identifiers_in_one_scope() {
    let analysis = analyze_text(
        r#"
struct A { long x; };
struct A { long y; };
module A { const long C = 1; };
"#,
    );
    let messages = messages(&analysis);
    assert_eq!(messages.len(), 2, "{messages:?}");
    for message in &messages {
        assert!(
            message.starts_with("duplicate identifier `A` in the global scope"),
            "{message}"
        );
    }
}

#[test]
fn duplicate_members() {
    let analysis = analyze_text("struct P { long x; double y, x; };");
    assert_eq!(
        messages(&analysis),
        vec!["duplicate member `x` in struct `P` (previous declaration at 1:17)"]
    );
}

// ── enumerators ───────────────────────────────────────────────────────────────

#[test]
fn enumerators_are_visible_in_the_enclosing_scope() {
    let analysis = analyze_text(
        r#"
module M {
  enum Color { RED, GREEN, BLUE };
  const Color C = GREEN;
  const Color D = Color::BLUE;
};
"#,
    );
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
    assert_eq!(
        analysis.symbols.resolve_path("M::RED"),
        analysis.symbols.resolve_path("M::Color::RED")
    );

    let ordinal = |name: &str| match analysis.model.get_by_name(name).map(|e| &e.kind) {
        Some(TypeKind::Const(c)) => match &c.value {
            ConstValue::Enumerator { ordinal, .. } => *ordinal,
            other => panic!("expected enumerator, got {other:?}"),
        },
        other => panic!("expected constant, got {other:?}"),
    };
    assert_eq!(ordinal("M::C"), 1);
    assert_eq!(ordinal("M::D"), 2);
}

#[test]
fn enumerator_injection_conflicts() {
    let analysis = analyze_text("enum E { A, B }; const long A = 1;");
    let messages = messages(&analysis);
    assert_eq!(messages.len(), 1, "{messages:?}");
    assert!(messages[0].starts_with("duplicate identifier `A`"));
}
