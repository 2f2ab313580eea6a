use omgidl_core::ast::{
    AnnotationParams, BinaryOp, CaseLabel, ConstrType, Declarator, DefinitionKind, Export,
    ExprKind, ForwardKind, ImportTarget, Literal, PrimitiveKind, Radix, TemplateType, TypeSpec,
    UnaryOp,
};
use omgidl_parser::{ParseOutput, ParserConfig, SyntaxError, parse, parse_str, tokenize};

fn parse_ok(text: &str) -> ParseOutput {
    let out = parse_str(text, &ParserConfig::default());
    assert!(
        !out.diagnostics.has_errors(),
        "unexpected diagnostics: {:?}",
        out.diagnostics
    );
    out
}

fn single(text: &str) -> DefinitionKind {
    let mut out = parse_ok(text);
    assert_eq!(out.specification.definitions.len(), 1);
    out.specification.definitions.remove(0).kind
}

fn const_value(text: &str) -> ExprKind {
    match single(text) {
        DefinitionKind::Const(c) => c.value.kind,
        other => panic!("expected const, got {other:?}"),
    }
}

// ── structs and members ───────────────────────────────────────────────────────

#[test]
fn struct_members_keep_declared_order() {
    let DefinitionKind::Struct(s) = single("struct Name { long a; string b; };") else {
        panic!("expected struct");
    };
    assert_eq!(s.name.name, "Name");
    assert_eq!(s.members.len(), 2);
    assert_eq!(s.members[0].ty, TypeSpec::Primitive(PrimitiveKind::Long));
    assert_eq!(s.members[0].declarators[0].name().name, "a");
    assert_eq!(
        s.members[1].ty,
        TypeSpec::Template(TemplateType::String { bound: None })
    );
    assert_eq!(s.members[1].declarators[0].name().name, "b");
}

#[test]
fn multi_declarators_and_arrays() {
    let DefinitionKind::Struct(s) = single("struct M { double x, y[3], z[2][4]; };") else {
        panic!("expected struct");
    };
    let decls = &s.members[0].declarators;
    assert_eq!(decls.len(), 3);
    assert!(matches!(decls[0], Declarator::Simple(_)));
    assert_eq!(decls[1].dims().len(), 1);
    assert_eq!(decls[2].dims().len(), 2);
}

#[test]
fn multi_keyword_base_types() {
    let DefinitionKind::Struct(s) = single(
        "struct T { unsigned short a; unsigned long b; unsigned long long c; long long d; long double e; };",
    ) else {
        panic!("expected struct");
    };
    let kinds: Vec<_> = s
        .members
        .iter()
        .map(|m| match &m.ty {
            TypeSpec::Primitive(kind) => *kind,
            other => panic!("expected primitive, got {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            PrimitiveKind::UShort,
            PrimitiveKind::ULong,
            PrimitiveKind::ULongLong,
            PrimitiveKind::LongLong,
            PrimitiveKind::LongDouble,
        ]
    );
}

#[test]
fn forward_declarations_and_inheritance() {
    let out = parse_ok("struct S; union U; struct D : ::base::B { long x; };");
    let defs = &out.specification.definitions;
    assert!(matches!(&defs[0].kind, DefinitionKind::Forward(f) if f.kind == ForwardKind::Struct));
    assert!(matches!(&defs[1].kind, DefinitionKind::Forward(f) if f.kind == ForwardKind::Union));
    let DefinitionKind::Struct(d) = &defs[2].kind else {
        panic!("expected struct");
    };
    let base = d.base.as_ref().expect("base should be parsed");
    assert!(base.name.absolute);
    assert_eq!(base.name.to_string(), "::base::B");
}

// ── templates ─────────────────────────────────────────────────────────────────

#[test]
fn bounded_and_unbounded_sequences() {
    let DefinitionKind::Struct(s) =
        single("struct P { sequence<Point, 100> bounded; sequence<Point> open; };")
    else {
        panic!("expected struct");
    };
    match &s.members[0].ty {
        TypeSpec::Template(TemplateType::Sequence { elem, bound }) => {
            assert!(matches!(elem.as_ref(), TypeSpec::Named(n) if n.name.to_string() == "Point"));
            let bound = bound.as_ref().expect("bound");
            assert_eq!(
                bound.kind,
                ExprKind::Literal(Literal::Integer(100, Radix::Decimal))
            );
        }
        other => panic!("unexpected type: {other:?}"),
    }
    assert!(matches!(
        &s.members[1].ty,
        TypeSpec::Template(TemplateType::Sequence { bound: None, .. })
    ));
}

#[test]
fn nested_template_closers() {
    let DefinitionKind::Typedef(t) = single("typedef sequence<sequence<long, 4>> Grid;") else {
        panic!("expected typedef");
    };
    let TypeSpec::Template(TemplateType::Sequence { elem, bound: None }) = &t.ty else {
        panic!("expected outer sequence");
    };
    assert!(matches!(
        elem.as_ref(),
        TypeSpec::Template(TemplateType::Sequence { bound: Some(_), .. })
    ));
}

#[test]
fn map_set_string_and_fixed_templates() {
    let DefinitionKind::Struct(s) = single(
        "struct C { map<string, long, 8> m; set<octet> s; wstring<16> w; fixed<10, 2> f; };",
    ) else {
        panic!("expected struct");
    };
    assert!(matches!(
        &s.members[0].ty,
        TypeSpec::Template(TemplateType::Map { bound: Some(_), .. })
    ));
    assert!(matches!(
        &s.members[1].ty,
        TypeSpec::Template(TemplateType::Set { bound: None, .. })
    ));
    assert!(matches!(
        &s.members[2].ty,
        TypeSpec::Template(TemplateType::WString { bound: Some(_) })
    ));
    assert!(matches!(
        &s.members[3].ty,
        TypeSpec::Template(TemplateType::Fixed {
            digits: Some(_),
            scale: Some(_)
        })
    ));
}

// ── unions, enums, bit types ──────────────────────────────────────────────────

#[test]
fn union_cases_and_default() {
    let DefinitionKind::Union(u) = single(
        "union U switch(long) { case 1: long i; case 2: case 3: double d; default: string s; };",
    ) else {
        panic!("expected union");
    };
    assert_eq!(u.cases.len(), 3);
    assert_eq!(u.cases[1].labels.len(), 2);
    assert!(u.cases[2].is_default());
    assert!(matches!(u.cases[2].labels[0], CaseLabel::Default(_)));
    assert_eq!(u.discriminant.ty, TypeSpec::Primitive(PrimitiveKind::Long));
}

#[test]
fn union_with_inline_enum_discriminant() {
    let DefinitionKind::Union(u) =
        single("union U switch(enum K { A, B }) { case A: long a; case B: short b; };")
    else {
        panic!("expected union");
    };
    match &u.discriminant.ty {
        TypeSpec::Constructed(c) => assert!(matches!(c.as_ref(), ConstrType::Enum(e) if e.enumerators.len() == 2)),
        other => panic!("unexpected discriminant: {other:?}"),
    }
}

#[test]
fn enum_preserves_enumerator_order() {
    let DefinitionKind::Enum(e) = single("enum E { A, B, C };") else {
        panic!("expected enum");
    };
    let names: Vec<_> = e.enumerators.iter().map(|x| x.name.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn bitset_and_bitmask() {
    let out = parse_ok(
        "bitset Flags { bitfield<3> a; bitfield<1, boolean> b; bitfield<4>; };\n\
         @bit_bound(8) bitmask Perm { @position(2) READ, WRITE };",
    );
    let defs = &out.specification.definitions;
    let DefinitionKind::Bitset(b) = &defs[0].kind else {
        panic!("expected bitset");
    };
    assert_eq!(b.bitfields.len(), 3);
    assert_eq!(b.bitfields[1].ty, Some(PrimitiveKind::Boolean));
    assert!(b.bitfields[2].names.is_empty());

    let DefinitionKind::Bitmask(m) = &defs[1].kind else {
        panic!("expected bitmask");
    };
    assert_eq!(defs[1].annotations[0].simple_name(), "bit_bound");
    assert_eq!(m.values.len(), 2);
    assert_eq!(m.values[0].annotations[0].simple_name(), "position");
}

// ── constant expressions ──────────────────────────────────────────────────────

#[test]
fn multiplication_binds_tighter_than_addition() {
    let ExprKind::Binary { op, rhs, .. } = const_value("const long X = 10 + 5 * 2;") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn binary_operators_are_left_associative() {
    let ExprKind::Binary { op, lhs, .. } = const_value("const long X = 10 - 4 - 3;") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Sub);
    assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
}

#[test]
fn full_precedence_chain() {
    // 1 | (2 ^ (3 & (4 << (5 + (6 * -7)))))
    let expr = const_value("const long X = 1 | 2 ^ 3 & 4 << 5 + 6 * -7;");
    let ExprKind::Binary { op: BinaryOp::Or, rhs, .. } = expr else {
        panic!("expected `|` at the root");
    };
    let ExprKind::Binary { op: BinaryOp::Xor, rhs, .. } = rhs.kind else {
        panic!("expected `^`");
    };
    let ExprKind::Binary { op: BinaryOp::And, rhs, .. } = rhs.kind else {
        panic!("expected `&`");
    };
    let ExprKind::Binary { op: BinaryOp::Shl, rhs, .. } = rhs.kind else {
        panic!("expected `<<`");
    };
    let ExprKind::Binary { op: BinaryOp::Add, rhs, .. } = rhs.kind else {
        panic!("expected `+`");
    };
    let ExprKind::Binary { op: BinaryOp::Mul, rhs, .. } = rhs.kind else {
        panic!("expected `*`");
    };
    assert!(matches!(rhs.kind, ExprKind::Unary { op: UnaryOp::Minus, .. }));
}

#[test]
fn parentheses_and_scoped_names() {
    let ExprKind::Binary { op, lhs, rhs } = const_value("const long X = (A::B + 1) * ::C;") else {
        panic!("expected binary expression");
    };
    assert_eq!(op, BinaryOp::Mul);
    assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
    assert!(matches!(&rhs.kind, ExprKind::Name(n) if n.absolute && n.to_string() == "::C"));
}

#[test]
fn shift_requires_adjacent_angles() {
    let out = parse_str("const long X = 1 < < 2;", &ParserConfig::default());
    assert!(out.diagnostics.has_errors());
}

#[test]
fn adjacent_strings_concatenate() {
    assert_eq!(
        const_value(r#"const string S = "ab" "cd";"#),
        ExprKind::Literal(Literal::String("abcd".into()))
    );
}

// ── annotations ───────────────────────────────────────────────────────────────

#[test]
fn annotation_parameter_forms() {
    let DefinitionKind::Struct(s) =
        single("struct A { @key long id; @range(min = 0, max = 10) long v; @optional @default(3) long o; };")
    else {
        panic!("expected struct");
    };
    assert_eq!(s.members[0].annotations[0].params, AnnotationParams::None);
    match &s.members[1].annotations[0].params {
        AnnotationParams::Named(params) => {
            let names: Vec<_> = params.iter().map(|(n, _)| n.name.as_str()).collect();
            assert_eq!(names, vec!["min", "max"]);
        }
        other => panic!("unexpected params: {other:?}"),
    }
    assert_eq!(s.members[2].annotations.len(), 2);
    assert!(s.members[2].annotations[1].value().is_some());
}

#[test]
fn annotation_declaration() {
    let out = parse_ok(
        "@annotation unit { string value; long scale default 1; };\nstruct S { @unit(\"m\") double d; };",
    );
    let DefinitionKind::Annotation(a) = &out.specification.definitions[0].kind else {
        panic!("expected annotation declaration");
    };
    assert_eq!(a.name.name, "unit");
    assert_eq!(a.members.len(), 2);
    assert!(a.members[1].default.is_some());
}

// ── CORBA constructs ──────────────────────────────────────────────────────────

#[test]
fn interfaces_and_value_types_parse() {
    let out = parse_ok(
        r#"
        import ::other;
        import "types.idl";
        module Svc {
            exception Failed { string why; };
            interface Base;
            abstract interface Named { readonly attribute string name; };
            interface Calc : Base, Named {
                typedef long Num;
                attribute Num total getraises(Failed) setraises(Failed);
                Num add(in Num a, inout Num b, out Num c) raises(Failed) context("x");
                oneway void ping();
            };
            valuetype Boxed sequence<long>;
            valuetype Account : truncatable Base supports Named {
                public long balance;
                private string owner;
                factory open(in long initial) raises(Failed);
            };
            eventtype Tick { public long when; };
            component Widget supports Calc {
                provides Calc calc;
                uses multiple Named names;
                emits Tick tick;
                consumes Tick other;
            };
            home WidgetHome manages Widget primarykey Account {
                finder byName(in string name);
            };
            typeid Calc "IDL:Svc/Calc:1.0";
            typeprefix Svc "example.org";
        };
        "#,
    );
    let spec = &out.specification;
    assert_eq!(spec.imports.len(), 2);
    assert!(matches!(spec.imports[1].target, ImportTarget::File(ref f) if f == "types.idl"));

    let DefinitionKind::Module(m) = &spec.definitions[0].kind else {
        panic!("expected module");
    };
    assert_eq!(m.definitions.len(), 11);
    let DefinitionKind::Interface(calc) = &m.definitions[3].kind else {
        panic!("expected interface");
    };
    assert_eq!(calc.bases.len(), 2);
    assert_eq!(calc.body.len(), 4);
    match &calc.body[2] {
        Export::Operation(op) => {
            assert_eq!(op.name.name, "add");
            assert_eq!(op.params.len(), 3);
            assert_eq!(op.raises.len(), 1);
            assert_eq!(op.context, vec!["x".to_string()]);
        }
        other => panic!("unexpected export: {other:?}"),
    }
    assert!(matches!(m.definitions[4].kind, DefinitionKind::ValueBox(_)));
    assert!(matches!(m.definitions[6].kind, DefinitionKind::Event(_)));
}

// ── error recovery ────────────────────────────────────────────────────────────

#[test]
fn one_malformed_definition_costs_one_definition() {
    let out = parse_str(
        "struct Bad { long };\nstruct A { long x; };\nenum E { X, Y };\nconst long C = 3;",
        &ParserConfig::default(),
    );
    assert_eq!(out.diagnostics.error_count(), 1, "{:?}", out.diagnostics);
    assert_eq!(out.specification.definitions.len(), 3);
    let names: Vec<_> = out
        .specification
        .definitions
        .iter()
        .filter_map(|d| d.kind.name().map(|n| n.name.clone()))
        .collect();
    assert_eq!(names, vec!["A", "E", "C"]);
}

#[test]
fn recovery_inside_module_keeps_siblings() {
    let out = parse_str(
        "module M { struct S { long x }; struct T { long y; }; };",
        &ParserConfig::default(),
    );
    assert_eq!(out.diagnostics.error_count(), 1);
    let DefinitionKind::Module(m) = &out.specification.definitions[0].kind else {
        panic!("expected module");
    };
    assert_eq!(m.definitions.len(), 1);
    assert_eq!(m.definitions[0].kind.name().map(|n| n.name.as_str()), Some("T"));
}

#[test]
fn stray_closing_brace_at_top_level() {
    let out = parse_str("}; struct A { long x; };", &ParserConfig::default());
    assert_eq!(out.diagnostics.error_count(), 1);
    assert_eq!(out.specification.definitions.len(), 1);
}

#[test]
fn error_message_names_expected_and_found() {
    let (tokens, _) = tokenize("struct 42 {};");
    let (_, errors) = parse(&tokens, &ParserConfig::default());
    match &errors[..] {
        [SyntaxError::Expected {
            expected, found, ..
        }] => {
            assert_eq!(expected, "identifier");
            assert_eq!(found, "integer literal `42`");
        }
        other => panic!("unexpected errors: {other:?}"),
    }
}

#[test]
fn nesting_limit_produces_single_error() {
    let config = ParserConfig { max_nesting: 16 };
    let text = format!("const long X = {}1{};", "(".repeat(40), ")".repeat(40));
    let (tokens, _) = tokenize(&text);
    let (spec, errors) = parse(&tokens, &config);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], SyntaxError::NestingTooDeep { limit: 16, .. }));
    assert!(spec.definitions.is_empty());
}

#[test]
fn long_operator_chains_count_against_the_nesting_limit() {
    let chain = |terms: usize| format!("const long X = {};", vec!["1"; terms].join(" + "));

    let out = parse_str(&chain(200), &ParserConfig::default());
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics);

    let (tokens, _) = tokenize(&chain(20_000));
    let (spec, errors) = parse(&tokens, &ParserConfig::default());
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], SyntaxError::NestingTooDeep { limit: 256, .. }));
    assert!(spec.definitions.is_empty());

    let config = ParserConfig { max_nesting: 16 };
    let product = vec!["2"; 10].join(" * ");
    let text = format!("const long X = ({product}) | ({product});");
    let (tokens, _) = tokenize(&text);
    assert_eq!(parse(&tokens, &config).1.len(), 1);
}

#[test]
fn parsing_is_deterministic() {
    let text = "module A { struct S { sequence<long, 5> v; }; const long N = 1 << 3; };";
    let first = parse_ok(text).specification;
    let second = parse_ok(text).specification;
    assert_eq!(first, second);
}
