use omgidl_parser::{BundleError, ParserConfig, SchemaBundle, normalized_text, parse_str};

const BUNDLE: &str = "\
================================================================================
IDL: ex/msg/A
module ex {
  module msg {
    struct A {
      ex::msg::B b;
    };
  };
};
================================================================================
IDL: ex/msg/B
module ex {
  module msg {
    struct B {
      uint32 y;
    };
  };
};
";

#[test]
fn schema_bundle_splits_sections_and_finds_main_type() {
    let bundle = SchemaBundle::parse("ex/msg/B", BUNDLE).expect("bundle parse should succeed");
    assert_eq!(bundle.sections.len(), 2);
    assert_eq!(bundle.sections[0].header_line, 2);
    assert_eq!(bundle.sections[1].header_line, 11);
    assert_eq!(
        bundle.main_type("ex/msg/B"),
        Some(vec!["ex".into(), "msg".into(), "B".into()])
    );
}

#[test]
fn main_type_falls_back_to_first_section() {
    let bundle = SchemaBundle::parse("other/msg/C", BUNDLE).expect("bundle parse should succeed");
    assert_eq!(
        bundle.main_type("other/msg/C"),
        Some(vec!["ex".into(), "msg".into(), "A".into()])
    );
}

#[test]
fn section_without_header_is_rejected() {
    let text = "====\nmodule m {};\n";
    match SchemaBundle::parse("m/msg/X", text) {
        Err(BundleError::MissingHeader { line, found }) => {
            assert_eq!(line, 2);
            assert_eq!(found, "module m {};");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        SchemaBundle::parse("x", "\n====\n\n"),
        Err(BundleError::NoSections { .. })
    ));
}

#[test]
fn normalized_text_preserves_offsets_and_parses_as_one_unit() {
    let text = normalized_text(BUNDLE);
    assert_eq!(text.len(), BUNDLE.len());
    assert_eq!(text.lines().count(), BUNDLE.lines().count());
    assert!(!text.contains("IDL:"));
    assert!(!text.contains("===="));

    let out = parse_str(&text, &ParserConfig::default());
    assert!(!out.diagnostics.has_errors(), "{:?}", out.diagnostics);
    assert_eq!(out.specification.definitions.len(), 2);
    let b = BUNDLE.find("struct B").expect("struct B present");
    assert_eq!(&text[b..b + 8], "struct B");
}

#[test]
fn plain_idl_is_not_a_bundle() {
    assert!(!SchemaBundle::is_bundle("struct A { long x; };"));
    assert!(SchemaBundle::is_bundle(BUNDLE));
    assert_eq!(normalized_text("struct A {};\n"), "struct A {};\n");
}
