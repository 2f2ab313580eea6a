use omgidl_core::format_specification;
use omgidl_parser::{ParserConfig, parse_str};

fn format(text: &str) -> String {
    let out = parse_str(text, &ParserConfig::default());
    assert!(
        !out.diagnostics.has_errors(),
        "unexpected diagnostics: {:?}",
        out.diagnostics
    );
    format_specification(&out.specification).expect("format")
}

#[test]
fn normalised_layout() {
    let text = "module m{struct S{long a;sequence<long,2*4> v;};const long N=1<<3;};";
    assert_eq!(
        format(text),
        "\
module m {
    struct S {
        long a;
        sequence<long, (2 * 4)> v;
    };
    const long N = (1 << 3);
};
"
    );
}

#[test]
fn formatted_output_reparses_to_the_same_text() {
    let corpus = [
        "struct Base { long id; }; struct Derived : Base { @key string<16> name; double v[2][3]; };",
        "enum Color { RED, GREEN }; union U switch (Color) { case RED: case GREEN: long a; default: octet b; };",
        "bitset Flags { bitfield<3> a; bitfield<5, octet> b, c; }; bitmask Perm { @position(4) READ, WRITE };",
        "typedef sequence<map<string, long, 8>> Table, Tables[4];",
        "const string GREETING = \"hi\\n\\\"there\\\"\"; const char C = '\\''; const long long H = 0x1F | 017;",
        "const fixed F = 1.50d; const double D = -(2.5 * 4); const boolean B = TRUE;",
        "interface I { readonly attribute long count; void op(in long a, out string b) raises(E); }; exception E { string why; };",
        "module outer { module inner { struct Fwd; struct Fwd { long x; }; }; };",
    ];
    for text in corpus {
        let once = format(text);
        let twice = format(&once);
        assert_eq!(once, twice, "formatting is not stable for:\n{text}");
    }
}
