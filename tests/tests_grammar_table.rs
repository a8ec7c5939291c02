//! Table-driven coverage of the production table (spec §4.3): one row per
//! keyword/context pairing that must either parse cleanly or fail with a
//! specific error code. Mirrors the teacher's `tests_parser_*.rs` files,
//! each a flat table of `#[case]` inputs run through one assertion function.

use once_cell::sync::Lazy;
use rstest::rstest;

use archdsl::errors::ErrorCode;
use archdsl::model::Workspace;
use archdsl::Parser;

/// Emits `tracing` output to the test harness's captured writer so a
/// failing case's `trace!`/`warn!` lines show up in `cargo test -- --nocapture`,
/// matching the teacher's own `tracing-subscriber` wiring in its test suite.
fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("archdsl=trace").try_init();
    });
    Lazy::force(&INIT);
}

/// A minimal workspace shell every case below is spliced into, shared so
/// cases that only need to confirm "this line parses under a plain model"
/// don't each re-type the boilerplate wrapper.
static MINIMAL_MODEL_PREFIX: &str = "workspace {\n    model {\n";
static MINIMAL_MODEL_SUFFIX: &str = "\n    }\n}";

fn wrap_in_model(body: &str) -> String {
    format!("{MINIMAL_MODEL_PREFIX}{body}{MINIMAL_MODEL_SUFFIX}")
}

#[rstest]
#[case(r#"u = person "User""#)]
#[case(r#"s = softwareSystem "S""#)]
#[case(r#"e = element "Custom""#)]
#[case("enterprise \"Acme\" {\n}")]
#[case("group \"Team\" {\n}")]
#[case("deploymentEnvironment \"Live\" {\n}")]
fn accepted_directly_under_model(#[case] line: &str) {
    init_tracing();
    let mut parser = Parser::<Workspace>::new();
    let source = wrap_in_model(line);
    parser.parse_str(&source).unwrap_or_else(|e| panic!("expected '{line}' to parse under model, got {e}"));
}

#[rstest]
#[case("container \"Web\"", ErrorCode::E0301)]
#[case("component \"C\"", ErrorCode::E0301)]
#[case("infrastructureNode \"Infra\"", ErrorCode::E0302)]
#[case("healthCheck \"check\" \"https://x\"", ErrorCode::E0302)]
fn rejected_directly_under_model(#[case] line: &str, #[case] expected: ErrorCode) {
    init_tracing();
    let mut parser = Parser::<Workspace>::new();
    let source = wrap_in_model(line);
    let err = parser.parse_str(&source).unwrap_err();
    assert_eq!(err.code(), expected, "line {line:?} should have failed with {expected:?}, got {err}");
}

#[rstest]
#[case("mdel { }")]
#[case("unexpectedKeyword")]
fn unknown_keyword_is_unexpected_tokens(#[case] line: &str) {
    init_tracing();
    let mut parser = Parser::<Workspace>::new();
    let source = format!("workspace {{\n    {line}\n}}");
    let err = parser.parse_str(&source).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E0301);
}

#[rstest]
#[case("exclude \"* -> element.tag==External\"", true)]
#[case("exclude * -> element.tag==External", false)]
fn exclude_expression_requires_quoting_when_it_contains_arrow(#[case] line: &str, #[case] should_parse: bool) {
    init_tracing();
    let mut parser = Parser::<Workspace>::new();
    let source = format!(
        "workspace {{\n    model {{\n        s = softwareSystem \"S\"\n    }}\n    views {{\n        systemContext s \"c\" {{\n            {line}\n        }}\n    }}\n}}"
    );
    let result = parser.parse_str(&source);
    assert_eq!(result.is_ok(), should_parse, "{line:?} parse result mismatch: {result:?}");
}

#[rstest]
#[case("!plugin com.example.Plugin", ErrorCode::E0501)]
#[case("!script javascript {", ErrorCode::E0501)]
#[case("!docs ./docs", ErrorCode::E0501)]
fn restricted_mode_rejects_plugin_script_and_docs(#[case] line: &str, #[case] expected: ErrorCode) {
    init_tracing();
    let mut parser = Parser::<Workspace>::new();
    parser.set_restricted(true);
    let source = format!("workspace {{\n    {line}\n}}");
    let err = parser.parse_str(&source).unwrap_err();
    assert_eq!(err.code(), expected);
}
