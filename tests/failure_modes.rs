//! Failure behavior: content mismatches are accumulated, wiring errors are
//! fatal, broken fixtures refuse to load.

mod common;

use common::{whole_document_edit, FakeServer, TemplateTree};
use lsp_conformance::{HarnessConfig, HarnessError, Suite};
use tower_lsp::lsp_types::{Diagnostic, Url};

fn completion_template() -> TemplateTree {
    let template = TemplateTree::new();
    template.create_file(
        "a.src",
        "func Foo() {} // item \"Foo\" \"Foo\" \"func Foo()\" \"func\"\n\
         func Bar() {} // item \"Bar\" \"Bar\" \"func Bar()\" \"func\"\n\
         f. // complete \"Foo\" \"Bar\"\n\
         // diag \"x declared and not used\"\n\
         var x int\n",
    );
    template
}

#[tokio::test]
async fn completion_order_mismatch_is_reported_and_run_continues() {
    let template = completion_template();
    let suite = Suite::load(template.root()).unwrap();
    let mut server = FakeServer::conforming(suite.expectations());

    // Answer the query with the right items in the wrong order.
    let (position, keys) = suite.expectations().completion_queries().next().unwrap();
    let mut items: Vec<_> = keys
        .iter()
        .map(|k| suite.expectations().catalog_item(k).unwrap().clone())
        .collect();
    items.reverse();
    server.set_completions(&position.uri().unwrap(), position.to_lsp(), items);

    let report = suite.run(&server).await.unwrap();
    assert!(!report.passed());
    assert_eq!(report.completion.failures.len(), 1);
    let failure = &report.completion.failures[0];
    assert!(failure.contains("completion failed for"), "{failure}");
    assert!(failure.contains("expected:") && failure.contains("got:"), "{failure}");
    // The diagnostics group still ran in full.
    assert_eq!(report.diagnostics.checked, 1);
    assert!(report.diagnostics.passed());
}

#[tokio::test]
async fn missing_diagnostic_is_reported_with_diff() {
    let template = TemplateTree::new();
    template.create_file("a.src", "// diag \"unused\"\nvar x int\n");
    let suite = Suite::load(template.root()).unwrap();
    let mut server = FakeServer::conforming(suite.expectations());

    let uri = Url::from_file_path(suite.fixtures().root().join("a.src")).unwrap();
    server.set_diagnostics(&uri, vec![]);

    let report = suite.run(&server).await.unwrap();
    assert!(!report.diagnostics.passed());
    assert!(report.diagnostics.failures[0].contains("diagnostics failed for"));
}

#[tokio::test]
async fn extra_diagnostic_on_clean_file_is_reported() {
    let template = TemplateTree::new();
    template.create_file("clean.src", "var y int // diag \"\"\n");
    let suite = Suite::load(template.root()).unwrap();
    let mut server = FakeServer::new();

    let uri = Url::from_file_path(suite.fixtures().root().join("clean.src")).unwrap();
    server.set_diagnostics(
        &uri,
        vec![Diagnostic {
            message: "unexpected".into(),
            ..Default::default()
        }],
    );

    let report = suite.run(&server).await.unwrap();
    assert!(!report.diagnostics.passed());
}

fn format_template(content: &str) -> (TemplateTree, HarnessConfig) {
    let template = TemplateTree::new();
    template.create_file("fmt.src", content);
    let config = HarnessConfig {
        formatter: vec!["sed".into(), "s/=/ = /".into()],
        ..Default::default()
    };
    (template, config)
}

#[tokio::test]
async fn format_missing_edit_is_reported() {
    let (template, config) = format_template("x=1 // format\n");
    let suite = Suite::load_with(template.root(), config).unwrap();
    let mut server = FakeServer::conforming(suite.expectations());

    let uri = Url::from_file_path(suite.fixtures().root().join("fmt.src")).unwrap();
    server.set_format_edits(&uri, vec![]);

    let report = suite.run(&server).await.unwrap();
    assert!(report.format.failures[0].contains("expected an edit, got none"));
}

#[tokio::test]
async fn format_unexpected_edit_is_reported() {
    let (template, config) = format_template("clean // format\n");
    let suite = Suite::load_with(template.root(), config).unwrap();
    let mut server = FakeServer::new();

    let uri = Url::from_file_path(suite.fixtures().root().join("fmt.src")).unwrap();
    server.set_format_edits(&uri, vec![whole_document_edit("reformatted\n")]);

    let report = suite.run(&server).await.unwrap();
    assert!(report.format.failures[0].contains("expected no edit"));
}

#[tokio::test]
async fn format_multiple_edits_are_reported() {
    let (template, config) = format_template("x=1 // format\n");
    let suite = Suite::load_with(template.root(), config).unwrap();
    let mut server = FakeServer::new();

    let uri = Url::from_file_path(suite.fixtures().root().join("fmt.src")).unwrap();
    server.set_format_edits(
        &uri,
        vec![whole_document_edit("a"), whole_document_edit("b")],
    );

    let report = suite.run(&server).await.unwrap();
    assert!(report.format.failures[0].contains("at most one edit"));
}

#[tokio::test]
async fn definition_location_count_is_enforced() {
    let template = TemplateTree::new();
    template.create_file(
        "def.src",
        "func Baz() {} // item \"decl\"\n\
         Baz() // item \"use\"\n\
         ok // godef \"use\" \"decl\"\n",
    );
    let suite = Suite::load(template.root()).unwrap();
    let mut server = FakeServer::conforming(suite.expectations());

    let (source, target) = suite.expectations().definitions().next().unwrap();
    let location =
        tower_lsp::lsp_types::Location::new(target.uri().unwrap(), target.to_lsp());
    server.set_definitions(
        &source.uri().unwrap(),
        source.start.to_lsp(),
        vec![location.clone(), location],
    );

    let report = suite.run(&server).await.unwrap();
    assert!(!report.definition.passed());
    assert!(report.definition.failures[0].contains("definition failed for"));
}

#[tokio::test]
async fn server_error_aborts_the_run() {
    let template = completion_template();
    let suite = Suite::load(template.root()).unwrap();
    let mut server = FakeServer::conforming(suite.expectations());
    server.fail_on("completion");

    let err = suite.run(&server).await.unwrap_err();
    assert!(
        matches!(&err, HarnessError::Server { capability: "completion", .. }),
        "{err}"
    );
}

#[tokio::test]
async fn formatting_error_is_tolerated_when_no_diff_expected() {
    // No reference formatter, so the expected text is empty.
    let template = TemplateTree::new();
    template.create_file("fmt.src", "clean // format\n");
    let suite = Suite::load(template.root()).unwrap();
    let mut server = FakeServer::new();
    server.fail_on("formatting");

    let report = suite.run(&server).await.unwrap();
    assert!(report.format.passed(), "{report}");
    assert_eq!(report.format.checked, 1);
}

#[tokio::test]
async fn formatting_error_is_fatal_when_diff_expected() {
    let (template, config) = format_template("x=1 // format\n");
    let suite = Suite::load_with(template.root(), config).unwrap();
    let mut server = FakeServer::new();
    server.fail_on("formatting");

    let err = suite.run(&server).await.unwrap_err();
    assert!(
        matches!(&err, HarnessError::Server { capability: "formatting", .. }),
        "{err}"
    );
}

#[tokio::test]
async fn count_drift_is_reported_but_not_fatal() {
    let template = completion_template();
    let config = HarnessConfig {
        strict_counts: true,
        expected: lsp_conformance::ExpectedCounts {
            completions: 5, // fixture tree only has 1
            diagnostics: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let suite = Suite::load_with(template.root(), config).unwrap();
    let server = FakeServer::conforming(suite.expectations());

    let report = suite.run(&server).await.unwrap();
    assert!(!report.completion.passed());
    assert!(
        report.completion.failures[0].contains("got 1 completion expectations, want 5"),
        "{:?}",
        report.completion.failures
    );
    // Content checks still ran and passed.
    assert_eq!(report.completion.checked, 1);
    assert!(report.diagnostics.passed());
}

#[test]
fn malformed_annotation_refuses_to_load() {
    let template = TemplateTree::new();
    template.create_file("bad.src", "var x int // diag unused\n");
    let err = Suite::load(template.root()).unwrap_err();
    assert!(matches!(&err, HarnessError::Fixture { .. }), "{err}");
}

#[test]
fn duplicate_alias_across_files_refuses_to_load() {
    let template = TemplateTree::new();
    template.create_file("a.src", "func Foo() {} // item \"Foo\"\n");
    template.create_file("b.src", "func Foo() {} // item \"Foo\"\n");
    let err = Suite::load(template.root()).unwrap_err();
    let HarnessError::Fixture { reason, .. } = &err else {
        panic!("expected fixture error, got {err}");
    };
    assert!(reason.contains("duplicate alias"), "{reason}");
}

#[test]
fn undeclared_alias_reference_refuses_to_load() {
    let template = TemplateTree::new();
    template.create_file("a.src", "f. // complete \"Ghost\"\n");
    let err = Suite::load(template.root()).unwrap_err();
    let HarnessError::Fixture { reason, .. } = &err else {
        panic!("expected fixture error, got {err}");
    };
    assert!(reason.contains("Ghost"), "{reason}");
}
