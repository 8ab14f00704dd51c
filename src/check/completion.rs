//! Completion verdicts.

use tower_lsp::lsp_types::CompletionItem;

use crate::diff;
use crate::error::HarnessError;
use crate::expect::Expectations;
use crate::report::CapabilityReport;
use crate::server::AnalysisServer;

/// Checks every completion query. The expected list is the ordered expansion
/// of the referenced catalog entries; the server's response order is taken
/// verbatim, since ordering is part of the contract under test.
pub(crate) async fn run<S: AnalysisServer + Sync + ?Sized>(
    expectations: &Expectations,
    server: &S,
    expected_count: Option<usize>,
) -> Result<CapabilityReport, HarnessError> {
    let mut report = CapabilityReport::new("completion");
    if let Some(count) = expected_count {
        report.check_count(expectations.completion_count(), count);
    }

    for (position, keys) in expectations.completion_queries() {
        let mut want = Vec::with_capacity(keys.len());
        for key in keys {
            let item = expectations.catalog_item(key).ok_or_else(|| {
                HarnessError::fixture(
                    &key.file,
                    key.line,
                    format!("catalog entry missing for {key}"),
                )
            })?;
            want.push(item.clone());
        }

        let uri = position.uri()?;
        tracing::debug!("completion at {position}");
        let got: Vec<CompletionItem> = server
            .completion(&uri, position.to_lsp())
            .await
            .map_err(|e| HarnessError::server("completion", e.context(format!("at {position}"))))?;

        report.checked += 1;
        if got != want {
            report.fail(diff::render(
                &format!("completion failed for {position}"),
                &want,
                &got,
            ));
        }
    }

    Ok(report)
}
