//! Go-to-definition verdicts.

use tower_lsp::lsp_types::Location;

use crate::diff;
use crate::error::HarnessError;
use crate::expect::Expectations;
use crate::report::CapabilityReport;
use crate::server::AnalysisServer;

/// Checks every definition expectation: the request at the source range's
/// start must return exactly one location, equal to the declared target.
pub(crate) async fn run<S: AnalysisServer + Sync + ?Sized>(
    expectations: &Expectations,
    server: &S,
    expected_count: Option<usize>,
) -> Result<CapabilityReport, HarnessError> {
    let mut report = CapabilityReport::new("definition");
    if let Some(count) = expected_count {
        report.check_count(expectations.definition_count(), count);
    }

    for (source, target) in expectations.definitions() {
        let uri = source.uri()?;
        tracing::debug!("definition at {}", source.start);
        let got = server
            .definition(&uri, source.start.to_lsp())
            .await
            .map_err(|e| {
                HarnessError::server("definition", e.context(format!("at {}", source.start)))
            })?;

        let want = vec![Location::new(target.uri()?, target.to_lsp())];
        report.checked += 1;
        if got != want {
            report.fail(diff::render(
                &format!("definition failed for {source}"),
                &want,
                &got,
            ));
        }
    }

    Ok(report)
}
