//! Diagnostics verdicts.

use crate::check::sort_canonical;
use crate::diff;
use crate::error::HarnessError;
use crate::expect::Expectations;
use crate::report::CapabilityReport;
use crate::server::AnalysisServer;
use crate::types::file_uri;

/// Checks every diagnostics-annotated file. Both sides are sorted into
/// canonical order before the structural comparison; a file registered with
/// an empty message must produce zero diagnostics. The drift count is the
/// total number of expected records, not the number of files.
pub(crate) async fn run<S: AnalysisServer + Sync + ?Sized>(
    expectations: &Expectations,
    server: &S,
    expected_count: Option<usize>,
) -> Result<CapabilityReport, HarnessError> {
    let mut report = CapabilityReport::new("diagnostics");
    let mut records = 0;

    for (path, want) in expectations.diagnostics() {
        let uri = file_uri(path)?;
        tracing::debug!("diagnostics for {}", path.display());
        let mut got = server.diagnostics(&uri).await.map_err(|e| {
            HarnessError::server(
                "diagnostics",
                e.context(format!("for {}", path.display())),
            )
        })?;

        let mut want = want.to_vec();
        sort_canonical(&mut want);
        sort_canonical(&mut got);

        report.checked += 1;
        if got != want {
            report.fail(diff::render(
                &format!("diagnostics failed for {}", path.display()),
                &want,
                &got,
            ));
        }
        records += want.len();
    }

    if let Some(count) = expected_count {
        report.check_count(records, count);
    }
    Ok(report)
}
