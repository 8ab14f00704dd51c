//! Formatting verdicts.

use crate::diff;
use crate::error::HarnessError;
use crate::expect::Expectations;
use crate::report::CapabilityReport;
use crate::server::AnalysisServer;
use crate::types::file_uri;

/// Checks every format-annotated file. At most one edit is allowed; zero
/// edits (or a failed server call) is acceptable only when the expected
/// text is empty, i.e. the reference formatter produced no diff.
pub(crate) async fn run<S: AnalysisServer + Sync + ?Sized>(
    expectations: &Expectations,
    server: &S,
    expected_count: Option<usize>,
) -> Result<CapabilityReport, HarnessError> {
    let mut report = CapabilityReport::new("format");
    if let Some(count) = expected_count {
        report.check_count(expectations.format_count(), count);
    }

    for (path, want) in expectations.formats() {
        let uri = file_uri(path)?;
        tracing::debug!("formatting for {}", path.display());
        report.checked += 1;

        let edits = match server.formatting(&uri).await {
            Ok(edits) => edits,
            Err(e) if want.is_empty() => {
                tracing::debug!(
                    "formatting error tolerated for {} (no diff expected): {e:#}",
                    path.display()
                );
                continue;
            }
            Err(e) => {
                return Err(HarnessError::server(
                    "formatting",
                    e.context(format!("for {}", path.display())),
                ));
            }
        };

        match edits.as_slice() {
            [] => {
                if !want.is_empty() {
                    report.fail(format!(
                        "formatting failed for {}: expected an edit, got none",
                        path.display()
                    ));
                }
            }
            [edit] => {
                if want.is_empty() {
                    report.fail(format!(
                        "formatting failed for {}: expected no edit, got one replacing with {:?}",
                        path.display(),
                        edit.new_text
                    ));
                } else if edit.new_text != want {
                    report.fail(diff::render(
                        &format!("formatting failed for {}", path.display()),
                        &[want],
                        &[edit.new_text.as_str()],
                    ));
                }
            }
            _ => {
                report.fail(format!(
                    "formatting failed for {}: expected at most one edit, got {}",
                    path.display(),
                    edits.len()
                ));
            }
        }
    }

    Ok(report)
}
