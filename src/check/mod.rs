//! Verdict runners, one per capability under test.
//!
//! All four follow the same shape: iterate the frozen expectation table,
//! issue one request per entry, normalize, compare with full structural
//! equality, and record mismatches without aborting so a single run reports
//! every failing fixture. A failing server call is different: it means the
//! wiring is broken, and the run stops with [`crate::HarnessError::Server`].

pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod format;

use tower_lsp::lsp_types::Diagnostic;

/// Canonical diagnostic order: (line, column, message). Server-side ordering
/// is not guaranteed, so both sides are sorted before comparison.
pub(crate) fn sort_canonical(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.range.start.line, a.range.start.character, a.message.as_str()).cmp(&(
            b.range.start.line,
            b.range.start.character,
            b.message.as_str(),
        ))
    });
}
