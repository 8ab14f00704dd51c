//! The request surface of the server under test.
//!
//! The harness does not care how the server is built; anything that can
//! answer these four requests can be checked. Implementations typically wrap
//! an in-process server state the way an LSP frontend would, or proxy to a
//! running process. Errors returned here indicate a harness/server wiring
//! problem, not a content mismatch, and abort the run.

use async_trait::async_trait;
use tower_lsp::lsp_types::{CompletionItem, Diagnostic, Location, Position, TextEdit, Url};

#[async_trait]
pub trait AnalysisServer {
    /// Completion items at `position`, in the order the server would present
    /// them. Order is part of the contract under test.
    async fn completion(&self, uri: &Url, position: Position)
        -> anyhow::Result<Vec<CompletionItem>>;

    /// All diagnostics for the file. The harness canonicalizes ordering
    /// before comparison.
    async fn diagnostics(&self, uri: &Url) -> anyhow::Result<Vec<Diagnostic>>;

    /// Whole-document formatting; at most one edit is expected.
    async fn formatting(&self, uri: &Url) -> anyhow::Result<Vec<TextEdit>>;

    /// Definition targets for the symbol at `position`.
    async fn definition(&self, uri: &Url, position: Position) -> anyhow::Result<Vec<Location>>;
}
