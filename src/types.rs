//! Source positions and ranges as written in fixture annotations.
//!
//! Fixture coordinates are 1-based (line and column), matching what a fixture
//! author sees in an editor; columns are byte offsets within the line. The
//! LSP wire types are 0-based, so every request site goes through the
//! conversion helpers here.

use std::fmt;
use std::path::{Path, PathBuf};
use tower_lsp::lsp_types::{CompletionItemKind, Position, Range, Url};

use crate::error::HarnessError;

/// The `source` tag stamped on every expected diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "LSP";

/// A single point in an exported fixture file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition {
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based byte column within the line.
    pub column: u32,
}

impl SourcePosition {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// The equivalent 0-based protocol position.
    pub fn to_lsp(&self) -> Position {
        Position::new(self.line - 1, self.column - 1)
    }

    pub fn uri(&self) -> Result<Url, HarnessError> {
        file_uri(&self.file)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.file.to_string_lossy());
        write!(f, "{}:{}:{}", base, self.line, self.column)
    }
}

/// A half-open span in an exported fixture file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// A range collapsed to a single point.
    pub fn point(position: SourcePosition) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    pub fn file(&self) -> &Path {
        &self.start.file
    }

    pub fn to_lsp(&self) -> Range {
        Range::new(self.start.to_lsp(), self.end.to_lsp())
    }

    pub fn uri(&self) -> Result<Url, HarnessError> {
        self.start.uri()
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}:{}",
            self.start, self.end.line, self.end.column
        )
    }
}

/// Converts an exported (absolute) fixture path to a `file://` URI.
pub fn file_uri(path: &Path) -> Result<Url, HarnessError> {
    Url::from_file_path(path).map_err(|()| HarnessError::Fixture {
        file: path.to_path_buf(),
        line: 0,
        reason: "fixture path cannot be expressed as a file URI".into(),
    })
}

/// Total mapping from a fixture `kind` name to a protocol completion kind.
///
/// Unknown names yield `None`; the marker parser treats that as a malformed
/// annotation rather than silently swallowing the typo.
pub fn completion_kind(name: &str) -> Option<CompletionItemKind> {
    match name {
        "struct" => Some(CompletionItemKind::STRUCT),
        "func" => Some(CompletionItemKind::FUNCTION),
        "var" => Some(CompletionItemKind::VARIABLE),
        "type" => Some(CompletionItemKind::TYPE_PARAMETER),
        "field" => Some(CompletionItemKind::FIELD),
        "interface" => Some(CompletionItemKind::INTERFACE),
        "const" => Some(CompletionItemKind::CONSTANT),
        "method" => Some(CompletionItemKind::METHOD),
        "package" => Some(CompletionItemKind::MODULE),
        _ => None,
    }
}
