//! Expectation tables, built from parsed markers.
//!
//! [`ExpectationBuilder`] is owned exclusively by the collection pass and is
//! consumed by [`ExpectationBuilder::freeze`]; the verdict phase only ever
//! sees the immutable [`Expectations`], so "no table is mutated during
//! comparison" holds by construction.
//!
//! The format collector is the only one doing I/O: it invokes the reference
//! formatter as a blocking subprocess to obtain ground-truth output, instead
//! of requiring fixtures to carry hand-authored formatted text. Formatter
//! failure is tolerated silently; some fixtures are intentionally
//! unformattable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tower_lsp::lsp_types::{
    CompletionItem, Diagnostic, DiagnosticSeverity, Range,
};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::marker::{AliasTable, ItemSpec, Marker};
use crate::types::{SourcePosition, SourceRange, DIAGNOSTIC_SOURCE};

/// The frozen expectation tables for one fixture tree.
#[derive(Debug, Default)]
pub struct Expectations {
    diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
    catalog: BTreeMap<SourcePosition, CompletionItem>,
    completions: BTreeMap<SourcePosition, Vec<SourcePosition>>,
    formats: BTreeMap<PathBuf, String>,
    definitions: BTreeMap<SourceRange, SourceRange>,
}

impl Expectations {
    /// Per-file expected diagnostics; files expected to be clean map to an
    /// empty slice.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&Path, &[Diagnostic])> {
        self.diagnostics.iter().map(|(p, d)| (p.as_path(), d.as_slice()))
    }

    /// Total number of expected diagnostic records across all files.
    pub fn diagnostic_record_count(&self) -> usize {
        self.diagnostics.values().map(Vec::len).sum()
    }

    pub fn catalog_item(&self, position: &SourcePosition) -> Option<&CompletionItem> {
        self.catalog.get(position)
    }

    /// Completion queries: position → ordered catalog keys.
    pub fn completion_queries(&self) -> impl Iterator<Item = (&SourcePosition, &[SourcePosition])> {
        self.completions.iter().map(|(p, k)| (p, k.as_slice()))
    }

    pub fn completion_count(&self) -> usize {
        self.completions.len()
    }

    /// Format-checked files with their expected text; empty text means "no
    /// edit should be produced".
    pub fn formats(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.formats.iter().map(|(p, t)| (p.as_path(), t.as_str()))
    }

    pub fn format_count(&self) -> usize {
        self.formats.len()
    }

    pub fn definitions(&self) -> impl Iterator<Item = (&SourceRange, &SourceRange)> {
        self.definitions.iter()
    }

    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }
}

/// Pass 2: populate every table, resolving alias references through the
/// (now read-only) alias table. Item markers are routed first so that a
/// completion query can be validated against the catalog no matter where in
/// the tree its items were declared.
pub(crate) fn collect(
    markers: &[Marker],
    aliases: &AliasTable,
    config: &HarnessConfig,
) -> Result<Expectations, HarnessError> {
    let mut builder = ExpectationBuilder::default();

    for marker in markers {
        if let Marker::Item { spec: Some(spec), range, .. } = marker {
            builder.collect_item(range.start.clone(), spec);
        }
    }

    for marker in markers {
        match marker {
            Marker::Item { .. } => {} // aliases were pass 1, catalog above
            Marker::Diag { position, message } => {
                builder.collect_diag(position.clone(), message);
            }
            Marker::Complete { position, aliases: names } => {
                let mut keys = Vec::with_capacity(names.len());
                for name in names {
                    let range = resolve_alias(aliases, name, position)?;
                    if !builder.catalog.contains_key(&range.start) {
                        return Err(HarnessError::fixture(
                            &position.file,
                            position.line,
                            format!(
                                "alias \"{name}\" has no completion item (declared at {} without label/detail/kind)",
                                range.start
                            ),
                        ));
                    }
                    keys.push(range.start.clone());
                }
                builder.collect_complete(position.clone(), keys);
            }
            Marker::Format { position } => {
                builder.collect_format(&position.file, &config.formatter)?;
            }
            Marker::GoDef { position, source_alias, target_alias } => {
                let source = resolve_alias(aliases, source_alias, position)?.clone();
                let target = resolve_alias(aliases, target_alias, position)?.clone();
                builder.collect_definition(source, target);
            }
        }
    }

    let expectations = builder.freeze();
    tracing::info!(
        "collected expectations: {} completion queries, {} diagnostics, {} formats, {} definitions",
        expectations.completion_count(),
        expectations.diagnostic_record_count(),
        expectations.format_count(),
        expectations.definition_count(),
    );
    Ok(expectations)
}

fn resolve_alias<'a>(
    aliases: &'a AliasTable,
    name: &str,
    at: &SourcePosition,
) -> Result<&'a SourceRange, HarnessError> {
    aliases.get(name).ok_or_else(|| {
        HarnessError::fixture(
            &at.file,
            at.line,
            format!("reference to undeclared alias \"{name}\""),
        )
    })
}

/// Mutable half of the tables, alive only during collection.
#[derive(Debug, Default)]
struct ExpectationBuilder {
    diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
    catalog: BTreeMap<SourcePosition, CompletionItem>,
    completions: BTreeMap<SourcePosition, Vec<SourcePosition>>,
    formats: BTreeMap<PathBuf, String>,
    definitions: BTreeMap<SourceRange, SourceRange>,
}

impl ExpectationBuilder {
    /// An empty message registers the file as "must produce zero
    /// diagnostics" without contributing a record.
    fn collect_diag(&mut self, position: SourcePosition, message: &str) {
        let records = self.diagnostics.entry(position.file.clone()).or_default();
        if message.is_empty() {
            return;
        }
        let point = position.to_lsp();
        records.push(Diagnostic {
            range: Range::new(point, point),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: message.to_string(),
            ..Default::default()
        });
    }

    fn collect_item(&mut self, position: SourcePosition, spec: &ItemSpec) {
        self.catalog.insert(
            position,
            CompletionItem {
                label: spec.label.clone(),
                detail: Some(spec.detail.clone()),
                kind: Some(spec.kind),
                ..Default::default()
            },
        );
    }

    fn collect_complete(&mut self, position: SourcePosition, keys: Vec<SourcePosition>) {
        self.completions.insert(position, keys);
    }

    /// Obtains the expected text by running the reference formatter on the
    /// exported file. When the formatter's output equals the file's current
    /// content, the stored expectation is empty: no edit should be produced.
    fn collect_format(&mut self, file: &Path, formatter: &[String]) -> Result<(), HarnessError> {
        let output = match formatter.split_first() {
            None => String::new(),
            Some((program, args)) => {
                match Command::new(program).args(args).arg(file).output() {
                    Ok(out) => {
                        if !out.status.success() {
                            tracing::debug!(
                                "reference formatter exited with {} on {} (tolerated)",
                                out.status,
                                file.display()
                            );
                        }
                        String::from_utf8_lossy(&out.stdout).into_owned()
                    }
                    Err(e) => {
                        tracing::debug!(
                            "reference formatter {program} failed on {}: {e} (tolerated)",
                            file.display()
                        );
                        String::new()
                    }
                }
            }
        };
        let current = std::fs::read_to_string(file).map_err(|e| HarnessError::Export {
            path: file.to_path_buf(),
            source: e,
        })?;
        let expected = if output == current { String::new() } else { output };
        self.formats.insert(file.to_path_buf(), expected);
        Ok(())
    }

    fn collect_definition(&mut self, source: SourceRange, target: SourceRange) {
        self.definitions.insert(source, target);
    }

    fn freeze(self) -> Expectations {
        Expectations {
            diagnostics: self.diagnostics,
            catalog: self.catalog,
            completions: self.completions,
            formats: self.formats,
            definitions: self.definitions,
        }
    }
}
