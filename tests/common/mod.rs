//! Shared test scaffolding: a template-tree builder and a scripted server.

#![allow(dead_code)]

use async_trait::async_trait;
use lsp_conformance::{AnalysisServer, Expectations};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tower_lsp::lsp_types::{
    CompletionItem, Diagnostic, Location, Position, Range, TextEdit, Url,
};

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// An annotated template directory, removed on drop.
pub struct TemplateTree {
    dir: TempDir,
}

impl TemplateTree {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: tempfile::tempdir().expect("failed to create template dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create template subdir");
        }
        let mut file = File::create(&path).expect("failed to create template file");
        write!(file, "{content}").expect("failed to write template file");
        path
    }
}

type PointKey = (String, u32, u32);

/// A scripted stand-in for the server under test. Responses are programmed
/// per request key; anything unprogrammed answers with an empty list.
#[derive(Default)]
pub struct FakeServer {
    completions: HashMap<PointKey, Vec<CompletionItem>>,
    diagnostics: HashMap<String, Vec<Diagnostic>>,
    formats: HashMap<String, Vec<TextEdit>>,
    definitions: HashMap<PointKey, Vec<Location>>,
    failing: HashSet<&'static str>,
}

fn point_key(uri: &Url, position: Position) -> PointKey {
    (uri.to_string(), position.line, position.character)
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A server programmed to answer every expectation exactly.
    pub fn conforming(expectations: &Expectations) -> Self {
        let mut server = Self::new();
        for (position, keys) in expectations.completion_queries() {
            let items = keys
                .iter()
                .map(|k| {
                    expectations
                        .catalog_item(k)
                        .expect("validated at collection")
                        .clone()
                })
                .collect();
            let uri = position.uri().expect("absolute fixture path");
            server.set_completions(&uri, position.to_lsp(), items);
        }
        for (path, want) in expectations.diagnostics() {
            let uri = Url::from_file_path(path).expect("absolute fixture path");
            server.set_diagnostics(&uri, want.to_vec());
        }
        for (path, want) in expectations.formats() {
            let uri = Url::from_file_path(path).expect("absolute fixture path");
            let edits = if want.is_empty() {
                vec![]
            } else {
                vec![whole_document_edit(want)]
            };
            server.set_format_edits(&uri, edits);
        }
        for (source, target) in expectations.definitions() {
            let uri = source.uri().expect("absolute fixture path");
            let location = Location::new(
                target.uri().expect("absolute fixture path"),
                target.to_lsp(),
            );
            server.set_definitions(&uri, source.start.to_lsp(), vec![location]);
        }
        server
    }

    pub fn set_completions(&mut self, uri: &Url, position: Position, items: Vec<CompletionItem>) {
        self.completions.insert(point_key(uri, position), items);
    }

    pub fn set_diagnostics(&mut self, uri: &Url, diagnostics: Vec<Diagnostic>) {
        self.diagnostics.insert(uri.to_string(), diagnostics);
    }

    pub fn set_format_edits(&mut self, uri: &Url, edits: Vec<TextEdit>) {
        self.formats.insert(uri.to_string(), edits);
    }

    pub fn set_definitions(&mut self, uri: &Url, position: Position, locations: Vec<Location>) {
        self.definitions.insert(point_key(uri, position), locations);
    }

    /// Make the named capability return an error on every request.
    pub fn fail_on(&mut self, capability: &'static str) {
        self.failing.insert(capability);
    }

    fn check_failure(&self, capability: &'static str) -> anyhow::Result<()> {
        if self.failing.contains(capability) {
            anyhow::bail!("scripted {capability} failure");
        }
        Ok(())
    }
}

pub fn whole_document_edit(new_text: &str) -> TextEdit {
    TextEdit::new(
        Range::new(Position::new(0, 0), Position::new(u32::MAX, 0)),
        new_text.to_string(),
    )
}

#[async_trait]
impl AnalysisServer for FakeServer {
    async fn completion(
        &self,
        uri: &Url,
        position: Position,
    ) -> anyhow::Result<Vec<CompletionItem>> {
        self.check_failure("completion")?;
        Ok(self
            .completions
            .get(&point_key(uri, position))
            .cloned()
            .unwrap_or_default())
    }

    async fn diagnostics(&self, uri: &Url) -> anyhow::Result<Vec<Diagnostic>> {
        self.check_failure("diagnostics")?;
        Ok(self.diagnostics.get(uri.as_str()).cloned().unwrap_or_default())
    }

    async fn formatting(&self, uri: &Url) -> anyhow::Result<Vec<TextEdit>> {
        self.check_failure("formatting")?;
        Ok(self.formats.get(uri.as_str()).cloned().unwrap_or_default())
    }

    async fn definition(&self, uri: &Url, position: Position) -> anyhow::Result<Vec<Location>> {
        self.check_failure("definition")?;
        Ok(self
            .definitions
            .get(&point_key(uri, position))
            .cloned()
            .unwrap_or_default())
    }
}
