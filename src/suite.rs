//! Suite orchestration.
//!
//! One evaluation pass per fixture tree: export the annotated templates,
//! extract markers (pass 1 registers aliases, pass 2 fills the tables),
//! freeze, then run the four verdict groups sequentially. The groups touch
//! disjoint tables and issue independent requests, so their order carries no
//! semantic weight; it is fixed anyway so reports are stable run to run.

use std::path::Path;

use crate::check;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::expect::{self, Expectations};
use crate::fixture::FixtureTree;
use crate::marker;
use crate::report::{CapabilityReport, RunReport};
use crate::server::AnalysisServer;

#[derive(Debug)]
pub struct Suite {
    fixtures: FixtureTree,
    expectations: Expectations,
    config: HarnessConfig,
}

impl Suite {
    /// Loads a suite from an annotated template directory, picking up an
    /// optional `conformance.toml` next to the fixtures.
    pub fn load(template_dir: &Path) -> Result<Self, HarnessError> {
        let config = HarnessConfig::load(template_dir)?;
        Self::load_with(template_dir, config)
    }

    pub fn load_with(template_dir: &Path, config: HarnessConfig) -> Result<Self, HarnessError> {
        let fixtures = FixtureTree::export(template_dir)?;

        let mut markers = Vec::new();
        for file in fixtures.files() {
            let text = fixtures.read(file)?;
            markers.extend(marker::parse_file(file, &text)?);
        }

        let aliases = marker::register_aliases(&markers)?;
        let expectations = expect::collect(&markers, &aliases, &config)?;

        Ok(Self {
            fixtures,
            expectations,
            config,
        })
    }

    pub fn fixtures(&self) -> &FixtureTree {
        &self.fixtures
    }

    pub fn expectations(&self) -> &Expectations {
        &self.expectations
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs all enabled verdict groups against `server`. Expectation tables
    /// are frozen before this is ever callable, so re-running against an
    /// unchanged server yields an identical report.
    pub async fn run<S: AnalysisServer + Sync + ?Sized>(
        &self,
        server: &S,
    ) -> Result<RunReport, HarnessError> {
        let toggles = self.config.run;
        let counts = self.config.expected;
        let strict = self.config.strict_counts;

        let completion = if toggles.completion {
            check::completion::run(&self.expectations, server, strict.then_some(counts.completions))
                .await?
        } else {
            CapabilityReport::skipped("completion")
        };
        let diagnostics = if toggles.diagnostics {
            check::diagnostics::run(&self.expectations, server, strict.then_some(counts.diagnostics))
                .await?
        } else {
            CapabilityReport::skipped("diagnostics")
        };
        let format = if toggles.format {
            check::format::run(&self.expectations, server, strict.then_some(counts.formats)).await?
        } else {
            CapabilityReport::skipped("format")
        };
        let definition = if toggles.definition {
            check::definition::run(&self.expectations, server, strict.then_some(counts.definitions))
                .await?
        } else {
            CapabilityReport::skipped("definition")
        };

        let report = RunReport {
            completion,
            diagnostics,
            format,
            definition,
        };
        tracing::info!(
            "conformance run {}",
            if report.passed() { "passed" } else { "failed" }
        );
        Ok(report)
    }

    /// Convenience entry point for synchronous test functions.
    pub fn run_blocking<S: AnalysisServer + Sync + ?Sized>(
        &self,
        server: &S,
    ) -> Result<RunReport, HarnessError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build tokio runtime");
        runtime.block_on(self.run(server))
    }
}
