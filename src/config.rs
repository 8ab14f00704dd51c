//! Harness configuration.
//!
//! A fixture template directory may carry a `conformance.toml` next to the
//! annotated files:
//!
//! ```toml
//! formatter = ["gofmt"]
//! strict_counts = true
//!
//! [expected]
//! completions = 43
//! diagnostics = 14
//! formats = 3
//! definitions = 16
//!
//! [run]
//! format = false
//! ```
//!
//! `strict_counts` replaces a version-conditional global in the original
//! harness: when set, each verdict runner checks the number of collected
//! expectations against the pinned totals, catching fixtures that silently
//! fell out of (or crept into) the tree.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::HarnessError;

pub const CONFIG_FILE: &str = "conformance.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HarnessConfig {
    /// Reference-formatter argv; the fixture file path is appended as the
    /// final argument. Empty means no reference formatter is available and
    /// every `format` expectation collects as "no edit expected".
    #[serde(default)]
    pub formatter: Vec<String>,

    /// Enforce `expected` totals per capability table.
    #[serde(default)]
    pub strict_counts: bool,

    #[serde(default)]
    pub expected: ExpectedCounts,

    #[serde(default)]
    pub run: RunToggles,
}

/// Pinned per-capability expectation totals, used only under `strict_counts`.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct ExpectedCounts {
    #[serde(default)]
    pub completions: usize,
    #[serde(default)]
    pub diagnostics: usize,
    #[serde(default)]
    pub formats: usize,
    #[serde(default)]
    pub definitions: usize,
}

/// Per-capability enablement.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RunToggles {
    #[serde(default = "true_bool")]
    pub completion: bool,
    #[serde(default = "true_bool")]
    pub diagnostics: bool,
    #[serde(default = "true_bool")]
    pub format: bool,
    #[serde(default = "true_bool")]
    pub definition: bool,
}

impl Default for RunToggles {
    fn default() -> Self {
        Self {
            completion: true,
            diagnostics: true,
            format: true,
            definition: true,
        }
    }
}

fn true_bool() -> bool {
    true
}

impl HarnessConfig {
    /// Reads `conformance.toml` from `dir` when present, otherwise returns
    /// the defaults.
    pub fn load(dir: &Path) -> Result<Self, HarnessError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| HarnessError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| HarnessError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!("loaded harness config from {}", path.display());
        Ok(config)
    }
}
