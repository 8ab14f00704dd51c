//! Verdict accumulation and reporting.
//!
//! Content mismatches and count drift are recoverable: they are recorded
//! here and checking continues, so one run surfaces every mismatch. A group
//! passes only if it finished with zero recorded failures.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityReport {
    pub capability: &'static str,
    /// Entries actually checked against the server.
    pub checked: usize,
    pub failures: Vec<String>,
    /// True when the capability was disabled by configuration.
    pub skipped: bool,
}

impl CapabilityReport {
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            checked: 0,
            failures: Vec::new(),
            skipped: false,
        }
    }

    pub fn skipped(capability: &'static str) -> Self {
        Self {
            skipped: true,
            ..Self::new(capability)
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        tracing::error!("{}: {}", self.capability, message);
        self.failures.push(message);
    }

    /// Drift check: the observed table size no longer matches the pinned
    /// constant. Independent of content failures.
    pub(crate) fn check_count(&mut self, observed: usize, expected: usize) {
        if observed != expected {
            self.fail(format!(
                "got {observed} {} expectations, want {expected}",
                self.capability
            ));
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub completion: CapabilityReport,
    pub diagnostics: CapabilityReport,
    pub format: CapabilityReport,
    pub definition: CapabilityReport,
}

impl RunReport {
    pub fn groups(&self) -> [&CapabilityReport; 4] {
        [
            &self.completion,
            &self.diagnostics,
            &self.format,
            &self.definition,
        ]
    }

    pub fn passed(&self) -> bool {
        self.groups().iter().all(|g| g.passed())
    }

    /// Every failure message across all groups, in group order.
    pub fn failures(&self) -> impl Iterator<Item = &str> {
        self.groups()
            .into_iter()
            .flat_map(|g| g.failures.iter().map(String::as_str))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in self.groups() {
            if group.skipped {
                writeln!(f, "{}: skipped", group.capability)?;
                continue;
            }
            writeln!(
                f,
                "{}: {} ({} checked, {} failed)",
                group.capability,
                if group.passed() { "ok" } else { "FAILED" },
                group.checked,
                group.failures.len()
            )?;
            for failure in &group.failures {
                for line in failure.lines() {
                    writeln!(f, "    {line}")?;
                }
            }
        }
        Ok(())
    }
}
