pub mod check;
pub mod config;
pub mod diff;
pub mod error;
pub mod expect;
pub mod fixture;
pub mod marker;
pub mod report;
pub mod server;
pub mod suite;
pub mod types;

pub use config::{ExpectedCounts, HarnessConfig, RunToggles};
pub use error::HarnessError;
pub use expect::Expectations;
pub use fixture::FixtureTree;
pub use report::{CapabilityReport, RunReport};
pub use server::AnalysisServer;
pub use suite::Suite;
pub use types::{SourcePosition, SourceRange, DIAGNOSTIC_SOURCE};
