//! Expected-vs-got rendering for failure messages.

use std::fmt::Debug;

/// Renders both collections one element per line under a header, so a
/// mismatch can be located in the fixture without re-running with extra
/// verbosity. Pure function; the only consumer is the failure log.
pub fn render<T: Debug>(header: &str, expected: &[T], actual: &[T]) -> String {
    let mut out = String::new();
    out.push_str(header);
    out.push_str(":\nexpected:\n");
    for item in expected {
        out.push_str(&format!("  {item:?}\n"));
    }
    out.push_str("got:\n");
    for item in actual {
        out.push_str(&format!("  {item:?}\n"));
    }
    out
}
