//! Integration Test: Thread Sleep Prohibition
//!
//! **Policy**: production code never parks a runtime thread. Frame pacing in
//! the TUI and simulated latency in tests use `tokio::time::sleep`.

use architectural_enforcement::{production_dirs, scan, thread_sleep_rule};

#[test]
fn test_no_thread_sleep_in_production_code() {
    let violations = scan(&production_dirs(), thread_sleep_rule);

    if !violations.is_empty() {
        eprintln!("\nThread sleeps found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!(
            "Found {} thread sleep(s); use tokio::time::sleep",
            violations.len()
        );
    }
}
