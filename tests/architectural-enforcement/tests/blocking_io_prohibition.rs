//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async code in `stego-core` and `stego-tui` must not block the
//! runtime. File, network and process I/O inside an `async fn` goes through
//! `tokio::fs`, `tokio::net`, `tokio::process` or async `reqwest`.
//!
//! Blocking calls are fine in plain functions that run before the runtime
//! starts or off the async path (config loading, log file setup) and in tests.

use architectural_enforcement::{blocking_io_rule, production_dirs, scan};

#[test]
fn test_no_blocking_io_in_async_code() {
    let violations = scan(&production_dirs(), blocking_io_rule);

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O found inside async functions:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nUse tokio::fs, tokio::net, tokio::process or async reqwest instead.");
        panic!(
            "Found {} blocking I/O violation(s) in production code",
            violations.len()
        );
    }
}

#[test]
fn test_production_dirs_exist() {
    for dir in production_dirs() {
        assert!(dir.is_dir(), "missing source directory {}", dir.display());
    }
}
