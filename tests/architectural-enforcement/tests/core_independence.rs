//! Integration Test: Core Independence
//!
//! **Policy**: `stego-core` is headless. It must not depend on terminal or
//! UI crates, so any surface can embed it.

use std::fs;

use architectural_enforcement::{production_lines, rust_sources, scan, workspace_root};

const UI_CRATES: [&str; 2] = ["ratatui", "crossterm"];

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = workspace_root().join("stego/core/Cargo.toml");
    let content = fs::read_to_string(&manifest).expect("read stego-core manifest");

    for line in production_lines(&content) {
        let key = line.split('=').next().unwrap_or("").trim();
        assert!(
            !UI_CRATES.contains(&key),
            "stego-core must not depend on {key}"
        );
    }
}

#[test]
fn test_core_sources_do_not_use_ui_crates() {
    let core = workspace_root().join("stego/core/src");
    assert!(!rust_sources(&core).is_empty());

    let violations = scan(&[core], |lines, idx| {
        let code = lines[idx];
        UI_CRATES
            .iter()
            .any(|name| code.contains(&format!("{name}::")))
            .then_some("UI crate in stego-core")
    });

    assert!(
        violations.is_empty(),
        "stego-core references UI crates:\n{}",
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
}

#[test]
fn test_core_does_not_depend_on_tui() {
    let manifest = workspace_root().join("stego/core/Cargo.toml");
    let content = fs::read_to_string(&manifest).expect("read stego-core manifest");
    assert!(!content.contains("stego-tui"));
}
