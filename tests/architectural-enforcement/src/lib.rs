//! Architectural Enforcement
//!
//! Source scanners shared by the integration tests in `tests/`. They enforce:
//! - No blocking I/O inside async functions
//! - No thread sleeps in production code
//! - `stego-core` stays free of terminal and UI crates
//!
//! The scanners are line based. Code after the first `#[cfg(test)]` in a file
//! is treated as test code and skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// A rule violation at a source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the violation is in
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// What rule was broken
    pub rule: &'static str,
    /// The offending line, trimmed
    pub code: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.rule,
            self.code
        )
    }
}

/// Workspace root, two levels above this crate
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Production source directories checked by the scanners
pub fn production_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    vec![root.join("stego/core/src"), root.join("tui/src")]
}

/// Every `.rs` file under `dir`
pub fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Lines before the test module, without trailing `//` comments
pub fn production_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .take_while(|line| line.trim() != "#[cfg(test)]")
        .map(|line| line.split("//").next().unwrap_or(line))
        .collect()
}

/// Whether a trimmed line opens a function
fn is_fn_header(line: &str) -> bool {
    let line = line.trim_start();
    let rest = line
        .strip_prefix("pub(crate) ")
        .or_else(|| line.strip_prefix("pub "))
        .unwrap_or(line);
    let rest = rest.strip_prefix("async ").unwrap_or(rest);
    rest.starts_with("fn ")
}

/// Header line of the function enclosing `idx`, if any
///
/// Walks backwards to the nearest function header, stopping at `mod` and
/// `impl` blocks.
pub fn enclosing_fn<'a>(lines: &[&'a str], idx: usize) -> Option<&'a str> {
    for line in lines[..=idx].iter().rev() {
        let trimmed = line.trim();
        if is_fn_header(trimmed) {
            return Some(trimmed);
        }
        if trimmed.starts_with("mod ") || (trimmed.starts_with("impl") && trimmed.contains('{')) {
            return None;
        }
    }
    None
}

/// Whether the line at `idx` sits inside an `async fn`
pub fn in_async_fn(lines: &[&str], idx: usize) -> bool {
    enclosing_fn(lines, idx).is_some_and(|header| header.contains("async fn "))
}

/// Run `check` over the production lines of every source file in `dirs`
pub fn scan<F>(dirs: &[PathBuf], mut check: F) -> Vec<Violation>
where
    F: FnMut(&[&str], usize) -> Option<&'static str>,
{
    let mut violations = Vec::new();
    for dir in dirs {
        for path in rust_sources(dir) {
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let lines = production_lines(&content);
            for idx in 0..lines.len() {
                if let Some(rule) = check(&lines, idx) {
                    violations.push(Violation {
                        path: path.clone(),
                        line: idx + 1,
                        rule,
                        code: lines[idx].trim().to_string(),
                    });
                }
            }
        }
    }
    violations
}

/// Blocking I/O rule for one line
pub fn blocking_io_rule(lines: &[&str], idx: usize) -> Option<&'static str> {
    let code = lines[idx];
    if code.trim_start().starts_with("use ") {
        return None;
    }

    let rule = if code.contains("std::fs::") {
        "Blocking file I/O"
    } else if code.contains("std::net::") {
        "Blocking network I/O"
    } else if code.contains("std::process::Command") {
        "Blocking process I/O"
    } else if code.contains("reqwest::blocking") {
        return Some("Blocking HTTP client");
    } else {
        return None;
    };

    in_async_fn(lines, idx).then_some(rule)
}

/// Thread sleep rule for one line
pub fn thread_sleep_rule(lines: &[&str], idx: usize) -> Option<&'static str> {
    let code = lines[idx];
    (code.contains("std::thread::sleep") || code.contains("thread::sleep("))
        .then_some("Thread sleep")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_tests() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests {}\n";
        assert_eq!(production_lines(content), vec!["fn a() {}"]);
    }

    #[test]
    fn test_comments_are_dropped() {
        let content = "let x = 1; // std::fs::read";
        assert_eq!(production_lines(content), vec!["let x = 1; "]);
    }

    #[test]
    fn test_enclosing_fn() {
        let lines = vec![
            "impl Foo {",
            "    pub async fn load(&self) {",
            "        std::fs::read(\"x\");",
            "    }",
            "    fn sync(&self) {",
            "        std::fs::read(\"x\");",
            "    }",
            "}",
        ];
        assert!(in_async_fn(&lines, 2));
        assert!(!in_async_fn(&lines, 5));
        assert_eq!(enclosing_fn(&lines, 0), None);
    }

    #[test]
    fn test_blocking_rule_ignores_imports_and_sync_fns() {
        let lines = vec![
            "use std::fs;",
            "fn read_config() {",
            "    std::fs::read_to_string(\"c\");",
            "}",
            "async fn handler() {",
            "    std::fs::read_to_string(\"c\");",
            "}",
        ];
        assert_eq!(blocking_io_rule(&lines, 0), None);
        assert_eq!(blocking_io_rule(&lines, 2), None);
        assert_eq!(blocking_io_rule(&lines, 5), Some("Blocking file I/O"));
    }

    #[test]
    fn test_blocking_http_client_is_always_flagged() {
        let lines = vec!["fn build() {", "    reqwest::blocking::Client::new();", "}"];
        assert_eq!(blocking_io_rule(&lines, 1), Some("Blocking HTTP client"));
    }

    #[test]
    fn test_sleep_rule() {
        let lines = vec![
            "tokio::time::sleep(d).await;",
            "std::thread::sleep(d);",
        ];
        assert_eq!(thread_sleep_rule(&lines, 0), None);
        assert_eq!(thread_sleep_rule(&lines, 1), Some("Thread sleep"));
    }
}
