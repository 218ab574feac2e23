//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `moltphone` binary and check exit codes
//! and output for paths that never reach a live API: argument errors,
//! missing credentials and an unreachable base URL.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

// Nothing listens on port 9 (discard) on a test machine.
const DEAD_BASE_URL: &str = "http://127.0.0.1:9";

/// `moltphone` with credential, base URL and proxy variables cleared and the
/// working directory set to the crate root so no stray `.env` is picked up
/// from elsewhere.
fn moltphone() -> Command {
    let mut cmd = cargo_bin_cmd!("moltphone");
    cmd.current_dir(Path::new(env!("CARGO_MANIFEST_DIR")))
        .env_remove("MOLTPHONE_API_KEY")
        .env_remove("MOLTPHONE_API_BASE")
        .env_remove("RUST_LOG");
    for proxy in ["HTTP_PROXY", "HTTPS_PROXY", "ALL_PROXY", "http_proxy", "https_proxy", "all_proxy"] {
        cmd.env_remove(proxy);
    }
    cmd
}

// ──────────────────────────────────────────────
// Help and version
// ──────────────────────────────────────────────

#[test]
fn help_lists_commands() {
    moltphone()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MoltPhone AI call tool"))
        .stdout(predicate::str::contains("transcript"))
        .stdout(predicate::str::contains("calls"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn version_exits_0() {
    moltphone()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("moltphone"));
}

#[test]
fn call_help_lists_overrides() {
    moltphone()
        .args(["call", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--system-prompt"))
        .stdout(predicate::str::contains("--first-message"))
        .stdout(predicate::str::contains("--error-message"))
        .stdout(predicate::str::contains("--model"));
}

// ──────────────────────────────────────────────
// Argument errors
// ──────────────────────────────────────────────

#[test]
fn call_requires_to() {
    moltphone()
        .arg("call")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--to"));
}

#[test]
fn overrides_without_to_are_rejected() {
    moltphone()
        .args(["--model", "gpt-4o", "--base-url", DEAD_BASE_URL])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--to"));
}

#[test]
fn non_numeric_limit_is_rejected() {
    moltphone()
        .args(["calls", "--limit", "many"])
        .assert()
        .code(2);
}

// ──────────────────────────────────────────────
// Missing credential: no request is sent
// ──────────────────────────────────────────────

#[test]
fn transcript_without_key_exits_2() {
    moltphone()
        .args(["transcript", "--base-url", DEAD_BASE_URL])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MOLTPHONE_API_KEY"));
}

#[test]
fn calls_without_key_exits_2() {
    moltphone()
        .args(["calls", "--base-url", DEAD_BASE_URL])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("MOLTPHONE_API_KEY"));
}

#[test]
fn blank_key_counts_as_missing() {
    moltphone()
        .env("MOLTPHONE_API_KEY", "")
        .args(["balance", "--base-url", DEAD_BASE_URL])
        .assert()
        .code(2);
}

// ──────────────────────────────────────────────
// Unreachable API
// ──────────────────────────────────────────────

#[test]
fn health_unreachable_exits_3() {
    moltphone()
        .args(["health", "--base-url", DEAD_BASE_URL])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("API unreachable"));
}

#[test]
fn to_shortcut_places_a_call() {
    // No key: webapp mode, so the banner shows the task before the
    // request fails.
    moltphone()
        .args(["--to", "+15551234567", "--base-url", DEAD_BASE_URL])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("📞 Calling +15551234567..."))
        .stdout(predicate::str::contains("Task:"))
        .stderr(predicate::str::contains("API unreachable"));
}

#[test]
fn keyed_call_shows_prompt_preview() {
    moltphone()
        .env("MOLTPHONE_API_KEY", "mp_test_key")
        .args([
            "call",
            "--to",
            "+15551234567",
            "--system-prompt",
            "Book a table for two at eight",
            "--base-url",
            DEAD_BASE_URL,
        ])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Prompt: Book a table for two at eight..."));
}

#[test]
fn base_url_env_var_is_used() {
    moltphone()
        .env("MOLTPHONE_API_BASE", DEAD_BASE_URL)
        .arg("health")
        .assert()
        .code(3);
}
