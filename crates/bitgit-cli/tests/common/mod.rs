//! Shared test harness for bitgit-cli integration tests.
//!
//! Runs the compiled binary with a pinned environment so that a repository
//! surrounding the temporary directory, or the caller's `GIT_DIR`, can never
//! leak into a test.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ──────────────────────────── Types ────────────────────────────

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }
}

// ──────────────────────────── Process Runners ────────────────────────────

fn command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bitgit"));
    cmd.args(args)
        .current_dir(dir)
        .env_remove("GIT_DIR")
        .env_remove("BITGIT_LOG")
        .env("GIT_CEILING_DIRECTORIES", ceiling_for(dir))
        .env("LC_ALL", "C");
    cmd
}

/// Searches stop below the system temp directory.
fn ceiling_for(dir: &Path) -> PathBuf {
    let tmp = std::fs::canonicalize(std::env::temp_dir()).unwrap();
    let dir = std::fs::canonicalize(dir).unwrap();
    if dir.starts_with(&tmp) {
        tmp
    } else {
        dir.parent().map(Path::to_path_buf).unwrap_or(dir)
    }
}

/// Run bitgit in `dir` with the given arguments.
pub fn bitgit(dir: &Path, args: &[&str]) -> CommandResult {
    let output = command(dir, args).output().expect("failed to run bitgit");
    CommandResult {
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Run bitgit with piped stdin in `dir`.
pub fn bitgit_stdin(dir: &Path, args: &[&str], stdin_bytes: &[u8]) -> CommandResult {
    let mut cmd = command(dir, args);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("failed to spawn bitgit");
    child.stdin.take().unwrap().write_all(stdin_bytes).unwrap();
    let output = child.wait_with_output().expect("failed to wait on bitgit");
    CommandResult {
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

// ──────────────────────────── Assertion Helpers ────────────────────────────

/// Assert a zero exit status, showing stderr otherwise.
pub fn assert_success(result: &CommandResult) {
    assert_eq!(
        result.exit_code, 0,
        "command failed (exit {}):\nstderr: {}",
        result.exit_code, result.stderr,
    );
}

/// Assert git's fatal exit status and a `fatal:` message.
pub fn assert_fatal(result: &CommandResult) {
    assert_eq!(result.exit_code, 128, "stderr: {}", result.stderr);
    assert!(result.stderr.starts_with("fatal: "), "stderr: {}", result.stderr);
}

// ──────────────────────────── Repo Setup Helpers ────────────────────────────

/// Initialize a repository in `dir` through the binary.
pub fn setup_empty_repo(dir: &Path) {
    assert_success(&bitgit(dir, &["init", "-q"]));
}

/// Store `content` as a blob and return its id.
pub fn store_blob(dir: &Path, content: &[u8]) -> String {
    let result = bitgit_stdin(dir, &["hash-object", "-w", "--stdin"], content);
    assert_success(&result);
    result.stdout_str().trim().to_string()
}
