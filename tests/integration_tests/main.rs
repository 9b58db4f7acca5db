//! Integration tests driving the `jstree` binary.

mod cli;
mod json;

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// `jstree` with an isolated config and no inherited color settings.
pub fn jstree() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jstree"));
    cmd.env("JSTREE_CONFIG_PATH", fixture("no-such-config.toml"))
        .env_remove("CLICOLOR_FORCE")
        .env_remove("RUST_LOG");
    cmd
}

/// Run `cmd` with `input` piped to stdin.
pub fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn jstree");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .expect("Failed to write to stdin");

    child.wait_with_output().expect("Failed to read output")
}
