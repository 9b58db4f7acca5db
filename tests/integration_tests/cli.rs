use std::process::Command;

use super::{fixture, jstree, run_with_stdin};

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_lock_tree_from_file() {
    let output = jstree()
        .arg(fixture("contention.txt"))
        .args(["--color", "never", "--section", "locks"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
LOCK CONTENTION
---------------
db-writer
  holds <0x00000007a0c00010> (Ledger), blocking 3 threads
├── http-1
│     holds <0x00000007a0c00020> (Session), blocking 1 thread
│   └── http-3
└── http-2
"
    );
}

#[test]
fn test_reads_stdin() {
    let input = std::fs::read_to_string(fixture("contention.txt")).unwrap();
    let mut cmd = jstree();
    cmd.args(["-", "--color", "never", "--section", "stats"]);
    let output = run_with_stdin(cmd, &input);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("THREAD STATISTICS\n"), "{out}");
    assert!(out.contains("Threads                 5\n"), "{out}");
    assert!(out.contains("BLOCKED                 3\n"), "{out}");
    assert!(out.contains("Blocked by others       3\n"), "{out}");
}

#[test]
fn test_sections_in_requested_order() {
    let output = jstree()
        .arg(fixture("contention.txt"))
        .args(["--color", "never", "--section", "oldest", "--section", "urls"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
OLDEST REQUESTS
---------------
    1m 00s  exec-7 | request=7f3a client=acme url=/checkout started=2024-05-02T08:59:00

TOP URLS
--------
     1  /checkout
"
    );
}

#[test]
fn test_reports_deadlock() {
    let output = jstree()
        .arg(fixture("deadlock.txt"))
        .args(["--color", "never", "--section", "deadlocks"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stdout(&output).contains("transfer-2 -> transfer-1 -> transfer-2\n"),
        "{}",
        stdout(&output)
    );
}

#[test]
fn test_full_report_has_every_section() {
    let output = jstree()
        .arg(fixture("deadlock.txt"))
        .args(["--color", "never"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    for heading in [
        "THREAD STATISTICS",
        "LOCK CONTENTION",
        "DEADLOCKS",
        "OLDEST REQUESTS",
        "YOUNGEST REQUESTS",
        "TOP URLS",
        "TOP CLIENTS",
        "LONGEST TRACES",
    ] {
        assert!(out.contains(heading), "missing {heading}:\n{out}");
    }
}

#[test]
fn test_color_always() {
    let output = jstree()
        .arg(fixture("contention.txt"))
        .args(["--color", "always", "--section", "locks"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("\u{1b}["));
}

#[test]
fn test_color_auto_is_plain_when_piped() {
    let output = jstree()
        .arg(fixture("contention.txt"))
        .args(["--section", "locks"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!stdout(&output).contains('\u{1b}'));
}

#[test]
fn test_config_file_sets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "color = \"never\"\ntop = 1\nsections = [\"traces\"]\n").unwrap();

    let output = jstree()
        .arg(fixture("contention.txt"))
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
LONGEST TRACES
--------------
     3  db-writer
"
    );
}

#[test]
fn test_flags_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "top = 1\nsections = [\"traces\"]\n").unwrap();

    let output = jstree()
        .env("JSTREE_CONFIG_PATH", &config)
        .arg(fixture("contention.txt"))
        .args(["--color", "never", "--top", "2"])
        .output()
        .expect("Failed to run jstree");

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
LONGEST TRACES
--------------
     3  db-writer
     3  http-1
"
    );
}

#[test]
fn test_unparseable_line_fails() {
    let mut cmd = jstree();
    cmd.arg("-");
    let output = run_with_stdin(cmd, "2024-05-02 09:00:00\n\"t\" tid=0x1 nid=0x2 runnable\ngarbage\n");

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(
        err.contains("line 3: unexpected line in state block-start: \"garbage\""),
        "{err}"
    );
}

#[test]
fn test_missing_file_fails() {
    let output = jstree()
        .arg("/nonexistent/path/to/dump.txt")
        .output()
        .expect("Failed to run jstree");

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to read"), "{}", stderr(&output));
}

#[test]
fn test_unknown_section_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_jstree"))
        .args(["--section", "bogus"])
        .output()
        .expect("Failed to run jstree");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("bogus"));
}

#[test]
fn test_input_without_threads_warns() {
    let mut cmd = jstree();
    cmd.args(["-", "--color", "never", "--section", "stats"]);
    let output = run_with_stdin(cmd, "NullPointerException in attach listener\n");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("No thread blocks found"), "{}", stderr(&output));
    assert!(stdout(&output).contains("Threads                 0\n"));
}
