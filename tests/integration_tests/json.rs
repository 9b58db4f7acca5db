use serde_json::Value;

use super::{fixture, jstree};

fn dump_json(name: &str) -> Value {
    let output = jstree()
        .arg(fixture(name))
        .args(["--format", "json"])
        .output()
        .expect("Failed to run jstree");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_json_carries_reconciled_locks() {
    let dump = dump_json("contention.txt");

    assert_eq!(dump["date"], "2024-05-02T09:00:00");
    let threads = dump["threads"].as_array().unwrap();
    assert_eq!(threads.len(), 5);

    let http1 = &threads[1];
    assert_eq!(http1["name"], "http-1");
    assert_eq!(http1["thread_state"], "BLOCKED");
    assert_eq!(http1["daemon"], true);
    assert_eq!(http1["locked"][0]["object_id"], "0x00000007a0c00020");
    assert_eq!(http1["waiting_on"]["object_id"], "0x00000007a0c00010");
    assert_eq!(http1["waiting_on"]["wait_kind"], "synchronized");
    assert!(http1.get("lines").is_none());

    // Threads holding nothing omit the field.
    assert!(threads[2].get("locked").is_none());
}

#[test]
fn test_json_frames_are_parsed() {
    let dump = dump_json("contention.txt");
    let trace = &dump["threads"][1]["trace"];

    assert_eq!(trace[0]["type"], "frame");
    assert_eq!(trace[0]["class"], "com.example.ledger.Ledger");
    assert_eq!(trace[0]["method"], "post");
    assert_eq!(trace[0]["file"], "Ledger.java");
    assert_eq!(trace[0]["line"], 51);

    assert_eq!(trace[1]["type"], "dash");
    assert_eq!(trace[1]["kind"], "waiting_synchronized");
    assert_eq!(trace[1]["object_class"], "com.example.ledger.Ledger");
}

#[test]
fn test_json_request_info() {
    let dump = dump_json("contention.txt");
    let request = &dump["threads"][4]["request"];

    assert_eq!(request["base"], "exec-7");
    assert_eq!(request["client"], "acme");
    assert_eq!(request["url"], "/checkout");
    assert_eq!(request["started"], "2024-05-02T08:59:00");
}
