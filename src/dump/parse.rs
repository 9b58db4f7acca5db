//! Block parser and dump assembler.
//!
//! [`parse_lines`] feeds each line to [`classify`] and then hands the
//! `(state, line)` pair to [`apply_line`], which either extends the dump-level
//! prelude/epilogue buffers or the thread currently being built (always the
//! last element of [`Dump::threads`]).

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::request::RequestInfo;
use super::state::{STATE_PREFIX, State, classify};
use super::{DashEvent, DashKind, Dump, ParseError, StackFrame, Thread, ThreadState, TraceEntry};

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap());

/// Quoted name (up to the last quote) followed by the unquoted attributes.
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"(?P<name>.*)"(?P<rest>[^"]*)$"#).unwrap());

static THREAD_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)#(\d+)\b").unwrap());

static FIELD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)=(\S+)").unwrap());

static STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnid=\S+\s+(?P<status>.*?)\s*(?:\[0x[0-9a-fA-F]+\])?\s*$").unwrap()
});

static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(0x[0-9a-fA-F]+)>").unwrap());

static OBJECT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((?:a|for) (?P<class>[^\s)]+)(?: for (?P<for>[^\s)]+))?\)").unwrap()
});

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a complete `jstack` output.
pub fn parse_dump(text: &str) -> Result<Dump, ParseError> {
    parse_lines(text.lines())
}

/// Parse a `jstack` output given as lines (without their terminators).
///
/// Threads come out with their raw trace; [`crate::locks::reconcile_dump`]
/// derives the held and awaited locks.
pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Dump, ParseError> {
    let mut dump = Dump::default();
    let mut state = State::Start;
    let mut line_count = 0;

    for (index, line) in lines.into_iter().enumerate() {
        let line_number = index + 1;
        state = classify(state, line, line_number)?;
        if line_number == 1 {
            dump.date = parse_date(line);
        }
        apply_line(&mut dump, state, line);
        line_count = line_number;
    }

    log::debug!(
        "Parsed {} lines into {} threads (last state {state}, date {:?})",
        line_count,
        dump.threads.len(),
        dump.date
    );

    for thread in &mut dump.threads {
        thread.request = RequestInfo::from_thread_name(&thread.name);
    }

    Ok(dump)
}

fn parse_date(line: &str) -> Option<NaiveDateTime> {
    if !DATE.is_match(line) {
        return None;
    }
    NaiveDateTime::parse_from_str(line, DATE_FORMAT)
        .inspect_err(|e| log::debug!("First line {line:?} looks like a date but isn't: {e}"))
        .ok()
}

/// Apply one classified line to the dump under construction.
pub fn apply_line(dump: &mut Dump, state: State, line: &str) {
    match state {
        State::Prelude => dump.prelude.push(line.to_string()),
        State::Epilogue => dump.epilogue.push(line.to_string()),
        State::BlockStart => {
            let mut thread = parse_header(line);
            thread.lines.push(line.to_string());
            dump.threads.push(thread);
        }
        State::Start | State::End => {}
        _ => {
            // Prelude only leaves through BlockStart, so a thread exists here.
            let Some(thread) = dump.threads.last_mut() else {
                return;
            };
            thread.lines.push(line.to_string());
            apply_block_line(thread, state, line);
        }
    }
}

fn apply_block_line(thread: &mut Thread, state: State, line: &str) {
    let kind = match state {
        State::BlockSecond => {
            parse_state_line(thread, line);
            return;
        }
        State::Trace => {
            let raw = line.strip_prefix("\tat ").unwrap_or(line);
            thread.trace.push(TraceEntry::Frame(StackFrame::new(raw)));
            return;
        }
        State::Locked => DashKind::Locked,
        State::WaitingConcurrent => DashKind::WaitingConcurrent,
        State::WaitingNotify => DashKind::WaitingNotify,
        State::WaitingSynchronized => DashKind::WaitingSynchronized,
        State::WaitingReLock => DashKind::WaitingReLock,
        State::Eliminated => DashKind::Eliminated,
        // Ownable synchronizers, compiler task and block separators carry
        // nothing beyond the raw line.
        _ => return,
    };
    thread.trace.push(TraceEntry::Dash(parse_dash(kind, line)));
}

/// Parse a block's first line.
///
/// ```text
/// "main" #1 prio=5 os_prio=0 cpu=312.48ms elapsed=1234.56s tid=0x00007f3ad0026e90 nid=0x6d01 waiting on condition  [0x00007f3ad7ffe000]
/// ```
pub fn parse_header(line: &str) -> Thread {
    let (name, rest) = match HEADER.captures(line) {
        Some(caps) => (caps["name"].to_string(), caps.name("rest").map_or("", |m| m.as_str())),
        None => (line.trim_start_matches('"').to_string(), ""),
    };

    let mut thread = Thread {
        name,
        daemon: rest.contains(" daemon "),
        ..Thread::default()
    };

    thread.id = THREAD_ID
        .captures(rest)
        .and_then(|caps| parse_field(&thread.name, "#", &caps[1]));

    for caps in FIELD.captures_iter(rest) {
        let value = &caps[2];
        match &caps[1] {
            "prio" => thread.priority = parse_field(&thread.name, "prio", value),
            "os_prio" => thread.os_priority = parse_field(&thread.name, "os_prio", value),
            "cpu" => thread.cpu = Some(value.to_string()),
            "elapsed" => thread.elapsed = Some(value.to_string()),
            "tid" => thread.tid = value.to_string(),
            "nid" => thread.nid = Some(value.to_string()),
            _ => {}
        }
    }

    if thread.tid.is_empty() {
        log::debug!("Thread {:?} has no tid", thread.name);
    }

    thread.status = STATUS
        .captures(rest)
        .map(|caps| caps["status"].to_string())
        .unwrap_or_default();

    thread
}

/// Numeric header field; malformed values are dropped.
fn parse_field<T: FromStr>(thread: &str, key: &str, value: &str) -> Option<T> {
    value
        .parse()
        .inspect_err(|_| log::debug!("Ignoring malformed {key}={value:?} on thread {thread:?}"))
        .ok()
}

/// `   java.lang.Thread.State: WAITING (parking)`
fn parse_state_line(thread: &mut Thread, line: &str) {
    let text = line.get(STATE_PREFIX.len()..).unwrap_or_default().trim();
    let (state, detail) = match text.split_once(' ') {
        Some((state, detail)) => (state, Some(detail)),
        None => (text, None),
    };

    thread.thread_state = ThreadState::from_str(state)
        .inspect_err(|_| log::debug!("Unknown thread state {state:?} on {:?}", thread.name))
        .ok();
    thread.state_detail = detail
        .map(|d| d.trim_start_matches('(').trim_end_matches(')').to_string())
        .filter(|d| !d.is_empty());
}

/// `\t- waiting to lock <0x00000007ffe01230> (a com.example.Inventory)`
pub fn parse_dash(kind: DashKind, line: &str) -> DashEvent {
    let object_id = OBJECT_ID.captures(line).map(|caps| caps[1].to_string());
    let (object_class, class_for) = match OBJECT_CLASS.captures(line) {
        Some(caps) => (
            Some(caps["class"].to_string()),
            caps.name("for").map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    };

    DashEvent {
        kind,
        object_id,
        object_class,
        class_for,
    }
}
