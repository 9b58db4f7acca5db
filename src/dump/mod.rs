//! Thread dump model and parser.
//!
//! A [`Dump`] is built once per `jstack` output by [`parse_dump`], which runs
//! the line classifier ([`state`]) and the block parser ([`parse`]) in
//! lock-step. [`Thread::locked`] and [`Thread::waiting_on`] stay empty until
//! [`crate::locks::reconcile_dump`] runs; [`crate::analyze`] does both.
//!
//! # Usage
//!
//! ```ignore
//! use jstack_tree::dump::parse_dump;
//!
//! let dump = parse_dump(&text)?;
//! for thread in &dump.threads {
//!     println!("{} {:?}", thread.name, thread.thread_state);
//! }
//! ```

pub mod error;
pub mod frame;
pub mod parse;
pub mod request;
pub mod state;

use chrono::NaiveDateTime;
use serde::Serialize;

pub use error::ParseError;
pub use frame::{FrameDetail, StackFrame};
pub use parse::{parse_dump, parse_lines};
pub use request::RequestInfo;
pub use state::{State, classify};

/// One parsed `jstack` snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dump {
    /// Timestamp from the first line, when it has the `YYYY-MM-DD HH:MM:SS` shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
    pub prelude: Vec<String>,
    pub threads: Vec<Thread>,
    pub epilogue: Vec<String>,
}

/// `java.lang.Thread.State` values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    New,
    Runnable,
    Blocked,
    Waiting,
    TimedWaiting,
    Terminated,
}

/// One thread block of the dump.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Thread {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub daemon: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
    /// Native thread address; the thread's key within the dump
    pub tid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid: Option<String>,
    /// Free text between `nid=` and the trailing address, e.g. `waiting on condition`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_state: Option<ThreadState>,
    /// Parenthetical after the state, e.g. `parking` or `on object monitor`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_detail: Option<String>,
    /// Top of stack first
    pub trace: Vec<TraceEntry>,
    /// Held locks, earliest acquired first. Empty when the thread holds nothing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locked: Vec<LockRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_on: Option<LockRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    /// The block's lines exactly as they appeared in the dump
    #[serde(skip)]
    pub lines: Vec<String>,
}

impl Thread {
    pub fn frames(&self) -> impl Iterator<Item = &StackFrame> {
        self.trace.iter().filter_map(|entry| match entry {
            TraceEntry::Frame(frame) => Some(frame),
            TraceEntry::Dash(_) => None,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames().count()
    }

    /// How long the thread has been serving its request at `dump_date`.
    pub fn age(&self, dump_date: Option<NaiveDateTime>) -> Option<chrono::Duration> {
        let started = self.request.as_ref()?.started?;
        Some(dump_date? - started)
    }
}

/// A line of a thread's trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEntry {
    Frame(StackFrame),
    Dash(DashEvent),
}

/// Which dash line produced a [`DashEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DashKind {
    /// `- locked`
    Locked,
    /// `- parking to wait for`
    WaitingConcurrent,
    /// `- waiting on`, the monitor is released while in `Object.wait()`
    WaitingNotify,
    /// `- waiting to lock`
    WaitingSynchronized,
    /// `- waiting to re-lock in wait()`
    WaitingReLock,
    /// `- eliminated`, a lock removed by escape analysis
    Eliminated,
}

impl DashKind {
    /// The kind of wait this line represents, for lines that block the thread.
    pub fn wait_kind(self) -> Option<WaitKind> {
        match self {
            DashKind::WaitingConcurrent => Some(WaitKind::Concurrent),
            DashKind::WaitingSynchronized => Some(WaitKind::Synchronized),
            DashKind::WaitingReLock => Some(WaitKind::ReLock),
            DashKind::Locked | DashKind::WaitingNotify | DashKind::Eliminated => None,
        }
    }
}

/// A `\t- ...` lock or wait annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashEvent {
    pub kind: DashKind,
    /// Absent for `<no object reference available>` and `<owner is scalar replaced>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    /// Target class of a `java.lang.Class for X` lock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_for: Option<String>,
}

impl DashEvent {
    /// Lock reference for this event, when it names an object.
    pub fn lock_ref(&self) -> Option<LockRef> {
        Some(LockRef {
            object_id: self.object_id.clone()?,
            object_class: self.object_class.clone(),
            class_for: self.class_for.clone(),
            wait_kind: self.kind.wait_kind(),
        })
    }
}

/// How a thread waits on the resource in [`Thread::waiting_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum WaitKind {
    /// `java.util.concurrent` lock or condition (`LockSupport.park`)
    Concurrent,
    /// Entering a `synchronized` block
    Synchronized,
    /// Re-acquiring a monitor after `Object.wait()` returned
    ReLock,
}

/// A monitor or lock object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LockRef {
    /// Hex address, unique within one dump only
    pub object_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_kind: Option<WaitKind>,
}

impl LockRef {
    /// Class name without its package; `Class for Foo` for class locks.
    pub fn short_class(&self) -> Option<String> {
        let class = self.object_class.as_deref()?;
        let short = class.rsplit('.').next().unwrap_or(class);
        Some(match self.class_for.as_deref() {
            Some(target) => {
                let target = target.rsplit('.').next().unwrap_or(target);
                format!("{short} for {target}")
            }
            None => short.to_string(),
        })
    }
}
