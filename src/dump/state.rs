//! Line classification state machine.
//!
//! Every state owns an ordered slice of `(Matcher, State)` rules. The first
//! rule whose matcher accepts the line decides the next state. Lock and wait
//! dash-line states all share [`BLOCK_TRANSITIONS`], so any of them can be
//! followed by another dash line, a stack frame, or the end of the block.

use super::error::ParseError;

/// Parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum State {
    /// Before the first line
    Start,
    /// Header lines before the first thread (date, VM banner, SMR info)
    Prelude,
    /// `"name" #1 prio=5 ... tid=0x.. nid=0x.. status [0x..]`
    BlockStart,
    /// `   java.lang.Thread.State: RUNNABLE`
    BlockSecond,
    /// `\tat com.example.Foo.bar(Foo.java:12)`
    Trace,
    /// `\t- locked <0x..> (a ..)`
    Locked,
    /// `\t- parking to wait for  <0x..> (a ..)`
    WaitingConcurrent,
    /// `\t- waiting on <0x..> (a ..)`, inside `Object.wait()`
    WaitingNotify,
    /// `\t- waiting to lock <0x..> (a ..)`
    WaitingSynchronized,
    /// `\t- waiting to re-lock in wait() <0x..> (a ..)`
    WaitingReLock,
    /// `\t- eliminated <..> (a ..)`
    Eliminated,
    /// `   No compile task`, printed for idle JIT compiler threads
    NoCompileTask,
    /// `   Compiling:  1429 4 java.util.HashMap::putVal (300 bytes)`, for busy ones
    CompileTask,
    /// Blank line closing a block
    BlockEnd,
    /// `   Locked ownable synchronizers:`
    OwnedLocksStart,
    /// `\t- <0x..> (a ..)` under the ownable synchronizers header
    OwnedLock,
    /// `\t- None` under the ownable synchronizers header
    NoOwned,
    /// Everything from `JNI global refs` on
    Epilogue,
    /// Input exhausted
    End,
}

/// How a rule tests a line.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    Prefix(&'static str),
    Empty,
    Any,
}

impl Matcher {
    pub fn matches(self, line: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => line.starts_with(prefix),
            Matcher::Empty => line.is_empty(),
            Matcher::Any => true,
        }
    }
}

type Rule = (Matcher, State);

pub(crate) const STATE_PREFIX: &str = "   java.lang.Thread.State: ";
const BLOCK_START: Matcher = Matcher::Prefix("\"");
const JNI_MARKER: Matcher = Matcher::Prefix("JNI global ");

static START: &[Rule] = &[(Matcher::Any, State::Prelude)];

static PRELUDE: &[Rule] = &[
    (BLOCK_START, State::BlockStart),
    (Matcher::Any, State::Prelude),
];

static BLOCK_HEADER: &[Rule] = &[
    (Matcher::Prefix(STATE_PREFIX), State::BlockSecond),
    (Matcher::Prefix("   No compile task"), State::NoCompileTask),
    (Matcher::Prefix("   Compiling:"), State::CompileTask),
    (Matcher::Empty, State::BlockEnd),
    (BLOCK_START, State::BlockStart),
    (JNI_MARKER, State::Epilogue),
];

/// Shared by the state line, stack frames and every dash-line state.
pub static BLOCK_TRANSITIONS: &[Rule] = &[
    (Matcher::Prefix("\tat "), State::Trace),
    (Matcher::Prefix("\t- locked "), State::Locked),
    (
        Matcher::Prefix("\t- parking to wait for "),
        State::WaitingConcurrent,
    ),
    (Matcher::Prefix("\t- waiting on "), State::WaitingNotify),
    (
        Matcher::Prefix("\t- waiting to lock "),
        State::WaitingSynchronized,
    ),
    (
        Matcher::Prefix("\t- waiting to re-lock in wait() "),
        State::WaitingReLock,
    ),
    (Matcher::Prefix("\t- eliminated "), State::Eliminated),
    (Matcher::Prefix("   No compile task"), State::NoCompileTask),
    (Matcher::Prefix("   Compiling:"), State::CompileTask),
    (Matcher::Empty, State::BlockEnd),
    (BLOCK_START, State::BlockStart),
    (JNI_MARKER, State::Epilogue),
];

static BLOCK_END: &[Rule] = &[
    (
        Matcher::Prefix("   Locked ownable synchronizers:"),
        State::OwnedLocksStart,
    ),
    (BLOCK_START, State::BlockStart),
    (Matcher::Empty, State::BlockEnd),
    (JNI_MARKER, State::Epilogue),
];

static OWNED_LOCKS_START: &[Rule] = &[
    (Matcher::Prefix("\t- None"), State::NoOwned),
    (Matcher::Prefix("\t- <"), State::OwnedLock),
];

static OWNED_LOCK: &[Rule] = &[
    (Matcher::Prefix("\t- <"), State::OwnedLock),
    (Matcher::Empty, State::BlockEnd),
];

static NO_OWNED: &[Rule] = &[(Matcher::Empty, State::BlockEnd)];

static EPILOGUE: &[Rule] = &[(Matcher::Any, State::Epilogue)];

impl State {
    /// Ordered transition rules out of this state.
    pub fn rules(self) -> &'static [Rule] {
        match self {
            State::Start => START,
            State::Prelude => PRELUDE,
            State::BlockStart => BLOCK_HEADER,
            State::BlockSecond
            | State::Trace
            | State::Locked
            | State::WaitingConcurrent
            | State::WaitingNotify
            | State::WaitingSynchronized
            | State::WaitingReLock
            | State::Eliminated
            | State::NoCompileTask
            | State::CompileTask => BLOCK_TRANSITIONS,
            State::BlockEnd => BLOCK_END,
            State::OwnedLocksStart => OWNED_LOCKS_START,
            State::OwnedLock => OWNED_LOCK,
            State::NoOwned => NO_OWNED,
            State::Epilogue => EPILOGUE,
            State::End => &[],
        }
    }
}

/// Next state for `line`, first match wins.
///
/// `line_number` is only used to build the error.
pub fn classify(state: State, line: &str, line_number: usize) -> Result<State, ParseError> {
    state
        .rules()
        .iter()
        .find(|(matcher, _)| matcher.matches(line))
        .map(|&(_, next)| next)
        .ok_or_else(|| ParseError {
            line_number,
            line: line.to_string(),
            state,
        })
}
