//! Parse errors
//!
//! The parser has exactly one failure mode: a line the state machine has no
//! transition for. Fields that match a structural pattern but fail to parse
//! (a non-numeric `prio=`, an unknown thread state) are dropped instead, so
//! they never surface here.

use super::state::State;

/// A line the classifier could not place.
///
/// Continuing from an unknown state would corrupt every following thread
/// record, so callers report this and stop.
///
/// # Usage
///
/// ```ignore
/// match jstack_tree::dump::parse_dump(&text) {
///     Ok(dump) => println!("{} threads", dump.threads.len()),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_number}: unexpected line in state {state}: {line:?}")]
pub struct ParseError {
    /// 1-based line number of the offending line
    pub line_number: usize,
    /// The offending line, verbatim
    pub line: String,
    /// State the parser was in when the line arrived
    pub state: State,
}
