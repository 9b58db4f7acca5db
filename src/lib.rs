//! Parse `jstack` thread dumps and show who is blocked behind whom.

pub mod config;
pub mod dump;
pub mod locks;
pub mod report;
pub mod styling;

pub use dump::{Dump, ParseError, Thread};

/// Parse `text` and attach each thread's held and awaited locks.
pub fn analyze(text: &str) -> Result<Dump, ParseError> {
    let mut dump = dump::parse_dump(text)?;
    locks::reconcile_dump(&mut dump);
    Ok(dump)
}
