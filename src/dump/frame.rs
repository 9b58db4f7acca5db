//! Stack frame lines.
//!
//! Big dumps carry tens of thousands of frames, and most reports only count
//! them. A [`StackFrame`] keeps the raw text and parses class, method and
//! location on first access, caching the result in the entry.

use once_cell::unsync::OnceCell;
use serde::{Serialize, Serializer};

/// Location texts that carry no file/line pair.
const SPECIAL_LOCATIONS: [&str; 3] = ["Native Method", "Unknown Source", "<generated>"];

/// A single `\tat ...` line.
#[derive(Clone)]
pub struct StackFrame {
    /// Text after `\tat `, e.g. `java.lang.Thread.run(java.base@17/Thread.java:833)`
    raw: String,
    detail: OnceCell<FrameDetail>,
}

/// Parsed form of a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameDetail {
    pub class: String,
    pub method: String,
    /// Module or class loader prefix, e.g. `java.base@17.0.2` or `app/`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            detail: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed detail, computed once.
    pub fn detail(&self) -> &FrameDetail {
        self.detail.get_or_init(|| FrameDetail::parse(&self.raw))
    }

    /// Whether [`detail`](Self::detail) has been computed yet.
    pub fn is_parsed(&self) -> bool {
        self.detail.get().is_some()
    }
}

impl std::fmt::Debug for StackFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StackFrame").field(&self.raw).finish()
    }
}

impl PartialEq for StackFrame {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for StackFrame {}

impl Serialize for StackFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.detail().serialize(serializer)
    }
}

impl FrameDetail {
    /// Parse `Class.method(Location)`.
    ///
    /// Never fails: text that does not fit the shape ends up in `class` with
    /// empty method and file.
    pub fn parse(raw: &str) -> Self {
        let (qualified, location) = match raw.split_once('(') {
            Some((qualified, rest)) => (qualified, rest.strip_suffix(')').unwrap_or(rest)),
            None => (raw, ""),
        };

        let (class, method) = qualified.rsplit_once('.').unwrap_or((qualified, ""));

        let (module, location) = match location.rsplit_once('/') {
            Some((module, rest)) => (Some(module.to_string()), rest),
            None => (None, location),
        };

        let (file, line) = if SPECIAL_LOCATIONS.contains(&location) {
            (location, None)
        } else {
            match location.rsplit_once(':') {
                Some((file, line)) => match line.parse::<u32>() {
                    Ok(line) => (file, Some(line)),
                    Err(_) => (location, None),
                },
                None => (location, None),
            }
        };

        Self {
            class: class.to_string(),
            method: method.to_string(),
            module,
            file: file.to_string(),
            line,
        }
    }
}
