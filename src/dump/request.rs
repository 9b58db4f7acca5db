//! Request correlation embedded in thread names.
//!
//! Some servers rename worker threads while they serve a request:
//!
//! ```text
//! http-nio-8080-exec-7 | request=6f1c2a client=acme url=/api/orders started=2024-03-01T10:15:02
//! ```
//!
//! Everything before ` | ` is the base name; the tail is `key=value` tokens
//! separated by spaces. Unknown keys are ignored.

use chrono::NaiveDateTime;
use serde::Serialize;

const SEPARATOR: &str = " | ";
const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Correlation fields parsed from a thread name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
    pub base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<NaiveDateTime>,
}

impl RequestInfo {
    /// `None` when the name does not follow the convention.
    pub fn from_thread_name(name: &str) -> Option<Self> {
        let (base, tail) = name.split_once(SEPARATOR)?;

        let mut info = RequestInfo {
            base: base.to_string(),
            request: None,
            client: None,
            url: None,
            started: None,
        };
        let mut recognized = false;

        for (key, value) in tail.split_whitespace().filter_map(|t| t.split_once('=')) {
            match key {
                "request" => info.request = Some(value.to_string()),
                "client" => info.client = Some(value.to_string()),
                "url" => info.url = Some(value.to_string()),
                "started" => match NaiveDateTime::parse_from_str(value, STARTED_FORMAT) {
                    Ok(started) => info.started = Some(started),
                    Err(e) => log::debug!("Ignoring started={value:?} in {name:?}: {e}"),
                },
                _ => continue,
            }
            recognized = true;
        }

        recognized.then_some(info)
    }
}
