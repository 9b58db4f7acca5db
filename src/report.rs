//! Summary report over a reconciled dump.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Deserialize;
use strum::IntoEnumIterator;
use unicode_width::UnicodeWidthChar;

use crate::dump::{Dump, Thread, ThreadState};
use crate::locks::{LockGraph, render_forest};
use crate::styling::{HEADING, RenderConfig, WARNING};

const NAME_WIDTH: usize = 80;

/// Report sections, in their default order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Stats,
    Locks,
    Deadlocks,
    Oldest,
    Youngest,
    Urls,
    Clients,
    Traces,
}

impl Section {
    pub fn all() -> Vec<Section> {
        Section::iter().collect()
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Entries per ranked section
    pub top: usize,
    pub sections: Vec<Section>,
    pub render: RenderConfig,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top: 10,
            sections: Section::all(),
            render: RenderConfig::PLAIN,
        }
    }
}

/// Render the selected sections, separated by empty lines.
pub fn render(dump: &Dump, options: &ReportOptions) -> String {
    let graph = LockGraph::build(dump);
    let mut out = String::new();

    for (i, section) in options.sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match section {
            Section::Stats => render_stats(&mut out, dump, &graph, options),
            Section::Locks => render_locks(&mut out, &graph, options),
            Section::Deadlocks => render_deadlocks(&mut out, &graph, options),
            Section::Oldest => render_ages(&mut out, dump, options, true),
            Section::Youngest => render_ages(&mut out, dump, options, false),
            Section::Urls => render_counts(&mut out, "TOP URLS", dump, options, |r| r.url.as_deref()),
            Section::Clients => {
                render_counts(&mut out, "TOP CLIENTS", dump, options, |r| r.client.as_deref())
            }
            Section::Traces => render_traces(&mut out, dump, options),
        }
    }

    out
}

fn render_heading(out: &mut String, title: &str, options: &ReportOptions) {
    writeln!(out, "{}", options.render.paint(title, HEADING)).unwrap();
    writeln!(out, "{}", "-".repeat(title.len())).unwrap();
}

fn render_stats(out: &mut String, dump: &Dump, graph: &LockGraph<'_>, options: &ReportOptions) {
    render_heading(out, "THREAD STATISTICS", options);

    let mut rows: Vec<(String, usize)> = vec![
        ("Threads".into(), dump.threads.len()),
        ("Daemon".into(), dump.threads.iter().filter(|t| t.daemon).count()),
    ];
    for state in ThreadState::iter() {
        let count = dump
            .threads
            .iter()
            .filter(|t| t.thread_state == Some(state))
            .count();
        if count > 0 {
            rows.push((state.to_string(), count));
        }
    }
    let stateless = dump.threads.iter().filter(|t| t.thread_state.is_none()).count();
    if stateless > 0 {
        rows.push(("No Java state".into(), stateless));
    }
    rows.push((
        "Holding locks".into(),
        dump.threads.iter().filter(|t| !t.locked.is_empty()).count(),
    ));
    rows.push((
        "Waiting on locks".into(),
        dump.threads.iter().filter(|t| t.waiting_on.is_some()).count(),
    ));
    rows.push(("Blocked by others".into(), graph.blocked_threads()));

    for (label, count) in rows {
        writeln!(out, "{label:<18} {count:>6}").unwrap();
    }
}

fn render_locks(out: &mut String, graph: &LockGraph<'_>, options: &ReportOptions) {
    render_heading(out, "LOCK CONTENTION", options);
    if graph.is_empty() {
        out.push_str("No thread is blocked behind another thread.\n");
        return;
    }
    for line in render_forest(graph.roots(), &options.render) {
        writeln!(out, "{line}").unwrap();
    }
}

fn render_deadlocks(out: &mut String, graph: &LockGraph<'_>, options: &ReportOptions) {
    render_heading(out, "DEADLOCKS", options);
    let deadlocks = graph.deadlocks();
    if deadlocks.is_empty() {
        out.push_str("None found.\n");
        return;
    }
    for cycle in deadlocks {
        let mut names: Vec<&str> = cycle.iter().map(|t| t.name.as_str()).collect();
        if let Some(first) = names.first().copied() {
            names.push(first);
        }
        let line = names.join(" -> ");
        writeln!(out, "{}", options.render.paint(&line, WARNING)).unwrap();
    }
}

fn render_ages(out: &mut String, dump: &Dump, options: &ReportOptions, oldest: bool) {
    let title = if oldest {
        "OLDEST REQUESTS"
    } else {
        "YOUNGEST REQUESTS"
    };
    render_heading(out, title, options);

    if dump.date.is_none() {
        out.push_str("Dump has no timestamp; request ages unavailable.\n");
        return;
    }

    let mut aged: Vec<(chrono::Duration, &Thread)> = dump
        .threads
        .iter()
        .filter_map(|t| Some((t.age(dump.date)?, t)))
        .collect();
    if aged.is_empty() {
        out.push_str("No request threads.\n");
        return;
    }

    aged.sort_by(|a, b| {
        let by_age = if oldest { b.0.cmp(&a.0) } else { a.0.cmp(&b.0) };
        by_age.then_with(|| a.1.name.cmp(&b.1.name))
    });

    for (age, thread) in aged.into_iter().take(options.top) {
        writeln!(out, "{:>10}  {}", format_age(age), truncate(&thread.name, NAME_WIDTH)).unwrap();
    }
}

fn render_counts(
    out: &mut String,
    title: &str,
    dump: &Dump,
    options: &ReportOptions,
    key: impl Fn(&crate::dump::RequestInfo) -> Option<&str>,
) {
    render_heading(out, title, options);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for request in dump.threads.iter().filter_map(|t| t.request.as_ref()) {
        if let Some(value) = key(request) {
            *counts.entry(value).or_default() += 1;
        }
    }
    if counts.is_empty() {
        out.push_str("No request threads.\n");
        return;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    for (value, count) in counts.into_iter().take(options.top) {
        writeln!(out, "{count:>6}  {}", truncate(value, NAME_WIDTH)).unwrap();
    }
}

fn render_traces(out: &mut String, dump: &Dump, options: &ReportOptions) {
    render_heading(out, "LONGEST TRACES", options);

    let mut threads: Vec<(usize, &Thread)> = dump
        .threads
        .iter()
        .map(|t| (t.frame_count(), t))
        .filter(|(frames, _)| *frames > 0)
        .collect();
    threads.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));

    for (frames, thread) in threads.into_iter().take(options.top) {
        writeln!(out, "{frames:>6}  {}", truncate(&thread.name, NAME_WIDTH)).unwrap();
    }
}

/// `42s`, `3m 07s`, `2h 05m`, `3d 04h`.
fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds();
    if secs < 0 {
        return format!("-{}", format_age(-age));
    }
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m {:02}s", secs / 60, secs % 60),
        3600..86400 => format!("{}h {:02}m", secs / 3600, secs % 3600 / 60),
        _ => format!("{}d {:02}h", secs / 86400, secs % 86400 / 3600),
    }
}

/// Cut `s` to at most `max_width` columns, ending in `...` when shortened.
fn truncate(s: &str, max_width: usize) -> String {
    let width: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return s.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
