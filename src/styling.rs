//! Terminal styling.
//!
//! This module uses the anstyle ecosystem:
//! - anstream for auto-detecting color support on stdout/stderr
//! - anstyle for composable styling
//! - Semantic style constants for domain-specific use
//!
//! Rendered trees and reports never consult the terminal themselves; whether
//! they carry escape codes is decided by the caller's [`RenderConfig`].

use anstyle::{AnsiColor, Color, Style};

// ============================================================================
// Re-export from anstream (auto-detecting output)
// ============================================================================

/// Auto-detecting eprintln that respects NO_COLOR, CLICOLOR_FORCE, and terminal capabilities
pub use anstream::eprintln;

// ============================================================================
// Semantic Style Constants
// ============================================================================

/// Error style (red) - use as `{ERROR}text{ERROR:#}`
pub const ERROR: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// Warning style (yellow) - use as `{WARNING}text{WARNING:#}`
pub const WARNING: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));

/// Hint style (dimmed) - use as `{HINT}text{HINT:#}`
pub const HINT: Style = Style::new().dimmed();

/// Thread names in the lock tree (bold)
pub const THREAD: Style = Style::new().bold();

/// Root holders of a lock tree (magenta + bold)
pub const ROOT: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Magenta)));

/// Section headings in reports (cyan + bold)
pub const HEADING: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));

// ============================================================================
// Message Emojis
// ============================================================================

/// Error emoji - use with ERROR style: `eprintln!("{ERROR_EMOJI} {ERROR}message{ERROR:#}");`
pub const ERROR_EMOJI: &str = "❌";

/// Warning emoji - use with WARNING style: `eprintln!("{WARNING_EMOJI} {WARNING}message{WARNING:#}");`
pub const WARNING_EMOJI: &str = "🟡";

// ============================================================================
// Render configuration
// ============================================================================

/// Output options threaded through every renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// Emit ANSI escape codes
    pub color: bool,
}

impl RenderConfig {
    pub const PLAIN: Self = Self { color: false };
    pub const COLOR: Self = Self { color: true };

    /// Wrap `text` in `style` when color is on.
    pub fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paint_is_identity() {
        assert_eq!(RenderConfig::PLAIN.paint("main", THREAD), "main");
    }

    #[test]
    fn test_color_paint_wraps_text() {
        let painted = RenderConfig::COLOR.paint("main", THREAD);
        assert!(painted.starts_with("\u{1b}["));
        assert!(painted.contains("main"));
        assert!(painted.ends_with("\u{1b}[0m"));
    }
}
