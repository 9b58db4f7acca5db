//! User configuration.
//!
//! Read from a TOML file located by, in order:
//! 1. the `--config` flag
//! 2. the `JSTREE_CONFIG_PATH` environment variable
//! 3. `jstree/config.toml` under the platform config directory
//!
//! A missing file means defaults. Command-line flags override file values.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use serde::Deserialize;

use crate::report::{ReportOptions, Section};
use crate::styling::RenderConfig;

pub const CONFIG_PATH_ENV: &str = "JSTREE_CONFIG_PATH";

/// When to emit ANSI colors.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when stdout is a terminal, honoring `NO_COLOR` and `CLICOLOR_FORCE`
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn resolve(self) -> RenderConfig {
        let color = match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                anstream::AutoStream::choice(&std::io::stdout()) != anstream::ColorChoice::Never
            }
        };
        RenderConfig { color }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub color: ColorChoice,
    /// Entries per ranked report section
    pub top: usize,
    pub sections: Vec<Section>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            top: 10,
            sections: Section::all(),
        }
    }
}

impl Config {
    /// Load from the resolved config path, or defaults when there is none.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match config_path(explicit, std::env::var_os(CONFIG_PATH_ENV)) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top: self.top,
            sections: self.sections.clone(),
            render: self.color.resolve(),
        }
    }
}

/// Config file location.
///
/// `choose_base_strategy` uses XDG on Linux and macOS (respecting
/// `XDG_CONFIG_HOME`) and `%APPDATA%` on Windows.
pub fn config_path(explicit: Option<&Path>, env: Option<OsString>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("jstree").join("config.toml"))
}
