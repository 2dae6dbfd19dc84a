//! Dashboard configuration
//!
//! Loaded from `config.toml`, then overridden by command-line flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tw_core::SkipConfig;

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Use Nerd Font glyphs instead of ASCII icons
    pub nerd_fonts: bool,
    /// How long a deleted entry stays visible (seconds)
    pub tombstone_secs: u64,
    /// Rows shown before the list scrolls
    pub viewport_rows: usize,
    /// How long a touched entry is highlighted (seconds)
    pub highlight_secs: u64,
    /// Periodic timer interval (milliseconds)
    pub tick_millis: u64,
    /// Rows moved per mouse-wheel notch
    pub scroll_amount: usize,
    pub skip: SkipConfig,
    pub strings: UiStrings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nerd_fonts: true,
            tombstone_secs: 30,
            viewport_rows: 10,
            highlight_secs: 3,
            tick_millis: 1000,
            scroll_amount: 1,
            skip: SkipConfig::default(),
            strings: UiStrings::default(),
        }
    }
}

/// Display text templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiStrings {
    pub monitoring: String,
    pub empty_dir: String,
    pub filter_prompt: String,
    pub help_nav: String,
    pub help_filter: String,
    pub help_quit: String,
    pub atomic_events: String,
    pub total_events: String,
    pub error_prefix: String,
}

impl Default for UiStrings {
    fn default() -> Self {
        Self {
            monitoring: "Monitoring".to_string(),
            empty_dir: "Directory is empty or an error occurred. Press 'q' to quit.".to_string(),
            filter_prompt: "Filter: ".to_string(),
            help_nav: "Navigate with ↑/↓".to_string(),
            help_filter: "/ filter".to_string(),
            help_quit: "'q' quit".to_string(),
            atomic_events: "Atomic Events".to_string(),
            total_events: "Events".to_string(),
            error_prefix: "Error: ".to_string(),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// read if present and defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match config_file_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the dashboard cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tombstone_secs == 0 {
            bail!("tombstone_secs must be greater than 0");
        }
        if self.viewport_rows == 0 {
            bail!("viewport_rows must be greater than 0");
        }
        if self.tick_millis < 50 {
            bail!("tick_millis must be at least 50 (got {})", self.tick_millis);
        }
        if self.scroll_amount == 0 {
            bail!("scroll_amount must be greater than 0");
        }
        Ok(())
    }

    pub fn tombstone(&self) -> Duration {
        Duration::from_secs(self.tombstone_secs)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_secs(self.highlight_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

/// Default per-user config location: `<config dir>/teawatch/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("teawatch").join("config.toml"))
}
