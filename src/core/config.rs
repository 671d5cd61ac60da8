//! # Configuration
//!
//! Centralizes all render settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatmark/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::render::highlight::HighlightStyle;
use crate::render::{FailurePolicy, RenderOptions};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatmarkConfig {
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MarkdownConfig {
    pub breaks: Option<bool>,
    pub gfm: Option<bool>,
    pub smartypants: Option<bool>,
    pub copy_buttons: Option<bool>,
    pub escape_html: Option<bool>,
    pub on_failure: Option<FailurePolicy>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HighlightConfig {
    pub enabled: Option<bool>,
    pub style: Option<HighlightStyle>,
    pub theme: Option<String>,
}

/// Values given on the command line. `None`/`false` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub theme: Option<String>,
    pub highlight_style: Option<HighlightStyle>,
    pub no_highlight: bool,
    pub copy_buttons: bool,
    pub escape_html: bool,
    pub strict: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatmark/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatmark").join("config.toml"))
}

/// Load config from `~/.chatmark/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ChatmarkConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ChatmarkConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(ChatmarkConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ChatmarkConfig::default());
    }

    load_config_from(&path)
}

/// Load and parse a config file at an explicit path.
pub fn load_config_from(path: &Path) -> Result<ChatmarkConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ChatmarkConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# chatmark configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [markdown]
# breaks = true                # single newlines become <br />
# gfm = true                   # tables, strikethrough, task lists
# smartypants = true           # curly quotes, dashes, ellipses
# copy_buttons = false         # wrap code blocks in a header with a copy button
# escape_html = false          # escape raw HTML instead of passing it through
# on_failure = "raw-fallback"  # "raw-fallback" or "propagate" (or CHATMARK_ON_FAILURE)

# [highlight]
# enabled = true
# style = "classed"            # "classed" or "inline" (or CHATMARK_HIGHLIGHT_STYLE)
# theme = "base16-ocean.dark"  # or CHATMARK_THEME
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Environment values that take part in resolution.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub theme: Option<String>,
    pub highlight_style: Option<String>,
    pub on_failure: Option<String>,
}

impl EnvOverrides {
    /// Reads `CHATMARK_THEME`, `CHATMARK_HIGHLIGHT_STYLE` and `CHATMARK_ON_FAILURE`.
    pub fn from_env() -> Self {
        Self {
            theme: std::env::var("CHATMARK_THEME").ok(),
            highlight_style: std::env::var("CHATMARK_HIGHLIGHT_STYLE").ok(),
            on_failure: std::env::var("CHATMARK_ON_FAILURE").ok(),
        }
    }
}

/// Resolve the final render options from the process environment.
pub fn resolve(config: &ChatmarkConfig, cli: &CliOverrides) -> RenderOptions {
    resolve_with_env(config, &EnvOverrides::from_env(), cli)
}

/// Resolve the final render options by collapsing: defaults → config file → env → CLI.
pub fn resolve_with_env(
    config: &ChatmarkConfig,
    env: &EnvOverrides,
    cli: &CliOverrides,
) -> RenderOptions {
    let defaults = RenderOptions::default();
    let md = &config.markdown;
    let hl = &config.highlight;

    // Theme: CLI → env → config → default
    let theme = cli
        .theme
        .clone()
        .or_else(|| env.theme.clone())
        .or_else(|| hl.theme.clone())
        .unwrap_or(defaults.theme);

    // Highlight style: CLI → env → config → default
    let highlight_style = cli
        .highlight_style
        .or_else(|| env.highlight_style.as_deref().and_then(parse_env_value))
        .or(hl.style)
        .unwrap_or(defaults.highlight_style);

    // Failure policy: --strict → env → config → default
    let on_failure = if cli.strict {
        FailurePolicy::Propagate
    } else {
        env.on_failure
            .as_deref()
            .and_then(parse_env_value)
            .or(md.on_failure)
            .unwrap_or(defaults.on_failure)
    };

    // CLI switches can only turn their feature on (or highlighting off)
    RenderOptions {
        breaks: md.breaks.unwrap_or(defaults.breaks),
        gfm: md.gfm.unwrap_or(defaults.gfm),
        smartypants: md.smartypants.unwrap_or(defaults.smartypants),
        highlight: !cli.no_highlight && hl.enabled.unwrap_or(defaults.highlight),
        highlight_style,
        theme,
        copy_buttons: cli.copy_buttons || md.copy_buttons.unwrap_or(defaults.copy_buttons),
        escape_html: cli.escape_html || md.escape_html.unwrap_or(defaults.escape_html),
        on_failure,
    }
}

/// Parses an env var using the same names the TOML file and CLI accept.
/// Unrecognized values are logged and ignored.
fn parse_env_value<T: ValueEnum>(raw: &str) -> Option<T> {
    let value = raw.trim();
    match T::from_str(value, true) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring invalid environment value '{}': {}", value, e);
            None
        }
    }
}
