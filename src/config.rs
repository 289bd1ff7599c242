//! Layered configuration: TOML file, then `BOOKMETER_*` environment, then CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Scraper settings. Fields missing from a config file keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mail: Option<String>,
    pub password: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    pub proxy: Option<String>,

    /// Minimum pause before each request, in milliseconds
    pub delay_ms: u64,

    /// Up to this many extra milliseconds are added to each pause
    pub delay_jitter_ms: u64,

    /// Upper bound on listing pages fetched per command
    pub max_pages: Option<u32>,

    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mail: None,
            password: None,
            proxy: None,
            delay_ms: 1000,
            delay_jitter_ms: 1000,
            max_pages: None,
            format: OutputFormat::default(),
        }
    }
}

/// Directory name under the platform config dir.
const APP_DIR: &str = "bookmeter-scraper";

const CONFIG_FILE: &str = "config.toml";

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading config {}", path.display());

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads `explicit_path`, or else the first config file found in the
    /// working directory or the platform config dir, or else defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        match Self::search_paths().into_iter().find(|p| p.is_file()) {
            Some(found) => Self::from_file(found),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(APP_DIR).join(CONFIG_FILE));
        }
        paths
    }

    /// Overrides fields from `BOOKMETER_*` environment variables.
    ///
    /// A `BOOKMETER_DELAY` that is not a number is ignored.
    pub fn with_env(mut self) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        self.mail = var("BOOKMETER_MAIL").or(self.mail);
        self.password = var("BOOKMETER_PASSWORD").or(self.password);
        self.proxy = var("BOOKMETER_PROXY").or(self.proxy);
        if let Some(delay) = var("BOOKMETER_DELAY").and_then(|d| d.parse().ok()) {
            self.delay_ms = delay;
        }

        self
    }

    /// Mail and password, when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.mail.as_deref()?, self.password.as_deref()?))
    }
}

/// How results are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl OutputFormat {
    fn name(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [OutputFormat::Table, OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Csv];
        let wanted = s.to_ascii_lowercase();
        if wanted == "md" {
            return Ok(OutputFormat::Markdown);
        }
        all.into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| format!("Unknown format: {}. Use: table, json, markdown, csv", s))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
