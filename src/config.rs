use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::duration::deserialize_duration;
use crate::harvest::FailurePolicy;

/// Default CDP request timeout (30 seconds).
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Browser launch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Explicit Chrome/Chromium executable. Auto-detected when unset.
    pub chrome_path: Option<PathBuf>,

    /// Run without a visible window.
    pub headless: bool,

    pub window_width: u32,
    pub window_height: u32,

    /// How long a single DevTools request may take before chromiumoxide
    /// gives up on it.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            window_width: 1280,
            window_height: 720,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Harvest behavior configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Abort on the first page or detail extraction failure. When false,
    /// failures are logged, recorded in the report, and skipped.
    pub strict: bool,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl HarvestSettings {
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Lenient
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserSettings,
    pub harvest: HarvestSettings,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
