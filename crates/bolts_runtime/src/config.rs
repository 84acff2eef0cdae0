//! Run Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `BOLTS_LISTENERS`, `BOLTS_REPEAT`, `BOLTS_ARITY`
//! 2. Config file named by `BOLTS_CONFIG`
//! 3. Config file: `bolts.toml` in the working directory
//! 4. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [dispatch]
//! arity = "strict"       # strict, lenient
//! catch_panics = true
//! report_failures = true
//!
//! [run]
//! listeners = "assets/listeners.json"
//! repeat = 2
//! args = [{ Int = 42 }]
//! ```

use std::path::{Path, PathBuf};

use bolts_event::{ArgumentCell, DispatchConfig, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// What the demo run does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Listener sheet to load; the built-in sheet is used when unset
    pub listeners: Option<PathBuf>,
    /// How many times the event fires
    pub repeat: u32,
    /// Invocation arguments; empty means the no-argument path
    pub args: Vec<ArgumentCell>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            listeners: None,
            repeat: 1,
            args: Vec::new(),
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dispatch: DispatchConfig,
    pub run: RunSection,
    /// Config file path it was loaded from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl RunConfig {
    /// Load run configuration from all sources
    pub fn load() -> Self {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("BOLTS_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        candidates.push(PathBuf::from("bolts.toml"));

        let mut config = Self::default();
        for path in &candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(loaded) => {
                    config = loaded;
                    log::info!("Loaded run config from {}", path.display());
                    break;
                }
                Err(e) => log::warn!("Ignoring config {}: {}", path.display(), e),
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from environment variables looked up through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("BOLTS_LISTENERS").filter(|p| !p.is_empty()) {
            log::info!("Listener sheet from env: {}", path);
            self.run.listeners = Some(PathBuf::from(path));
        }

        if let Some(repeat) = var("BOLTS_REPEAT") {
            match repeat.parse() {
                Ok(n) => self.run.repeat = n,
                Err(_) => log::warn!("Ignoring BOLTS_REPEAT={}: not a count", repeat),
            }
        }

        if let Some(arity) = var("BOLTS_ARITY") {
            match arity.parse() {
                Ok(policy) => self.dispatch.arity = policy,
                Err(e) => log::warn!("Ignoring BOLTS_ARITY: {}", e),
            }
        }
    }

    /// Invocation arguments as values
    pub fn args(&self) -> Vec<Value> {
        self.run.args.iter().map(ArgumentCell::value).collect()
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        log::info!("Run Configuration:");
        log::info!(
            "  Dispatch: arity={:?}, catch_panics={}, report_failures={}",
            self.dispatch.arity,
            self.dispatch.catch_panics,
            self.dispatch.report_failures
        );
        match &self.run.listeners {
            Some(path) => log::info!("  Listeners: {}", path.display()),
            None => log::info!("  Listeners: built-in sheet"),
        }
        log::info!("  Repeat: {}, args: {:?}", self.run.repeat, self.run.args);
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path.display());
        }
    }
}
