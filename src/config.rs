//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ringlens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".ringlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Graph layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "ringlens_report.md".to_string()
}

/// Analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis service.
    #[serde(default = "default_service_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_service_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    120 // large CSVs take a while server-side
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Ring members shown per row before truncating with `...` (0 = all).
    #[serde(default = "default_member_preview")]
    pub member_preview: usize,

    /// Directory for timestamped JSON exports.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            member_preview: default_member_preview(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_member_preview() -> usize {
    3
}

fn default_export_dir() -> String {
    ".".to_string()
}

/// 3D layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Maximum sphere radius.
    #[serde(default = "default_radius_cap")]
    pub radius_cap: f64,

    /// Radius added per node until the cap is reached.
    #[serde(default = "default_node_spacing")]
    pub node_spacing: f64,

    /// Vertical squash factor.
    #[serde(default = "default_y_scale")]
    pub y_scale: f64,

    /// Maximum placeholder nodes when a report lists no accounts.
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius_cap: default_radius_cap(),
            node_spacing: default_node_spacing(),
            y_scale: default_y_scale(),
            fallback_limit: default_fallback_limit(),
        }
    }
}

fn default_radius_cap() -> f64 {
    250.0
}

fn default_node_spacing() -> f64 {
    15.0
}

fn default_y_scale() -> f64 {
    0.5
}

fn default_fallback_limit() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.ringlens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.service_url {
            self.service.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(preview) = args.member_preview {
            self.report.member_preview = preview;
        }
        if let Some(ref dir) = args.export_dir {
            self.report.export_dir = dir.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins, then `verbose` from the
    /// file or the command line.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
