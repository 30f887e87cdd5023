//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::RiskTier;
use clap::Parser;
use std::path::PathBuf;

/// RingLens - client for a fraud-ring analysis service
///
/// Load an analysis result (from a file or by uploading a transactions CSV),
/// derive the repeat-offender view and the 3D graph scene, and write
/// Markdown/HTML/JSON reports.
///
/// Examples:
///   ringlens --input result.json
///   ringlens --input result.json --format html --output report.html
///   ringlens --upload transactions.csv --scene scene.json --export
///   ringlens --health --service-url http://localhost:5000
///   ringlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(["input", "upload", "health", "init_config"]),
))]
pub struct Args {
    /// Analysis result JSON file to load
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Transactions CSV to upload to the analysis service
    #[arg(short, long, value_name = "CSV")]
    pub upload: Option<PathBuf>,

    /// Check that the analysis service is reachable and exit
    #[arg(long)]
    pub health: bool,

    /// Generate a default .ringlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Analysis service base URL
    ///
    /// Default: from config or http://localhost:5000.
    #[arg(long, value_name = "URL", env = "RINGLENS_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Request timeout in seconds
    ///
    /// Default: from config or 120s.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (markdown, html, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// Default: from config or ringlens_report.md.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the 3D graph scene (nodes, edges, positions) as JSON
    #[arg(long, value_name = "FILE")]
    pub scene: Option<PathBuf>,

    /// Also write a timestamped JSON export of the normalized report
    #[arg(long)]
    pub export: bool,

    /// Directory for --export files
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Ring members shown per row before truncating (0 = all)
    #[arg(long, value_name = "COUNT")]
    pub member_preview: Option<usize>,

    /// Fail if any ring or suspicious account reaches this risk tier
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is reached.
    /// Values: high, medium, low
    #[arg(long, value_name = "TIER")]
    pub fail_on: Option<FailOnTier>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ringlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// Standalone HTML page
    Html,
    /// Canonical report JSON
    Json,
}

/// Risk tier for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnTier {
    Low,
    Medium,
    High,
}

impl From<FailOnTier> for RiskTier {
    fn from(tier: FailOnTier) -> Self {
        match tier {
            FailOnTier::Low => RiskTier::Low,
            FailOnTier::Medium => RiskTier::Medium,
            FailOnTier::High => RiskTier::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if let Some(ref csv) = self.upload {
            if !csv.is_file() {
                return Err(format!("CSV file does not exist: {}", csv.display()));
            }
        }

        if self.health && (self.scene.is_some() || self.export) {
            return Err("--scene and --export need a report (--input or --upload)".to_string());
        }

        Ok(())
    }

    /// Human-readable name of the report source.
    pub fn source_label(&self, service_url: &str) -> String {
        match (&self.input, &self.upload) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(csv)) => format!("{} via {}", csv.display(), service_url),
            (None, None) => service_url.to_string(),
        }
    }
}
