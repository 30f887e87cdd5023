//! RingLens - client for a fraud-ring analysis service
//!
//! A CLI tool that loads the analysis service's result (from a JSON file or
//! by uploading a transactions CSV), derives the repeat-offender view and a
//! 3D graph scene, and writes Markdown, HTML or JSON reports.
//!
//! Exit codes:
//!   0 - Success (nothing at or above --fail-on, or no --fail-on set)
//!   1 - Runtime error (bad payload, IO, service offline, etc.)
//!   2 - A ring or suspicious account reached the --fail-on tier

mod analysis;
mod cli;
mod config;
mod error;
mod graph;
mod ingest;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use graph::{scene_document, LayoutParams};
use indicatif::{ProgressBar, ProgressStyle};
use ingest::ServiceClient;
use models::RiskTier;
use report::{generate_html_report, generate_markdown_report, RenderOptions};
use session::{LoadedReport, Session};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first: its `verbose` setting feeds the log level
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(args.quiet));

    info!("RingLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ringlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the service URL, report output and layout.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the verbosity settings.
fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the selected mode. Returns exit code (0, 1 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    if args.health {
        return run_health_check(&config).await;
    }

    // Step 1: Get the analysis result, normalize it and derive views
    let mut session = Session::new(LayoutParams::from(&config.layout));
    let (loaded, client_time) = load_payload(&args, &config, &mut session).await?;

    let processing_time = client_time.or(loaded.report.summary.processing_time_seconds);
    print_summary(loaded, processing_time);

    let threshold_hit = args
        .fail_on
        .map(RiskTier::from)
        .filter(|&tier| reaches_tier(loaded, tier));

    // Step 2: Generate and save the report
    println!("\n📝 Generating report...");

    let source = args.source_label(&config.service.url);
    let output = render(&session, args.format, &config, &source, client_time)?;
    let output_path = output_path(&config, args.format, args.output.is_some());

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
    println!("✅ Report saved to: {}", output_path.display());

    if let Some(ref scene_path) = args.scene {
        write_scene(&session, scene_path)?;
        println!("🌐 Graph scene saved to: {}", scene_path.display());
    }

    if args.export {
        let dir = PathBuf::from(&config.report.export_dir);
        if let Some(path) = session.export_current(&dir)? {
            println!("💾 Exported report to: {}", path.display());
        }
    }

    // Check --fail-on threshold
    if let Some(tier) = threshold_hit {
        eprintln!(
            "\n⛔ Rings or accounts found at or above {} risk. Failing (exit code 2).",
            tier
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --health: ping the service and report whether it is online.
async fn run_health_check(config: &Config) -> Result<i32> {
    let client = ServiceClient::new(&config.service)?;
    println!("🩺 Checking analysis service at {}", client.base_url());

    match client.health().await {
        Ok(health) => {
            let status = if health.status.is_empty() {
                "ok"
            } else {
                health.status.as_str()
            };
            println!("✅ Service online ({})", status);
            if !health.message.is_empty() {
                println!("   {}", health.message);
            }
            Ok(0)
        }
        Err(e) => {
            warn!("Health check failed: {:#}", e);
            println!("❌ Service offline: {:#}", e);
            Ok(1)
        }
    }
}

/// Read the payload from --input, or upload --upload to the service, and
/// make it the session's current report.
///
/// Also returns the client-side elapsed seconds for uploads.
async fn load_payload<'s>(
    args: &Args,
    config: &Config,
    session: &'s mut Session,
) -> Result<(&'s LoadedReport, Option<f64>)> {
    if let Some(ref input) = args.input {
        println!("📂 Loading analysis result: {}", input.display());
        let text = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let loaded = session
            .load_text(&text)
            .with_context(|| format!("Failed to load analysis result from {}", input.display()))?;
        return Ok((loaded, None));
    }

    let csv = args
        .upload
        .as_ref()
        .context("One of --input, --upload or --health is required")?;

    let client = ServiceClient::new(&config.service)?;
    println!("📤 Uploading {} to {}", csv.display(), client.base_url());
    println!("   Timeout: {}s", config.service.timeout_seconds);

    let spinner = (!args.quiet).then(|| analysis_spinner("Analyzing transactions..."));
    let result = client.upload(csv).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let result = result?;

    let loaded = session
        .load_report(&result.payload)
        .context("Failed to load analysis result")?;
    Ok((loaded, Some(result.elapsed.as_secs_f64())))
}

fn analysis_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(loaded: &LoadedReport, processing_time: Option<f64>) {
    let summary = &loaded.report.summary;

    println!("\n📊 Analysis Summary:");
    if loaded.report.is_empty() {
        println!("   No rings or suspicious accounts in this result.");
    }
    println!("   Accounts analyzed: {}", summary.total_accounts_analyzed);
    println!("   Suspicious accounts: {}", summary.suspicious_accounts_flagged);
    println!("   Fraud rings: {}", summary.fraud_rings_detected);
    println!(
        "   - 🔴 High: {} | 🟡 Medium: {} | 🟢 Low: {}",
        loaded.ring_tiers.high, loaded.ring_tiers.medium, loaded.ring_tiers.low
    );
    for (pattern, count) in analysis::pattern_distribution(&loaded.report.fraud_rings) {
        println!("     {}: {}", pattern, count);
    }
    println!("   Repeat offenders: {}", loaded.repeat_offenders.len());
    if let Some(seconds) = processing_time {
        println!("   Processing time: {:.2}s", seconds);
    }
}

/// Whether any ring or suspicious account sits at or above `tier`.
fn reaches_tier(loaded: &LoadedReport, tier: RiskTier) -> bool {
    [loaded.ring_tiers.worst(), loaded.account_tiers.worst()]
        .into_iter()
        .flatten()
        .any(|worst| worst >= tier)
}

fn render(
    session: &Session,
    format: OutputFormat,
    config: &Config,
    source: &str,
    client_time: Option<f64>,
) -> Result<String> {
    if format == OutputFormat::Json {
        let loaded = session.current_report().context("No report loaded")?;
        return Ok(report::export::serialize(&loaded.report)?);
    }

    let doc = session
        .document(source, client_time)
        .context("No report loaded")?;
    let options = RenderOptions {
        member_preview: config.report.member_preview,
    };

    Ok(match format {
        OutputFormat::Html => generate_html_report(&doc, &options),
        _ => generate_markdown_report(&doc, &options),
    })
}

/// Report path. A configured `.md` default follows the chosen format.
fn output_path(config: &Config, format: OutputFormat, explicit: bool) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if explicit || path.extension().map_or(true, |ext| ext != "md") {
        return path;
    }
    match format {
        OutputFormat::Markdown => path,
        OutputFormat::Html => path.with_extension("html"),
        OutputFormat::Json => path.with_extension("json"),
    }
}

fn write_scene(session: &Session, path: &Path) -> Result<()> {
    let layout = session.current_layout().context("No graph scene built")?;
    let document = scene_document(&layout.scene, &layout.positions);
    if layout.positions.is_empty() {
        warn!("Graph scene is empty");
    } else if layout.scene.synthetic {
        info!("Graph uses placeholder accounts; the report listed none");
    }
    debug!(
        "Placed {} nodes within radius {:.1}",
        layout.positions.len(),
        layout.positions.radius()
    );
    for (account_id, position) in layout.positions.iter() {
        debug!(
            "  {} at ({:.1}, {:.1}, {:.1}), {:.1} from origin",
            account_id,
            position.x,
            position.y,
            position.z,
            position.magnitude()
        );
    }

    let json =
        serde_json::to_string_pretty(&document).context("Failed to serialize graph scene")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write graph scene to {}", path.display()))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn loaded(payload: Value) -> Session {
        let mut session = Session::new(LayoutParams::default());
        session.load_report(&payload).unwrap();
        session
    }

    #[test]
    fn test_reaches_tier() {
        let session = loaded(json!({
            "fraud_rings": [{"ring_id": "R1", "risk_score": 65}],
            "suspicious_accounts": [{"account_id": "A", "suspicion_score": 40}]
        }));
        let report = session.current_report().unwrap();

        assert!(reaches_tier(report, RiskTier::Low));
        assert!(reaches_tier(report, RiskTier::Medium));
        assert!(!reaches_tier(report, RiskTier::High));
    }

    #[test]
    fn test_reaches_tier_empty_report() {
        let session = loaded(json!({}));
        assert!(!reaches_tier(session.current_report().unwrap(), RiskTier::Low));
    }

    #[test]
    fn test_output_path_follows_format() {
        let config = Config::default();
        assert_eq!(
            output_path(&config, OutputFormat::Html, false),
            PathBuf::from("ringlens_report.html")
        );
        assert_eq!(
            output_path(&config, OutputFormat::Markdown, false),
            PathBuf::from("ringlens_report.md")
        );

        let mut config = Config::default();
        config.general.output = "custom.md".to_string();
        assert_eq!(
            output_path(&config, OutputFormat::Json, true),
            PathBuf::from("custom.md")
        );
    }

    #[test]
    fn test_render_json_is_canonical_export() {
        let session = loaded(json!({"summary": {"total_accounts_analyzed": 4}}));
        let config = Config::default();
        let text = render(&session, OutputFormat::Json, &config, "x", None).unwrap();
        assert_eq!(
            ingest::parse_payload(&text).unwrap(),
            session.current_report().unwrap().report
        );
    }

    #[test]
    fn test_write_scene() {
        let dir = tempfile::TempDir::new().unwrap();
        let session = loaded(json!({
            "fraud_rings": [{"ring_id": "R1", "member_accounts": ["A", "B"], "risk_score": 90}]
        }));
        let path = dir.path().join("scene.json");
        write_scene(&session, &path).unwrap();

        let scene: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(scene["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(scene["edges"].as_array().unwrap().len(), 1);
        assert_eq!(scene["synthetic"], false);
    }
}
