use anyhow::{Context, Result};
use clap::Parser;
use hipo::cli::{Cli, OutputFormat};
use hipo::config::DetectionConfig;
use hipo::db_correlation;
use hipo::detection;
use hipo::json_output::{JsonDbCorrelationReport, JsonDetectionReport};
use hipo::{dataset, series::Series};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<DetectionConfig> {
    match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            DetectionConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(DetectionConfig::default()),
    }
}

fn run_detection(cli: &Cli, config: &DetectionConfig, series: &Series) -> Result<()> {
    let report = detection::detect_hiccups(series, config, cli.strategy.to_strategy())?;

    match cli.format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => {
            println!("{}", JsonDetectionReport::from_report(&report).to_json_pretty()?);
        }
    }
    Ok(())
}

fn run_db_correlation(cli: &Cli) -> Result<()> {
    let (Some(requests_path), Some(db_path)) = (&cli.requests, &cli.db_activity) else {
        return Ok(());
    };

    let requests = dataset::load_requests_csv(requests_path)?;
    let samples = dataset::load_db_samples_csv(db_path)?;
    let stats = db_correlation::correlate_db_activity(&requests, &samples);

    match cli.format {
        OutputFormat::Text => {
            println!("DB overhead per operation:");
            if stats.is_empty() {
                println!("  no attributable requests");
            }
            for stat in &stats {
                println!(
                    "  {}: mean={:.2} min={} max={} detected={}",
                    stat.operation,
                    stat.mean_queries_per_transaction,
                    stat.min_queries,
                    stat.max_queries,
                    stat.detected(),
                );
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                JsonDbCorrelationReport::from_stats(&stats).to_json_pretty()?
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let series = dataset::load_series_csv(&cli.input)?;

    run_detection(&cli, &config, &series)?;
    run_db_correlation(&cli)?;

    Ok(())
}
