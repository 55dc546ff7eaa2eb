//! CLI argument parsing for hipo

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::detection::Strategy;

/// Output format for detection reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

/// Detection strategy selection
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    MovingAverage,
    BucketedTopN,
    CenterOfGravity,
    NoiseReduction,
    NoiseAndOutlier,
}

impl StrategyArg {
    pub fn to_strategy(self) -> Strategy {
        match self {
            StrategyArg::MovingAverage => Strategy::MovingAverage,
            StrategyArg::BucketedTopN => Strategy::BucketedTopN,
            StrategyArg::CenterOfGravity => Strategy::CenterOfGravity,
            StrategyArg::NoiseReduction => Strategy::NoiseReduction,
            StrategyArg::NoiseAndOutlier => Strategy::NoiseAndOutlier,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hipo")]
#[command(version)]
#[command(about = "Response-time hiccup detection with DB activity correlation", long_about = None)]
pub struct Cli {
    /// Response-time measurements CSV (semicolon-delimited: timestamp;value)
    pub input: PathBuf,

    /// Detection strategy
    #[arg(short, long, value_enum, default_value = "moving-average")]
    pub strategy: StrategyArg,

    /// Detection configuration TOML file (missing keys keep their defaults)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Request events CSV (start;end;operation) for DB correlation
    #[arg(long = "requests", value_name = "FILE", requires = "db_activity")]
    pub requests: Option<PathBuf>,

    /// DB activity samples CSV (timestamp;queries) for DB correlation
    #[arg(long = "db-activity", value_name = "FILE", requires = "requests")]
    pub db_activity: Option<PathBuf>,

    /// Enable debug logging to stderr
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_minimal() {
        let cli = Cli::try_parse_from(["hipo", "measurements.csv"]).unwrap();
        assert!(matches!(cli.strategy, StrategyArg::MovingAverage));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_strategy_selection() {
        let cli =
            Cli::try_parse_from(["hipo", "m.csv", "--strategy", "center-of-gravity"]).unwrap();
        assert!(matches!(cli.strategy, StrategyArg::CenterOfGravity));
        assert_eq!(
            cli.strategy.to_strategy(),
            crate::detection::Strategy::CenterOfGravity
        );
    }

    #[test]
    fn test_cli_requests_requires_db_activity() {
        assert!(Cli::try_parse_from(["hipo", "m.csv", "--requests", "r.csv"]).is_err());
        assert!(Cli::try_parse_from([
            "hipo",
            "m.csv",
            "--requests",
            "r.csv",
            "--db-activity",
            "d.csv"
        ])
        .is_ok());
    }
}
