use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::perf_analyzer::{ComparisonThresholds, TestConfig, ThresholdOverrides};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub comparison: ComparisonThresholds,
}

/// Where test logs are read and baselines are kept
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub logs_dir: PathBuf,
    pub baselines_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

// =========================
// Command line
// =========================

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "transform-perf")]
#[command(version, about = "Transform performance baselines and regression comparison")]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (overrides config file, e.g., "info,transform_perf=debug")
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Directory holding load-test logs (overrides config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub logs_dir: Option<PathBuf>,

    /// Directory holding saved baselines (overrides config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub baselines_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract a baseline from the logs of one test run
    Extract(ExtractArgs),
    /// Compare a current baseline against a saved one
    Compare(CompareArgs),
    /// List saved baselines, newest first
    List,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Prefix shared by the run's cluster-health, node-stats and transform-stats logs
    pub prefix: String,

    /// Test name recorded in the baseline (defaults to the prefix)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub entity_count: u64,

    #[arg(long, default_value_t = 0)]
    pub logs_per_entity: u64,

    #[arg(long)]
    pub upload_count: Option<u64>,

    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Print the baseline without saving it
    #[arg(long)]
    pub no_save: bool,
}

impl ExtractArgs {
    pub fn test_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.prefix)
    }

    pub fn test_config(&self) -> TestConfig {
        TestConfig {
            entity_count: self.entity_count,
            logs_per_entity: self.logs_per_entity,
            upload_count: self.upload_count,
            interval_ms: self.interval_ms,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Saved baseline name, prefix or path
    pub baseline: String,

    /// Current baseline name, prefix or path
    pub current: String,

    #[arg(long, value_name = "PERCENT")]
    pub degradation_threshold: Option<f64>,

    #[arg(long, value_name = "PERCENT")]
    pub warning_threshold: Option<f64>,

    #[arg(long, value_name = "PERCENT")]
    pub improvement_threshold: Option<f64>,

    /// Exit with status 1 when any metric degraded
    #[arg(long)]
    pub fail_on_degradation: bool,
}

impl CompareArgs {
    pub fn overrides(&self) -> ThresholdOverrides {
        ThresholdOverrides {
            degradation_threshold: self.degradation_threshold,
            warning_threshold: self.warning_threshold,
            improvement_threshold: self.improvement_threshold,
        }
    }
}

// =========================
// Loading
// =========================

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with PERF_, `.env` honoured)
    /// 3. Configuration file (perf.toml)
    /// 4. Default values
    pub fn load(cli: &Cli) -> Result<Self, anyhow::Error> {
        let _ = dotenvy::dotenv();

        // 1. Load from config file (use CLI --config if provided, otherwise find default)
        let config_path = cli.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            Config::default()
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Override with command line arguments (highest priority)
        config.apply_cli_overrides(cli);

        // 4. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PERF_LOGS_DIR: Load-test logs directory (default: logs)
    /// - PERF_BASELINES_DIR: Baselines directory (default: baselines)
    /// - PERF_LOG_LEVEL: Logging level (e.g., "info,transform_perf=debug")
    /// - PERF_LOG_FILE: Log file path, enables the daily rolling file layer
    /// - PERF_DEGRADATION_THRESHOLD / PERF_WARNING_THRESHOLD / PERF_IMPROVEMENT_THRESHOLD:
    ///   comparison thresholds in percent
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("PERF_LOGS_DIR") {
            self.paths.logs_dir = PathBuf::from(dir);
            tracing::info!("Override paths.logs_dir from env: {}", self.paths.logs_dir.display());
        }

        if let Ok(dir) = std::env::var("PERF_BASELINES_DIR") {
            self.paths.baselines_dir = PathBuf::from(dir);
            tracing::info!(
                "Override paths.baselines_dir from env: {}",
                self.paths.baselines_dir.display()
            );
        }

        if let Ok(level) = std::env::var("PERF_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(file) = std::env::var("PERF_LOG_FILE") {
            tracing::info!("Override logging.file from env: {}", file);
            self.logging.file = Some(file);
        }

        let thresholds = [
            ("PERF_DEGRADATION_THRESHOLD", &mut self.comparison.degradation_threshold),
            ("PERF_WARNING_THRESHOLD", &mut self.comparison.warning_threshold),
            ("PERF_IMPROVEMENT_THRESHOLD", &mut self.comparison.improvement_threshold),
        ];
        for (var, target) in thresholds {
            if let Ok(raw) = std::env::var(var) {
                match raw.trim().trim_end_matches('%').parse::<f64>() {
                    Ok(val) => {
                        *target = val;
                        tracing::info!("Override {} from env: {}", var, val);
                    },
                    Err(e) => tracing::warn!("Invalid {} '{}': {} (keep {})", var, raw, e, target),
                }
            }
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }

        if let Some(dir) = &cli.logs_dir {
            self.paths.logs_dir = dir.clone();
            tracing::info!("Override paths.logs_dir from CLI: {}", dir.display());
        }

        if let Some(dir) = &cli.baselines_dir {
            self.paths.baselines_dir = dir.clone();
            tracing::info!("Override paths.baselines_dir from CLI: {}", dir.display());
        }

        if let Command::Compare(args) = &cli.command {
            self.comparison = self.comparison.with_overrides(&args.overrides());
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.paths.logs_dir.as_os_str().is_empty() {
            anyhow::bail!("paths.logs_dir cannot be empty");
        }

        if self.paths.baselines_dir.as_os_str().is_empty() {
            anyhow::bail!("paths.baselines_dir cannot be empty");
        }

        if let Err(e) = self.comparison.validate() {
            anyhow::bail!("Invalid comparison thresholds: {}", e);
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/perf.toml", "perf.toml", "./conf/perf.toml", "./perf.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { logs_dir: PathBuf::from("logs"), baselines_dir: PathBuf::from("baselines") }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,transform_perf=info".to_string(), file: None }
    }
}
