use clap::Parser;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transform_perf::config::{Cli, Command, CompareArgs, Config, ExtractArgs};
use transform_perf::services::perf_analyzer::{
    BaselineStore, ComparisonEngine, ReportFormatter, extract_baseline,
};

/// Console logs go to stderr so the report on stdout stays clean
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    // Add file logging if configured
    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("transform-perf.log");
        // Rolling appender adds the date suffix
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        Some(guard)
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        None
    }
}

fn run_extract(config: &Config, args: &ExtractArgs) -> anyhow::Result<ExitCode> {
    let baseline = extract_baseline(
        &config.paths.logs_dir,
        &args.prefix,
        args.test_name(),
        args.test_config(),
    )?;

    if args.no_save {
        println!("{}", serde_json::to_string_pretty(&baseline)?);
    } else {
        let path = BaselineStore::new(&config.paths.baselines_dir).save(&baseline)?;
        println!("Baseline saved to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_compare(config: &Config, args: &CompareArgs) -> anyhow::Result<ExitCode> {
    let store = BaselineStore::new(&config.paths.baselines_dir);
    let baseline = store.load_by_pattern(&args.baseline)?;
    let current = store.load_by_pattern(&args.current)?;

    let engine = ComparisonEngine::new(config.comparison);
    let thresholds = engine.thresholds();
    tracing::info!(
        "Comparing '{}' against '{}' (degradation {}%, warning {}%, improvement {}%)",
        current.test_name,
        baseline.test_name,
        thresholds.degradation_threshold,
        thresholds.warning_threshold,
        thresholds.improvement_threshold
    );
    let report = engine.compare(&baseline, &current);
    print!("{}", ReportFormatter::format(&report));

    if args.fail_on_degradation && report.has_degradations() {
        tracing::warn!("{} metrics degraded", report.summary.degradations);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_list(config: &Config) -> anyhow::Result<ExitCode> {
    let entries = BaselineStore::new(&config.paths.baselines_dir).list();
    if entries.is_empty() {
        println!("No baselines in {}", config.paths.baselines_dir.display());
    }
    for entry in entries {
        println!("{}", entry.name);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first
    let config = Config::load(&cli)?;
    let _guard = init_logging(&config);
    tracing::debug!("Configuration loaded: {:?}", config);

    match &cli.command {
        Command::Extract(args) => run_extract(&config, args),
        Command::Compare(args) => run_compare(&config, args),
        Command::List => run_list(&config),
    }
}
