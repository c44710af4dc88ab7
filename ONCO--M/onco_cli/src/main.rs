use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use onco_learning::{
    ErrorClass, FeatureRow, LearningTelemetry, OncoConfig, PipelineError, PredictionService,
    TrainingOrchestrator,
};
use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "onco", version, about = "Tumor diagnosis training and inference")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `[logging] level`.
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Overrides `[logging] path`.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Trains the pipeline and writes the artifact.
    Train(TrainArgs),
    /// Predicts a single feature row.
    Predict(PredictArgs),
    /// Reports whether the artifact can be served.
    Health {
        /// Artifact path.
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Source CSV.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Artifact output path.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Number of trees.
    #[arg(long)]
    n_trees: Option<usize>,
    /// Maximum tree depth.
    #[arg(long)]
    max_depth: Option<usize>,
    /// Split and forest seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Held-out fraction.
    #[arg(long)]
    test_ratio: Option<f64>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// JSON object of feature name to value.
    #[arg(long, conflicts_with = "row_file", required_unless_present = "row_file")]
    row: Option<String>,
    /// File holding the JSON row.
    #[arg(long)]
    row_file: Option<PathBuf>,
    /// Artifact path.
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    class: &'static str,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = OncoConfig::load_or_default(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level.to_string();
    }
    if let Some(path) = cli.log_file {
        config.logging.path = Some(path);
    }
    let telemetry = build_telemetry(&config)?;

    match cli.command {
        Commands::Train(args) => handle_train(config, args, telemetry),
        Commands::Predict(args) => handle_predict(&config, args, telemetry),
        Commands::Health { model } => {
            let path = model.unwrap_or(config.paths.model);
            let service = PredictionService::load_or_unavailable(&path, telemetry);
            print_json(&service.health())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_telemetry(config: &OncoConfig) -> Result<LearningTelemetry> {
    let mut builder = LearningTelemetry::builder("onco-cli")
        .stderr(true)
        .min_level(config.log_level()?);
    if let Some(path) = &config.logging.path {
        builder = builder.log_path(path);
    }
    builder.build()
}

fn handle_train(
    mut config: OncoConfig,
    args: TrainArgs,
    telemetry: LearningTelemetry,
) -> Result<ExitCode> {
    if let Some(data) = args.data {
        config.paths.data = data;
    }
    if let Some(model) = args.model {
        config.paths.model = model;
    }
    if let Some(n_trees) = args.n_trees {
        config.forest.n_trees = n_trees;
    }
    if args.max_depth.is_some() {
        config.forest.max_depth = args.max_depth;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(ratio) = args.test_ratio {
        config.training.test_ratio = ratio;
    }
    config.validate()?;

    let report = TrainingOrchestrator::from_config(&config)
        .with_telemetry(telemetry)
        .run()
        .with_context(|| format!("training from {}", config.paths.data.display()))?;
    println!("{}", report.summary());
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn handle_predict(
    config: &OncoConfig,
    args: PredictArgs,
    telemetry: LearningTelemetry,
) -> Result<ExitCode> {
    let raw = match (args.row, args.row_file) {
        (Some(row), _) => row,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("reading row file {}", path.display()))?,
        (None, None) => anyhow::bail!("either --row or --row-file is required"),
    };
    let path = args.model.unwrap_or_else(|| config.paths.model.clone());
    let outcome = FeatureRow::from_json_str(&raw).and_then(|row| {
        PredictionService::load(&path, telemetry.clone())?.predict(&row)
    });
    match outcome {
        Ok(result) => {
            print_json(&result)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure(&err, &telemetry),
    }
}

fn report_failure(err: &PipelineError, telemetry: &LearningTelemetry) -> Result<ExitCode> {
    let (class, code): (&'static str, u8) = match err.class() {
        ErrorClass::ClientError => ("client_error", 2),
        ErrorClass::ServiceUnavailable => ("service_unavailable", 3),
        ErrorClass::Internal => ("internal", 1),
    };
    telemetry.emit(
        LogLevel::Error,
        "prediction_failed",
        json!({ "class": class, "error": err.to_string() }),
    );
    print_json(&ErrorBody {
        error: err.to_string(),
        class,
    })?;
    Ok(ExitCode::from(code))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_requires_a_row() {
        assert!(Cli::try_parse_from(["onco", "predict"]).is_err());
        let cli = Cli::try_parse_from([
            "onco",
            "predict",
            "--row",
            r#"{"radius_mean": 17.99}"#,
            "--log-level",
            "warn",
        ])
        .unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Warn));
        assert!(matches!(cli.command, Commands::Predict(PredictArgs { row: Some(_), .. })));
    }

    #[test]
    fn train_flags_are_optional() {
        let cli = Cli::try_parse_from(["onco", "train", "--n-trees", "10"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.n_trees, Some(10));
        assert!(args.data.is_none());
    }
}
