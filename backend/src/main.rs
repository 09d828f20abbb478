//! Irrigation decision engine - command line driver
//!
//! Reads a JSON request, runs the engine and prints the JSON report.
//!
//! ```text
//! irrigation-engine analyze <request.json>
//! irrigation-engine quick <request.json>
//! irrigation-engine roi <roi_request.json>
//! irrigation-engine compare <crop_type> <area_ha>
//! irrigation-engine train
//! irrigation-engine status
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use irrigation_backend::error::AppError;
use irrigation_backend::services::{FieldAnalyzer, StressForecastService};
use irrigation_backend::{AppResult, Config};
use shared::{FieldAnalysisRequest, RoiRequest};

enum Command {
    Analyze(PathBuf),
    Quick(PathBuf),
    Roi(PathBuf),
    Compare { crop_type: String, area_ha: f64 },
    Train,
    Status,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let command = args.next().unwrap_or_else(|| "help".into());
        let command = match command.as_str() {
            "analyze" => Self::Analyze(path_arg(args.next())?),
            "quick" => Self::Quick(path_arg(args.next())?),
            "roi" => Self::Roi(path_arg(args.next())?),
            "compare" => {
                let crop_type = args.next().context("missing crop type")?;
                let area_ha = args
                    .next()
                    .context("missing field area")?
                    .parse()
                    .context("field area must be a number of hectares")?;
                Self::Compare { crop_type, area_ha }
            }
            "train" => Self::Train,
            "status" => Self::Status,
            other => bail!(
                "unknown command '{}' (expected analyze, quick, roi, compare, train or status)",
                other
            ),
        };
        Ok(command)
    }

    fn needs_model(&self) -> bool {
        matches!(self, Self::Analyze(_))
    }
}

fn path_arg(arg: Option<String>) -> anyhow::Result<PathBuf> {
    arg.map(PathBuf::from).context("missing request file path")
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_slice(&bytes).map_err(AppError::from)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter.clone().into());
    let json = config.logging.json;

    // logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Load the persisted model or train one, waiting at most `training_wait_secs`
async fn prepare_model(forecast: &Arc<StressForecastService>) -> AppResult<()> {
    match forecast.load_artifact() {
        Ok(true) => return Ok(()),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable model artifact"),
    }

    let Some(handle) = forecast.spawn_training() else {
        return Ok(());
    };
    let wait = Duration::from_secs(forecast.config().training_wait_secs);
    match tokio::time::timeout(wait, handle).await {
        Ok(Ok(result)) => result.map(|_| ()),
        Ok(Err(join)) => Err(AppError::Internal(format!("training task failed: {}", join))),
        Err(_) => {
            tracing::warn!(wait_secs = wait.as_secs(), "Model still training, continuing without it");
            Ok(())
        }
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let forecast = Arc::new(StressForecastService::new(config.forecast.clone()));
    let analyzer = FieldAnalyzer::new(&config, Arc::clone(&forecast));

    if command.needs_model() {
        if let Err(e) = prepare_model(&forecast).await {
            tracing::warn!(error = %e, "Stress forecast model unavailable");
        }
    }

    match command {
        Command::Analyze(path) => {
            let request: FieldAnalysisRequest = read_json(&path).await?;
            print_json(&analyzer.analyze(&request)?)
        }
        Command::Quick(path) => {
            let request: FieldAnalysisRequest = read_json(&path).await?;
            print_json(&analyzer.quick_analysis(&request)?)
        }
        Command::Roi(path) => {
            let request: RoiRequest = read_json(&path).await?;
            print_json(&analyzer.financial().project(&request)?)
        }
        Command::Compare { crop_type, area_ha } => {
            print_json(&analyzer.financial().comparison(area_ha, &crop_type)?)
        }
        Command::Train => {
            let service = Arc::clone(&forecast);
            let model = tokio::task::spawn_blocking(move || service.train_blocking()).await??;
            print_json(&serde_json::json!({
                "model_id": model.model_id,
                "trained_at": model.trained_at,
                "accuracy": model.accuracy,
                "train_samples": model.train_samples,
                "test_samples": model.test_samples,
                "feature_importance": model.feature_importance,
            }))
        }
        Command::Status => {
            forecast.load_artifact()?;
            print_json(&forecast.status())
        }
    }
}

/// Print the error body on stdout, where successful reports go
fn report(error: &AppError) {
    if let Ok(body) = serde_json::to_string_pretty(&error.to_response()) {
        println!("{}", body);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            report(&AppError::from(e));
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    tracing::info!("Starting irrigation decision engine");
    tracing::info!("Environment: {}", config.environment);

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::from(2);
        }
    };

    match run(command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let app = e.downcast::<AppError>().unwrap_or_else(AppError::from);
            report(&app);
            ExitCode::FAILURE
        }
    }
}
