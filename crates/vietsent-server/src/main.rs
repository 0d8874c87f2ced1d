//! vietsent
//!
//! Vietnamese sentiment classification: HTTP API, web UI and CLI.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use vietsent_classifiers::SentimentModel;
use vietsent_server::cli::{Cli, Commands};
use vietsent_server::evaluate::run_evaluation;
use vietsent_server::metrics::init_metrics;
use vietsent_server::service::{build_analyzer, build_service, ClassifyError};
use vietsent_server::{run_server, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let mut config = ServiceConfig::load(&cli.config, &cli)?;

    match &cli.command {
        Commands::Serve {
            listen,
            port,
            allowed_origins,
        } => {
            config.apply_server_overrides(listen.as_deref(), *port, allowed_origins.as_deref());
            serve(config).await?;
        }

        Commands::Classify { text } => {
            let (service, _) = build_service(&config)?;
            match service.classify(text).await {
                Ok(classified) => {
                    let mut output = serde_json::to_value(&classified.record)?;
                    if let Some(warning) = classified.warning {
                        output["warning"] = serde_json::Value::String(warning);
                    }
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                Err(ClassifyError::Persistence { result, source }) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    anyhow::bail!("classification was not recorded: {source}");
                }
                Err(err) => anyhow::bail!(err),
            }
        }

        Commands::History { limit } => {
            let (service, _) = build_service(&config)?;
            for record in service.list_recent(*limit).await? {
                println!(
                    "{:>6}  {}  {:<8}  {:>5.1}%  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.sentiment,
                    record.confidence * 100.0,
                    record.text
                );
            }
        }

        Commands::ClearHistory => {
            let (service, _) = build_service(&config)?;
            service.clear().await?;
            println!("History cleared");
        }

        Commands::Evaluate => {
            let (analyzer, handle) = build_analyzer(&config);
            handle.get().await?;
            println!("Model: {}", analyzer.model_name());

            let report = run_evaluation(&analyzer).await;
            for outcome in &report.outcomes {
                println!("{outcome}");
            }
            println!("{}", report.summary());

            if !report.passed() {
                anyhow::bail!("accuracy below threshold");
            }
        }
    }

    Ok(())
}

async fn serve(config: ServiceConfig) -> Result<()> {
    info!("Starting vietsent");

    let metrics_handle = init_metrics()?;
    let (service, handle) = build_service(&config)?;

    // Load the model in the background; requests that arrive first wait on
    // the same load.
    let warmup = Arc::clone(&handle);
    tokio::spawn(async move {
        match warmup.get().await {
            Ok(model) => info!(model = %model.name(), "Sentiment model ready"),
            Err(e) => warn!(error = %e, "Sentiment model failed to load, will retry on demand"),
        }
    });

    let state = AppState::new(Arc::new(service), metrics_handle, &config.server);
    run_server(state, &config.server).await
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("vietsent=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vietsent=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}
