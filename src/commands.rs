use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};

use bulkenrich::board::BrandBoard;
use bulkenrich::config::Config;
use bulkenrich::enrichment;
use bulkenrich::input::parse_websites;
use bulkenrich::observability::RunMetrics;
use bulkenrich::runner::{BoundedRunner, RunnerConfig};

use crate::cli::EnrichArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Enrich every website from the input and emit the board as JSON.
///
/// Ctrl+C stops dispatching, aborts in-flight calls and still writes the
/// entries that settled so far.
pub async fn enrich(config: Config, args: EnrichArgs) -> Result<(), AnyError> {
    let text = read_input(&args.input).await?;
    let websites = parse_websites(&text);

    let concurrency = args.concurrency.unwrap_or(config.runner.concurrency);
    let runner_config = RunnerConfig::new(concurrency)?;
    let metrics = Arc::new(RunMetrics::new());
    let runner = BoundedRunner::new(runner_config).with_metrics(Arc::clone(&metrics));

    let enricher = enrichment::from_config(&config.enrichment)?;
    let mut board = BrandBoard::from_websites(websites)
        .with_apply_to_edited_fields(config.board.apply_to_edited_fields);

    info!(
        websites = board.entries().len(),
        concurrency,
        endpoint = %config.enrichment.endpoint,
        "Enriching websites"
    );

    tokio::select! {
        result = board.enrich_pending(enricher, &runner) => {
            result?;
        }
        _ = shutdown_signal() => {
            warn!("Interrupted, writing partial results");
        }
    }

    let snapshot = metrics.snapshot();
    let report = board.report();
    info!(
        dispatched = snapshot.items_dispatched,
        succeeded = snapshot.items_succeeded,
        failed = snapshot.items_failed,
        peak_in_flight = snapshot.peak_in_flight,
        "{}",
        report
    );

    let json = serde_json::to_string_pretty(board.entries())?;
    write_output(args.output.as_deref(), &json).await?;

    Ok(())
}

/// Print the effective configuration (secrets are never serialized)
pub fn show_config(config: &Config) -> Result<(), AnyError> {
    let rendered = toml::to_string_pretty(config)?;
    println!("{}", rendered);
    Ok(())
}

async fn read_input(path: &Path) -> Result<String, AnyError> {
    if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }

    Ok(tokio::fs::read_to_string(path).await?)
}

async fn write_output(path: Option<&Path>, json: &str) -> Result<(), AnyError> {
    match path {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            info!(path = %path.display(), "Results written");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
