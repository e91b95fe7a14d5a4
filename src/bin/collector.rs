use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use httpmetrics::collectors::{Collector, CollectorPlugin, HttpCollectorPlugin, SourceDescriptor};
use httpmetrics::config::{CollectorConfig, DEFAULT_CONFIG_PATH};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Poll HTTP endpoints and report milli-scaled metric readings", long_about = None)]
struct Args {
    /// Path to the TOML collector configuration
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Poll every collector once and exit
    #[arg(long)]
    once: bool,

    /// Print each reading as a JSON line on stdout
    #[arg(long)]
    json: bool,
}

struct Target {
    source: SourceDescriptor,
    collector: Arc<dyn Collector>,
}

const DEFAULT_LOG_FILTER: &str = "httpmetrics=info";

/// `RUST_LOG` when it is set and parses, otherwise the default filter.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let args = Args::parse();
    let config = CollectorConfig::load(&args.config)?;

    // The blocking client has to be built before the runtime starts, and the
    // plugin keeps it alive until the runtime is gone.
    let plugin = HttpCollectorPlugin::new();
    let mut targets = Vec::with_capacity(config.metrics.len());
    for (index, entry) in config.metrics.iter().enumerate() {
        let source = entry.source(&config.namespace, index);
        let collector = plugin
            .new_collector(&source, &entry.metric_config(), entry.interval())
            .with_context(|| format!("failed to create collector {source}"))?;
        targets.push(Arc::new(Target {
            source,
            collector: Arc::from(collector),
        }));
    }

    info!(
        plugin = plugin.name(),
        collectors = targets.len(),
        config = %args.config,
        once = args.once,
        "httpmetrics-collector starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let failures = if args.once {
        runtime.block_on(poll_all_once(targets, args.json))
    } else {
        runtime.block_on(poll_forever(targets, args.json));
        0
    };
    runtime.shutdown_timeout(Duration::from_secs(5));
    drop(plugin);

    if failures > 0 {
        bail!("{failures} collector(s) failed");
    }
    Ok(())
}

async fn poll_all_once(targets: Vec<Arc<Target>>, json: bool) -> usize {
    let mut tasks = JoinSet::new();
    for target in targets {
        tasks.spawn_blocking(move || poll(&target, json));
    }

    let mut failures = 0;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(true) => {}
            Ok(false) => failures += 1,
            Err(e) => {
                error!(error = %e, "Poll task failed");
                failures += 1;
            }
        }
    }
    failures
}

async fn poll_forever(targets: Vec<Arc<Target>>, json: bool) {
    let mut tasks = JoinSet::new();
    for target in targets {
        tasks.spawn(poll_loop(target, json));
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        }
        _ = async { while tasks.join_next().await.is_some() {} } => {}
    }
    tasks.abort_all();
}

async fn poll_loop(target: Arc<Target>, json: bool) {
    let mut ticker = time::interval(target.collector.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let target = Arc::clone(&target);
        if let Err(e) = tokio::task::spawn_blocking(move || poll(&target, json)).await {
            error!(error = %e, "Poll task failed");
        }
    }
}

/// Returns whether the poll succeeded. Failures are logged and the next
/// tick polls again.
fn poll(target: &Target, json: bool) -> bool {
    match target.collector.get_metrics() {
        Ok(metrics) => {
            for mut metric in metrics {
                metric.external.timestamp = Some(chrono::Utc::now());
                if json {
                    match serde_json::to_string(&metric) {
                        Ok(line) => println!("{line}"),
                        Err(e) => error!(error = %e, "Failed to serialize metric"),
                    }
                } else {
                    info!(
                        source = %target.source,
                        kind = %metric.kind,
                        metric = metric.name(),
                        value = %metric.value(),
                        "Collected metric"
                    );
                }
            }
            true
        }
        Err(e) => {
            warn!(source = %target.source, error = %e, "Collection failed");
            false
        }
    }
}
