//! system-metrics - version 0.1.0
//!
//! Periodic system-metrics sampler with tracing logging.
//! This is the main entry point that configures the collector, drives it on a
//! fixed interval and serves the sampled gauges over HTTP.

mod cli;
mod commands;
mod config;
mod handlers;
mod state;

use axum::{routing::get, Router};
use clap::Parser;
use prometheus::{Gauge, Registry};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use system_metrics::{Collector, CycleStats, LogSink, MetricRegistry, MetricSink, PrometheusSink};
use tokio::{net::TcpListener, signal, time::MissedTickBehavior};
use tracing::{debug, error, info, warn, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_config, command_list, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, SinkKind, DEFAULT_BIND_ADDR,
    DEFAULT_PORT,
};
use handlers::{health_handler, metrics_handler};
use state::{AppState, SharedState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(level: LogLevel) {
    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration, starting logging at
/// the resolved level. Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    setup_logging(config.log_level());
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Builds the collector for the configured sink and applies the module block.
fn build_collector(
    config: &Config,
    registry: &Registry,
) -> Result<Arc<Collector>, Box<dyn std::error::Error>> {
    let sink: Arc<dyn MetricSink> = match config.sink() {
        SinkKind::Prometheus => Arc::new(PrometheusSink::new(registry)?),
        SinkKind::Log => Arc::new(LogSink),
    };

    let collector = Collector::new(MetricRegistry::builtin(config.proc_root()), sink)
        .with_plugin_name(config.plugin_name());

    let report = collector.configure(&config.config_block());
    if report.applied.is_none() {
        warn!("No metric_list configured - collection cycles will not emit anything");
    }

    for name in collector.selector().configured().iter() {
        if !collector.registry().contains(name) {
            warn!("Metric '{}' is not registered and will be ignored", name);
        }
    }

    Ok(Arc::new(collector))
}

/// Runs one collection cycle on the blocking pool and records its outcome.
async fn run_cycle(state: &SharedState) {
    let collector = state.collector.clone();
    match tokio::task::spawn_blocking(move || collector.read_cycle()).await {
        Ok(report) => {
            state.stats.record_cycle(&report);
            if report.skipped {
                return;
            }
            state.cycle_duration.set(report.duration.as_secs_f64());
            state
                .cycle_success
                .set(if report.is_clean() { 1.0 } else { 0.0 });
            debug!(
                "Cycle finished: {} producers, {} values, {} failures",
                report.producers_run,
                report.dispatched,
                report.producer_failures.len() + report.dispatch_failures.len()
            );
        }
        Err(e) => {
            // A panicking producer must not take the scheduler down with it
            error!("Collection cycle aborted: {}", e);
            state.cycle_success.set(0.0);
        }
    }
}

/// Background task firing a collection cycle every interval.
async fn collection_loop(state: SharedState) {
    let interval = Duration::from_secs(state.config.interval_seconds());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Collecting every {}s", interval.as_secs());
    loop {
        ticker.tick().await;
        run_cycle(&state).await;
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;

        return match command {
            Commands::List => command_list(&config),
            Commands::Test {
                iterations,
                verbose,
            } => command_test(*iterations, *verbose, &config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    let config = load_validated_config(&args)?;

    info!("Starting system-metrics");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR).to_string();
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let collector = build_collector(&config, &registry)?;

    let cycle_duration = Gauge::new(
        "system_metrics_cycle_duration_seconds",
        "Time spent in the most recent collection cycle",
    )?;
    let cycle_success = Gauge::new(
        "system_metrics_cycle_success",
        "Whether the most recent collection cycle had no failures (1) or not (0)",
    )?;
    registry.register(Box::new(cycle_duration.clone()))?;
    registry.register(Box::new(cycle_success.clone()))?;

    debug!("All metrics registered successfully");

    let state = Arc::new(AppState {
        registry,
        collector,
        stats: Arc::new(CycleStats::new()),
        config: Arc::new(config),
        cycle_duration,
        cycle_success,
    });

    // The first tick fires immediately, so /metrics has data right away
    tokio::spawn(collection_loop(state.clone()));

    // Setup graceful shutdown signal handlers
    let shutdown_signal = async {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    };

    // Configure HTTP server routes
    let bind_ip: IpAddr = bind_ip_str.parse()?;
    let addr = SocketAddr::new(bind_ip, port);

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "system-metrics listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("system-metrics stopped gracefully");
    Ok(())
}
