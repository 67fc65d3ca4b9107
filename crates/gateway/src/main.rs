//! Notification gateway entry point.
//!
//! Startup sequence:
//! 1. Load and validate configuration
//! 2. Build channel adapters (fail fast if none are configured)
//! 3. Start the health check HTTP server
//! 4. Start the Kafka consumer loop on its own task
//! 5. Wait for a stop signal, then drain gracefully

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use notification_gateway::channel::{build_email_adapters, build_sms_adapters};
use notification_gateway::{
    serve_health, CustomerResolver, DlqPublisher, GatewayError, HttpCustomerResolver,
    MockCustomerResolver, NotificationConsumer, NotificationDispatcher, ReadinessGate,
    RetryExecutor, RetryPolicy,
};
use notification_gateway_config::{ExhaustedAction, GatewayConfig, ResolverKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Bounded wait for the consumer to drain its in-flight batch on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "notification-gateway",
    version,
    about = "AB Bank notification gateway - consumes notification events and delivers them over email and SMS"
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, value_name = "FILE", env = "GATEWAY_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        error!(error = %e, "gateway failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), GatewayError> {
    // 1. Configuration
    let config = GatewayConfig::load(cli.config)?;
    config.validate()?;
    info!(
        bootstrap = %config.kafka.bootstrap_servers,
        topics = ?config.kafka.topics,
        "configuration loaded"
    );

    // 2. Channel adapters, fail fast when none are operational
    let email_adapters = build_email_adapters(&config.channels.email);
    let sms_adapters = build_sms_adapters(&config.channels.sms);
    if email_adapters.is_empty() && sms_adapters.is_empty() {
        error!("no channel adapters are configured, refusing to start; set at least one email or SMS provider's credentials");
        return Err(GatewayError::NoAdapters);
    }

    // 3. Core services
    let shutdown = CancellationToken::new();
    let gate = ReadinessGate::new();

    let retry = RetryExecutor::new(RetryPolicy::from(&config.retry), shutdown.clone());
    let resolver = build_resolver(&config);
    let dispatcher = NotificationDispatcher::new(
        email_adapters.clone(),
        sms_adapters.clone(),
        retry,
        config.routing.force_both_on_severity.clone(),
    );
    let dlq = match config.retry.on_exhausted {
        ExhaustedAction::Kafka => Some(DlqPublisher::new(&config.kafka, &config.retry.dlq_topic)?),
        ExhaustedAction::Log => None,
    };

    // 4. Health server
    let health_task = tokio::spawn(serve_health(
        config.health.port,
        gate.clone(),
        shutdown.clone(),
    ));

    // 5. Consumer task
    let consumer = NotificationConsumer::new(
        &config.kafka,
        dispatcher,
        resolver,
        dlq,
        config.retry.on_exhausted,
        shutdown.clone(),
        gate.clone(),
    )?;
    let mut consumer_task = tokio::spawn(consumer.run());

    info!("notification gateway is running");

    // 6. Wait for a stop signal, or for the consumer to die on its own
    let consumer_done = tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received, starting graceful drain");
            false
        }
        result = &mut consumer_task => {
            report_consumer_exit(result);
            true
        }
    };

    gate.mark_not_ready();
    shutdown.cancel();

    if !consumer_done {
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut consumer_task).await {
            Ok(result) => report_consumer_exit(result),
            Err(_) => {
                warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "consumer did not drain within the grace period, aborting"
                );
                consumer_task.abort();
            }
        }
    }

    // Close every adapter exactly once
    for adapter in email_adapters.iter().chain(sms_adapters.iter()) {
        adapter.close().await;
    }

    if let Ok(Err(e)) = health_task.await {
        warn!(error = %e, "health server exited with error");
    }

    info!("notification gateway shut down cleanly");
    Ok(())
}

fn build_resolver(config: &GatewayConfig) -> Arc<dyn CustomerResolver> {
    match config.resolver.kind {
        ResolverKind::Http => {
            info!(base_url = %config.resolver.http.base_url, "using HTTP customer resolver");
            Arc::new(HttpCustomerResolver::new(&config.resolver.http))
        }
        ResolverKind::Mock => {
            warn!("using mock customer resolver, not suitable for production");
            Arc::new(MockCustomerResolver)
        }
    }
}

fn report_consumer_exit(result: Result<Result<(), GatewayError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!("consumer drained cleanly"),
        Ok(Err(e)) => error!(error = %e, "consumer exited with error"),
        Err(e) => error!(error = %e, "consumer task panicked or was aborted"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "notification_gateway=debug,info"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
