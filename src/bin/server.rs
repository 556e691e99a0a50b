use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use schnorr_auth::directory::MemoryUserDirectory;
use schnorr_auth::events::LogEventPublisher;
use schnorr_auth::server::routes::{handle_rejection, routes};
use schnorr_auth::server::{AuthService, CpuPool, RateLimiter, ServerConfig};
use schnorr_auth::store::MemoryChallengeStore;
use schnorr_auth::token::RandomTokenIssuer;
use schnorr_auth::SchnorrGroup;
use tokio::{signal, time};
use tracing::{error, info};
use warp::Filter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Schnorr zero-knowledge authentication server", long_about = None)]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Enable the Prometheus metrics endpoint
    #[arg(long, env = "METRICS_ENABLED")]
    metrics: bool,

    /// Metrics port
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServerConfig::from_env().unwrap_or_else(|e| {
        error!("Failed to load configuration: {e}");
        info!("Using default configuration");
        ServerConfig::default()
    });
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Err(e) = config.validate() {
        return Err(format!("Invalid configuration: {e}").into());
    }

    let group = Arc::new(SchnorrGroup::rfc3526_1536());
    let store = Arc::new(MemoryChallengeStore::new());
    let pool = if config.cpu.workers == 0 {
        CpuPool::with_defaults()
    } else {
        CpuPool::new(config.cpu.workers, config.cpu.queue_capacity)
    };
    let service = Arc::new(AuthService::new(
        group,
        store.clone(),
        Arc::new(MemoryUserDirectory::new()),
        Arc::new(LogEventPublisher),
        Arc::new(RandomTokenIssuer::new(config.token.expires_in_secs)),
        pool,
        Duration::from_secs(config.challenge.ttl_secs),
    ));
    let limiter = RateLimiter::new(
        config.rate_limit.requests_per_minute,
        config.rate_limit.burst,
    );

    // Expired challenges already behave as absent; this loop reclaims their
    // memory and restarts itself if it ever dies.
    let cleanup_store = store.clone();
    tokio::spawn(async move {
        loop {
            let store = cleanup_store.clone();
            let cleanup_handle = tokio::spawn(async move {
                let mut interval = time::interval(Duration::from_secs(60));
                loop {
                    interval.tick().await;
                    store.cleanup_expired().await;
                }
            });

            match cleanup_handle.await {
                Ok(()) => error!("Cleanup task terminated unexpectedly, restarting..."),
                Err(e) => error!("Cleanup task panicked: {:?}, restarting...", e),
            }

            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    });

    if args.metrics || config.metrics.enabled {
        let metrics_addr =
            format!("{}:{}", config.host, args.metrics_port).parse::<SocketAddr>()?;
        tokio::spawn(async move {
            if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                error!("Failed to start metrics server: {e}");
            } else {
                info!("Metrics server started on {metrics_addr}");
            }
        });
    }

    let addr = config.addr();
    info!(
        %addr,
        ttl_secs = config.challenge.ttl_secs,
        rate_limit = config.rate_limit.requests_per_minute,
        "server starting"
    );

    let api = routes(service, limiter).recover(handle_rejection);
    let (bound, serving) = warp::serve(api).bind_with_graceful_shutdown(addr, shutdown_signal());
    info!("Listening on {bound}");
    serving.await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Initiating graceful shutdown (allowing in-flight requests to complete)");
}
