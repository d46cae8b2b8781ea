use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use kube::Client;
use kube_leader_election::{LeaseLock, LeaseLockParams};
use tokio::signal;
use tracing::{error, info, warn};

use cdn_operator::edge::{InMemoryMediaCache, MediaState, StaticNodeTable, run_media_server};
use cdn_operator::health::{HealthState, run_health_server};
use cdn_operator::{Config, run_controller, run_node_controller};

/// Grace period for in-flight reconciliations to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // Install the TLS crypto provider before any TLS operations
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        // Check if a provider is already installed
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            return Err(
                "Failed to install rustls crypto provider and no provider is available".into(),
            );
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cdn_operator=info".parse()?)
                .add_directive("kube=info".parse()?)
                .add_directive("kube_leader_election=info".parse()?),
        )
        .init();

    info!("Starting cdn-operator");

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let health_state = Arc::new(HealthState::new());

    // Probes and media lookups are served even while not leading
    let health_handle = {
        let health_state = health_state.clone();
        let addr = config.health_addr;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, addr).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let media_handle = {
        let state = MediaState::new(
            Arc::new(StaticNodeTable::default()),
            Arc::new(InMemoryMediaCache::new()),
        )
        .with_health_state(health_state.clone());
        let addr = config.media_addr;
        tokio::spawn(async move {
            if let Err(e) = run_media_server(state, addr).await {
                error!("Media server error: {}", e);
            }
        })
    };

    let lease_renewal_handle = if config.disable_leader_election {
        warn!("Leader election disabled, assuming a single operator replica");
        None
    } else {
        Some(acquire_leadership(&client, &config).await)
    };

    let lease_future = async {
        match lease_renewal_handle {
            Some(handle) => handle.await,
            None => std::future::pending().await,
        }
    };

    let namespace = config.watch_namespace.clone();
    info!(
        "Watching ContentDeliveryNetwork resources (apiVersion: {}) in {}",
        cdn_operator::resources::API_VERSION,
        namespace.as_deref().unwrap_or("all namespaces")
    );

    let controller_handle = {
        let health_state = health_state.clone();
        let client = client.clone();
        let settings = config.reconcile_settings();
        let namespace = namespace.clone();
        tokio::spawn(async move {
            run_controller(client, settings, Some(health_state), namespace.as_deref()).await;
        })
    };

    let node_controller_handle = {
        let client = client.clone();
        tokio::spawn(async move {
            run_node_controller(client, namespace.as_deref()).await;
        })
    };

    tokio::select! {
        result = controller_handle => {
            if let Err(e) = result {
                error!("CDN controller task panicked: {}", e);
            }
        }
        result = node_controller_handle => {
            if let Err(e) = result {
                error!("Node controller task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        result = media_handle => {
            if let Err(e) = result {
                error!("Media server task panicked: {}", e);
            }
        }
        // Lease renewal only exits via process::exit() or panic
        Err(e) = lease_future => {
            error!("Lease renewal task panicked: {}", e);
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            health_state.set_ready(false).await;
            info!("Marked operator as not ready");

            info!(
                "Waiting {}s for in-flight reconciliations to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Operator stopped");
    Ok(())
}

fn lease_lock(client: &Client, config: &Config, holder_id: &str) -> LeaseLock {
    LeaseLock::new(
        client.clone(),
        &config.pod_namespace,
        LeaseLockParams {
            holder_id: holder_id.to_string(),
            lease_name: config.lease_name.clone(),
            lease_ttl: config.lease_ttl(),
        },
    )
}

/// Block until this replica holds the lease, then keep renewing it in the
/// background. Losing the lease exits the process so Kubernetes restarts it
/// into a fresh election.
async fn acquire_leadership(client: &Client, config: &Config) -> tokio::task::JoinHandle<()> {
    let holder_id = config.pod_name.clone().unwrap_or_else(|| {
        warn!("POD_NAME not set, using hostname");
        hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    });

    info!(
        holder_id = %holder_id,
        namespace = %config.pod_namespace,
        lease_name = %config.lease_name,
        "Initializing leader election"
    );

    let lock = lease_lock(client, config, &holder_id);
    let renew_interval = config.lease_renew_interval();

    info!("Waiting to acquire leadership...");
    loop {
        match lock.try_acquire_or_renew().await {
            Ok(result) if result.acquired_lease => {
                info!("Acquired leadership");
                break;
            }
            Ok(_) => info!("Another instance is leader, waiting..."),
            Err(e) => warn!("Failed to acquire lease: {}, retrying...", e),
        }
        tokio::time::sleep(renew_interval).await;
    }

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(renew_interval).await;

            match lock.try_acquire_or_renew().await {
                Ok(result) if result.acquired_lease => {}
                Ok(_) => {
                    error!("Lost leadership! Shutting down...");
                    std::process::exit(1);
                }
                Err(e) => {
                    error!("Failed to renew lease: {}. Shutting down...", e);
                    std::process::exit(1);
                }
            }
        }
    })
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
