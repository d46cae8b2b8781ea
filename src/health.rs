//! Health server for Kubernetes probes and Prometheus metrics
//!
//! Provides HTTP endpoints for:
//! - `/healthz` - Liveness probe (is the process alive?)
//! - `/readyz` - Readiness probe (is the operator ready to serve?)
//! - `/metrics` - Prometheus metrics

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::crd::CdnState;

/// Labels for per-CDN metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReconcileLabels {
    pub namespace: String,
    pub name: String,
}

impl ReconcileLabels {
    fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Labels for failed reconciliations; `step` is empty for failures outside
/// the step pipeline
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub namespace: String,
    pub name: String,
    pub step: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StateLabels {
    pub namespace: String,
    pub name: String,
    pub state: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct LookupLabels {
    pub source: String,
}

/// Shared metrics state
pub struct Metrics {
    /// Total reconciliations counter
    pub reconciliations_total: Family<ReconcileLabels, Counter>,
    /// Failed reconciliations counter
    pub reconciliation_errors_total: Family<ErrorLabels, Counter>,
    /// Reconciliation duration histogram
    pub reconcile_duration_seconds: Family<ReconcileLabels, Histogram>,
    /// One for the state each CDN is in, zero for the others
    pub cdn_state: Family<StateLabels, Gauge>,
    /// Replica count the autoscaler asked for, per CDN
    pub cdn_replicas_desired: Family<ReconcileLabels, Gauge>,
    /// Media lookups by where the answer came from
    pub media_lookups_total: Family<LookupLabels, Counter>,

    /// Prometheus registry
    registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let reconciliations_total = Family::<ReconcileLabels, Counter>::default();
        registry.register(
            "cdn_operator_reconciliations",
            "Total number of reconciliations",
            reconciliations_total.clone(),
        );

        let reconciliation_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "cdn_operator_reconciliation_errors",
            "Total number of reconciliation errors",
            reconciliation_errors_total.clone(),
        );

        let reconcile_duration_seconds =
            Family::<ReconcileLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.001, 2.0, 15))
            });
        registry.register(
            "cdn_operator_reconcile_duration_seconds",
            "Duration of reconciliation in seconds",
            reconcile_duration_seconds.clone(),
        );

        let cdn_state = Family::<StateLabels, Gauge>::default();
        registry.register(
            "cdn_operator_cdn_state",
            "Current state of each ContentDeliveryNetwork",
            cdn_state.clone(),
        );

        let cdn_replicas_desired = Family::<ReconcileLabels, Gauge>::default();
        registry.register(
            "cdn_operator_replicas_desired",
            "Replica count chosen by the autoscaler for each CDN",
            cdn_replicas_desired.clone(),
        );

        let media_lookups_total = Family::<LookupLabels, Counter>::default();
        registry.register(
            "cdn_operator_media_lookups",
            "Media-to-node lookups by answer source",
            media_lookups_total.clone(),
        );

        Self {
            reconciliations_total,
            reconciliation_errors_total,
            reconcile_duration_seconds,
            cdn_state,
            cdn_replicas_desired,
            media_lookups_total,
            registry,
        }
    }

    /// Record a successful reconciliation
    pub fn record_reconcile(&self, namespace: &str, name: &str, duration_secs: f64) {
        let labels = ReconcileLabels::new(namespace, name);
        self.reconciliations_total.get_or_create(&labels).inc();
        self.reconcile_duration_seconds
            .get_or_create(&labels)
            .observe(duration_secs);
    }

    /// Record a failed reconciliation
    pub fn record_error(&self, namespace: &str, name: &str, step: Option<&str>) {
        let labels = ErrorLabels {
            namespace: namespace.to_string(),
            name: name.to_string(),
            step: step.unwrap_or_default().to_string(),
        };
        self.reconciliation_errors_total
            .get_or_create(&labels)
            .inc();
    }

    /// Record the state a CDN was left in
    pub fn set_cdn_state(&self, namespace: &str, name: &str, state: CdnState) {
        for candidate in [CdnState::Pending, CdnState::Ready, CdnState::Degraded] {
            let labels = StateLabels {
                namespace: namespace.to_string(),
                name: name.to_string(),
                state: candidate.to_string(),
            };
            let value = if candidate == state { 1 } else { 0 };
            self.cdn_state.get_or_create(&labels).set(value);
        }
    }

    /// Update the desired replica gauge of a CDN
    pub fn set_desired_replicas(&self, namespace: &str, name: &str, desired: i64) {
        self.cdn_replicas_desired
            .get_or_create(&ReconcileLabels::new(namespace, name))
            .set(desired);
    }

    /// Count a media lookup answered from `source`
    pub fn record_media_lookup(&self, source: &str) {
        let labels = LookupLabels {
            source: source.to_string(),
        };
        self.media_lookups_total.get_or_create(&labels).inc();
    }

    /// Prometheus text exposition, empty if encoding fails
    fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, &self.registry) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        buffer
    }
}

/// Shared state for the health server
pub struct HealthState {
    /// Whether the operator is ready (connected to K8s API)
    pub ready: RwLock<bool>,
    /// Metrics registry
    pub metrics: Metrics,
    /// Unix time of the last successful reconcile
    pub last_reconcile: AtomicU64,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            ready: RwLock::new(false),
            metrics: Metrics::new(),
            last_reconcile: AtomicU64::new(0),
        }
    }

    /// Mark the operator as ready
    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Check if the operator is ready
    pub async fn is_ready(&self) -> bool {
        *self.ready.read().await
    }

    /// Stamp the last successful reconcile with the current time
    pub fn touch_reconcile(&self) {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.last_reconcile.store(now, Ordering::Relaxed);
    }
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// 503 until the controllers have started
async fn readyz(State(state): State<Arc<HealthState>>) -> Response {
    if state.is_ready().await {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

/// Metrics handler
async fn metrics(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let body = state.metrics.encode();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Create the health server router
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Run the health server on `addr`
pub async fn run_health_server(
    state: Arc<HealthState>,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Health server listening on {}", addr);

    axum::serve(listener, app).await
}
