use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ContentDeliveryNetwork is the Schema for the contentdeliverynetworks API
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    group = "cdn.benauro.gg",
    version = "v3",
    kind = "ContentDeliveryNetwork",
    plural = "contentdeliverynetworks",
    shortname = "cdn",
    namespaced,
    status = "ContentDeliveryNetworkStatus",
    printcolumn = r#"{"name":"Domain", "type":"string", "jsonPath":".spec.domainName"}"#,
    printcolumn = r#"{"name":"Origin", "type":"string", "jsonPath":".spec.origin"}"#,
    printcolumn = r#"{"name":"Min", "type":"integer", "jsonPath":".spec.minReplicas"}"#,
    printcolumn = r#"{"name":"Max", "type":"integer", "jsonPath":".spec.maxReplicas"}"#,
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.state"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ContentDeliveryNetworkSpec {
    /// Source of the original content (e.g. "https://origin.example.com")
    pub origin: String,

    /// Public domain name served by the CDN nodes
    pub domain_name: String,

    /// Caching policy identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_behavior: Option<String>,

    /// Ordered cache rules, first match wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_rules: Vec<CacheRule>,

    /// SSL/TLS configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_config: Option<SslConfig>,

    /// Lower bound for the CDN node replica count
    pub min_replicas: i32,

    /// Upper bound for the CDN node replica count
    pub max_replicas: i32,
}

/// A path-scoped caching rule
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheRule {
    /// Request path pattern (e.g. "/static/*")
    pub path_pattern: String,

    /// Time-to-live in seconds
    pub ttl: i64,
}

/// SSL/TLS configuration for the CDN
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SslConfig {
    /// Terminate TLS at the network entry
    pub enabled: bool,

    /// PEM certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,

    /// PEM private key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Status of the ContentDeliveryNetwork
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentDeliveryNetworkStatus {
    /// Current lifecycle state
    #[serde(default)]
    pub state: CdnState,

    /// Addresses of the CDN nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,

    /// RFC3339 timestamp of the last successful reconciliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// Traffic metrics snapshot
    #[serde(default)]
    pub metrics: CdnMetrics,

    /// Observed generation of the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Kubernetes-style conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Message of the last failed reconciliation, cleared on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// CDN lifecycle state
#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, Default, PartialEq, Eq)]
pub enum CdnState {
    /// Not yet reconciled
    #[default]
    Pending,
    /// Every child resource has been applied
    Ready,
    /// The last reconciliation failed part-way through
    Degraded,
}

impl std::fmt::Display for CdnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CdnState::Pending => write!(f, "Pending"),
            CdnState::Ready => write!(f, "Ready"),
            CdnState::Degraded => write!(f, "Degraded"),
        }
    }
}

/// Monitoring metrics reported for the CDN.
///
/// Values are opaque decimal strings; the autoscaler treats anything
/// unparsable as zero.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CdnMetrics {
    #[serde(default)]
    pub requests_per_second: String,

    #[serde(default)]
    pub cache_hit_rate: String,

    /// Average latency in milliseconds
    #[serde(default)]
    pub average_latency: String,
}

/// Kubernetes-style condition
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition: True, False, or Unknown
    pub status: String,

    /// Reason for the condition's last transition
    pub reason: String,

    /// Human-readable message
    pub message: String,

    /// Last time the condition transitioned
    pub last_transition_time: String,

    /// Generation observed when condition was set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl ContentDeliveryNetwork {
    /// Requests-per-second metric as last reported in status
    pub fn requests_per_second(&self) -> &str {
        self.status
            .as_ref()
            .map(|s| s.metrics.requests_per_second.as_str())
            .unwrap_or_default()
    }

    /// Whether TLS termination is requested
    pub fn tls_enabled(&self) -> bool {
        self.spec.ssl_config.as_ref().is_some_and(|c| c.enabled)
    }
}
