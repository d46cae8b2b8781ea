//! Command-line and environment configuration

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::controller::ReconcileSettings;
use crate::controller::status::DEFAULT_STATUS_ATTEMPTS;
use crate::resources::deployment::DEFAULT_NODE_IMAGE;

/// Kubernetes operator for ContentDeliveryNetwork resources
#[derive(Parser, Debug, Clone)]
#[command(name = "cdn-operator")]
#[command(about = "Reconciles ContentDeliveryNetwork resources into CDN node workloads", long_about = None)]
#[command(version)]
pub struct Config {
    /// Only watch this namespace (default: cluster-wide)
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Container image of the CDN nodes
    #[arg(long, env = "CDN_NODE_IMAGE", default_value = DEFAULT_NODE_IMAGE)]
    pub node_image: String,

    /// Address of the health and metrics server
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8080")]
    pub health_addr: SocketAddr,

    /// Address of the media-resolution service
    #[arg(long, env = "MEDIA_ADDR", default_value = "0.0.0.0:8081")]
    pub media_addr: SocketAddr,

    /// Seconds between periodic reconciliations of a healthy CDN
    #[arg(long, env = "REQUEUE_SECS", default_value_t = 60)]
    pub requeue_secs: u64,

    /// Attempts for a status write that keeps conflicting
    #[arg(long, env = "STATUS_ATTEMPTS", default_value_t = DEFAULT_STATUS_ATTEMPTS)]
    pub status_attempts: u32,

    /// Name of the leader-election lease
    #[arg(long, env = "LEASE_NAME", default_value = "cdn-operator-leader")]
    pub lease_name: String,

    /// Lease time-to-live in seconds
    #[arg(long, env = "LEASE_TTL_SECS", default_value_t = 15)]
    pub lease_ttl_secs: u64,

    /// Seconds between lease renewals
    #[arg(long, env = "LEASE_RENEW_SECS", default_value_t = 5)]
    pub lease_renew_secs: u64,

    /// Identity of this replica in the lease (default: hostname)
    #[arg(long, env = "POD_NAME")]
    pub pod_name: Option<String>,

    /// Namespace holding the lease
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    pub pod_namespace: String,

    /// Run without leader election (single replica deployments)
    #[arg(long, env = "DISABLE_LEADER_ELECTION")]
    pub disable_leader_election: bool,
}

impl Config {
    /// Settings of a reconciliation pass
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            node_image: self.node_image.clone(),
            requeue_after: Duration::from_secs(self.requeue_secs),
            status_attempts: self.status_attempts.max(1),
        }
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    pub fn lease_renew_interval(&self) -> Duration {
        Duration::from_secs(self.lease_renew_secs)
    }
}
