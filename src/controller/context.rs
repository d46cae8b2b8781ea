use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use kube::Client;

use crate::controller::status::DEFAULT_STATUS_ATTEMPTS;
use crate::health::HealthState;
use crate::resources::deployment::DEFAULT_NODE_IMAGE;
use crate::store::{KubeStore, ObjectKey};

/// Requeue interval after a fully successful pass
pub const DEFAULT_REQUEUE_AFTER: Duration = Duration::from_secs(60);

/// Knobs of a reconciliation pass
#[derive(Clone, Debug)]
pub struct ReconcileSettings {
    /// Image of the CDN node container
    pub node_image: String,
    /// Periodic resync interval after success
    pub requeue_after: Duration,
    /// Attempts for a conflicting status write
    pub status_attempts: u32,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            node_image: DEFAULT_NODE_IMAGE.to_string(),
            requeue_after: DEFAULT_REQUEUE_AFTER,
            status_attempts: DEFAULT_STATUS_ATTEMPTS,
        }
    }
}

/// Shared context for the controllers
pub struct Context<S = KubeStore> {
    /// Declared-state store
    pub store: S,
    /// Reconciliation settings
    pub settings: ReconcileSettings,
    /// Health state for metrics recording, absent in tests
    pub health_state: Option<Arc<HealthState>>,
    /// Consecutive failures per object, cleared on success
    failures: DashMap<ObjectKey, u32>,
}

impl Context<KubeStore> {
    pub fn new(client: Client, settings: ReconcileSettings) -> Self {
        Self::with_store(KubeStore::new(client), settings)
    }
}

impl<S> Context<S> {
    /// Context over any store implementation
    pub fn with_store(store: S, settings: ReconcileSettings) -> Self {
        Self {
            store,
            settings,
            health_state: None,
            failures: DashMap::new(),
        }
    }

    /// Record metrics into the given health state
    pub fn with_health_state(mut self, health_state: Arc<HealthState>) -> Self {
        self.health_state = Some(health_state);
        self
    }

    /// Count a failed pass and return how many came before it
    pub fn record_failure(&self, key: &ObjectKey) -> u32 {
        let mut entry = self.failures.entry(key.clone()).or_insert(0);
        let previous = *entry;
        *entry = previous.saturating_add(1);
        previous
    }

    /// Length of the current failure streak of an object
    pub fn failure_count(&self, key: &ObjectKey) -> u32 {
        self.failures.get(key).map(|c| *c).unwrap_or(0)
    }

    /// Forget the failure streak of an object
    pub fn clear_failures(&self, key: &ObjectKey) {
        self.failures.remove(key);
    }
}
