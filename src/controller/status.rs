//! Status and conditions management for ContentDeliveryNetwork resources
//!
//! This module provides utilities for managing Kubernetes-style conditions
//! and updating the status subresource.
//!
//! Status writes are version-checked. When a write loses a race with
//! another writer the object is re-read, the same mutation is applied to
//! the fresh copy and the write is retried, up to a fixed number of
//! attempts.

use chrono::Utc;
use tracing::{debug, warn};

use crate::controller::error::Result;
use crate::crd::{CdnState, Condition, ContentDeliveryNetwork, ContentDeliveryNetworkStatus};
use crate::store::{ClusterStore, ObjectKey};

/// Default number of attempts for a status write that keeps conflicting
pub const DEFAULT_STATUS_ATTEMPTS: u32 = 3;

/// Standard condition types following Kubernetes conventions
pub mod condition_types {
    /// Every child resource has been applied
    pub const READY: &str = "Ready";
    /// The last reconciliation failed part-way through
    pub const DEGRADED: &str = "Degraded";
}

/// Condition status values
pub mod condition_status {
    pub const TRUE: &str = "True";
    pub const FALSE: &str = "False";
}

fn flag(value: bool) -> &'static str {
    if value {
        condition_status::TRUE
    } else {
        condition_status::FALSE
    }
}

/// Builder for creating and updating status conditions
pub struct ConditionBuilder {
    conditions: Vec<Condition>,
    generation: Option<i64>,
}

impl ConditionBuilder {
    /// Create a new condition builder
    pub fn new(generation: Option<i64>) -> Self {
        Self {
            conditions: Vec::new(),
            generation,
        }
    }

    /// Create from existing conditions
    pub fn from_existing(existing: Vec<Condition>, generation: Option<i64>) -> Self {
        Self {
            conditions: existing,
            generation,
        }
    }

    /// Set a condition, updating if it exists or adding if it doesn't
    pub fn set_condition(mut self, type_: &str, status: &str, reason: &str, message: &str) -> Self {
        let now = Utc::now().to_rfc3339();

        if let Some(existing) = self.conditions.iter_mut().find(|c| c.type_ == type_) {
            // Transition time only moves when the status flips
            if existing.status != status {
                existing.status = status.to_string();
                existing.last_transition_time = now;
            }
            existing.reason = reason.to_string();
            existing.message = message.to_string();
            existing.observed_generation = self.generation;
        } else {
            self.conditions.push(Condition {
                type_: type_.to_string(),
                status: status.to_string(),
                reason: reason.to_string(),
                message: message.to_string(),
                last_transition_time: now,
                observed_generation: self.generation,
            });
        }
        self
    }

    /// Set the Ready condition
    pub fn ready(self, is_ready: bool, reason: &str, message: &str) -> Self {
        self.set_condition(condition_types::READY, flag(is_ready), reason, message)
    }

    /// Set the Degraded condition
    pub fn degraded(self, is_degraded: bool, reason: &str, message: &str) -> Self {
        self.set_condition(condition_types::DEGRADED, flag(is_degraded), reason, message)
    }

    /// Build the conditions list
    pub fn build(self) -> Vec<Condition> {
        self.conditions
    }
}

/// Status after a fully successful reconciliation
pub fn ready_status(cdn: &ContentDeliveryNetwork) -> ContentDeliveryNetworkStatus {
    let generation = cdn.metadata.generation;
    let existing = cdn.status.clone().unwrap_or_default();

    let conditions = ConditionBuilder::from_existing(existing.conditions, generation)
        .ready(true, "Reconciled", "All child resources are applied")
        .degraded(false, "Reconciled", "Last reconciliation succeeded")
        .build();

    ContentDeliveryNetworkStatus {
        state: CdnState::Ready,
        nodes: existing.nodes,
        last_updated: Some(Utc::now().to_rfc3339()),
        metrics: existing.metrics,
        observed_generation: generation,
        conditions,
        last_error: None,
    }
}

/// Status after a reconciliation that stopped part-way through
///
/// `lastUpdated` keeps pointing at the last successful pass.
pub fn degraded_status(
    cdn: &ContentDeliveryNetwork,
    reason: &str,
    message: &str,
) -> ContentDeliveryNetworkStatus {
    let generation = cdn.metadata.generation;
    let existing = cdn.status.clone().unwrap_or_default();

    let conditions = ConditionBuilder::from_existing(existing.conditions, generation)
        .ready(false, reason, message)
        .degraded(true, reason, message)
        .build();

    ContentDeliveryNetworkStatus {
        state: CdnState::Degraded,
        nodes: existing.nodes,
        last_updated: existing.last_updated,
        metrics: existing.metrics,
        observed_generation: generation,
        conditions,
        last_error: Some(message.to_string()),
    }
}

/// Status manager for ContentDeliveryNetwork resources
pub struct StatusManager<'a, S> {
    store: &'a S,
    key: &'a ObjectKey,
    attempts: u32,
}

impl<'a, S: ClusterStore> StatusManager<'a, S> {
    /// Create a new status manager
    pub fn new(store: &'a S, key: &'a ObjectKey) -> Self {
        Self {
            store,
            key,
            attempts: DEFAULT_STATUS_ATTEMPTS,
        }
    }

    /// Override the number of write attempts (at least one)
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Mark the CDN Ready and stamp `lastUpdated`
    pub async fn set_ready(&self, cdn: &ContentDeliveryNetwork) -> Result<()> {
        self.write(cdn, ready_status).await
    }

    /// Mark the CDN Degraded with the failure that interrupted reconciliation
    pub async fn set_degraded(
        &self,
        cdn: &ContentDeliveryNetwork,
        reason: &str,
        message: &str,
    ) -> Result<()> {
        self.write(cdn, |fresh| degraded_status(fresh, reason, message))
            .await
    }

    /// Write a status computed from the object, re-reading it on conflict.
    ///
    /// An object deleted between attempts ends the write without error.
    async fn write<F>(&self, cdn: &ContentDeliveryNetwork, compute: F) -> Result<()>
    where
        F: Fn(&ContentDeliveryNetwork) -> ContentDeliveryNetworkStatus,
    {
        let mut current = cdn.clone();
        let mut attempt = 1;

        loop {
            let mut desired = current.clone();
            desired.status = Some(compute(&current));

            match self.store.replace_status(&desired).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_conflict() && attempt < self.attempts => {
                    warn!(
                        key = %self.key,
                        attempt,
                        "Status update conflicted, re-reading object"
                    );
                    match self.store.get::<ContentDeliveryNetwork>(self.key).await? {
                        Some(fresh) => current = fresh,
                        None => {
                            debug!(key = %self.key, "Object deleted during status update");
                            return Ok(());
                        }
                    }
                    attempt += 1;
                }
                Err(e) if e.is_not_found() => {
                    debug!(key = %self.key, "Object deleted before status update");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Check if the CDN spec has changed since the last recorded reconciliation
pub fn spec_changed(cdn: &ContentDeliveryNetwork) -> bool {
    let current_generation = cdn.metadata.generation;
    let observed_generation = cdn.status.as_ref().and_then(|s| s.observed_generation);

    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        _ => true,
    }
}
