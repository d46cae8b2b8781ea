//! Reconciliation logic for ContentDeliveryNetwork resources
//!
//! One pass validates the spec, runs the step pipeline and records the
//! outcome on the status subresource. Child resources carry owner
//! references, so deletion is left to the garbage collector and no
//! finalizer is needed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::ResourceExt;
use kube::runtime::controller::Action;
use tracing::{debug, error, info, instrument, warn};

use crate::controller::autoscale::desired_replicas;
use crate::controller::context::{Context, ReconcileSettings};
use crate::controller::error::{BackoffConfig, Error, Result};
use crate::controller::pipeline::{Step, run_pipeline};
use crate::controller::status::{StatusManager, spec_changed};
use crate::controller::validation::validate_spec;
use crate::crd::{CdnState, ContentDeliveryNetwork};
use crate::store::{ClusterStore, ObjectKey};

/// Reconcile the CDN stored under `key`.
///
/// Returns the requeue interval after a successful pass, `None` when the
/// object no longer exists.
pub async fn reconcile_key<S: ClusterStore>(
    key: &ObjectKey,
    store: &S,
    settings: &ReconcileSettings,
) -> Result<Option<Duration>> {
    let Some(cdn) = store.get::<ContentDeliveryNetwork>(key).await? else {
        debug!(key = %key, "ContentDeliveryNetwork not found, nothing to do");
        return Ok(None);
    };

    if spec_changed(&cdn) {
        info!(
            key = %key,
            generation = ?cdn.metadata.generation,
            observed = ?cdn.status.as_ref().and_then(|s| s.observed_generation),
            "Spec changed, performing full reconciliation"
        );
    }

    let status = StatusManager::new(store, key).with_attempts(settings.status_attempts);

    if let Err(e) = validate_spec(&cdn) {
        warn!(key = %key, error = %e, "Rejecting invalid ContentDeliveryNetwork");
        if let Err(status_err) = status.set_degraded(&cdn, "InvalidSpec", &e.to_string()).await {
            warn!(key = %key, error = %status_err, "Failed to record Degraded status");
        }
        return Err(e);
    }

    match run_pipeline(&Step::ORDER, &cdn, store, settings).await {
        Ok(reports) => {
            let changed = reports.iter().filter(|r| r.outcome.changed()).count();
            debug!(key = %key, changed, "All steps applied");
        }
        Err(e) => {
            error!(
                key = %key,
                step = e.failed_step().map(|s| s.name()).unwrap_or_default(),
                error = %e,
                "Reconciliation failed"
            );
            if let Err(status_err) = status
                .set_degraded(&cdn, "ReconcileFailed", &e.to_string())
                .await
            {
                warn!(key = %key, error = %status_err, "Failed to record Degraded status");
            }
            return Err(e);
        }
    }

    status.set_ready(&cdn).await?;
    info!(key = %key, "Reconciliation completed successfully");
    Ok(Some(settings.requeue_after))
}

/// Controller entry point
#[instrument(skip(cdn, ctx), fields(name = %cdn.name_any(), namespace = cdn.namespace().unwrap_or_default()))]
pub async fn reconcile<S: ClusterStore>(
    cdn: Arc<ContentDeliveryNetwork>,
    ctx: Arc<Context<S>>,
) -> Result<Action> {
    let start = Instant::now();
    let key = ObjectKey::of(cdn.as_ref())?;

    let result = reconcile_key(&key, &ctx.store, &ctx.settings).await;

    if let Some(ref health) = ctx.health_state {
        let metrics = &health.metrics;
        match &result {
            Ok(None) => {}
            Ok(Some(_)) => {
                metrics.record_reconcile(&key.namespace, &key.name, start.elapsed().as_secs_f64());
                metrics.set_desired_replicas(
                    &key.namespace,
                    &key.name,
                    i64::from(desired_replicas(&cdn)),
                );
                metrics.set_cdn_state(&key.namespace, &key.name, CdnState::Ready);
                health.touch_reconcile();
            }
            Err(e) => {
                metrics.record_error(&key.namespace, &key.name, e.failed_step().map(|s| s.name()));
                metrics.set_cdn_state(&key.namespace, &key.name, CdnState::Degraded);
            }
        }
    }

    match result? {
        Some(requeue_after) => {
            ctx.clear_failures(&key);
            Ok(Action::requeue(requeue_after))
        }
        None => {
            ctx.clear_failures(&key);
            Ok(Action::await_change())
        }
    }
}

/// Error policy for the controller with exponential backoff
pub fn error_policy<S: ClusterStore>(
    cdn: Arc<ContentDeliveryNetwork>,
    error: &Error,
    ctx: Arc<Context<S>>,
) -> Action {
    let name = cdn.name_any();
    let attempt = match ObjectKey::of(cdn.as_ref()) {
        // Gone objects are not reconciled again, so drop their streak
        Ok(key) if error.is_not_found() => {
            ctx.clear_failures(&key);
            0
        }
        Ok(key) => ctx.record_failure(&key),
        Err(_) => 0,
    };
    let delay = BackoffConfig::default().delay_for_error(error, attempt);

    if error.is_retryable() {
        warn!(
            "Retryable error for {}: {}, requeuing in {:?}",
            name, error, delay
        );
    } else {
        error!(
            "Non-retryable error for {}: {}, requeuing in {:?} for manual intervention",
            name, error, delay
        );
    }

    Action::requeue(delay)
}
