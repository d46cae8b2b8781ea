//! Finalizer bookkeeping for ContentDeliveryNetworkNode resources
//!
//! Nodes get a finalizer while they live; on deletion it is removed so the
//! API server can release the object. There is no external state to clean
//! up in between.

use std::sync::Arc;
use std::time::Duration;

use kube::ResourceExt;
use kube::runtime::controller::Action;
use tracing::{debug, info, instrument, warn};

use crate::controller::context::Context;
use crate::controller::error::{BackoffConfig, Error, Result};
use crate::crd::ContentDeliveryNetworkNode;
use crate::store::{ClusterStore, ObjectKey};

/// Finalizer placed on every CDN node
pub const NODE_FINALIZER: &str = "cdnnode.finalizers.cdn.benauro.gg";

fn has_finalizer(node: &ContentDeliveryNetworkNode) -> bool {
    node.finalizers().iter().any(|f| f == NODE_FINALIZER)
}

/// Add or release the node finalizer depending on the deletion state
pub async fn reconcile_node_key<S: ClusterStore>(key: &ObjectKey, store: &S) -> Result<()> {
    let Some(mut node) = store.get::<ContentDeliveryNetworkNode>(key).await? else {
        debug!(key = %key, "ContentDeliveryNetworkNode not found, nothing to do");
        return Ok(());
    };

    if node.metadata.deletion_timestamp.is_some() {
        if has_finalizer(&node) {
            node.finalizers_mut().retain(|f| f != NODE_FINALIZER);
            store.replace(&node).await?;
            info!(key = %key, "Removed finalizer from deleted node");
        }
        return Ok(());
    }

    if !has_finalizer(&node) {
        node.finalizers_mut().push(NODE_FINALIZER.to_string());
        store.replace(&node).await?;
        info!(key = %key, "Added finalizer to node");
    }

    Ok(())
}

/// Controller entry point for nodes
#[instrument(skip(node, ctx), fields(name = %node.name_any(), namespace = node.namespace().unwrap_or_default()))]
pub async fn reconcile_node<S: ClusterStore>(
    node: Arc<ContentDeliveryNetworkNode>,
    ctx: Arc<Context<S>>,
) -> Result<Action> {
    let key = ObjectKey::of(node.as_ref())?;
    reconcile_node_key(&key, &ctx.store).await?;
    Ok(Action::await_change())
}

/// Error policy for the node controller
pub fn node_error_policy<S: ClusterStore>(
    node: Arc<ContentDeliveryNetworkNode>,
    error: &Error,
    _ctx: Arc<Context<S>>,
) -> Action {
    let delay = if error.is_conflict() {
        // Stale copy; the watch delivers the fresh object shortly
        Duration::from_secs(1)
    } else {
        BackoffConfig::default().delay_for_error(error, 0)
    };
    warn!(
        "Error reconciling node {}: {}, requeuing in {:?}",
        node.name_any(),
        error,
        delay
    );
    Action::requeue(delay)
}
