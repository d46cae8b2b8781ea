pub mod config;
pub mod controller;
pub mod crd;
pub mod edge;
pub mod health;
pub mod resources;
pub mod store;

pub use config::Config;
pub use controller::{
    BackoffConfig, Context, Error, NODE_FINALIZER, ReconcileSettings, Result, error_policy,
    node_error_policy, reconcile, reconcile_node,
};
pub use crd::{ContentDeliveryNetwork, ContentDeliveryNetworkNode};
pub use health::{HealthState, Metrics};
pub use store::{ClusterStore, InMemoryStore, KubeStore, ObjectKey};

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use k8s_openapi::api::networking::v1::{Ingress, NetworkPolicy};
use kube::runtime::Controller;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

/// Helper to create a namespaced or cluster-wide API based on scope.
fn scoped_api<T>(client: Client, namespace: Option<&str>) -> Api<T>
where
    T: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <T as Resource>::DynamicType: Default,
    T: Clone + DeserializeOwned + std::fmt::Debug,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Run the ContentDeliveryNetwork controller.
///
/// When `namespace` is `Some(ns)`, only watches resources in that namespace.
/// When `namespace` is `None`, watches resources cluster-wide.
///
/// If health_state is provided, metrics will be recorded for reconciliations.
pub async fn run_controller(
    client: Client,
    settings: ReconcileSettings,
    health_state: Option<Arc<HealthState>>,
    namespace: Option<&str>,
) {
    let scope_msg = namespace.unwrap_or("cluster-wide");
    tracing::info!(
        "Starting controller for ContentDeliveryNetwork resources (scope: {})",
        scope_msg
    );

    if let Some(ref state) = health_state {
        state.set_ready(true).await;
    }

    let mut ctx = Context::new(client.clone(), settings);
    if let Some(state) = health_state {
        ctx = ctx.with_health_state(state);
    }
    let ctx = Arc::new(ctx);

    let cdns: Api<ContentDeliveryNetwork> = scoped_api(client.clone(), namespace);
    let deployments: Api<Deployment> = scoped_api(client.clone(), namespace);
    let services: Api<Service> = scoped_api(client.clone(), namespace);
    let ingresses: Api<Ingress> = scoped_api(client.clone(), namespace);
    let network_policies: Api<NetworkPolicy> = scoped_api(client.clone(), namespace);
    let pvcs: Api<PersistentVolumeClaim> = scoped_api(client.clone(), namespace);

    let watcher_config = WatcherConfig::default().any_semantic();

    // Changes to any owned child trigger reconciliation of its CDN
    Controller::new(cdns, watcher_config.clone())
        .owns(deployments, watcher_config.clone())
        .owns(services, watcher_config.clone())
        .owns(ingresses, watcher_config.clone())
        .owns(network_policies, watcher_config.clone())
        .owns(pvcs, watcher_config)
        .run(reconcile::<KubeStore>, error_policy::<KubeStore>, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    tracing::debug!("Reconciled: {}", obj.name);
                }
                Err(e) => {
                    // Watch events for children of a deleted CDN can still
                    // trigger a pass after the CDN is gone
                    let is_not_found = matches!(
                        &e,
                        kube::runtime::controller::Error::ReconcilerFailed(err, _) if err.is_not_found()
                    );
                    if is_not_found {
                        tracing::debug!("Object no longer exists (likely deleted): {:?}", e);
                    } else {
                        tracing::error!("Reconciliation error: {:?}", e);
                    }
                }
            }
        })
        .await;

    // This should never complete in normal operation
    tracing::error!("Controller stream ended unexpectedly");
}

/// Run the ContentDeliveryNetworkNode controller.
pub async fn run_node_controller(client: Client, namespace: Option<&str>) {
    let scope_msg = namespace.unwrap_or("cluster-wide");
    tracing::info!(
        "Starting controller for ContentDeliveryNetworkNode resources (scope: {})",
        scope_msg
    );

    let ctx = Arc::new(Context::new(client.clone(), ReconcileSettings::default()));
    let nodes: Api<ContentDeliveryNetworkNode> = scoped_api(client, namespace);

    Controller::new(nodes, WatcherConfig::default().any_semantic())
        .run(reconcile_node::<KubeStore>, node_error_policy::<KubeStore>, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    tracing::debug!("Reconciled node: {}", obj.name);
                }
                Err(e) => {
                    tracing::error!("Node reconciliation error: {:?}", e);
                }
            }
        })
        .await;

    tracing::error!("Node controller stream ended unexpectedly");
}
