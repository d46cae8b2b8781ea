//! Compute driver: the CDN node Deployment and its replica count

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use tracing::{debug, info};

use crate::controller::autoscale::desired_replicas;
use crate::controller::error::Result;
use crate::controller::pipeline::Outcome;
use crate::crd::ContentDeliveryNetwork;
use crate::resources::deployment::generate_deployment;
use crate::resources::deployment_name;
use crate::store::{ClusterStore, ObjectKey};

/// Create the node Deployment at `minReplicas`.
///
/// Losing the create race to another writer is not an error: the workload
/// exists either way.
pub async fn create_workload<S: ClusterStore>(
    store: &S,
    cdn: &ContentDeliveryNetwork,
    image: &str,
) -> Result<Option<Deployment>> {
    let deployment = generate_deployment(cdn, image);

    match store.create(&deployment).await {
        Ok(created) => {
            info!(
                name = %deployment.name_any(),
                replicas = cdn.spec.min_replicas,
                "Created CDN node deployment"
            );
            Ok(Some(created))
        }
        Err(e) if e.is_already_exists() => {
            debug!(name = %deployment.name_any(), "Deployment created concurrently");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Bring the node Deployment to the replica count the CDN's load calls for.
///
/// Only `spec.replicas` is compared and written. A missing Deployment is
/// created first and then scaled in the same pass, so a second pass over
/// unchanged input finds nothing to do.
pub async fn auto_scale<S: ClusterStore>(
    store: &S,
    cdn: &ContentDeliveryNetwork,
    image: &str,
) -> Result<Outcome> {
    let key = ObjectKey::of(cdn)?.sibling(deployment_name(&cdn.name_any()));
    let desired = desired_replicas(cdn);

    let (deployment, created) = match store.get::<Deployment>(&key).await? {
        Some(existing) => (existing, false),
        None => match create_workload(store, cdn, image).await? {
            Some(created) => (created, true),
            None => return Ok(Outcome::Unchanged),
        },
    };

    let outcome = scale(store, deployment, desired).await?;
    Ok(match (created, outcome) {
        (true, _) => Outcome::Created,
        (false, outcome) => outcome,
    })
}

async fn scale<S: ClusterStore>(
    store: &S,
    mut deployment: Deployment,
    desired: i32,
) -> Result<Outcome> {
    // The API server defaults an unset replica count to one
    let current = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);

    if current == desired {
        return Ok(Outcome::Unchanged);
    }

    info!(
        name = %deployment.name_any(),
        from = current,
        to = desired,
        "Scaling CDN node deployment"
    );
    deployment.spec.get_or_insert_with(Default::default).replicas = Some(desired);
    store.replace(&deployment).await?;
    Ok(Outcome::Updated)
}
