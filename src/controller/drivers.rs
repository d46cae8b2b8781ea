//! Create-or-update protocol shared by every child-resource driver
//!
//! Each driver reads the stored child first. An absent child is created;
//! a create that loses a race (`AlreadyExists`) falls back to updating the
//! object the other writer created. A present child is replaced only when
//! it has drifted from the desired definition on a field this operator
//! manages, so a converged pass writes nothing.
//!
//! Replacement is a full overwrite of the managed fields: the operator is
//! the only writer of these children.

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use k8s_openapi::api::networking::v1::{Ingress, NetworkPolicy};
use kube::ResourceExt;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::controller::error::Result;
use crate::controller::pipeline::Outcome;
use crate::store::{ClusterStore, Managed, ObjectKey};

/// A child resource kind the create-or-update protocol can drive
pub trait ChildResource: Managed {
    /// Copy fields the API server assigns and the desired definition does
    /// not manage, so a replace does not try to clear them
    fn carry_over(&mut self, _stored: &Self) {}
}

impl ChildResource for Ingress {}

impl ChildResource for NetworkPolicy {}

impl ChildResource for Service {
    fn carry_over(&mut self, stored: &Self) {
        if let (Some(spec), Some(stored_spec)) = (self.spec.as_mut(), stored.spec.as_ref()) {
            spec.cluster_ip = stored_spec.cluster_ip.clone();
            spec.cluster_ips = stored_spec.cluster_ips.clone();
        }
    }
}

impl ChildResource for PersistentVolumeClaim {
    fn carry_over(&mut self, stored: &Self) {
        if let (Some(spec), Some(stored_spec)) = (self.spec.as_mut(), stored.spec.as_ref()) {
            spec.volume_name = stored_spec.volume_name.clone();
            spec.storage_class_name = stored_spec.storage_class_name.clone();
            spec.volume_mode = stored_spec.volume_mode.clone();
        }
    }
}

/// Apply a desired child resource with the create-or-update protocol
pub async fn create_or_update<S, K>(store: &S, desired: K) -> Result<Outcome>
where
    S: ClusterStore,
    K: ChildResource,
{
    let key = ObjectKey::of(&desired)?;

    if let Some(stored) = store.get::<K>(&key).await? {
        return update_if_drifted(store, desired, &stored).await;
    }

    match store.create(&desired).await {
        Ok(_) => {
            info!(kind = %K::kind(&()), key = %key, "Created child resource");
            Ok(Outcome::Created)
        }
        Err(e) if e.is_already_exists() => {
            debug!(
                kind = %K::kind(&()),
                key = %key,
                "Child resource created concurrently, updating instead"
            );
            match store.get::<K>(&key).await? {
                Some(stored) => update_if_drifted(store, desired, &stored).await,
                // Deleted again in between; surface the original race
                None => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

async fn update_if_drifted<S, K>(store: &S, mut desired: K, stored: &K) -> Result<Outcome>
where
    S: ClusterStore,
    K: ChildResource,
{
    if converged(&desired, stored)? {
        debug!(kind = %K::kind(&()), name = %stored.name_any(), "Child resource up to date");
        return Ok(Outcome::Unchanged);
    }

    desired.carry_over(stored);
    desired.meta_mut().resource_version = stored.resource_version();
    store.replace(&desired).await?;
    info!(kind = %K::kind(&()), name = %stored.name_any(), "Updated child resource");
    Ok(Outcome::Updated)
}

/// Whether the stored object already carries every field of the desired one.
///
/// Compared fields: labels, owner references and every top-level field
/// other than metadata and status. Fields the server adds on its own
/// (defaults, allocated addresses) do not count as drift.
pub fn converged<K: Managed>(desired: &K, stored: &K) -> Result<bool> {
    let desired = managed_view(serde_json::to_value(desired)?);
    let stored = serde_json::to_value(stored)?;
    Ok(is_subset(&desired, &stored))
}

fn managed_view(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let mut view = Map::new();
    for (field, v) in map {
        match field.as_str() {
            "apiVersion" | "kind" | "status" => {}
            "metadata" => {
                let mut meta = Map::new();
                for managed in ["labels", "ownerReferences"] {
                    if let Some(v) = v.get(managed) {
                        meta.insert(managed.to_string(), v.clone());
                    }
                }
                view.insert(field, Value::Object(meta));
            }
            _ => {
                view.insert(field, v);
            }
        }
    }
    Value::Object(view)
}

/// Structural subset check: objects may carry extra keys, arrays must match
/// element for element, scalars must be equal.
pub fn is_subset(desired: &Value, actual: &Value) -> bool {
    match (desired, actual) {
        (Value::Null, _) => true,
        (Value::Object(d), Value::Object(a)) => d.iter().all(|(k, dv)| match a.get(k) {
            Some(av) => is_subset(dv, av),
            None => dv.is_null(),
        }),
        (Value::Array(d), Value::Array(a)) => {
            d.len() == a.len() && d.iter().zip(a).all(|(dv, av)| is_subset(dv, av))
        }
        (d, a) => d == a,
    }
}
