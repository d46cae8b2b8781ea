use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use serde_json::{Value, json};
use tracing::debug;

use crate::controller::error::Result;
use crate::resources::FIELD_MANAGER;
use crate::store::{ClusterStore, Managed, ObjectKey};

/// [`ClusterStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: Managed>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(FIELD_MANAGER.to_string()),
        }
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get<K: Managed>(&self, key: &ObjectKey) -> Result<Option<K>> {
        Ok(self.api::<K>(&key.namespace).get_opt(&key.name).await?)
    }

    async fn create<K: Managed>(&self, obj: &K) -> Result<K> {
        let key = ObjectKey::of(obj)?;
        let created = self
            .api::<K>(&key.namespace)
            .create(&Self::post_params(), obj)
            .await?;
        debug!(kind = %K::kind(&()), key = %key, "Created resource");
        Ok(created)
    }

    async fn replace<K: Managed>(&self, obj: &K) -> Result<K> {
        let key = ObjectKey::of(obj)?;
        let replaced = self
            .api::<K>(&key.namespace)
            .replace(&key.name, &Self::post_params(), obj)
            .await?;
        debug!(kind = %K::kind(&()), key = %key, "Replaced resource");
        Ok(replaced)
    }

    async fn replace_status<K: Managed>(&self, obj: &K) -> Result<K> {
        let key = ObjectKey::of(obj)?;
        let status = serde_json::to_value(obj)?
            .get("status")
            .cloned()
            .unwrap_or(Value::Null);

        // resourceVersion turns the merge patch into a version-checked write
        let patch = json!({
            "metadata": { "resourceVersion": obj.resource_version() },
            "status": status,
        });

        let updated = self
            .api::<K>(&key.namespace)
            .patch_status(
                &key.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
        debug!(kind = %K::kind(&()), key = %key, "Updated status");
        Ok(updated)
    }
}
