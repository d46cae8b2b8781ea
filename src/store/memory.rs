use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::controller::error::{Error, Result, api_error};
use crate::store::{ClusterStore, Managed, ObjectKey};

/// Kind of write issued against the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Create,
    Replace,
    ReplaceStatus,
}

/// A successful write, recorded in call order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mutation {
    pub verb: Verb,
    pub kind: String,
    pub key: ObjectKey,
}

#[derive(Clone, Debug)]
struct FailureRule {
    verb: Verb,
    kind: String,
    code: u16,
    reason: String,
    remaining: Option<u32>,
}

type StoreKey = (String, String, String);

/// In-process [`ClusterStore`] with API-server-like semantics.
///
/// Objects are kept as JSON and get a fresh `resourceVersion` on every
/// write, so stale writes fail with `Conflict` just as they would against
/// a real cluster. Writes can be made to fail on demand.
#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<StoreKey, Value>>,
    mutations: Mutex<Vec<Mutation>>,
    failures: Mutex<Vec<FailureRule>>,
    version: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn store_key<K: Managed>(key: &ObjectKey) -> StoreKey {
        (
            K::kind(&()).to_string(),
            key.namespace.clone(),
            key.name.clone(),
        )
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Seed an object without recording a mutation
    pub async fn insert<K: Managed>(&self, obj: &K) -> Result<()> {
        let key = ObjectKey::of(obj)?;
        let mut value = serde_json::to_value(obj)?;
        set_resource_version(&mut value, &self.next_version());
        self.objects
            .lock()
            .await
            .insert(Self::store_key::<K>(&key), value);
        Ok(())
    }

    /// Remove an object without recording a mutation
    pub async fn remove<K: Managed>(&self, key: &ObjectKey) {
        self.objects
            .lock()
            .await
            .remove(&Self::store_key::<K>(key));
    }

    /// Make every matching write fail with the given API status
    pub async fn fail_on(&self, verb: Verb, kind: &str, code: u16, reason: &str) {
        self.push_failure(verb, kind, code, reason, None).await;
    }

    /// Make the next `times` matching writes fail with the given API status
    pub async fn fail_times(&self, verb: Verb, kind: &str, code: u16, reason: &str, times: u32) {
        self.push_failure(verb, kind, code, reason, Some(times))
            .await;
    }

    async fn push_failure(
        &self,
        verb: Verb,
        kind: &str,
        code: u16,
        reason: &str,
        remaining: Option<u32>,
    ) {
        self.failures.lock().await.push(FailureRule {
            verb,
            kind: kind.to_string(),
            code,
            reason: reason.to_string(),
            remaining,
        });
    }

    /// Writes recorded so far
    pub async fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().await.clone()
    }

    pub async fn clear_mutations(&self) {
        self.mutations.lock().await.clear();
    }

    /// Number of objects of a kind currently stored
    pub async fn count(&self, kind: &str) -> usize {
        self.objects
            .lock()
            .await
            .keys()
            .filter(|(k, _, _)| k == kind)
            .count()
    }

    async fn injected_failure<K: Managed>(&self, verb: Verb, key: &ObjectKey) -> Result<()> {
        let kind = K::kind(&()).to_string();
        let mut failures = self.failures.lock().await;
        let Some(pos) = failures
            .iter()
            .position(|r| r.verb == verb && r.kind == kind)
        else {
            return Ok(());
        };

        let rule = failures[pos].clone();
        if let Some(remaining) = rule.remaining {
            if remaining <= 1 {
                failures.remove(pos);
            } else {
                failures[pos].remaining = Some(remaining - 1);
            }
        }
        Err(api_error(
            rule.code,
            &rule.reason,
            format!("injected failure for {} {}", kind, key),
        )
        .into())
    }

    async fn record<K: Managed>(&self, verb: Verb, key: &ObjectKey) {
        self.mutations.lock().await.push(Mutation {
            verb,
            kind: K::kind(&()).to_string(),
            key: key.clone(),
        });
    }

    /// Reject a write whose resourceVersion does not match the stored one
    fn check_version(stored: &Value, incoming: Option<String>, key: &ObjectKey) -> Result<()> {
        let current = stored
            .pointer("/metadata/resourceVersion")
            .and_then(Value::as_str);
        match incoming {
            Some(v) if Some(v.as_str()) != current => Err(api_error(
                409,
                "Conflict",
                format!(
                    "the object {} has been modified; please apply your changes to the latest version and try again",
                    key
                ),
            )
            .into()),
            _ => Ok(()),
        }
    }
}

fn set_resource_version(value: &mut Value, version: &str) {
    if let Some(meta) = value.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.insert(
            "resourceVersion".to_string(),
            Value::String(version.to_string()),
        );
    }
}

fn not_found(kind: &str, key: &ObjectKey) -> Error {
    api_error(404, "NotFound", format!("{} {} not found", kind, key)).into()
}

#[async_trait]
impl ClusterStore for InMemoryStore {
    async fn get<K: Managed>(&self, key: &ObjectKey) -> Result<Option<K>> {
        let objects = self.objects.lock().await;
        match objects.get(&Self::store_key::<K>(key)) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn create<K: Managed>(&self, obj: &K) -> Result<K> {
        let key = ObjectKey::of(obj)?;
        self.injected_failure::<K>(Verb::Create, &key).await?;

        let mut objects = self.objects.lock().await;
        let store_key = Self::store_key::<K>(&key);
        if objects.contains_key(&store_key) {
            return Err(api_error(
                409,
                "AlreadyExists",
                format!("{} {} already exists", K::kind(&()), key),
            )
            .into());
        }

        let mut value = serde_json::to_value(obj)?;
        set_resource_version(&mut value, &self.next_version());
        if let Some(meta) = value.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.entry("uid")
                .or_insert_with(|| Value::String(format!("uid-{}", key)));
        }
        objects.insert(store_key, value.clone());
        drop(objects);

        self.record::<K>(Verb::Create, &key).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn replace<K: Managed>(&self, obj: &K) -> Result<K> {
        let key = ObjectKey::of(obj)?;
        self.injected_failure::<K>(Verb::Replace, &key).await?;

        let mut objects = self.objects.lock().await;
        let store_key = Self::store_key::<K>(&key);
        let stored = objects
            .get(&store_key)
            .ok_or_else(|| not_found(&K::kind(&()), &key))?;
        Self::check_version(stored, obj.resource_version(), &key)?;

        let mut value = serde_json::to_value(obj)?;
        // Writes to the main resource never touch status
        match (stored.get("status"), value.as_object_mut()) {
            (Some(status), Some(map)) => {
                map.insert("status".to_string(), status.clone());
            }
            (None, Some(map)) => {
                map.remove("status");
            }
            _ => {}
        }
        set_resource_version(&mut value, &self.next_version());
        objects.insert(store_key, value.clone());
        drop(objects);

        self.record::<K>(Verb::Replace, &key).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn replace_status<K: Managed>(&self, obj: &K) -> Result<K> {
        let key = ObjectKey::of(obj)?;
        self.injected_failure::<K>(Verb::ReplaceStatus, &key).await?;

        let mut objects = self.objects.lock().await;
        let store_key = Self::store_key::<K>(&key);
        let stored = objects
            .get(&store_key)
            .ok_or_else(|| not_found(&K::kind(&()), &key))?;
        Self::check_version(stored, obj.resource_version(), &key)?;

        let status = serde_json::to_value(obj)?
            .get("status")
            .cloned()
            .unwrap_or(Value::Null);
        let mut value = stored.clone();
        if let Some(map) = value.as_object_mut() {
            map.insert("status".to_string(), status);
        }
        set_resource_version(&mut value, &self.next_version());
        objects.insert(store_key, value.clone());
        drop(objects);

        self.record::<K>(Verb::ReplaceStatus, &key).await;
        Ok(serde_json::from_value(value)?)
    }
}
