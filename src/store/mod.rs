//! Declared-state store boundary
//!
//! Everything the controllers read or write goes through [`ClusterStore`].
//! [`KubeStore`] talks to the API server; [`InMemoryStore`] keeps objects
//! in process and records every mutation, which is what the tests use.

mod kube_store;
mod memory;

pub use kube_store::KubeStore;
pub use memory::{InMemoryStore, Mutation, Verb};

use std::fmt;
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::controller::error::{Error, Result};

/// Namespaced resource types the controllers manage
pub trait Managed:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> Managed for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Namespace-qualified identity of an object
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing object; fails if it carries no namespace or name
    pub fn of<K: Resource>(obj: &K) -> Result<Self> {
        let namespace = obj
            .namespace()
            .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
        let name = obj
            .meta()
            .name
            .clone()
            .ok_or(Error::MissingObjectKey(".metadata.name"))?;
        Ok(Self { namespace, name })
    }

    /// Key of a sibling object in the same namespace
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Read/write surface of the cluster's declared-state store.
///
/// Errors follow API server semantics: a missing object on `replace` is a
/// 404, `create` of an existing name is a 409 `AlreadyExists`, and a write
/// whose `resourceVersion` is stale is a 409 `Conflict`.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fetch an object, `None` if it does not exist
    async fn get<K: Managed>(&self, key: &ObjectKey) -> Result<Option<K>>;

    /// Create a new object
    async fn create<K: Managed>(&self, obj: &K) -> Result<K>;

    /// Overwrite an existing object (status is left untouched)
    async fn replace<K: Managed>(&self, obj: &K) -> Result<K>;

    /// Overwrite the status subresource of an existing object
    async fn replace_status<K: Managed>(&self, obj: &K) -> Result<K>;
}
