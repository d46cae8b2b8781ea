//! Common utilities for Kubernetes resource generation
//!
//! This module provides shared functions and constants used across
//! all resource generators to ensure consistency and reduce duplication.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;
use kube::core::ObjectMeta;

use crate::crd::ContentDeliveryNetwork;

/// API version for ContentDeliveryNetwork CRD
pub const API_VERSION: &str = "cdn.benauro.gg/v3";

/// Kind for ContentDeliveryNetwork CRD
pub const KIND: &str = "ContentDeliveryNetwork";

/// Operator field manager name
pub const FIELD_MANAGER: &str = "cdn-operator";

/// Label carrying the owning CDN name on every child resource
pub const CDN_LABEL: &str = "cdn.benauro.gg/cdn";

/// Port served by CDN nodes and exposed by the routing target
pub const HTTP_PORT: i32 = 80;

/// Deterministic child resource names
pub fn deployment_name(cdn_name: &str) -> String {
    format!("{}-deployment", cdn_name)
}

pub fn service_name(cdn_name: &str) -> String {
    format!("{}-service", cdn_name)
}

pub fn ingress_name(cdn_name: &str) -> String {
    format!("{}-ingress", cdn_name)
}

pub fn network_policy_name(cdn_name: &str) -> String {
    format!("{}-network-policy", cdn_name)
}

pub fn pvc_name(cdn_name: &str) -> String {
    format!("{}-pvc", cdn_name)
}

pub fn tls_secret_name(cdn_name: &str) -> String {
    format!("{}-tls", cdn_name)
}

/// Generate an owner reference for a ContentDeliveryNetwork
///
/// This ensures that all child resources are properly owned by the CDN
/// and will be garbage collected when the CDN is deleted.
pub fn owner_reference(cdn: &ContentDeliveryNetwork) -> OwnerReference {
    OwnerReference {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        name: cdn.name_any(),
        uid: cdn.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Generate standard labels for all resources belonging to a ContentDeliveryNetwork
pub fn standard_labels(cdn_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app.kubernetes.io/name".to_string(), cdn_name.to_string()),
        (
            "app.kubernetes.io/component".to_string(),
            "cdn-node".to_string(),
        ),
        (
            "app.kubernetes.io/managed-by".to_string(),
            FIELD_MANAGER.to_string(),
        ),
        (CDN_LABEL.to_string(), cdn_name.to_string()),
    ])
}

/// Labels selecting the CDN node pods
pub fn selector_labels(cdn_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), cdn_name.to_string())])
}

/// Metadata shared by every child resource: name, namespace, labels, owner
pub fn child_metadata(cdn: &ContentDeliveryNetwork, name: String) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: cdn.namespace(),
        labels: Some(standard_labels(&cdn.name_any())),
        owner_references: Some(vec![owner_reference(cdn)]),
        ..Default::default()
    }
}
