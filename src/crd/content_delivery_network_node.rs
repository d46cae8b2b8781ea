use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ContentDeliveryNetworkNode describes a single caching node
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    group = "cdn.benauro.gg",
    version = "v3",
    kind = "ContentDeliveryNetworkNode",
    plural = "contentdeliverynetworknodes",
    shortname = "cdnnode",
    namespaced,
    status = "ContentDeliveryNetworkNodeStatus",
    printcolumn = r#"{"name":"CacheSize", "type":"integer", "jsonPath":".spec.cacheSize"}"#,
    printcolumn = r#"{"name":"Available", "type":"boolean", "jsonPath":".status.available"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ContentDeliveryNetworkNodeSpec {
    /// Cache size for this node
    pub cache_size: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentDeliveryNetworkNodeStatus {
    #[serde(default)]
    pub available: bool,
}
