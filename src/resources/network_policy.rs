//! NetworkPolicy generation for CDN nodes
//!
//! Restricts ingress to the CDN node pods to the HTTP port. Any peer may
//! reach that port (the ingress controller lives in another namespace);
//! everything else is denied.

use k8s_openapi::api::networking::v1::{
    NetworkPolicy, NetworkPolicyIngressRule, NetworkPolicyPort, NetworkPolicySpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use crate::crd::ContentDeliveryNetwork;
use crate::resources::common::{
    HTTP_PORT, child_metadata, network_policy_name, selector_labels,
};

/// Generate the access policy for the CDN node pods
pub fn generate_network_policy(cdn: &ContentDeliveryNetwork) -> NetworkPolicy {
    let cdn_name = cdn.name_any();

    NetworkPolicy {
        metadata: child_metadata(cdn, network_policy_name(&cdn_name)),
        spec: Some(NetworkPolicySpec {
            pod_selector: LabelSelector {
                match_labels: Some(selector_labels(&cdn_name)),
                ..Default::default()
            },
            policy_types: Some(vec!["Ingress".to_string()]),
            ingress: Some(vec![NetworkPolicyIngressRule {
                // No `from`: the port is open to every peer
                from: None,
                ports: Some(vec![NetworkPolicyPort {
                    port: Some(IntOrString::Int(HTTP_PORT)),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
            }]),
            ..Default::default()
        }),
    }
}
