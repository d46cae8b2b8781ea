//! Service generation for CDN nodes
//!
//! The Service is the internal routing target the network entry points at.
//! It selects the CDN node pods by their `app` label on the fixed HTTP port.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use crate::crd::ContentDeliveryNetwork;
use crate::resources::common::{HTTP_PORT, child_metadata, selector_labels, service_name};

/// Generate the routing-target Service
pub fn generate_service(cdn: &ContentDeliveryNetwork) -> Service {
    let cdn_name = cdn.name_any();

    Service {
        metadata: child_metadata(cdn, service_name(&cdn_name)),
        spec: Some(ServiceSpec {
            selector: Some(selector_labels(&cdn_name)),
            ports: Some(vec![ServicePort {
                name: Some("http".to_string()),
                port: HTTP_PORT,
                target_port: Some(IntOrString::Int(HTTP_PORT)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            type_: Some("ClusterIP".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
