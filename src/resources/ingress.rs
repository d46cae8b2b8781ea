//! Ingress generation: the public network entry for a CDN

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use kube::ResourceExt;

use crate::crd::ContentDeliveryNetwork;
use crate::resources::common::{
    HTTP_PORT, child_metadata, ingress_name, service_name, tls_secret_name,
};

/// Generate the Ingress routing the CDN domain to its Service
///
/// A single host rule sends every path under the domain to the routing
/// target. When TLS is enabled the domain is terminated with the
/// `<name>-tls` secret; issuing that certificate is left to the cluster.
pub fn generate_ingress(cdn: &ContentDeliveryNetwork) -> Ingress {
    let cdn_name = cdn.name_any();
    let host = cdn.spec.domain_name.clone();

    let rule = IngressRule {
        host: Some(host.clone()),
        http: Some(HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some("/".to_string()),
                path_type: "Prefix".to_string(),
                backend: IngressBackend {
                    service: Some(IngressServiceBackend {
                        name: service_name(&cdn_name),
                        port: Some(ServiceBackendPort {
                            number: Some(HTTP_PORT),
                            name: None,
                        }),
                    }),
                    resource: None,
                },
            }],
        }),
    };

    let tls = cdn.tls_enabled().then(|| {
        vec![IngressTLS {
            hosts: Some(vec![host]),
            secret_name: Some(tls_secret_name(&cdn_name)),
        }]
    });

    Ingress {
        metadata: child_metadata(cdn, ingress_name(&cdn_name)),
        spec: Some(IngressSpec {
            rules: Some(vec![rule]),
            tls,
            ..Default::default()
        }),
        ..Default::default()
    }
}
