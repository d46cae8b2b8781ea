//! Unit tests for resource generators
//!
//! Tests for the node Deployment, routing Service, Ingress, NetworkPolicy
//! and cache PVC generated for a ContentDeliveryNetwork.

use crate::common::*;
use cdn_operator::resources::common::{CDN_LABEL, owner_reference};
use cdn_operator::resources::deployment::{
    CACHE_MOUNT_PATH, CONTAINER_NAME, DEFAULT_NODE_IMAGE, generate_deployment,
};
use cdn_operator::resources::ingress::generate_ingress;
use cdn_operator::resources::network_policy::generate_network_policy;
use cdn_operator::resources::service::generate_service;
use cdn_operator::resources::storage::generate_pvc;
use kube::ResourceExt;

mod deployment_tests {
    use super::*;

    #[test]
    fn test_deployment_name_and_namespace() {
        let cdn = create_test_cdn("edge", "media");
        let deployment = generate_deployment(&cdn, DEFAULT_NODE_IMAGE);

        assert_eq!(deployment.name_any(), "edge-deployment");
        assert_eq!(deployment.namespace().as_deref(), Some("media"));
    }

    #[test]
    fn test_deployment_starts_at_min_replicas() {
        let cdn = CdnBuilder::new("edge", "default")
            .with_replicas(3, 10)
            .with_requests_per_second("900")
            .build();
        let deployment = generate_deployment(&cdn, DEFAULT_NODE_IMAGE);

        assert_eq!(deployment.spec.unwrap().replicas, Some(3));
    }

    #[test]
    fn test_deployment_container() {
        let cdn = CdnBuilder::new("edge", "default")
            .with_origin("https://assets.internal")
            .with_domain("cdn.example.org")
            .build();
        let deployment = generate_deployment(&cdn, "registry.local/cdn-node:2");

        let pod = deployment.spec.unwrap().template.spec.unwrap();
        let container = &pod.containers[0];
        assert_eq!(container.name, CONTAINER_NAME);
        assert_eq!(container.image.as_deref(), Some("registry.local/cdn-node:2"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 80);

        let env = container.env.as_ref().unwrap();
        let value = |name: &str| {
            env.iter()
                .find(|e| e.name == name)
                .and_then(|e| e.value.clone())
        };
        assert_eq!(value("ORIGIN").as_deref(), Some("https://assets.internal"));
        assert_eq!(value("DOMAIN_NAME").as_deref(), Some("cdn.example.org"));
        assert_eq!(value("CACHE_BEHAVIOR"), None);

        let mount = &container.volume_mounts.as_ref().unwrap()[0];
        assert_eq!(mount.mount_path, CACHE_MOUNT_PATH);
        let volume = &pod.volumes.as_ref().unwrap()[0];
        assert_eq!(
            volume.persistent_volume_claim.as_ref().unwrap().claim_name,
            "edge-pvc"
        );
    }

    #[test]
    fn test_cache_behavior_is_passed_through() {
        let cdn = CdnBuilder::new("edge", "default")
            .with_cache_behavior("aggressive")
            .build();
        let deployment = generate_deployment(&cdn, DEFAULT_NODE_IMAGE);

        let env = deployment.spec.unwrap().template.spec.unwrap().containers[0]
            .env
            .clone()
            .unwrap();
        assert!(
            env.iter()
                .any(|e| e.name == "CACHE_BEHAVIOR" && e.value.as_deref() == Some("aggressive"))
        );
    }

    #[test]
    fn test_selector_matches_pod_labels() {
        let cdn = create_test_cdn("edge", "default");
        let spec = generate_deployment(&cdn, DEFAULT_NODE_IMAGE).spec.unwrap();

        let selector = spec.selector.match_labels.unwrap();
        let pod_labels = spec.template.metadata.unwrap().labels.unwrap();
        for (k, v) in &selector {
            assert_eq!(pod_labels.get(k), Some(v));
        }
        assert_eq!(selector.get("app"), Some(&"edge".to_string()));
    }
}

mod service_tests {
    use super::*;

    #[test]
    fn test_service_routes_port_80_to_nodes() {
        let cdn = create_test_cdn("edge", "default");
        let service = generate_service(&cdn);

        assert_eq!(service.name_any(), "edge-service");
        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let port = &spec.ports.unwrap()[0];
        assert_eq!(port.port, 80);
        assert_eq!(
            spec.selector.unwrap().get("app"),
            Some(&"edge".to_string())
        );
    }
}

mod ingress_tests {
    use super::*;

    #[test]
    fn test_ingress_routes_domain_to_service() {
        let cdn = CdnBuilder::new("edge", "default")
            .with_domain("cdn.example.org")
            .build();
        let ingress = generate_ingress(&cdn);

        assert_eq!(ingress.name_any(), "edge-ingress");
        let spec = ingress.spec.unwrap();
        assert!(spec.tls.is_none());

        let rule = &spec.rules.unwrap()[0];
        assert_eq!(rule.host.as_deref(), Some("cdn.example.org"));
        let path = &rule.http.as_ref().unwrap().paths[0];
        assert_eq!(path.path.as_deref(), Some("/"));
        assert_eq!(path.path_type, "Prefix");
        let backend = path.backend.service.as_ref().unwrap();
        assert_eq!(backend.name, "edge-service");
        assert_eq!(backend.port.as_ref().unwrap().number, Some(80));
    }

    #[test]
    fn test_ingress_tls_when_enabled() {
        let cdn = CdnBuilder::new("edge", "default")
            .with_domain("cdn.example.org")
            .with_tls()
            .build();
        let tls = generate_ingress(&cdn).spec.unwrap().tls.unwrap();

        assert_eq!(tls.len(), 1);
        assert_eq!(tls[0].secret_name.as_deref(), Some("edge-tls"));
        assert_eq!(
            tls[0].hosts.as_deref(),
            Some(&["cdn.example.org".to_string()][..])
        );
    }
}

mod network_policy_tests {
    use super::*;

    #[test]
    fn test_policy_allows_http_from_anywhere() {
        let cdn = create_test_cdn("edge", "default");
        let policy = generate_network_policy(&cdn);

        assert_eq!(policy.name_any(), "edge-network-policy");
        let spec = policy.spec.unwrap();
        assert_eq!(
            spec.pod_selector.match_labels.unwrap().get("app"),
            Some(&"edge".to_string())
        );
        assert_eq!(spec.policy_types, Some(vec!["Ingress".to_string()]));

        let rules = spec.ingress.unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].from.is_none());
        let port = &rules[0].ports.as_ref().unwrap()[0];
        assert_eq!(port.protocol.as_deref(), Some("TCP"));
    }
}

mod storage_tests {
    use super::*;

    #[test]
    fn test_pvc_requests_fixed_size() {
        let cdn = create_test_cdn("edge", "default");
        let pvc = generate_pvc(&cdn);

        assert_eq!(pvc.name_any(), "edge-pvc");
        let spec = pvc.spec.unwrap();
        assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
        let requests = spec.resources.unwrap().requests.unwrap();
        assert_eq!(requests.get("storage").unwrap().0, "10Gi");
    }
}

mod ownership_tests {
    use super::*;

    #[test]
    fn test_all_children_are_owned_and_labelled() {
        let cdn = create_test_cdn("edge", "default");
        let expected_owner = owner_reference(&cdn);

        let metas = [
            generate_deployment(&cdn, DEFAULT_NODE_IMAGE).metadata,
            generate_service(&cdn).metadata,
            generate_ingress(&cdn).metadata,
            generate_network_policy(&cdn).metadata,
            generate_pvc(&cdn).metadata,
        ];

        for meta in metas {
            let owners = meta.owner_references.unwrap();
            assert_eq!(owners, vec![expected_owner.clone()]);
            assert_eq!(owners[0].controller, Some(true));
            assert_eq!(owners[0].uid, "edge-uid");
            assert_eq!(
                meta.labels.unwrap().get(CDN_LABEL),
                Some(&"edge".to_string())
            );
        }
    }
}
