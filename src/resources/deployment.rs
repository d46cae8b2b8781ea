//! Deployment generation for CDN nodes

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::ResourceExt;
use kube::core::ObjectMeta;

use crate::crd::ContentDeliveryNetwork;
use crate::resources::common::{
    HTTP_PORT, child_metadata, deployment_name, pvc_name, selector_labels, standard_labels,
};

/// Default container image for CDN nodes
pub const DEFAULT_NODE_IMAGE: &str = "benauro/cdn-node:latest";

/// Container name inside every CDN node pod
pub const CONTAINER_NAME: &str = "cdn-node";

/// Mount path of the per-CDN cache volume
pub const CACHE_MOUNT_PATH: &str = "/var/cache/cdn";

const CACHE_VOLUME: &str = "cache";

/// Generate the CDN node Deployment
///
/// The replica count starts at `minReplicas`; the autoscaler adjusts it on
/// later passes. The pod template only varies with origin, domain and the
/// cache behaviour, and mounts the CDN's cache claim.
pub fn generate_deployment(cdn: &ContentDeliveryNetwork, image: &str) -> Deployment {
    let cdn_name = cdn.name_any();
    let selector = selector_labels(&cdn_name);

    let mut pod_labels = standard_labels(&cdn_name);
    pod_labels.extend(selector.clone());

    let mut env = vec![
        EnvVar {
            name: "ORIGIN".to_string(),
            value: Some(cdn.spec.origin.clone()),
            ..Default::default()
        },
        EnvVar {
            name: "DOMAIN_NAME".to_string(),
            value: Some(cdn.spec.domain_name.clone()),
            ..Default::default()
        },
    ];
    if let Some(ref behavior) = cdn.spec.cache_behavior {
        env.push(EnvVar {
            name: "CACHE_BEHAVIOR".to_string(),
            value: Some(behavior.clone()),
            ..Default::default()
        });
    }

    Deployment {
        metadata: child_metadata(cdn, deployment_name(&cdn_name)),
        spec: Some(DeploymentSpec {
            replicas: Some(cdn.spec.min_replicas),
            selector: LabelSelector {
                match_labels: Some(selector),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: CONTAINER_NAME.to_string(),
                        image: Some(image.to_string()),
                        ports: Some(vec![ContainerPort {
                            name: Some("http".to_string()),
                            container_port: HTTP_PORT,
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        env: Some(env),
                        volume_mounts: Some(vec![VolumeMount {
                            name: CACHE_VOLUME.to_string(),
                            mount_path: CACHE_MOUNT_PATH.to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: CACHE_VOLUME.to_string(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: pvc_name(&cdn_name),
                            read_only: None,
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
