//! PersistentVolumeClaim generation for the CDN node cache

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;

use crate::crd::ContentDeliveryNetwork;
use crate::resources::common::{child_metadata, pvc_name};

/// Size of the cache claim; not configurable from the CDN spec
pub const CACHE_STORAGE_SIZE: &str = "10Gi";

/// Generate the cache PersistentVolumeClaim (one per CDN, provisioned once)
pub fn generate_pvc(cdn: &ContentDeliveryNetwork) -> PersistentVolumeClaim {
    let cdn_name = cdn.name_any();

    PersistentVolumeClaim {
        metadata: child_metadata(cdn, pvc_name(&cdn_name)),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(CACHE_STORAGE_SIZE.to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
