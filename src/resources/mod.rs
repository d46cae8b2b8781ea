pub mod common;
pub mod deployment;
pub mod ingress;
pub mod network_policy;
pub mod service;
pub mod storage;

pub use common::{
    API_VERSION, CDN_LABEL, FIELD_MANAGER, HTTP_PORT, KIND, deployment_name, ingress_name,
    network_policy_name, owner_reference, pvc_name, service_name, standard_labels,
};
