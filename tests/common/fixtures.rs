//! Test fixtures and builders for ContentDeliveryNetwork resources
//!
//! # Quick Start
//!
//! For simple unit tests, use the convenience functions:
//! ```rust,ignore
//! let cdn = create_test_cdn("edge", "default");
//! ```
//!
//! For more complex configurations, use the builder pattern:
//! ```rust,ignore
//! let cdn = CdnBuilder::new("edge", "default")
//!     .with_replicas(2, 10)
//!     .with_tls()
//!     .with_requests_per_second("250")
//!     .build();
//! ```

use cdn_operator::crd::{
    CacheRule, CdnMetrics, ContentDeliveryNetwork, ContentDeliveryNetworkNode,
    ContentDeliveryNetworkNodeSpec, ContentDeliveryNetworkSpec, ContentDeliveryNetworkStatus,
    SslConfig,
};
use cdn_operator::store::ObjectKey;
use kube::core::ObjectMeta;

// =============================================================================
// Convenience Functions for Simple Test Cases
// =============================================================================

/// Create a CDN with one to five replicas and no metrics
pub fn create_test_cdn(name: &str, namespace: &str) -> ContentDeliveryNetwork {
    CdnBuilder::new(name, namespace).build()
}

/// Key of a test object
pub fn key(name: &str, namespace: &str) -> ObjectKey {
    ObjectKey::new(namespace, name)
}

/// Create a CDN node with the given cache size
pub fn create_test_node(name: &str, namespace: &str) -> ContentDeliveryNetworkNode {
    ContentDeliveryNetworkNode {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("{}-uid", name)),
            ..Default::default()
        },
        spec: ContentDeliveryNetworkNodeSpec { cache_size: 1024 },
        status: None,
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for ContentDeliveryNetwork test objects
pub struct CdnBuilder {
    name: String,
    namespace: String,
    generation: Option<i64>,
    spec: ContentDeliveryNetworkSpec,
    status: Option<ContentDeliveryNetworkStatus>,
}

impl CdnBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            generation: Some(1),
            spec: ContentDeliveryNetworkSpec {
                origin: "https://origin.example.com".to_string(),
                domain_name: format!("{}.example.com", name),
                cache_behavior: None,
                cache_rules: Vec::new(),
                ssl_config: None,
                min_replicas: 1,
                max_replicas: 5,
            },
            status: None,
        }
    }

    pub fn with_replicas(mut self, min: i32, max: i32) -> Self {
        self.spec.min_replicas = min;
        self.spec.max_replicas = max;
        self
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.spec.origin = origin.to_string();
        self
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.spec.domain_name = domain.to_string();
        self
    }

    pub fn with_cache_behavior(mut self, behavior: &str) -> Self {
        self.spec.cache_behavior = Some(behavior.to_string());
        self
    }

    pub fn with_cache_rule(mut self, path_pattern: &str, ttl: i64) -> Self {
        self.spec.cache_rules.push(CacheRule {
            path_pattern: path_pattern.to_string(),
            ttl,
        });
        self
    }

    pub fn with_tls(mut self) -> Self {
        self.spec.ssl_config = Some(SslConfig {
            enabled: true,
            ..Default::default()
        });
        self
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Report a requests-per-second metric in status
    pub fn with_requests_per_second(mut self, rps: &str) -> Self {
        let status = self.status.get_or_insert_with(Default::default);
        status.metrics = CdnMetrics {
            requests_per_second: rps.to_string(),
            ..Default::default()
        };
        self
    }

    pub fn build(self) -> ContentDeliveryNetwork {
        let mut cdn = ContentDeliveryNetwork::new(&self.name, self.spec);
        cdn.metadata = ObjectMeta {
            name: Some(self.name.clone()),
            namespace: Some(self.namespace),
            uid: Some(format!("{}-uid", self.name)),
            generation: self.generation,
            ..Default::default()
        };
        cdn.status = self.status;
        cdn
    }
}
