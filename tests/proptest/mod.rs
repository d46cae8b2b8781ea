// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::string_slice
)]

//! Property-based tests for ContentDeliveryNetwork validation, scaling and
//! resource generation
//!
//! These tests use proptest to generate random configurations and verify that:
//! 1. The replica decision always lands inside the configured bounds
//! 2. More load never yields fewer replicas
//! 3. Arbitrary metric strings never panic the parser
//! 4. Valid specs always generate resources without panicking
//! 5. Validation is deterministic (same input = same output)

use proptest::prelude::*;

use cdn_operator::controller::autoscale::{
    desired_replicas, parse_requests_per_second, replicas_for_load,
};
use cdn_operator::controller::validation::{validate_cache_rules, validate_spec};
use cdn_operator::crd::{
    CacheRule, CdnMetrics, ContentDeliveryNetwork, ContentDeliveryNetworkSpec,
    ContentDeliveryNetworkStatus, SslConfig,
};
use cdn_operator::resources::deployment::{DEFAULT_NODE_IMAGE, generate_deployment};
use cdn_operator::resources::{ingress, network_policy, service, storage};
use kube::core::ObjectMeta;

// =============================================================================
// Helper functions
// =============================================================================

fn cdn_from(spec: ContentDeliveryNetworkSpec, requests_per_second: String) -> ContentDeliveryNetwork {
    ContentDeliveryNetwork {
        metadata: ObjectMeta {
            name: Some("edge".to_string()),
            namespace: Some("default".to_string()),
            uid: Some("edge-uid".to_string()),
            generation: Some(1),
            ..Default::default()
        },
        spec,
        status: Some(ContentDeliveryNetworkStatus {
            metrics: CdnMetrics {
                requests_per_second,
                ..Default::default()
            },
            ..Default::default()
        }),
    }
}

// =============================================================================
// Strategy generators
// =============================================================================

/// Replica bounds with `0 <= min <= max` (shrinks toward small values)
fn valid_bounds() -> impl Strategy<Value = (i32, i32)> {
    (0..=50i32, 0..=50i32).prop_map(|(min, extra)| (min, min + extra))
}

/// Load in requests per second (shrinks toward zero)
fn load() -> impl Strategy<Value = f64> {
    prop_oneof![
        3 => 0.0..10_000.0f64,
        1 => Just(0.0),
        1 => 1e6..1e12f64,
    ]
}

/// Raw metric strings, both well-formed and garbage
fn raw_metric() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..100_000u32).prop_map(|n| n.to_string()),
        (0.0..5_000.0f64).prop_map(|n| format!("{:.2}", n)),
        Just("NaN".to_string()),
        Just("-inf".to_string()),
        Just("inf".to_string()),
        Just("1e400".to_string()),
        ".{0,16}",
    ]
}

fn cache_rule() -> impl Strategy<Value = CacheRule> {
    ("[a-z*./]{0,10}", -10..=86_400i64).prop_map(|(path_pattern, ttl)| CacheRule {
        path_pattern,
        ttl,
    })
}

fn ssl_config() -> impl Strategy<Value = Option<SslConfig>> {
    prop_oneof![
        2 => Just(None),
        1 => any::<bool>().prop_map(|enabled| Some(SslConfig {
            enabled,
            ..Default::default()
        })),
    ]
}

/// A spec with valid replica bounds and endpoints
fn valid_spec() -> impl Strategy<Value = ContentDeliveryNetworkSpec> {
    (
        valid_bounds(),
        "[a-z]{3,10}\\.example\\.com",
        prop::option::of(prop_oneof![Just("standard"), Just("aggressive")]),
        ssl_config(),
    )
        .prop_map(|((min, max), domain, behavior, ssl)| ContentDeliveryNetworkSpec {
            origin: "https://origin.example.com".to_string(),
            domain_name: domain,
            cache_behavior: behavior.map(str::to_string),
            cache_rules: Vec::new(),
            ssl_config: ssl,
            min_replicas: min,
            max_replicas: max,
        })
}

/// A spec with arbitrary (possibly invalid) replica bounds and endpoints
fn any_spec() -> impl Strategy<Value = ContentDeliveryNetworkSpec> {
    (-5..=20i32, -5..=20i32, "[a-z:/.]{0,12}", "[a-z.]{0,12}").prop_map(
        |(min, max, origin, domain)| ContentDeliveryNetworkSpec {
            origin,
            domain_name: domain,
            cache_behavior: None,
            cache_rules: Vec::new(),
            ssl_config: None,
            min_replicas: min,
            max_replicas: max,
        },
    )
}

// =============================================================================
// Scaling properties
// =============================================================================

proptest! {
    #[test]
    fn replicas_stay_within_bounds((min, max) in valid_bounds(), rps in load()) {
        let replicas = replicas_for_load(rps, min, max);
        prop_assert!(replicas >= min);
        prop_assert!(replicas <= max);
    }

    #[test]
    fn more_load_never_means_fewer_replicas(
        (min, max) in valid_bounds(),
        low in load(),
        extra in 0.0..5_000.0f64,
    ) {
        let high = low + extra;
        prop_assert!(replicas_for_load(low, min, max) <= replicas_for_load(high, min, max));
    }

    #[test]
    fn parsing_never_panics_and_is_never_negative(raw in raw_metric()) {
        let value = parse_requests_per_second(&raw);
        prop_assert!(value >= 0.0);
        prop_assert!(!value.is_nan());
    }

    #[test]
    fn unbounded_load_saturates_at_max((min, max) in valid_bounds(), finite in load()) {
        let saturated = replicas_for_load(parse_requests_per_second("inf"), min, max);
        prop_assert_eq!(saturated, max);
        prop_assert!(replicas_for_load(finite, min, max) <= saturated);
    }

    #[test]
    fn desired_replicas_respects_spec_bounds(spec in valid_spec(), raw in raw_metric()) {
        let (min, max) = (spec.min_replicas, spec.max_replicas);
        let replicas = desired_replicas(&cdn_from(spec, raw));
        prop_assert!(replicas >= min && replicas <= max);
    }
}

// =============================================================================
// Validation properties
// =============================================================================

proptest! {
    #[test]
    fn valid_specs_pass_validation(spec in valid_spec()) {
        prop_assert!(validate_spec(&cdn_from(spec, String::new())).is_ok());
    }

    #[test]
    fn validation_is_deterministic(spec in any_spec()) {
        let cdn = cdn_from(spec, String::new());
        let first = validate_spec(&cdn).map_err(|e| e.to_string());
        let second = validate_spec(&cdn).map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn inverted_bounds_are_always_rejected(min in 1..=100i32, gap in 1..=100i32) {
        let spec = ContentDeliveryNetworkSpec {
            origin: "https://origin.example.com".to_string(),
            domain_name: "edge.example.com".to_string(),
            cache_behavior: None,
            cache_rules: Vec::new(),
            ssl_config: None,
            min_replicas: min,
            max_replicas: min - gap,
        };
        prop_assert!(validate_spec(&cdn_from(spec, String::new())).is_err());
    }

    #[test]
    fn cache_rules_accepted_iff_present_and_non_negative(
        rules in prop::collection::vec(cache_rule(), 0..5),
    ) {
        let expected = rules
            .iter()
            .all(|r| !r.path_pattern.trim().is_empty() && r.ttl >= 0);
        prop_assert_eq!(validate_cache_rules(&rules).is_ok(), expected);
    }
}

// =============================================================================
// Resource generation properties
// =============================================================================

proptest! {
    #[test]
    fn valid_specs_generate_resources(spec in valid_spec(), raw in raw_metric()) {
        let min = spec.min_replicas;
        let tls = spec.ssl_config.as_ref().is_some_and(|s| s.enabled);
        let cdn = cdn_from(spec, raw);

        let deployment = generate_deployment(&cdn, DEFAULT_NODE_IMAGE);
        prop_assert_eq!(deployment.spec.unwrap().replicas, Some(min));

        let ingress = ingress::generate_ingress(&cdn);
        prop_assert_eq!(ingress.spec.unwrap().tls.is_some(), tls);

        service::generate_service(&cdn);
        network_policy::generate_network_policy(&cdn);
        storage::generate_pvc(&cdn);
    }
}
