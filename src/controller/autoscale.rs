//! Replica count decision for CDN node Deployments
//!
//! A stateless proportional policy: one replica per
//! [`REQUESTS_PER_REPLICA`] requests per second, clamped into the CDN's
//! `[minReplicas, maxReplicas]` bounds. There is no hysteresis and no
//! rate limiting, so a large metric swing moves the replica count in a
//! single pass.

use crate::crd::ContentDeliveryNetwork;

/// Requests per second a single CDN node is assumed to serve
pub const REQUESTS_PER_REPLICA: f64 = 100.0;

/// Parse a reported requests-per-second value.
///
/// Malformed, negative and NaN values count as zero traffic. Positive
/// infinity (including overflowing literals like `1e400`) is kept and
/// saturates at the upper replica bound.
pub fn parse_requests_per_second(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v > 0.0 => v,
        _ => 0.0,
    }
}

/// Replica count for a given load, clamped into `[min, max]`.
///
/// `min` wins if the bounds are inverted; validation rejects such specs
/// before this is reached.
pub fn replicas_for_load(requests_per_second: f64, min: i32, max: i32) -> i32 {
    let wanted = (requests_per_second / REQUESTS_PER_REPLICA).ceil();
    let wanted = if wanted >= i32::MAX as f64 {
        i32::MAX
    } else {
        wanted as i32
    };
    wanted.min(max).max(min)
}

/// Desired replica count for a CDN from its last reported metrics
pub fn desired_replicas(cdn: &ContentDeliveryNetwork) -> i32 {
    replicas_for_load(
        parse_requests_per_second(cdn.requests_per_second()),
        cdn.spec.min_replicas,
        cdn.spec.max_replicas,
    )
}
