//! Validation logic for ContentDeliveryNetwork specs

use crate::controller::error::{Error, Result};
use crate::crd::{CacheRule, ContentDeliveryNetwork};

/// Validate the CDN spec
pub fn validate_spec(cdn: &ContentDeliveryNetwork) -> Result<()> {
    validate_replicas(cdn)?;
    validate_endpoints(cdn)?;
    Ok(())
}

/// Validate replica bounds: `0 <= minReplicas <= maxReplicas`
fn validate_replicas(cdn: &ContentDeliveryNetwork) -> Result<()> {
    let min = cdn.spec.min_replicas;
    let max = cdn.spec.max_replicas;

    if min < 0 {
        return Err(Error::ValidationError(format!(
            "minReplicas {} must not be negative",
            min
        )));
    }

    if min > max {
        return Err(Error::ValidationError(format!(
            "minReplicas {} exceeds maxReplicas {}",
            min, max
        )));
    }

    Ok(())
}

/// The domain is the Ingress host and the TLS host; an empty one would
/// turn the rule into a catch-all for the whole ingress class.
fn validate_endpoints(cdn: &ContentDeliveryNetwork) -> Result<()> {
    if cdn.spec.domain_name.trim().is_empty() {
        return Err(Error::ValidationError(
            "domainName must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate cache rules: a pattern must be present and a TTL cannot be
/// negative. Pattern syntax is free-form (`/static/*`, `*.jpg`, ...).
pub fn validate_cache_rules(rules: &[CacheRule]) -> Result<()> {
    for (i, rule) in rules.iter().enumerate() {
        if rule.path_pattern.trim().is_empty() {
            return Err(Error::ValidationError(format!(
                "cacheRules[{}].pathPattern must not be empty",
                i
            )));
        }
        if rule.ttl < 0 {
            return Err(Error::ValidationError(format!(
                "cacheRules[{}].ttl {} must not be negative",
                i, rule.ttl
            )));
        }
    }
    Ok(())
}
