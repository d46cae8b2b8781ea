//! Ordered reconciliation steps for a ContentDeliveryNetwork
//!
//! Steps run strictly in [`Step::ORDER`]. The first failing step aborts
//! the pass; later steps do not run and the error carries the step name.

use std::fmt;

use tracing::debug;

use crate::controller::compute::auto_scale;
use crate::controller::context::ReconcileSettings;
use crate::controller::drivers::create_or_update;
use crate::controller::error::Result;
use crate::controller::validation::validate_cache_rules;
use crate::crd::ContentDeliveryNetwork;
use crate::resources::ingress::generate_ingress;
use crate::resources::network_policy::generate_network_policy;
use crate::resources::service::generate_service;
use crate::resources::storage::generate_pvc;
use crate::store::ClusterStore;

/// One unit of reconciliation work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Check the cache rules; nothing is written for them yet
    ApplyCacheRules,
    /// Public entry point (Ingress)
    NetworkEntry,
    /// Internal routing target (Service)
    RoutingTarget,
    /// Node Deployment and its replica count
    AutoScale,
    /// Access policy for the node pods (NetworkPolicy)
    AccessPolicy,
    /// Cache volume claim
    Storage,
    /// Metrics collection hook; no-op
    UpdateMetrics,
}

impl Step {
    /// Execution order of a full pass
    pub const ORDER: [Step; 7] = [
        Step::ApplyCacheRules,
        Step::NetworkEntry,
        Step::RoutingTarget,
        Step::AutoScale,
        Step::AccessPolicy,
        Step::Storage,
        Step::UpdateMetrics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::ApplyCacheRules => "ApplyCacheRules",
            Step::NetworkEntry => "NetworkEntry",
            Step::RoutingTarget => "RoutingTarget",
            Step::AutoScale => "AutoScale",
            Step::AccessPolicy => "AccessPolicy",
            Step::Storage => "Storage",
            Step::UpdateMetrics => "UpdateMetrics",
        }
    }

    /// Execute this step against the store
    pub async fn run<S: ClusterStore>(
        self,
        cdn: &ContentDeliveryNetwork,
        store: &S,
        settings: &ReconcileSettings,
    ) -> Result<Outcome> {
        match self {
            Step::ApplyCacheRules => {
                validate_cache_rules(&cdn.spec.cache_rules)?;
                Ok(Outcome::Skipped)
            }
            Step::NetworkEntry => create_or_update(store, generate_ingress(cdn)).await,
            Step::RoutingTarget => create_or_update(store, generate_service(cdn)).await,
            Step::AutoScale => auto_scale(store, cdn, &settings.node_image).await,
            Step::AccessPolicy => create_or_update(store, generate_network_policy(cdn)).await,
            Step::Storage => create_or_update(store, generate_pvc(cdn)).await,
            Step::UpdateMetrics => Ok(Outcome::Skipped),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a step did to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    /// The step has nothing to write
    Skipped,
}

impl Outcome {
    pub fn changed(self) -> bool {
        matches!(self, Outcome::Created | Outcome::Updated)
    }
}

/// Result of one executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub outcome: Outcome,
}

/// Run steps in order, stopping at the first failure.
///
/// The returned error names the failing step.
pub async fn run_pipeline<S: ClusterStore>(
    steps: &[Step],
    cdn: &ContentDeliveryNetwork,
    store: &S,
    settings: &ReconcileSettings,
) -> Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(steps.len());

    for &step in steps {
        let outcome = step
            .run(cdn, store, settings)
            .await
            .map_err(|e| e.in_step(step))?;
        debug!(step = %step, ?outcome, "Step finished");
        reports.push(StepReport { step, outcome });
    }

    Ok(reports)
}
