pub mod autoscale;
pub mod compute;
pub mod context;
pub mod drivers;
pub mod error;
pub mod node_reconciler;
pub mod pipeline;
pub mod reconciler;
pub mod status;
pub mod validation;

pub use context::{Context, ReconcileSettings};
pub use error::{BackoffConfig, Error, Result};
pub use node_reconciler::{NODE_FINALIZER, node_error_policy, reconcile_node};
pub use pipeline::{Outcome, Step, StepReport, run_pipeline};
pub use reconciler::{error_policy, reconcile, reconcile_key};
pub use status::{ConditionBuilder, StatusManager, spec_changed};
pub use validation::{validate_cache_rules, validate_spec};
