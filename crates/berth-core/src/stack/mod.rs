//! Stack environment and reconciliation.

pub mod env;
pub mod reconciler;

pub use env::ComposeEnvironment;
pub use reconciler::{
    StackOutcome, StackPlan, StackReconciler, build_create_request, build_update_request,
};
