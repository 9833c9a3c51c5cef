//! Berth Core Library
//!
//! Drives a Portainer control plane through one deployment: authenticate,
//! resolve the target endpoint, pull release images and create or update a
//! stack from a compose file.

pub mod api;
pub mod config;
pub mod deploy;
pub mod error;
pub mod pull;
pub mod release;
pub mod resolver;
pub mod session;
pub mod stack;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{DeployMode, DeployOptions, load_compose_file};

    // Run
    pub use crate::deploy::{DeployReport, Deployer, deploy};
    pub use crate::error::{DeployError, Result, Stage};

    // Stages
    pub use crate::pull::ImagePuller;
    pub use crate::release::{ReleaseTag, url_prefix};
    pub use crate::resolver::ResourceResolver;
    pub use crate::session::Session;
    pub use crate::stack::{ComposeEnvironment, StackOutcome, StackPlan, StackReconciler};

    // API
    pub use crate::api::PortainerClient;
}
