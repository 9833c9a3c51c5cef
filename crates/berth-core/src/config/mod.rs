//! Run configuration for a deployment.
//!
//! The binary gathers raw inputs (flags and environment variables) and turns
//! them into a validated [`DeployOptions`] using the parsers in this module.

pub mod options;
pub mod parser;

pub use options::{DEFAULT_COMPOSE_FILE, DeployMode, DeployOptions};
pub use parser::{load_compose_file, parse_image_list, parse_stack_env};
