//! Error types for a deployment run.
//!
//! Every failure is fatal: callers propagate a [`DeployError`] up to the
//! binary, which logs it and exits non-zero.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline step that issued a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    ListEndpoints,
    ListRegistries,
    PullImage,
    SwarmId,
    ListStacks,
    CreateStack,
    UpdateStack,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Authenticate => "authenticate",
            Stage::ListEndpoints => "list-endpoints",
            Stage::ListRegistries => "list-registries",
            Stage::PullImage => "pull-image",
            Stage::SwarmId => "swarm-id",
            Stage::ListStacks => "list-stacks",
            Stage::CreateStack => "create-stack",
            Stage::UpdateStack => "update-stack",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of control-plane resource looked up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Endpoint,
    Registry,
    Cluster,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Endpoint => "endpoint",
            ResourceKind::Registry => "registry",
            ResourceKind::Cluster => "swarm cluster",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    /// The control plane rejected the credentials.
    #[error("authentication failed: HTTP {status}: {body}")]
    Authentication { status: u16, body: String },

    /// A named resource is not registered with the control plane.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ResourceKind, name: String },

    /// A call completed with a status other than 200/201.
    #[error("{stage} failed: HTTP {status}: {body}")]
    Remote {
        stage: Stage,
        status: u16,
        body: String,
    },

    /// The request could not be sent or its response could not be decoded.
    #[error("{stage} request failed")]
    Transport {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    /// The image pull stream reported an error after a successful status.
    #[error("pull of {image} failed: {message}")]
    PullFailed { image: String, message: String },

    #[error("failed to read {}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, DeployError>;

impl DeployError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Stage of the remote call that failed, if the error came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeployError::Authentication { .. } => Some(Stage::Authenticate),
            DeployError::Remote { stage, .. } | DeployError::Transport { stage, .. } => {
                Some(*stage)
            }
            DeployError::PullFailed { .. } => Some(Stage::PullImage),
            _ => None,
        }
    }
}
