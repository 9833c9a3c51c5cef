//! Deployment options.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{DeployError, Result};
use crate::release::ReleaseTag;

use super::parser::{parse_image_list, parse_stack_env};

/// Compose file read when no path is configured.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Runtime the stack is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployMode {
    /// Docker Swarm cluster; stacks are scoped to the swarm ID.
    #[default]
    Clustered,
    /// Single Docker host running compose stacks.
    Standalone,
}

impl DeployMode {
    pub fn from_standalone(standalone: bool) -> Self {
        if standalone {
            DeployMode::Standalone
        } else {
            DeployMode::Clustered
        }
    }

    /// Portainer stack type code used when creating a stack.
    pub fn stack_type(&self) -> u8 {
        match self {
            DeployMode::Clustered => 1,
            DeployMode::Standalone => 2,
        }
    }
}

/// Inputs for a single deployment run.
#[derive(Clone)]
pub struct DeployOptions {
    /// Base URL of the Portainer instance
    pub portainer_url: Url,
    pub username: String,
    pub password: String,
    /// Branch being deployed
    pub branch: String,
    /// Commit hash being deployed
    pub commit: String,
    /// Images to pull before reconciling the stack
    pub images: Vec<String>,
    /// Stack to create or update
    pub stack_name: String,
    /// Portainer endpoint hosting the stack
    pub endpoint_name: String,
    /// Extra environment entries appended after the built-in ones
    pub stack_env: Vec<(String, String)>,
    pub compose_file: PathBuf,
    pub mode: DeployMode,
    /// Ask Portainer to re-pull images when updating an existing stack
    pub force_pull: bool,
    /// Per-request timeout; `None` leaves requests unbounded
    pub timeout: Option<Duration>,
}

impl DeployOptions {
    /// Create options targeting `stack_name` on `endpoint_name`.
    ///
    /// Fails if `portainer_url` is not an absolute URL.
    pub fn new(
        portainer_url: &str,
        stack_name: impl Into<String>,
        endpoint_name: impl Into<String>,
    ) -> Result<Self> {
        let portainer_url = Url::parse(portainer_url).map_err(|e| {
            DeployError::config(format!("invalid Portainer URL '{portainer_url}': {e}"))
        })?;

        Ok(Self {
            portainer_url,
            username: String::new(),
            password: String::new(),
            branch: String::new(),
            commit: String::new(),
            images: Vec::new(),
            stack_name: stack_name.into(),
            endpoint_name: endpoint_name.into(),
            stack_env: Vec::new(),
            compose_file: PathBuf::from(DEFAULT_COMPOSE_FILE),
            mode: DeployMode::default(),
            force_pull: false,
            timeout: None,
        })
    }

    /// Set the Portainer login
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the branch and commit the release tag is derived from
    pub fn with_revision(mut self, branch: impl Into<String>, commit: impl Into<String>) -> Self {
        self.branch = branch.into();
        self.commit = commit.into();
        self
    }

    /// Set the images from a comma-separated list
    pub fn with_images(mut self, images: &str) -> Self {
        self.images = parse_image_list(images);
        self
    }

    /// Set extra stack environment from a JSON object
    pub fn with_stack_env_json(mut self, json: &str) -> Result<Self> {
        self.stack_env = parse_stack_env(json)?;
        Ok(self)
    }

    pub fn with_compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = path.into();
        self
    }

    pub fn with_mode(mut self, mode: DeployMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_force_pull(mut self, force_pull: bool) -> Self {
        self.force_pull = force_pull;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn release_tag(&self) -> Result<ReleaseTag> {
        ReleaseTag::new(&self.branch, &self.commit)
    }
}

impl fmt::Debug for DeployOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployOptions")
            .field("portainer_url", &self.portainer_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("branch", &self.branch)
            .field("commit", &self.commit)
            .field("images", &self.images)
            .field("stack_name", &self.stack_name)
            .field("endpoint_name", &self.endpoint_name)
            .field("stack_env", &self.stack_env)
            .field("compose_file", &self.compose_file)
            .field("mode", &self.mode)
            .field("force_pull", &self.force_pull)
            .field("timeout", &self.timeout)
            .finish()
    }
}
