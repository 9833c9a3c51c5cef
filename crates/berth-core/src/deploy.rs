//! End-to-end deployment run.
//!
//! Stages run strictly in order; only the image pulls fan out:
//!
//! 1. authenticate
//! 2. resolve the endpoint
//! 3. pull images (skipped when none are configured)
//! 4. resolve the swarm ID (clustered mode only)
//! 5. list stacks, then create or update

use serde::Serialize;
use tracing::info;

use crate::api::PortainerClient;
use crate::config::DeployOptions;
use crate::error::Result;
use crate::pull::ImagePuller;
use crate::release::{ReleaseTag, url_prefix};
use crate::resolver::ResourceResolver;
use crate::session::Session;
use crate::stack::{ComposeEnvironment, StackOutcome, StackReconciler};

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub release_tag: String,
    pub endpoint_id: u64,
    pub stack_name: String,
    pub pulled_images: Vec<String>,
    pub stack: StackOutcome,
}

/// Owns the authenticated client and lookup caches for one run.
#[derive(Debug)]
pub struct Deployer {
    client: PortainerClient,
    resolver: ResourceResolver,
}

impl Deployer {
    /// Authenticate against the configured Portainer instance.
    pub async fn connect(options: &DeployOptions) -> Result<Self> {
        let client = PortainerClient::new(&options.portainer_url, options.timeout)?;
        let session = Session::authenticate(&client, &options.username, &options.password).await?;
        Ok(Self::with_client(client.with_session(session)))
    }

    /// Wrap an already authenticated client.
    pub fn with_client(client: PortainerClient) -> Self {
        Self {
            client,
            resolver: ResourceResolver::new(),
        }
    }

    /// Pull the configured images and reconcile the stack.
    pub async fn run(
        &self,
        options: &DeployOptions,
        release_tag: &ReleaseTag,
        compose: &str,
    ) -> Result<DeployReport> {
        let endpoint_id = self
            .resolver
            .resolve_endpoint(&self.client, &options.endpoint_name)
            .await?;

        let pulled_images = ImagePuller::new(&self.client, &self.resolver, endpoint_id)
            .pull_all(&options.images, release_tag)
            .await?;

        let env = ComposeEnvironment::build(
            release_tag,
            &url_prefix(&options.branch),
            &options.stack_name,
            &options.stack_env,
        );
        let stack = StackReconciler::new(&self.client, endpoint_id, options.mode)
            .reconcile(&options.stack_name, compose, &env, options.force_pull)
            .await?;

        Ok(DeployReport {
            release_tag: release_tag.to_string(),
            endpoint_id,
            stack_name: options.stack_name.clone(),
            pulled_images,
            stack,
        })
    }
}

/// Run a full deployment of `compose` as described by `options`.
///
/// The release tag is validated before any remote call is made.
pub async fn deploy(options: &DeployOptions, compose: &str) -> Result<DeployReport> {
    let release_tag = options.release_tag()?;
    info!(
        stack = %options.stack_name,
        endpoint = %options.endpoint_name,
        %release_tag,
        "starting deployment"
    );

    let deployer = Deployer::connect(options).await?;
    let report = deployer.run(options, &release_tag, compose).await?;

    info!(stack = %report.stack_name, id = ?report.stack.id(), "deployment complete");
    Ok(report)
}
