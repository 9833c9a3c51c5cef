//! Create-or-update reconciliation of a named stack.

use serde::Serialize;
use tracing::info;

use crate::api::{CreateStackRequest, PortainerClient, Stack, UpdateStackRequest};
use crate::config::DeployMode;
use crate::error::{DeployError, ResourceKind, Result};

use super::env::ComposeEnvironment;

/// What reconciliation will do with the named stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPlan {
    Create,
    Update { id: u64 },
}

impl StackPlan {
    /// Update the first stack named `name`, or create one if none matches.
    pub fn decide(stacks: &[Stack], name: &str) -> Self {
        stacks
            .iter()
            .find(|stack| stack.name == name)
            .map_or(StackPlan::Create, |stack| StackPlan::Update { id: stack.id })
    }
}

/// Result of a reconciliation.
///
/// A created stack's ID is only known when Portainer echoes it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StackOutcome {
    Created { id: Option<u64> },
    Updated { id: u64 },
}

impl StackOutcome {
    pub fn id(&self) -> Option<u64> {
        match self {
            StackOutcome::Created { id } => *id,
            StackOutcome::Updated { id } => Some(*id),
        }
    }
}

/// Body for creating a stack. Prune is always on.
pub fn build_create_request(
    name: &str,
    compose: &str,
    env: &ComposeEnvironment,
    swarm_id: Option<&str>,
) -> CreateStackRequest {
    CreateStackRequest {
        name: name.to_string(),
        swarm_id: swarm_id.map(str::to_string),
        stack_file_content: compose.to_string(),
        env: env.entries().to_vec(),
        prune: true,
    }
}

/// Body for replacing an existing stack's content. Prune is always on.
pub fn build_update_request(
    compose: &str,
    env: &ComposeEnvironment,
    pull_image: bool,
) -> UpdateStackRequest {
    UpdateStackRequest {
        stack_file_content: compose.to_string(),
        env: env.entries().to_vec(),
        prune: true,
        pull_image,
    }
}

/// Reconciles one stack on one endpoint.
#[derive(Debug)]
pub struct StackReconciler<'a> {
    client: &'a PortainerClient,
    endpoint_id: u64,
    mode: DeployMode,
}

impl<'a> StackReconciler<'a> {
    pub fn new(client: &'a PortainerClient, endpoint_id: u64, mode: DeployMode) -> Self {
        Self {
            client,
            endpoint_id,
            mode,
        }
    }

    /// Swarm ID scoping stack operations, or `None` in standalone mode.
    pub async fn resolve_swarm_id(&self) -> Result<Option<String>> {
        if self.mode == DeployMode::Standalone {
            return Ok(None);
        }

        let swarm = self.client.swarm_info(self.endpoint_id).await?;
        if swarm.id.is_empty() {
            return Err(DeployError::not_found(
                ResourceKind::Cluster,
                format!("endpoint {}", self.endpoint_id),
            ));
        }
        info!(swarm_id = %swarm.id, "resolved swarm");
        Ok(Some(swarm.id))
    }

    /// Create `stack_name` if absent, otherwise replace its content.
    pub async fn reconcile(
        &self,
        stack_name: &str,
        compose: &str,
        env: &ComposeEnvironment,
        force_pull: bool,
    ) -> Result<StackOutcome> {
        let swarm_id = self.resolve_swarm_id().await?;
        let stacks = self.client.list_stacks(swarm_id.as_deref()).await?;

        match StackPlan::decide(&stacks, stack_name) {
            StackPlan::Create => {
                info!(stack = stack_name, mode = ?self.mode, "creating stack");
                let body = build_create_request(stack_name, compose, env, swarm_id.as_deref());
                let id = self
                    .client
                    .create_stack(self.endpoint_id, self.mode.stack_type(), &body)
                    .await?;
                Ok(StackOutcome::Created { id })
            }
            StackPlan::Update { id } => {
                info!(stack = stack_name, id, force_pull, "updating stack");
                let body = build_update_request(compose, env, force_pull);
                self.client
                    .update_stack(id, self.endpoint_id, &body)
                    .await?;
                Ok(StackOutcome::Updated { id })
            }
        }
    }
}
