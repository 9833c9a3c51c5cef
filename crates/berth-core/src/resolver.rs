//! Name to identifier resolution for endpoints and registries.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::api::{PortainerClient, Registry};
use crate::error::{DeployError, ResourceKind, Result};

/// Resolves human-readable names to Portainer identifiers.
///
/// The registry list is fetched at most once per resolver and reused for every
/// later lookup, including lookups racing from concurrent pulls.
#[derive(Debug, Default)]
pub struct ResourceResolver {
    registries: OnceCell<Vec<Registry>>,
}

impl ResourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the ID of the first endpoint named exactly `name`.
    pub async fn resolve_endpoint(&self, client: &PortainerClient, name: &str) -> Result<u64> {
        let endpoints = client.list_endpoints().await?;
        let endpoint = endpoints
            .iter()
            .find(|endpoint| endpoint.name == name)
            .ok_or_else(|| DeployError::not_found(ResourceKind::Endpoint, name))?;
        info!(endpoint = name, id = endpoint.id, "resolved endpoint");
        Ok(endpoint.id)
    }

    /// Find the registry whose URL equals `host`.
    pub async fn resolve_registry(&self, client: &PortainerClient, host: &str) -> Result<u64> {
        let registries = self.registries(client).await?;
        registries
            .iter()
            .find(|registry| registry.url == host)
            .map(|registry| registry.id)
            .ok_or_else(|| DeployError::not_found(ResourceKind::Registry, host))
    }

    /// Resolve `host` and encode it as an `X-Registry-Auth` header value.
    pub async fn resolve_registry_auth(
        &self,
        client: &PortainerClient,
        host: &str,
    ) -> Result<String> {
        let id = self.resolve_registry(client, host).await?;
        debug!(registry = host, id, "resolved registry");
        Ok(registry_auth_header(id))
    }

    /// Whether the registry list has been fetched.
    pub fn registries_cached(&self) -> bool {
        self.registries.initialized()
    }

    async fn registries(&self, client: &PortainerClient) -> Result<&[Registry]> {
        let registries = self
            .registries
            .get_or_try_init(|| async {
                let registries = client.list_registries().await?;
                debug!(count = registries.len(), "cached registry list");
                Ok::<_, DeployError>(registries)
            })
            .await?;
        Ok(registries.as_slice())
    }
}

/// Encode a registry ID the way Portainer's Docker proxy expects it:
/// base64 of the compact JSON `{"registryId":<id>}`.
pub fn registry_auth_header(registry_id: u64) -> String {
    let payload = serde_json::json!({ "registryId": registry_id }).to_string();
    STANDARD.encode(payload)
}
