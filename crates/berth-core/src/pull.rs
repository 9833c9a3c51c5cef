//! Concurrent image pulls onto an endpoint.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::api::{PortainerClient, PullProgress};
use crate::error::{DeployError, Result};
use crate::release::ReleaseTag;
use crate::resolver::ResourceResolver;

/// Registry host pulled from without credentials.
pub const PUBLIC_REGISTRY_HOST: &str = "docker.io";

/// Registry host of an image: the part before the first `/`.
///
/// Returns `None` for names without a `/`, which carry no host segment.
pub fn registry_host(image: &str) -> Option<&str> {
    image.split_once('/').map(|(host, _)| host)
}

/// Host whose credentials must be resolved before pulling `image`, if any.
pub fn private_registry_host(image: &str) -> Option<&str> {
    registry_host(image).filter(|host| *host != PUBLIC_REGISTRY_HOST)
}

/// Pulls a batch of images onto one endpoint.
#[derive(Debug)]
pub struct ImagePuller<'a> {
    client: &'a PortainerClient,
    resolver: &'a ResourceResolver,
    endpoint_id: u64,
}

impl<'a> ImagePuller<'a> {
    pub fn new(
        client: &'a PortainerClient,
        resolver: &'a ResourceResolver,
        endpoint_id: u64,
    ) -> Self {
        Self {
            client,
            resolver,
            endpoint_id,
        }
    }

    /// Pull every image tagged with `tag`, all at once.
    ///
    /// Returns the images in completion order. The first failure is returned
    /// immediately and the pulls still in flight are dropped; images already
    /// pulled stay on the endpoint.
    pub async fn pull_all(&self, images: &[String], tag: &ReleaseTag) -> Result<Vec<String>> {
        if images.is_empty() {
            info!("no images to pull");
            return Ok(Vec::new());
        }

        info!(count = images.len(), %tag, "pulling images");
        let mut pulls: FuturesUnordered<_> = images
            .iter()
            .map(|image| async move {
                self.pull_one(image, tag).await?;
                Ok::<_, DeployError>(image.clone())
            })
            .collect();

        let mut pulled = Vec::with_capacity(images.len());
        while let Some(result) = pulls.next().await {
            let image = result?;
            info!(image = %image, "pulled image");
            pulled.push(image);
        }
        Ok(pulled)
    }

    async fn pull_one(&self, image: &str, tag: &ReleaseTag) -> Result<()> {
        let auth = match private_registry_host(image) {
            Some(host) => Some(self.resolver.resolve_registry_auth(self.client, host).await?),
            None => None,
        };

        debug!(image, authenticated = auth.is_some(), "starting pull");
        let stream = self
            .client
            .pull_image(self.endpoint_id, image, tag.as_str(), auth.as_deref())
            .await?;

        check_pull_stream(image, &stream)
    }
}

/// Fail if the Docker progress stream reports an error.
///
/// Docker answers `200 OK` before pulling and reports failures inline, one
/// JSON object per line.
pub fn check_pull_stream(image: &str, stream: &str) -> Result<()> {
    for line in stream.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let progress: PullProgress = match serde_json::from_str(line) {
            Ok(progress) => progress,
            Err(_) => {
                warn!(image, line, "ignoring unparseable pull progress");
                continue;
            }
        };
        if let Some(message) = progress.failure() {
            return Err(DeployError::PullFailed {
                image: image.to_string(),
                message,
            });
        }
    }
    Ok(())
}
