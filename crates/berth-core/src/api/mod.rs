//! HTTP client for the Portainer API.
//!
//! Each method maps to one remote call. Only `200 OK` and `201 Created` count
//! as success; any other status becomes [`DeployError::Remote`] carrying the
//! response body, which is logged before the error is returned.

pub mod types;

pub use types::{
    AuthRequest, AuthResponse, CreateStackRequest, CreatedStack, Endpoint, EnvVar, PullProgress,
    Registry, Stack, SwarmInfo, UpdateStackRequest,
};

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{DeployError, Result, Stage};
use crate::session::Session;

/// Header carrying the encoded registry reference on image pulls.
pub const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

#[derive(Debug, Clone)]
pub struct PortainerClient {
    http: reqwest::Client,
    base_url: Url,
    session: Option<Session>,
}

impl PortainerClient {
    /// Build a client rooted at `base_url`.
    ///
    /// A base URL with a path (e.g. `https://host/portainer`) is kept as a
    /// prefix for every API path.
    pub fn new(base_url: &Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("berth/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| DeployError::config(format!("failed to build HTTP client: {e}")))?;

        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            session: None,
        })
    }

    /// Attach the session whose token authorizes every later call.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let stage = Stage::Authenticate;
        let request = self
            .request(Method::POST, "api/auth")?
            .json(&AuthRequest { username, password });
        let response = self.send(stage, request).await?;
        read_json(stage, response).await
    }

    pub async fn list_endpoints(&self) -> Result<Vec<Endpoint>> {
        self.get_json(Stage::ListEndpoints, "api/endpoints").await
    }

    pub async fn list_registries(&self) -> Result<Vec<Registry>> {
        self.get_json(Stage::ListRegistries, "api/registries").await
    }

    /// Pull `image:tag` onto the endpoint and return the raw progress stream.
    pub async fn pull_image(
        &self,
        endpoint_id: u64,
        image: &str,
        tag: &str,
        registry_auth: Option<&str>,
    ) -> Result<String> {
        let stage = Stage::PullImage;
        let path = format!("api/endpoints/{endpoint_id}/docker/images/create");
        let mut request = self
            .request(Method::POST, &path)?
            .query(&[("fromImage", image), ("tag", tag)]);
        if let Some(auth) = registry_auth {
            request = request.header(REGISTRY_AUTH_HEADER, auth);
        }
        let response = self.send(stage, request).await?;
        response
            .text()
            .await
            .map_err(|source| DeployError::Transport { stage, source })
    }

    pub async fn swarm_info(&self, endpoint_id: u64) -> Result<SwarmInfo> {
        let path = format!("api/endpoints/{endpoint_id}/docker/swarm");
        self.get_json(Stage::SwarmId, &path).await
    }

    /// List stacks, restricted to one swarm when `swarm_id` is given.
    pub async fn list_stacks(&self, swarm_id: Option<&str>) -> Result<Vec<Stack>> {
        let stage = Stage::ListStacks;
        let mut request = self.request(Method::GET, "api/stacks")?;
        if let Some(swarm_id) = swarm_id {
            let filters = serde_json::json!({ "SwarmID": swarm_id }).to_string();
            request = request.query(&[("filters", filters.as_str())]);
        }
        let response = self.send(stage, request).await?;
        read_json(stage, response).await
    }

    /// Create a stack and return its ID when the response carries one.
    ///
    /// The stack exists once the status is accepted, so an empty or
    /// unexpected body is logged rather than treated as a failure.
    pub async fn create_stack(
        &self,
        endpoint_id: u64,
        stack_type: u8,
        body: &CreateStackRequest,
    ) -> Result<Option<u64>> {
        let stage = Stage::CreateStack;
        let stack_type = stack_type.to_string();
        let endpoint_id = endpoint_id.to_string();
        let request = self
            .request(Method::POST, "api/stacks")?
            .query(&[
                ("type", stack_type.as_str()),
                ("method", "string"),
                ("endpointId", endpoint_id.as_str()),
            ])
            .json(body);
        let response = self.send(stage, request).await?;
        match response.text().await {
            Ok(text) => Ok(created_stack_id(&text)),
            Err(err) => {
                warn!(%stage, error = %err, "could not read stack creation response");
                Ok(None)
            }
        }
    }

    /// Replace the content of stack `stack_id`. The response body is ignored.
    pub async fn update_stack(
        &self,
        stack_id: u64,
        endpoint_id: u64,
        body: &UpdateStackRequest,
    ) -> Result<()> {
        let stage = Stage::UpdateStack;
        let path = format!("api/stacks/{stack_id}");
        let request = self
            .request(Method::PUT, &path)?
            .query(&[("endpointId", endpoint_id)])
            .json(body);
        self.send(stage, request).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, stage: Stage, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path)?;
        let response = self.send(stage, request).await?;
        read_json(stage, response).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| DeployError::config(format!("invalid API path '{path}': {e}")))?;
        debug!(%method, %url, "sending request");

        let mut request = self.http.request(method, url);
        if let Some(session) = &self.session {
            request = request.bearer_auth(session.token());
        }
        Ok(request)
    }

    async fn send(&self, stage: Stage, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| DeployError::Transport { stage, source })?;

        let status = response.status();
        if is_accepted(status) {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(%stage, status = status.as_u16(), %body, "remote call failed");
        Err(DeployError::Remote {
            stage,
            status: status.as_u16(),
            body,
        })
    }
}

fn is_accepted(status: StatusCode) -> bool {
    matches!(status, StatusCode::OK | StatusCode::CREATED)
}

fn created_stack_id(body: &str) -> Option<u64> {
    if body.trim().is_empty() {
        debug!("stack creation response had no body");
        return None;
    }
    match serde_json::from_str::<CreatedStack>(body) {
        Ok(created) => created.id,
        Err(err) => {
            warn!(error = %err, "unrecognized stack creation response");
            None
        }
    }
}

async fn read_json<T: DeserializeOwned>(stage: Stage, response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|source| DeployError::Transport { stage, source })
}
