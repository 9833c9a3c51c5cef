//! Request and response bodies of the Portainer API.
//!
//! Field names follow Portainer's JSON casing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
}

/// Execution environment registered with Portainer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    pub id: u64,
    pub name: String,
}

/// Private image registry registered with Portainer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registry {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "URL")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    pub id: u64,
    pub name: String,
}

/// Response of the Docker swarm inspect proxy.
#[derive(Debug, Deserialize)]
pub struct SwarmInfo {
    #[serde(rename = "ID", default)]
    pub id: String,
}

/// One stack environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStackRequest {
    pub name: String,
    #[serde(rename = "SwarmID", skip_serializing_if = "Option::is_none")]
    pub swarm_id: Option<String>,
    pub stack_file_content: String,
    pub env: Vec<EnvVar>,
    pub prune: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackRequest {
    pub stack_file_content: String,
    pub env: Vec<EnvVar>,
    pub prune: bool,
    pub pull_image: bool,
}

/// Body returned by stack creation. Only the ID is read, and it may be absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatedStack {
    #[serde(rename = "Id")]
    pub id: Option<u64>,
}

/// One line of the Docker image pull progress stream.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullProgress {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_detail: Option<PullErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PullErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

impl PullProgress {
    /// Error reported by this line, if any.
    pub fn failure(&self) -> Option<String> {
        self.error.clone().or_else(|| {
            self.error_detail
                .as_ref()
                .and_then(|detail| detail.message.clone())
        })
    }
}
