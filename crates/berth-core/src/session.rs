//! Authenticated Portainer session.

use std::fmt;

use tracing::info;

use crate::api::PortainerClient;
use crate::error::{DeployError, Result};

/// Bearer token obtained once per run.
///
/// The token is never refreshed; if it expires mid-run the next call fails.
#[derive(Clone)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Log in with `username`/`password` and keep the returned JWT.
    pub async fn authenticate(
        client: &PortainerClient,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        info!(username, "authenticating");
        let response = client
            .login(username, password)
            .await
            .map_err(|err| match err {
                DeployError::Remote { status, body, .. } => {
                    DeployError::Authentication { status, body }
                }
                other => other,
            })?;

        if response.jwt.is_empty() {
            return Err(DeployError::Authentication {
                status: 200,
                body: "response carried an empty token".to_string(),
            });
        }

        Ok(Self::new(response.jwt))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}
