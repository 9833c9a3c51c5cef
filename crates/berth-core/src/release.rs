//! Release tag and URL prefix derivation.

use std::fmt;

use crate::error::{DeployError, Result};

/// Number of commit hash characters kept in a release tag.
pub const SHORT_COMMIT_LEN: usize = 8;

/// Branch whose stacks are served without a URL prefix.
pub const PRODUCTION_BRANCH: &str = "main";

/// Tag applied to every pulled image and exposed to the stack as `RELEASE_TAG`.
///
/// Formatted as `<branch>-<first 8 characters of the commit hash>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    pub fn new(branch: &str, commit: &str) -> Result<Self> {
        let commit = commit.trim();
        if commit.is_empty() {
            return Err(DeployError::config("commit identifier is required"));
        }
        let short: String = commit.chars().take(SHORT_COMMIT_LEN).collect();
        Ok(Self(format!("{branch}-{short}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hostname prefix for the branch: empty for `main`, `<branch>.` otherwise.
pub fn url_prefix(branch: &str) -> String {
    if branch == PRODUCTION_BRANCH {
        String::new()
    } else {
        format!("{branch}.")
    }
}
