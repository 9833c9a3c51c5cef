//! Environment passed to the stack's compose file.

use serde::Serialize;

use crate::api::EnvVar;
use crate::release::ReleaseTag;

pub const RELEASE_TAG_VAR: &str = "RELEASE_TAG";
pub const URL_PREFIX_VAR: &str = "URL_PREFIX";
pub const STACK_NAME_VAR: &str = "STACK_NAME";

/// Ordered stack environment.
///
/// `RELEASE_TAG`, `URL_PREFIX` and `STACK_NAME` always come first, followed by
/// caller-supplied entries in their given order. Names are not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ComposeEnvironment {
    entries: Vec<EnvVar>,
}

impl ComposeEnvironment {
    pub fn build(
        release_tag: &ReleaseTag,
        url_prefix: &str,
        stack_name: &str,
        extra: &[(String, String)],
    ) -> Self {
        let mut entries = Vec::with_capacity(3 + extra.len());
        entries.push(EnvVar::new(RELEASE_TAG_VAR, release_tag.as_str()));
        entries.push(EnvVar::new(URL_PREFIX_VAR, url_prefix));
        entries.push(EnvVar::new(STACK_NAME_VAR, stack_name));
        entries.extend(
            extra
                .iter()
                .map(|(name, value)| EnvVar::new(name.as_str(), value.as_str())),
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[EnvVar] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vars(self) -> Vec<EnvVar> {
        self.entries
    }
}
