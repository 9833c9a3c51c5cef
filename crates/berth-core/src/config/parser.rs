//! Parsers for raw configuration values.

use std::path::Path;

use serde_json::Value;

use crate::error::{DeployError, Result};

/// Split a comma-separated image list.
///
/// Whitespace around names is trimmed, blank items are dropped and repeated
/// names are kept once.
pub fn parse_image_list(raw: &str) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !images.iter().any(|existing| existing == name) {
            images.push(name.to_string());
        }
    }
    images
}

/// Parse the extra stack environment from a JSON object.
///
/// Entries keep the key order of the source document. String values are used
/// verbatim; any other value is rendered as compact JSON.
pub fn parse_stack_env(json: &str) -> Result<Vec<(String, String)>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(json)
        .map_err(|e| DeployError::config(format!("stack environment is not valid JSON: {e}")))?;

    let Value::Object(map) = value else {
        return Err(DeployError::config("stack environment must be a JSON object"));
    };

    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

/// Read the compose file that becomes the stack definition.
pub fn load_compose_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| DeployError::LocalIo {
        path: path.to_path_buf(),
        source,
    })
}
