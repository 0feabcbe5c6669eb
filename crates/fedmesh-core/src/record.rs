//! The published discovery record for one federation node.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Last known-published reachable address of exactly one node.
///
/// On the wire the node name is stored under `name`, matching the
/// `server.json` documents the static site serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelRecord {
    #[serde(rename = "name")]
    pub node_name: String,
    pub url: String,
}

impl TunnelRecord {
    pub fn new(node_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            url: url.into(),
        }
    }

    /// Canonical document body: pretty-printed JSON with a trailing newline.
    pub fn to_document(&self) -> Result<String> {
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        Ok(body)
    }

    /// Parse a document body previously produced by [`Self::to_document`].
    pub fn from_document(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Check that a node name can be used verbatim as a path segment.
pub fn validate_node_name(name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if name.is_empty() || !valid_chars || name.split('.').all(str::is_empty) || name.contains("..")
    {
        return Err(Error::InvalidNodeName(name.to_string()));
    }
    Ok(())
}
