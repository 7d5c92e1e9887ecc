//! Intermediate `input.json` rows handed from version comparison to ticket extraction.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::error::{ParseError, Result};

/// One service's tag pair plus the repository to compare it in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInput {
    pub service: String,

    /// Repository URL or `owner/repo` slug. May be empty when unknown.
    #[serde(default)]
    pub repository: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_key: Option<String>,

    /// Deployed tag; empty when the service is not deployed.
    #[serde(default)]
    pub current_tag: String,

    /// Declared tag; empty when the .env does not declare the service.
    #[serde(default)]
    pub new_tag: String,
}

impl ServiceInput {
    pub fn is_changed(&self) -> bool {
        self.current_tag != self.new_tag
    }
}

/// Parse an `input.json` document. The top level must be an array.
pub fn parse_service_inputs(content: &str) -> Result<Vec<ServiceInput>> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(ParseError::from)?;
    if !value.is_array() {
        return Err(ParseError::UnexpectedShape(
            "input JSON must be an array of service objects".to_string(),
        )
        .into());
    }
    Ok(serde_json::from_value(value).map_err(ParseError::from)?)
}

/// Read and parse an `input.json` file.
pub fn read_service_inputs(path: &Path) -> Result<Vec<ServiceInput>> {
    let content = std::fs::read_to_string(path)?;
    parse_service_inputs(&content)
}
