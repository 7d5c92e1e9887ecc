//! Writers for the JSON and text artifacts a run leaves on disk.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_text_artifact(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))
}

/// Serialize `value` as JSON and write it with [`write_text_artifact`].
///
/// Serialization happens first, so a value that cannot be serialized leaves
/// no file behind.
pub fn write_json_artifact<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let content = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .with_context(|| format!("serialize {:?}", path))?;
    write_text_artifact(path, &content)
}
