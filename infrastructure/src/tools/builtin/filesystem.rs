//! Filesystem provider: create_file, read_file, write_file, append_file,
//! delete_file.
//!
//! Paths arrive already anchored by the normalization policy, so the
//! provider uses `file_name` as given. Failures come back as
//! `{"error": "..."}` text.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use stepwise_domain::{ProviderError, ToolDescriptor, ToolProvider};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const PROVIDER_ID: &str = "filesystem";

pub const CREATE_FILE: &str = "create_file";
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const APPEND_FILE: &str = "append_file";
pub const DELETE_FILE: &str = "delete_file";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

fn error_text(message: impl std::fmt::Display) -> String {
    json!({ "error": message.to_string() }).to_string()
}

fn require_str<'a>(arguments: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| error_text(format!("Missing required argument: {}", key)))
}

/// `content` may be given as any JSON value; non-strings are written as JSON.
fn content_arg(arguments: &Map<String, Value>) -> Result<String, String> {
    match arguments.get("content") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(error_text("Missing required argument: content")),
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

async fn create_file(arguments: &Map<String, Value>) -> Result<String, String> {
    let file_name = require_str(arguments, "file_name")?;
    let content = content_arg(arguments)?;
    let path = Path::new(file_name);

    ensure_parent(path)
        .await
        .map_err(|e| error_text(format!("Failed to create '{}': {}", file_name, e)))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| error_text(format!("Failed to create '{}': {}", file_name, e)))?;
    Ok(format!("File '{}' created", file_name))
}

async fn read_file(arguments: &Map<String, Value>) -> Result<String, String> {
    let file_name = require_str(arguments, "file_name")?;
    let path = Path::new(file_name);

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|_| error_text(format!("File '{}' not found", file_name)))?;
    if !metadata.is_file() {
        return Err(error_text(format!("'{}' is not a file", file_name)));
    }
    if metadata.len() > MAX_READ_SIZE {
        return Err(error_text(format!(
            "File '{}' is too large ({} bytes, max {} bytes)",
            file_name,
            metadata.len(),
            MAX_READ_SIZE
        )));
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| error_text(format!("Failed to read '{}': {}", file_name, e)))
}

async fn write_file(arguments: &Map<String, Value>) -> Result<String, String> {
    let file_name = require_str(arguments, "file_name")?;
    let content = content_arg(arguments)?;
    let path = Path::new(file_name);

    ensure_parent(path)
        .await
        .map_err(|e| error_text(format!("Failed to write '{}': {}", file_name, e)))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| error_text(format!("Failed to write '{}': {}", file_name, e)))?;
    Ok(format!("File '{}' written", file_name))
}

async fn append_file(arguments: &Map<String, Value>) -> Result<String, String> {
    let file_name = require_str(arguments, "file_name")?;
    let content = content_arg(arguments)?;
    let path = Path::new(file_name);

    ensure_parent(path)
        .await
        .map_err(|e| error_text(format!("Failed to append to '{}': {}", file_name, e)))?;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| error_text(format!("Failed to append to '{}': {}", file_name, e)))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| error_text(format!("Failed to append to '{}': {}", file_name, e)))?;
    Ok(format!("Appended to file '{}'", file_name))
}

async fn delete_file(arguments: &Map<String, Value>) -> Result<String, String> {
    let file_name = require_str(arguments, "file_name")?;
    match tokio::fs::remove_file(file_name).await {
        Ok(()) => Ok(format!("File '{}' deleted", file_name)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(error_text(format!("File '{}' not found", file_name)))
        }
        Err(e) => Err(error_text(format!("Failed to delete '{}': {}", file_name, e))),
    }
}

/// Local file operations
#[derive(Debug, Clone, Default)]
pub struct FilesystemProvider;

impl FilesystemProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(CREATE_FILE, "Create a new file with the given content")
                .with_string_arg("file_name", "Path of the file to create", true)
                .with_string_arg("content", "Initial content", true),
            ToolDescriptor::new(READ_FILE, "Read the full contents of a file")
                .with_string_arg("file_name", "Path of the file to read", true),
            ToolDescriptor::new(WRITE_FILE, "Overwrite a file with the given content")
                .with_string_arg("file_name", "Path of the file to write", true)
                .with_string_arg("content", "Content to write", true),
            ToolDescriptor::new(APPEND_FILE, "Append content to the end of a file")
                .with_string_arg("file_name", "Path of the file to append to", true)
                .with_string_arg("content", "Content to append", true),
            ToolDescriptor::new(DELETE_FILE, "Delete a file")
                .with_string_arg("file_name", "Path of the file to delete", true),
        ]
    }
}

#[async_trait]
impl ToolProvider for FilesystemProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(Self::descriptors())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, ProviderError> {
        debug!(tool = name, "filesystem invoke");
        let result = match name {
            CREATE_FILE => create_file(arguments).await,
            READ_FILE => read_file(arguments).await,
            WRITE_FILE => write_file(arguments).await,
            APPEND_FILE => append_file(arguments).await,
            DELETE_FILE => delete_file(arguments).await,
            other => Err(error_text(format!("Unknown tool: {}", other))),
        };
        Ok(result.unwrap_or_else(|e| e))
    }
}
