//! MCP server process as a [`ToolProvider`] session.
//!
//! Each configured server is spawned once and spoken to over its stdio with
//! newline-delimited JSON-RPC. Requests on one session are serialized by a
//! `tokio::sync::Mutex`, so a response is always read by the request that
//! is waiting for it.
//!
//! ```text
//! McpStdioProvider ──stdin──▶  server process
//!        ▲                         │
//!        └──────────stdout─────────┘
//! ```

use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use stepwise_domain::{ProviderError, ToolDescriptor, ToolProvider};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use super::error::{McpError, Result};
use super::protocol::{
    CallToolResult, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    initialize_params,
};

/// How to launch one MCP server
#[derive(Debug, Clone, Default)]
pub struct McpServerSpec {
    pub id: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Live stdio connection to a server process
struct McpConnection {
    /// Held so the process is killed when the connection drops
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl McpConnection {
    async fn spawn(spec: &McpServerSpec) -> Result<Self> {
        which::which(&spec.command).map_err(|_| McpError::CommandNotFound(spec.command.clone()))?;

        debug!("Spawning MCP server {}: {} {:?}", spec.id, spec.command, spec.args);

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(McpError::SpawnError)?;
        let stdin = child.stdin.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdin"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;

        Ok(Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
        })
    }

    async fn write_line(&mut self, message: &impl serde::Serialize) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        trace!("MCP >> {}", line);
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Send a request and wait for its response.
    ///
    /// Notifications, server-initiated requests and non-JSON lines that
    /// arrive first are skipped.
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.write_line(&JsonRpcRequest::new(id, method, params)).await?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line).await? == 0 {
                return Err(McpError::TransportClosed);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            trace!("MCP << {}", trimmed);

            let response: JsonRpcResponse = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(_) => {
                    debug!("Skipping non-JSON-RPC line from MCP server: {}", trimmed);
                    continue;
                }
            };
            if !response.answers(id) {
                continue;
            }
            if let Some(err) = response.error {
                return Err(McpError::RpcError {
                    code: err.code,
                    message: err.message,
                });
            }
            return response
                .result
                .ok_or_else(|| McpError::UnexpectedResponse(format!("{} returned no result", method)));
        }
    }

    async fn initialize(&mut self) -> Result<()> {
        let result = self.request("initialize", Some(initialize_params())).await?;
        if let Some(server) = result.get("serverInfo") {
            debug!("MCP server info: {}", server);
        }
        self.write_line(&JsonRpcNotification::new("notifications/initialized"))
            .await
    }
}

/// A stdio MCP server exposed as a tool provider session.
pub struct McpStdioProvider {
    id: String,
    connection: Mutex<McpConnection>,
}

impl McpStdioProvider {
    /// Spawn the server and complete the `initialize` handshake.
    pub async fn connect(spec: McpServerSpec) -> Result<Self> {
        let mut connection = McpConnection::spawn(&spec).await?;
        connection.initialize().await?;
        info!("Connected to MCP server {}", spec.id);
        Ok(Self {
            id: spec.id,
            connection: Mutex::new(connection),
        })
    }
}

#[async_trait]
impl ToolProvider for McpStdioProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ProviderError> {
        let mut connection = self.connection.lock().await;
        let result = connection.request("tools/list", None).await?;
        let listed: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| ProviderError::DiscoveryFailed(format!("{}: {}", self.id, e)))?;
        Ok(listed.tools)
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> std::result::Result<String, ProviderError> {
        let mut connection = self.connection.lock().await;
        let params = json!({ "name": name, "arguments": arguments });
        match connection.request("tools/call", Some(params)).await {
            Ok(result) => match serde_json::from_value::<CallToolResult>(result) {
                Ok(call) => Ok(call.into_text()),
                Err(e) => Ok(format!("Error: malformed tools/call result: {}", e)),
            },
            // The server answered, just not successfully
            Err(McpError::RpcError { code, message }) => {
                warn!(provider = %self.id, tool = %name, code, "MCP tool call failed: {}", message);
                Ok(format!("Error: {}", message))
            }
            Err(e) => Err(e.into()),
        }
    }
}
