//! Client for the tool registry
//!
//! Tools that live behind HTTP routes announce themselves to a small shared
//! registry so that agent processes can discover them at runtime. The
//! registry keys entries by tool name and expires the ones that stop
//! refreshing, which is why [`RegistryClient::advertise`] re-registers on an
//! interval instead of registering once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::tools::Tool;

/// How often [`RegistryClient::advertise`] refreshes its registrations
pub const DEFAULT_ADVERTISE_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP client for a tool registry
///
/// The registry exposes `PUT /tools/{name}` to upsert a tool, `GET /tools`
/// to list the live ones, and `GET /tools/{name}` to fetch a single entry.
/// Cloning is cheap; clones share the underlying connection pool, so a
/// clone can be moved into a background task running the advertise loop.
///
/// # Example
///
/// ```rust,no_run
/// use gemini_agent::{RegistryClient, ToolDefinition, Tool, ToolRoute};
///
/// # async fn example() -> gemini_agent::Result<()> {
/// let registry = RegistryClient::new("http://localhost:5050")?;
///
/// let tool = Tool::new(
///     ToolDefinition::builder("get_utc_now", "Returns the current UTC time.").build()?,
///     ToolRoute::get("http://localhost:5120/api/time/now"),
/// );
/// registry.register(&tool).await?;
///
/// for tool in registry.list().await? {
///     println!("available: {}", tool.name());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    /// Creates a client for the registry at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|err| Error::config(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Registers (or refreshes) a tool under its name
    ///
    /// The registry treats the call as an upsert, so registering the same
    /// tool again resets its expiry rather than failing.
    pub async fn register(&self, tool: &Tool) -> Result<()> {
        let response = self
            .http_client
            .put(self.tool_url(tool.name()))
            .json(tool)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Lists every tool currently live in the registry
    pub async fn list(&self) -> Result<Vec<Tool>> {
        let response = self.http_client.get(self.tools_url()).send().await?;
        let response = check_status(response).await?;
        let tools = response.json::<Vec<Tool>>().await?;
        Ok(tools)
    }

    /// Fetches a single tool by name, or `None` if the registry does not
    /// know it (expired entries disappear the same way as never-registered
    /// ones)
    pub async fn get(&self, name: &str) -> Result<Option<Tool>> {
        let response = self.http_client.get(self.tool_url(name)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let tool = response.json::<Tool>().await?;
        Ok(Some(tool))
    }

    /// Keeps a set of tools registered until `stop` is set
    ///
    /// Registers every tool, sleeps for `interval`, and repeats. A failed
    /// registration is logged and retried on the next round; the registry
    /// being briefly unreachable should not take the advertised tools down
    /// with it. The loop notices `stop` when it wakes, so it exits within
    /// one interval of the flag being set.
    pub async fn advertise(&self, tools: &[Tool], interval: Duration, stop: Arc<AtomicBool>) {
        log::debug!(
            "Advertising {} tool(s) to {} every {:?}",
            tools.len(),
            self.base_url,
            interval
        );

        while !stop.load(Ordering::SeqCst) {
            for tool in tools {
                if let Err(err) = self.register(tool).await {
                    log::warn!("Failed to advertise tool '{}': {}", tool.name(), err);
                }
            }
            tokio::time::sleep(interval).await;
        }
    }

    fn tools_url(&self) -> String {
        format!("{}/tools", self.base_url.trim_end_matches('/'))
    }

    fn tool_url(&self, name: &str) -> String {
        format!("{}/tools/{}", self.base_url.trim_end_matches('/'), name)
    }
}

/// Turns a non-success registry response into an API error carrying the
/// status and whatever body the registry sent back
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|err| format!("failed to read error response body: {}", err));
        return Err(Error::api(status.as_u16(), body));
    }
    Ok(response)
}
