//! Advertise tool example
//!
//! Defines a parameterless time tool backed by a plain HTTP endpoint and
//! keeps it registered with the tool registry until Ctrl-C.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gemini_agent::{
    DEFAULT_ADVERTISE_INTERVAL, RegistryClient, Tool, ToolDefinition, ToolRoute, get_registry_url,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let tool = Tool::new(
        ToolDefinition::builder(
            "get_utc_now",
            "Returns the current UTC date and time, in RFC3339 format.",
        )
        .build()?,
        ToolRoute::get("http://localhost:5120/api/time/now"),
    );

    let registry = RegistryClient::new(get_registry_url(None))?;
    println!(
        "Advertising '{}' every {:?}; press Ctrl-C to stop.",
        tool.name(),
        DEFAULT_ADVERTISE_INTERVAL
    );

    let stop = Arc::new(AtomicBool::new(false));
    let advertiser = {
        let registry = registry.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            registry
                .advertise(&[tool], DEFAULT_ADVERTISE_INTERVAL, stop)
                .await;
        })
    };

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down...");

    stop.store(true, Ordering::SeqCst);
    // Don't wait out the sleep between advertising rounds
    advertiser.abort();

    Ok(())
}
