//! Simple ask example
//!
//! Streams a single prompt through `query()`: thinking output goes to
//! stderr, the answer itself to stdout.

use anyhow::Context;
use futures::StreamExt;
use gemini_agent::{ConversationOptions, ResponseEvent, get_api_key, get_base_url, get_model, query};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_key = get_api_key(None).context("set GEMINI_API_KEY to run this example")?;

    // Configure the conversation
    let options = ConversationOptions::builder()
        .api_key(api_key)
        .base_url(get_base_url(None))
        .model(get_model(None))
        .system_instruction("You are a concise assistant.")
        .build()?;

    println!("Asking {}...\n", options.model);

    // Send the prompt and stream the response
    let mut events = query("What is the capital of France? Please be brief.", &options).await?;

    while let Some(event) = events.next().await {
        match event? {
            ResponseEvent::Thought(thought) => {
                eprintln!("[thinking] {}", thought.text);
            }
            ResponseEvent::Text(text) => {
                print!("{}", text);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            ResponseEvent::FunctionCall(call) => {
                // No tools were advertised, so this should not happen
                println!("\nFunction requested: {}", call);
            }
        }
    }

    println!("\n\nDone.");

    Ok(())
}
