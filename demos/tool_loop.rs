//! Tool loop example
//!
//! Discovers tools from the registry, asks a question, and services the
//! model's function calls until it produces a final answer. Run the
//! `advertise_tool` example (and something listening on its route) first.

use anyhow::Context;
use gemini_agent::{
    Conversation, ConversationOptions, RegistryClient, ResponseEvent, ToolDispatcher, ToolSet,
    get_api_key, get_registry_url,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_key = get_api_key(None).context("set GEMINI_API_KEY to run this example")?;

    // Discover whatever is currently registered
    let registry = RegistryClient::new(get_registry_url(None))?;
    let tools: ToolSet = registry.list().await?.into_iter().collect();
    if tools.is_empty() {
        println!("No tools are registered; run the advertise_tool example first.");
        return Ok(());
    }
    for tool in tools.iter() {
        println!("Discovered tool: {}", tool.name());
    }
    println!();

    let options = ConversationOptions::builder()
        .api_key(api_key.clone())
        .system_instruction(
            "You are a helpful assistant. \
             Use of the available tools is compulsory when one fits the question.",
        )
        .tools(tools)
        .build()?;

    let mut conversation = Conversation::new(options)?;
    let dispatcher = ToolDispatcher::new()?.with_api_key(api_key);

    conversation.ask("What time is it in UTC right now?").await?;

    while let Some(event) = conversation.receive().await? {
        match event {
            ResponseEvent::Thought(thought) => {
                eprintln!("[thinking] {}", thought.text);
            }
            ResponseEvent::Text(text) => {
                print!("{}", text);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            ResponseEvent::FunctionCall(call) => {
                println!("🔧 {}", call);

                // Look up the route, invoke it, and hand the result back so
                // the model can resume from the function response
                let tool = conversation.options().tools.get(&call.name).cloned();
                match tool {
                    Some(tool) => {
                        let result = dispatcher.dispatch(&tool, &call.args).await?;
                        println!("   result: {}", result);
                        conversation
                            .reply_with_function_result(&call.name, &result)
                            .await?;
                    }
                    None => {
                        eprintln!("   Tool not found: {}", call.name);
                        break;
                    }
                }
            }
        }
    }

    println!("\n\nDone.");

    Ok(())
}
