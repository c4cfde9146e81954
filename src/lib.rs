//! # Gemini Agent SDK
//!
//! A streaming-first Rust SDK for building conversational Gemini agents with
//! thinking output and HTTP tool calling.
//!
//! ## Overview
//!
//! The SDK talks to the generative-language API's
//! `streamGenerateContent?alt=sse` endpoint and turns its record stream into
//! typed events:
//! - **Thoughts**: the model's thinking trace, streamed as it happens
//! - **Text**: the answer itself
//! - **Function calls**: requests to invoke one of the tools you advertised
//!
//! Tools are plain HTTP endpoints described by a [`ToolDefinition`] and a
//! [`ToolRoute`]; the [`ToolDispatcher`] invokes them and a [`RegistryClient`]
//! can discover them from (or advertise them to) a shared registry service.
//!
//! ## Key Features
//!
//! - **Streaming Responses**: events are yielded as records arrive, not after
//!   the model finishes
//! - **Thinking Output**: thought parts are surfaced as events and kept out of
//!   conversation history
//! - **Tool Calling**: function-call round-trips with history the model can
//!   resume from
//! - **Tool Discovery**: registry client for advertising and listing tools at
//!   runtime
//! - **Interrupts**: cancel a streaming exchange from another task
//! - **Usage Metadata**: token counts decoded from every response
//!
//! ## Two Interaction Modes
//!
//! ### 1. Simple Query Function (`query()`)
//! For single-turn interactions without conversation state:
//!
//! ```rust,no_run
//! use gemini_agent::{query, ConversationOptions, ResponseEvent};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConversationOptions::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .system_instruction("You are a concise assistant")
//!         .build()?;
//!
//!     // Send a single prompt and stream the response
//!     let mut events = query("What is the capital of France?", &options).await?;
//!
//!     while let Some(event) = events.next().await {
//!         match event? {
//!             ResponseEvent::Thought(thought) => eprintln!("[thinking] {}", thought.text),
//!             ResponseEvent::Text(text) => print!("{}", text),
//!             ResponseEvent::FunctionCall(call) => println!("wants to call: {}", call),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### 2. Conversation Object (`Conversation`)
//! For exchanges where the model calls tools and continues from their
//! results:
//!
//! ```rust,no_run
//! use gemini_agent::{Conversation, ConversationOptions, ResponseEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConversationOptions::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .system_instruction("Use the available tools to answer.")
//!         .build()?;
//!
//!     let mut conversation = Conversation::new(options)?;
//!
//!     conversation.ask("What time is it in UTC?").await?;
//!     while let Some(event) = conversation.receive().await? {
//!         match event {
//!             ResponseEvent::Text(text) => print!("{}", text),
//!             ResponseEvent::FunctionCall(call) => {
//!                 // Look the tool up, dispatch it, then hand the result back
//!                 // with `conversation.reply_with_function_result(...)` --
//!                 // the model resumes from the function response.
//!                 println!("function requested: {}", call);
//!             }
//!             ResponseEvent::Thought(_) => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The SDK is organized into several modules, each with a specific responsibility:
//!
//! - **conversation**: Streaming query function and the multi-turn conversation engine
//! - **types**: Request/response wire types, parts, turns, and configuration
//! - **tools**: Tool definitions, routes, and the ordered tool set
//! - **dispatch**: HTTP invocation of tool routes from model function calls
//! - **registry**: Client for the tool registry (register, list, advertise)
//! - **stream**: Internal decoder for the SSE-framed record stream
//! - **value**: Structured-value bridge between JSON and function responses
//! - **config**: Environment-variable configuration helpers
//! - **error**: Error types and conversions shared across the SDK

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================
// These modules are private (internal implementation details) unless explicitly
// re-exported through `pub use` statements below.

/// Environment-backed configuration helpers for API key, base URL, model,
/// and registry URL resolution.
mod config;

/// Streaming conversation engine. Contains the `query()` function for
/// single-turn prompts and the `Conversation` struct for multi-turn
/// exchanges with function-call round-trips.
mod conversation;

/// Tool dispatch over HTTP: GET parameter flattening with URI placeholder
/// substitution, JSON bodies for POST/PUT, and result decoding.
mod dispatch;

/// Error types and conversions for comprehensive error handling throughout the SDK.
/// Defines the `Error` enum and `Result<T>` type alias used across all public APIs.
mod error;

/// Client for the tool registry service: register, list, fetch, and the
/// periodic advertise loop that keeps registrations alive.
mod registry;

/// Internal decoder turning the endpoint's chunked SSE body into a stream
/// of parsed response records.
mod stream;

/// Tool definition system: declarations sent to the model, routes used by
/// the dispatcher, and the ordered `ToolSet`.
mod tools;

/// Core type definitions for turns, parts, response events, wire payloads,
/// and conversation configuration.
mod types;

/// Bridge between raw JSON values and the structured values carried inside
/// function-response turns.
mod value;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================
// These items form the public API of the SDK. Everything else is internal.

// --- Core Conversation API ---

pub use conversation::{Conversation, EventStream, query};

// --- Configuration ---

pub use config::{
    DEFAULT_REGISTRY_URL, get_api_key, get_base_url, get_model, get_registry_url,
};

// --- Error Handling ---

pub use error::{Error, Result};

// --- Tool System ---

pub use dispatch::ToolDispatcher;
pub use registry::{DEFAULT_ADVERTISE_INTERVAL, RegistryClient};
pub use tools::{
    HttpMethod, PropertySchema, Tool, ToolDefinition, ToolDefinitionBuilder, ToolParameters,
    ToolRoute, ToolSet,
};

// --- Core Types ---

pub use types::{
    Candidate, Content, ConversationOptions, ConversationOptionsBuilder, DEFAULT_BASE_URL,
    DEFAULT_MODEL, FunctionCall, FunctionCallPart, FunctionResponse, FunctionResponsePart,
    GeminiPart, GeminiResponse, Part, ResponseEvent, Role, TextPart, ThoughtPart, Turn,
    UsageMetadata,
};

// --- Structured Values ---

pub use value::{StructMap, StructuredValue};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// Convenience module containing the most commonly used types and functions.
/// Import with `use gemini_agent::prelude::*;` to get everything you need for typical usage.
///
/// This includes:
/// - Configuration: ConversationOptions, ConversationOptionsBuilder
/// - Conversation: Conversation, query()
/// - Events: ResponseEvent, FunctionCall
/// - Tools: Tool, ToolDefinition, ToolRoute, ToolSet, ToolDispatcher, RegistryClient
/// - Values: StructuredValue
/// - Errors: Error, Result
pub mod prelude {
    pub use crate::{
        Conversation, ConversationOptions, ConversationOptionsBuilder, Error, FunctionCall, Part,
        RegistryClient, ResponseEvent, Result, Role, StructuredValue, Tool, ToolDefinition,
        ToolDispatcher, ToolRoute, ToolSet, Turn, query,
    };
}
