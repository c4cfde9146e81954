//! Streaming conversations with the model
//!
//! This module is the core of the SDK: it owns conversation history, builds
//! the outbound request, and turns the decoded response stream into typed
//! [`ResponseEvent`]s.
//!
//! # Request flow
//!
//! ```text
//! ask(prompt)
//!     │
//!     ├─> history reset to a single user turn
//!     │
//!     ├─> POST …/models/{model}:streamGenerateContent?alt=sse
//!     │      (full history + system instruction + tool declarations)
//!     │
//!     └─> response body decoded record by record
//!
//! receive()
//!     │
//!     ├─> next part of the preferred candidate, classified
//!     │
//!     ├─> Thought   → event only, never stored
//!     ├─> Text      → appended to history as a model turn, then yielded
//!     └─> FunctionCall → appended to history as a model turn, then yielded;
//!                        answer it with reply_with_function_result()
//! ```
//!
//! History is only ever mutated here: `ask` and `reply_with_function_result`
//! append user-role turns before the request goes out, and `receive` appends
//! one model turn per retained part as events are pulled. On any error the
//! exchange is over; history stays at its last consistent state for
//! inspection, but the same exchange cannot be resumed.
//!
//! # Examples
//!
//! ## Single question
//!
//! ```rust,no_run
//! use gemini_agent::{query, ConversationOptions, ResponseEvent};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConversationOptions::builder()
//!         .api_key("AIza...")
//!         .build()?;
//!
//!     let mut events = query("What is 2+2?", &options).await?;
//!
//!     while let Some(event) = events.next().await {
//!         if let ResponseEvent::Text(text) = event? {
//!             print!("{}", text);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Conversation with a tool round-trip
//!
//! ```rust,no_run
//! use gemini_agent::{Conversation, ConversationOptions, ResponseEvent};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ConversationOptions::builder()
//!     .system_instruction("Use the provided tools to answer.")
//!     .api_key("AIza...")
//!     .build()?;
//!
//! let mut conversation = Conversation::new(options)?;
//! conversation.ask("What time is it?").await?;
//!
//! while let Some(event) = conversation.receive().await? {
//!     match event {
//!         ResponseEvent::Thought(thought) => eprintln!("[thinking] {}", thought.text),
//!         ResponseEvent::Text(text) => println!("{}", text),
//!         ResponseEvent::FunctionCall(call) => {
//!             // Execute the tool out of band, then resume the exchange
//!             let result = json!({"now": "2024-01-01T00:00:00Z"});
//!             conversation
//!                 .reply_with_function_result(&call.name, &result)
//!                 .await?;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{Stream, StreamExt};

use crate::error::{Error, Result};
use crate::stream::{RecordStream, decode_record_stream};
use crate::types::{
    ConversationOptions, GeminiPart, GeminiRequest, GeminiResponse, Part, ResponseEvent, Turn,
    UsageMetadata,
};
use crate::value::StructuredValue;

/// A pinned, boxed stream of response events from the model
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ResponseEvent>> + Send>>;

/// One-shot query without conversation state.
///
/// Sends a single user prompt and yields the response events as they
/// arrive. Because nothing is retained between events, a `FunctionCall`
/// event cannot be answered here; use [`Conversation`] for tool round-trips
/// and multi-turn exchanges.
pub async fn query(prompt: &str, options: &ConversationOptions) -> Result<EventStream> {
    let client = reqwest::Client::builder()
        .build()
        .map_err(|err| Error::config(format!("failed to build HTTP client: {}", err)))?;

    let contents = vec![Turn::user_text(prompt)];
    let request = GeminiRequest::new(&contents, &options.system_instruction, &options.tools);

    let response = send_request(&client, options, &request).await?;

    let events = decode_record_stream(response).flat_map(|record| {
        futures::stream::iter(match record {
            Ok(record) => events_of_record(record),
            Err(err) => vec![Err(err)],
        })
    });

    Ok(Box::pin(events))
}

/// POST the request and fail on a non-success status, body included
async fn send_request(
    client: &reqwest::Client,
    options: &ConversationOptions,
    request: &GeminiRequest<'_>,
) -> Result<reqwest::Response> {
    let url = options.stream_url();
    log::debug!("streaming request to {}", url);

    let response = client
        .post(&url)
        .header("X-Goog-Api-Key", &options.api_key)
        .header("Accept", "text/event-stream")
        .json(request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|err| format!("failed to read error response body: {}", err));
        return Err(Error::api(status, body));
    }

    Ok(response)
}

/// Classify every part of the record's preferred candidate into events
fn events_of_record(mut record: GeminiResponse) -> Vec<Result<ResponseEvent>> {
    // Decoding guarantees at least one candidate per record
    let Some(index) = record.preferred_candidate_index() else {
        return vec![Err(Error::protocol(
            "expected at least one candidate in stream record",
        ))];
    };
    let candidate = record.candidates.swap_remove(index);

    candidate
        .content
        .parts
        .iter()
        .filter_map(|raw| match raw.classify() {
            Ok(part) => event_for(part).map(Ok),
            Err(err) => Some(Err(err)),
        })
        .collect()
}

fn event_for(part: Part) -> Option<ResponseEvent> {
    match part {
        Part::Thought(thought) => Some(ResponseEvent::Thought(thought)),
        Part::Text(text) => Some(ResponseEvent::Text(text.text)),
        Part::FunctionCall(call) => Some(ResponseEvent::FunctionCall(call.function_call)),
        // Function responses only travel outbound
        Part::FunctionResponse(_) => None,
    }
}

/// Stateful multi-turn conversation with tool calling.
///
/// A `Conversation` drives one exchange at a time: [`ask`](Self::ask) starts
/// a fresh exchange, [`receive`](Self::receive) pulls events from it, and
/// [`reply_with_function_result`](Self::reply_with_function_result) answers
/// a pending function call and resumes the same exchange.
///
/// The conversation is not safe for concurrent use, but the interrupt flag
/// from [`interrupt_handle`](Self::interrupt_handle) may be set from any
/// thread to stop the current exchange at the next `receive` call.
pub struct Conversation {
    options: ConversationOptions,

    /// Reused across requests for connection pooling
    http_client: reqwest::Client,

    /// Ordered turn sequence sent with every request
    history: Vec<Turn>,

    /// Active record stream, `None` between exchanges
    current_stream: Option<RecordStream>,

    /// Parts of the current record not yet classified and yielded
    pending_parts: VecDeque<GeminiPart>,

    /// Most recent token accounting seen on the stream
    last_usage: Option<UsageMetadata>,

    /// Set from any thread to stop the exchange; reset on ask/reply
    interrupted: Arc<AtomicBool>,
}

impl Conversation {
    pub fn new(options: ConversationOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|err| Error::config(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self {
            options,
            http_client,
            history: Vec::new(),
            current_stream: None,
            pending_parts: VecDeque::new(),
            last_usage: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start a fresh exchange with a single user prompt.
    ///
    /// Any prior history is discarded. Call [`receive`](Self::receive) to
    /// consume the response.
    pub async fn ask(&mut self, prompt: impl Into<String>) -> Result<()> {
        self.interrupted.store(false, Ordering::SeqCst);
        self.history.clear();
        self.pending_parts.clear();
        self.last_usage = None;

        self.history.push(Turn::user_text(prompt));
        self.open_stream().await
    }

    /// Answer a pending function call with the tool's JSON result and resume.
    ///
    /// The last turn must end with a function-call part, otherwise this
    /// fails with [`Error::InvalidState`]. The result is converted into the
    /// structured map shape the model expects; a bare array is wrapped under
    /// a `"data"` key and a bare leaf value is a conversion error.
    pub async fn reply_with_function_result(
        &mut self,
        tool_name: &str,
        result: &serde_json::Value,
    ) -> Result<()> {
        let ends_with_call = self
            .history
            .last()
            .and_then(|turn| turn.parts.last())
            .map(Part::is_function_call)
            .unwrap_or(false);
        if !ends_with_call {
            return Err(Error::invalid_state(
                "expected the last turn to end with a function call",
            ));
        }

        let response = StructuredValue::struct_from_json(result)?;

        self.interrupted.store(false, Ordering::SeqCst);
        self.pending_parts.clear();

        log::debug!("function result for {} appended, resuming exchange", tool_name);
        self.history.push(Turn::function_response(tool_name, response));
        self.open_stream().await
    }

    /// Build and send the streaming request for the current history
    ///
    /// Any stream from the previous request is dropped first, so a send
    /// failure leaves the conversation with no exchange in flight.
    async fn open_stream(&mut self) -> Result<()> {
        self.current_stream = None;

        let request = GeminiRequest::new(
            &self.history,
            &self.options.system_instruction,
            &self.options.tools,
        );
        let response = send_request(&self.http_client, &self.options, &request).await?;
        self.current_stream = Some(decode_record_stream(response));
        Ok(())
    }

    /// Pull the next event from the current exchange.
    ///
    /// Returns `Ok(None)` when the exchange is finished, no exchange is in
    /// flight, or the interrupt flag is set. Text and function-call parts
    /// are appended to history as model turns at the moment they are
    /// yielded; thoughts are surfaced without being stored. Any error ends
    /// the exchange.
    pub async fn receive(&mut self) -> Result<Option<ResponseEvent>> {
        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                self.current_stream = None;
                self.pending_parts.clear();
                return Ok(None);
            }

            if let Some(raw) = self.pending_parts.pop_front() {
                let part = match raw.classify() {
                    Ok(part) => part,
                    Err(err) => return Err(self.fail(err)),
                };

                match part {
                    Part::Thought(thought) => {
                        return Ok(Some(ResponseEvent::Thought(thought)));
                    }
                    Part::FunctionCall(call_part) => {
                        let call = call_part.function_call.clone();
                        self.history
                            .push(Turn::model_part(Part::FunctionCall(call_part)));
                        return Ok(Some(ResponseEvent::FunctionCall(call)));
                    }
                    Part::Text(text_part) => {
                        let text = text_part.text.clone();
                        self.history.push(Turn::model_part(Part::Text(text_part)));
                        return Ok(Some(ResponseEvent::Text(text)));
                    }
                    // Classification never yields this inbound
                    Part::FunctionResponse(_) => continue,
                }
            }

            let Some(stream) = self.current_stream.as_mut() else {
                return Ok(None);
            };

            match stream.next().await {
                Some(Ok(mut record)) => {
                    if let Some(usage) = record.usage_metadata.take() {
                        self.last_usage = Some(usage);
                    }
                    // Decoding guarantees at least one candidate per record
                    let Some(index) = record.preferred_candidate_index() else {
                        return Err(self.fail(Error::protocol(
                            "expected at least one candidate in stream record",
                        )));
                    };
                    let candidate = record.candidates.swap_remove(index);
                    self.pending_parts.extend(candidate.content.parts);
                }
                Some(Err(err)) => return Err(self.fail(err)),
                None => {
                    self.current_stream = None;
                    return Ok(None);
                }
            }
        }
    }

    /// End the exchange on a fatal error, leaving history as-is
    fn fail(&mut self, err: Error) -> Error {
        self.current_stream = None;
        self.pending_parts.clear();
        err
    }

    /// Signal the current exchange to stop at the next `receive` call
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Shared flag for interrupting from another thread or task
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Turns exchanged so far, in order
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn options(&self) -> &ConversationOptions {
        &self.options
    }

    /// Token accounting from the most recent stream record that carried any
    pub fn usage(&self) -> Option<&UsageMetadata> {
        self.last_usage.as_ref()
    }
}
