//! Core types for the Gemini Agent SDK

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::tools::ToolSet;
use crate::value::StructMap;

/// Default endpoint of the generative-language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Options for configuring a conversation
#[derive(Clone)]
pub struct ConversationOptions {
    /// System instruction guiding the model's behavior
    ///
    /// When tools are provided, state explicitly whether their use is
    /// optional or compulsory; the model's default behavior is inconsistent.
    pub system_instruction: String,

    /// Model name (e.g. "gemini-2.5-flash")
    pub model: String,

    /// Base URL of the generative-language API
    pub base_url: String,

    /// API key sent as the `X-Goog-Api-Key` header
    pub api_key: String,

    /// Tools available to the model for the life of the conversation
    pub tools: ToolSet,
}

impl fmt::Debug for ConversationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationOptions")
            .field("system_instruction", &self.system_instruction)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("tools", &format!("{} tools", self.tools.len()))
            .finish()
    }
}

impl ConversationOptions {
    /// Create a new builder for ConversationOptions
    pub fn builder() -> ConversationOptionsBuilder {
        ConversationOptionsBuilder::default()
    }

    /// Full streaming URL for this model
    pub fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Builder for ConversationOptions
#[derive(Default)]
pub struct ConversationOptionsBuilder {
    system_instruction: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    tools: ToolSet,
}

impl fmt::Debug for ConversationOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationOptionsBuilder")
            .field("system_instruction", &self.system_instruction)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("tools", &format!("{} tools", self.tools.len()))
            .finish()
    }
}

impl ConversationOptionsBuilder {
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn tool(mut self, tool: crate::tools::Tool) -> Self {
        self.tools.insert(tool);
        self
    }

    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn build(self) -> Result<ConversationOptions> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("an API key is required to talk to Gemini"))?;

        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }

        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }

        Ok(ConversationOptions {
            system_instruction: self.system_instruction.unwrap_or_default(),
            model,
            base_url,
            api_key,
            tools: self.tools,
        })
    }
}

/// Turn role in the conversation
///
/// Function responses travel under the user role; the model side only ever
/// produces model-role turns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Plain text part
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TextPart {
    pub text: String,
}

impl TextPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Thinking-trace part
///
/// Only ever observed inbound; classification yields it as an event and the
/// engine never appends it to history.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThoughtPart {
    pub text: String,
    pub thought: bool,
    #[serde(rename = "thoughtSignature", skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ThoughtPart {
    pub fn new(text: impl Into<String>, signature: Option<String>) -> Self {
        Self {
            text: text.into(),
            thought: true,
            signature,
        }
    }
}

/// Function-call part
///
/// The thought signature that may ride along with a function call is kept so
/// the stored turn round-trips it on the next request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionCallPart {
    #[serde(rename = "functionCall")]
    pub function_call: FunctionCall,
    #[serde(rename = "thoughtSignature", skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
}

impl FunctionCallPart {
    pub fn new(function_call: FunctionCall, thought_signature: Option<String>) -> Self {
        Self {
            function_call,
            thought_signature,
        }
    }
}

/// Function-response part
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionResponsePart {
    #[serde(rename = "functionResponse")]
    pub function_response: FunctionResponse,
}

/// A tool's result, named and map-shaped, headed back to the model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: StructMap,
}

/// A function call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for FunctionCall {
    /// Render as `name(key: value, key2: value2)` for logs and CLIs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = match self.args.as_object() {
            Some(entries) => entries
                .iter()
                .map(|(key, value)| match value.as_str() {
                    Some(s) => format!("{}: {}", key, s),
                    None => format!("{}: {}", key, value),
                })
                .collect::<Vec<_>>()
                .join(", "),
            None => String::new(),
        };
        write!(f, "{}({})", self.name, rendered)
    }
}

/// The smallest unit within a turn
///
/// A closed set: anything a response part claims to be that is not one of
/// these is a protocol error, surfaced by [`GeminiPart::classify`] rather
/// than silently skipped.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text(TextPart),
    Thought(ThoughtPart),
    FunctionCall(FunctionCallPart),
    FunctionResponse(FunctionResponsePart),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(TextPart::new(text))
    }

    pub fn function_response(name: impl Into<String>, response: StructMap) -> Self {
        Part::FunctionResponse(FunctionResponsePart {
            function_response: FunctionResponse {
                name: name.into(),
                response,
            },
        })
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Part::FunctionCall(_))
    }
}

/// One role-attributed contribution to the conversation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// A user turn carrying one text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// A model turn carrying exactly one part
    pub fn model_part(part: Part) -> Self {
        Self {
            role: Role::Model,
            parts: vec![part],
        }
    }

    /// A user turn answering a function call with the tool's structured result
    pub fn function_response(name: impl Into<String>, response: StructMap) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::function_response(name, response)],
        }
    }
}

/// A typed event pulled from the response stream
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseEvent {
    /// Ephemeral model reasoning; shown to the caller, never retained
    Thought(ThoughtPart),
    /// A chunk of answer text (also appended to history)
    Text(String),
    /// The model wants a tool invoked; answer with
    /// `reply_with_function_result`
    FunctionCall(FunctionCall),
}

// ---------------------------------------------------------------------------
// Wire types: outbound request
// ---------------------------------------------------------------------------

/// Request payload for `streamGenerateContent`
///
/// Field naming follows the endpoint exactly: `system_instruction` is
/// snake_case while `generationConfig` is camelCase.
#[derive(Debug, Serialize)]
pub struct GeminiRequest<'a> {
    pub contents: &'a [Turn],
    pub system_instruction: SystemInstruction,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolDeclarations>,
}

impl<'a> GeminiRequest<'a> {
    pub fn new(contents: &'a [Turn], system_instruction: &str, tools: &ToolSet) -> Self {
        Self {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![TextPart::new(system_instruction)],
            },
            generation_config: GenerationConfig::default(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(ToolDeclarations {
                    function_declarations: tools.declarations(),
                })
            },
        }
    }
}

/// `system_instruction` payload: bare text parts
#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

/// `generationConfig` payload
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    #[serde(rename = "thinkingConfig")]
    pub thinking_config: ThinkingConfig,
}

/// Fixed thinking policy: unlimited budget, thoughts always included
#[derive(Debug, Clone, Serialize)]
pub struct ThinkingConfig {
    #[serde(rename = "thinkingBudget")]
    pub thinking_budget: i32,
    #[serde(rename = "includeThoughts")]
    pub include_thoughts: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            thinking_config: ThinkingConfig {
                thinking_budget: -1,
                include_thoughts: true,
            },
        }
    }
}

/// `tools` payload: the flattened declaration list
#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclarations {
    #[serde(rename = "functionDeclarations")]
    pub function_declarations: Vec<crate::tools::ToolDefinition>,
}

// ---------------------------------------------------------------------------
// Wire types: inbound stream records
// ---------------------------------------------------------------------------

/// One decoded record of the response stream
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub model_version: Option<String>,
    pub response_id: Option<String>,
}

impl GeminiResponse {
    /// Pick the candidate to surface from this record
    ///
    /// Minimum finish-reason rank wins; ties keep the first occurrence.
    /// `None` only for an empty candidate list, which decode already
    /// rejects.
    pub fn preferred_candidate(&self) -> Option<&Candidate> {
        self.preferred_candidate_index()
            .map(|index| &self.candidates[index])
    }

    /// Index of the preferred candidate, for callers that take it by value
    pub fn preferred_candidate_index(&self) -> Option<usize> {
        let mut best: Option<(usize, u8)> = None;
        for (index, candidate) in self.candidates.iter().enumerate() {
            let rank = candidate.finish_reason_rank();
            match best {
                Some((_, best_rank)) if rank >= best_rank => {}
                _ => best = Some((index, rank)),
            }
        }
        best.map(|(index, _)| index)
    }
}

/// One model-proposed completion within a record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    pub finish_reason: Option<String>,
    pub index: Option<u32>,
}

impl Candidate {
    /// Rank for candidate selection: lower is better
    ///
    /// No finish reason means generation is still under way and outranks
    /// everything; a clean `"STOP"` beats any abnormal termination.
    pub fn finish_reason_rank(&self) -> u8 {
        match self.finish_reason.as_deref() {
            None => 0,
            Some("STOP") => 1,
            Some(_) => 2,
        }
    }
}

/// Turn-shaped content of a candidate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// Raw inbound part, before classification
///
/// The wire leaves every field optional; [`classify`](Self::classify) turns
/// the combination into exactly one [`Part`] or a protocol error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
    pub thought_signature: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl GeminiPart {
    /// Classify this raw part into the closed [`Part`] variant set
    ///
    /// Thought flag wins over a function call, which wins over plain text;
    /// a part claiming to be a thought (or nothing at all) without text is
    /// a protocol error carrying the literal part.
    pub fn classify(&self) -> Result<Part> {
        if self.thought {
            return match self.text.as_deref() {
                Some(text) if !text.is_empty() => Ok(Part::Thought(ThoughtPart::new(
                    text,
                    self.thought_signature.clone(),
                ))),
                _ => Err(Error::protocol("expected a thought part to contain text")),
            };
        }

        if let Some(call) = &self.function_call {
            return Ok(Part::FunctionCall(FunctionCallPart::new(
                call.clone(),
                self.thought_signature.clone(),
            )));
        }

        match self.text.as_deref() {
            Some(text) if !text.is_empty() => Ok(Part::text(text)),
            _ => Err(Error::protocol(format!(
                "a response part carried none of text, thought, or a function call: {:?}",
                self
            ))),
        }
    }
}

/// Token accounting reported by the endpoint
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub thoughts_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}
