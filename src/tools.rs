//! # Tool definitions, routes, and the per-conversation catalogue
//!
//! A tool has two halves:
//!
//! 1. **Declaration**, the [`ToolDefinition`]: a JSON-Schema-shaped
//!    description of the tool's name, purpose, and parameters. This is what
//!    the model reads when deciding to call the tool, and what the discovery
//!    registry stores.
//!
//! 2. **Route**, the [`ToolRoute`]: the HTTP method and URI template the
//!    orchestrator invokes when the model asks for the tool. The SDK never
//!    runs tool logic in-process; every tool is an HTTP endpoint somewhere.
//!
//! A conversation receives its tools as a [`ToolSet`]: an immutable
//! catalogue, unique by lowercase name, fixed for the life of the
//! conversation. There is deliberately no way to add or remove tools
//! mid-exchange; build a new conversation instead.
//!
//! ## Example
//!
//! ```rust
//! use gemini_agent::{PropertySchema, Tool, ToolDefinition, ToolRoute, ToolSet};
//!
//! let definition = ToolDefinition::builder("trades", "Returns synthetic trades.")
//!     .required_property("from", PropertySchema::string().description("RFC3339 start"))
//!     .required_property("until", PropertySchema::string().description("RFC3339 end"))
//!     .property("instrumentId", PropertySchema::integer())
//!     .build()?;
//!
//! let tool = Tool::new(definition, ToolRoute::get("http://localhost:5250/api/trades"));
//! let tools: ToolSet = vec![tool].into();
//! # Ok::<(), gemini_agent::Error>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// HTTP method a tool route is invoked with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how a tool's implementation is reached
///
/// The URI may contain `{name}` placeholders; on GET they are filled from
/// the call's parameters by the dispatcher. `requires_api_key` marks routes
/// that need the model API key forwarded to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRoute {
    pub method: HttpMethod,
    pub uri: String,
    #[serde(default)]
    pub requires_api_key: bool,
}

impl ToolRoute {
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            requires_api_key: false,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, uri)
    }

    /// Forward the model API key to this route when invoking it
    pub fn with_api_key(mut self) -> Self {
        self.requires_api_key = true;
        self
    }
}

/// One property in a tool's parameter schema
///
/// The `type` field tolerates registries that encode it as a single-element
/// string array (OpenAPI exports do this for nullable schemas) but always
/// writes a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type", deserialize_with = "string_or_first_of_array")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertySchema>>,
}

impl PropertySchema {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: None,
            enum_values: None,
            properties: None,
        }
    }

    pub fn string() -> Self {
        Self::new("string")
    }

    pub fn number() -> Self {
        Self::new("number")
    }

    pub fn integer() -> Self {
        Self::new("integer")
    }

    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    pub fn array() -> Self {
        Self::new("array")
    }

    pub fn object() -> Self {
        Self::new("object")
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Nested properties for an object-typed property
    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (S, PropertySchema)>,
        S: Into<String>,
    {
        self.properties = Some(
            properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        );
        self
    }
}

/// `parameters` object of a tool declaration (`type` is always `"object"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// What the model (and the registry) sees of a tool
///
/// `name` is lowercased at build time and is the tool's identity everywhere:
/// in the catalogue, in function-call events, and in registry paths.
/// `parameters` is omitted entirely for parameterless tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ToolParameters>,
}

impl ToolDefinition {
    /// Start building a definition
    pub fn builder(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> ToolDefinitionBuilder {
        ToolDefinitionBuilder {
            name: name.into(),
            description: description.into(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// Builder for [`ToolDefinition`]
#[derive(Debug, Clone)]
pub struct ToolDefinitionBuilder {
    name: String,
    description: String,
    properties: BTreeMap<String, PropertySchema>,
    required: Vec<String>,
}

impl ToolDefinitionBuilder {
    /// Add an optional parameter
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Add a parameter and mark it required
    pub fn required_property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    pub fn build(self) -> Result<ToolDefinition> {
        if self.name.trim().is_empty() {
            return Err(Error::config("tool name is required"));
        }

        if self.description.trim().is_empty() {
            return Err(Error::config("tool description is required"));
        }

        let parameters = if self.properties.is_empty() {
            None
        } else {
            Some(ToolParameters {
                kind: "object".to_string(),
                properties: self.properties,
                required: self.required,
            })
        };

        Ok(ToolDefinition {
            name: self.name.to_lowercase(),
            description: self.description,
            parameters,
        })
    }
}

/// A registered tool: its declaration plus the route to invoke it at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub definition: ToolDefinition,
    pub route: ToolRoute,
}

impl Tool {
    pub fn new(definition: ToolDefinition, route: ToolRoute) -> Self {
        Self { definition, route }
    }

    /// The tool's identity (lowercased at definition build time)
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// The immutable tool catalogue of one conversation
///
/// Unique by lowercase name; inserting a duplicate replaces the earlier
/// entry in place, the same upsert the registry applies on PUT. First
/// insertion order is preserved for request building.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<Tool>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool, replacing any existing tool of the same name
    pub fn insert(&mut self, tool: Tool) {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Look up a tool by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Tool> {
        let name = name.to_lowercase();
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Flatten the catalogue into the declaration list a request carries
    pub fn declarations(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }
}

impl FromIterator<Tool> for ToolSet {
    fn from_iter<I: IntoIterator<Item = Tool>>(iter: I) -> Self {
        let mut set = ToolSet::new();
        for tool in iter {
            set.insert(tool);
        }
        set
    }
}

impl From<Vec<Tool>> for ToolSet {
    fn from(tools: Vec<Tool>) -> Self {
        tools.into_iter().collect()
    }
}

/// Accept `"string"` or `["string", …]` for a schema `type` field
fn string_or_first_of_array<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TypeField {
        One(String),
        Many(Vec<String>),
    }

    match TypeField::deserialize(deserializer)? {
        TypeField::One(kind) => Ok(kind),
        TypeField::Many(kinds) => kinds
            .into_iter()
            .next()
            .ok_or_else(|| serde::de::Error::custom("expected at least one type in the array")),
    }
}
