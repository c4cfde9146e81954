//! HTTP dispatch of tool calls requested by the model
//!
//! The model only ever names a tool and hands over an argument object; it is
//! the orchestrating caller, not the conversation engine, that runs the tool
//! and feeds the result back with
//! [`reply_with_function_result`](crate::Conversation::reply_with_function_result).
//! [`ToolDispatcher`] does the running: it maps a tool's declared route onto
//! a plain HTTP call and returns the raw JSON result.
//!
//! GET routes flatten the argument object into the URI: a `{name}`
//! placeholder in the route is substituted from the matching argument, and
//! every remaining argument becomes a query-string pair. POST and PUT routes
//! send the argument object verbatim as a JSON body.

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::tools::{HttpMethod, Tool};

/// Executes tool calls against their advertised HTTP routes.
///
/// The dispatcher is stateless apart from its connection pool and an
/// optional API key, attached as `X-Goog-Api-Key` to routes that declare
/// they need one (tools that call the model themselves, such as a charting
/// service).
pub struct ToolDispatcher {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ToolDispatcher {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|err| Error::config(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self {
            http_client,
            api_key: None,
        })
    }

    /// Key forwarded to routes flagged with `requiresApiKey`
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Invoke `tool` with the given argument object and return the raw JSON
    /// result.
    ///
    /// A non-success status, an unreachable endpoint, and a malformed JSON
    /// body are all [`Error::ToolExecution`]; an empty body is an empty
    /// object, not an error.
    pub async fn dispatch(&self, tool: &Tool, params: &Value) -> Result<Value> {
        let builder = match tool.route.method {
            HttpMethod::Get => {
                let uri = build_get_uri(&tool.route.uri, params)?;
                log::debug!("dispatching {} via GET {}", tool.name(), uri);
                self.http_client.get(uri)
            }
            HttpMethod::Post => {
                log::debug!("dispatching {} via POST {}", tool.name(), tool.route.uri);
                self.http_client.post(&tool.route.uri).json(params)
            }
            HttpMethod::Put => {
                log::debug!("dispatching {} via PUT {}", tool.name(), tool.route.uri);
                self.http_client.put(&tool.route.uri).json(params)
            }
        };

        let mut builder = builder.header("Accept", "application/json");
        if tool.route.requires_api_key {
            let key = self.api_key.as_deref().ok_or_else(|| {
                Error::config(format!(
                    "tool {} requires an API key but the dispatcher has none",
                    tool.name()
                ))
            })?;
            builder = builder.header("X-Goog-Api-Key", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| Error::tool_execution(format!("tool {} call failed: {}", tool.name(), err)))?;

        read_result(tool.name(), response).await
    }
}

/// Substitute route placeholders and append the rest as a query string
fn build_get_uri(template: &str, params: &Value) -> Result<String> {
    let mut uri = template.to_string();
    let mut query = Vec::new();

    for (key, value) in flatten_parameters(params)? {
        let placeholder = format!("{{{}}}", key);
        if uri.contains(&placeholder) {
            uri = uri.replace(&placeholder, &value);
        } else {
            query.push(format!("{}={}", key, value));
        }
    }

    if !query.is_empty() {
        uri = format!("{}?{}", uri, query.join("&"));
    }

    Ok(uri)
}

/// Render each top-level argument as a query-string value, in key order
fn flatten_parameters(params: &Value) -> Result<Vec<(String, String)>> {
    match params {
        // The model sends no arguments at all for parameterless tools
        Value::Null => Ok(Vec::new()),
        Value::Object(entries) => entries
            .iter()
            .map(|(key, value)| render_value(key, value).map(|rendered| (key.clone(), rendered)))
            .collect(),
        other => Err(Error::unsupported_parameter(format!(
            "GET tools expect an object-shaped argument set, received {}",
            json_kind(other)
        ))),
    }
}

fn render_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::Array(items) => {
            let rendered: Result<Vec<String>> =
                items.iter().map(|item| render_scalar(key, item)).collect();
            Ok(rendered?.join(","))
        }
        other => render_scalar(key, other),
    }
}

fn render_scalar(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(true) => Ok("true".to_string()),
        Value::Bool(false) => Ok("false".to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Object(_) | Value::Array(_) => Err(Error::unsupported_parameter(format!(
            "GET tools do not support {} values (parameter {})",
            json_kind(value),
            key
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map the response to a JSON result; empty body means empty object
async fn read_result(tool_name: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.map_err(|err| {
        Error::tool_execution(format!("tool {} response could not be read: {}", tool_name, err))
    })?;

    if !status.is_success() {
        return Err(Error::tool_execution(format!(
            "tool {} returned status {}: {}",
            tool_name,
            status.as_u16(),
            body
        )));
    }

    if body.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_str(&body).map_err(|err| {
        Error::tool_execution(format!("tool {} returned malformed JSON: {}", tool_name, err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_uri_flattens_parameters() {
        let uri = build_get_uri(
            "http://localhost:5250/api/trades",
            &json!({"instrumentId": 7, "from": "2024-01-01"}),
        )
        .unwrap();

        assert_eq!(
            uri,
            "http://localhost:5250/api/trades?from=2024-01-01&instrumentId=7"
        );
    }

    #[test]
    fn test_get_uri_substitutes_placeholders() {
        let uri = build_get_uri(
            "http://localhost:5250/api/instruments/{instrumentId}/candles",
            &json!({"instrumentId": 7, "interval": "1d"}),
        )
        .unwrap();

        // The placeholder value must not reappear in the query string
        assert_eq!(
            uri,
            "http://localhost:5250/api/instruments/7/candles?interval=1d"
        );
    }

    #[test]
    fn test_get_uri_comma_joins_arrays() {
        let uri = build_get_uri(
            "http://localhost:5250/api/trades",
            &json!({"instrumentIds": [1, 2, 3]}),
        )
        .unwrap();

        assert_eq!(uri, "http://localhost:5250/api/trades?instrumentIds=1,2,3");
    }

    #[test]
    fn test_get_uri_renders_literal_tokens() {
        let uri = build_get_uri(
            "http://localhost:5250/api/trades",
            &json!({"ascending": true, "archived": false, "cursor": null}),
        )
        .unwrap();

        assert_eq!(
            uri,
            "http://localhost:5250/api/trades?archived=false&ascending=true&cursor=null"
        );
    }

    #[test]
    fn test_get_uri_without_parameters() {
        let uri = build_get_uri("http://localhost:5050/api/now", &json!(null)).unwrap();
        assert_eq!(uri, "http://localhost:5050/api/now");

        let uri = build_get_uri("http://localhost:5050/api/now", &json!({})).unwrap();
        assert_eq!(uri, "http://localhost:5050/api/now");
    }

    #[test]
    fn test_object_parameter_is_unsupported() {
        let result = build_get_uri(
            "http://localhost:5250/api/trades",
            &json!({"filter": {"instrumentId": 7}}),
        );

        match result {
            Err(Error::UnsupportedParameter(message)) => {
                assert!(message.contains("do not support"), "got: {}", message);
                assert!(message.contains("filter"), "got: {}", message);
            }
            other => panic!("expected an unsupported-parameter error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_array_parameter_is_unsupported() {
        let result = build_get_uri(
            "http://localhost:5250/api/trades",
            &json!({"pairs": [[1, 2], [3, 4]]}),
        );

        assert!(matches!(result, Err(Error::UnsupportedParameter(_))));
    }

    #[test]
    fn test_non_object_parameter_set_is_unsupported() {
        let result = build_get_uri("http://localhost:5250/api/trades", &json!([1, 2, 3]));
        assert!(matches!(result, Err(Error::UnsupportedParameter(_))));

        let result = build_get_uri("http://localhost:5250/api/trades", &json!("bare"));
        assert!(matches!(result, Err(Error::UnsupportedParameter(_))));
    }

    #[test]
    fn test_dispatcher_debug_masks_api_key() {
        let dispatcher = ToolDispatcher::new()
            .expect("should build dispatcher")
            .with_api_key("super-secret");

        let debug = format!("{:?}", dispatcher);
        assert!(!debug.contains("super-secret"));
    }
}
