//! Integration tests for the Gemini Agent SDK
//!
//! These tests verify that different modules work together correctly.

use gemini_agent::{Conversation, ConversationOptions, Part, Role, Turn};

#[test]
fn test_options_with_tools() {
    use gemini_agent::{PropertySchema, Tool, ToolDefinition, ToolRoute};

    let trades = Tool::new(
        ToolDefinition::builder("Trades", "Returns synthetic trades for an instrument.")
            .required_property(
                "from",
                PropertySchema::string().description("Start of the window, RFC3339."),
            )
            .property(
                "instrumentId",
                PropertySchema::integer().description("Instrument to query."),
            )
            .build()
            .unwrap(),
        ToolRoute::get("http://localhost:5250/api/trades").with_api_key(),
    );

    let options = ConversationOptions::builder()
        .api_key("test-key")
        .system_instruction("You are a trading assistant")
        .tool(trades)
        .build()
        .unwrap();

    assert_eq!(options.tools.len(), 1);
    // Names are lowercased on build and looked up case-insensitively
    assert!(options.tools.get("trades").is_some());
    assert!(options.tools.get("TRADES").is_some());
}

#[test]
fn test_options_require_an_api_key() {
    use gemini_agent::Error;

    let result = ConversationOptions::builder()
        .system_instruction("No key")
        .build();
    match result {
        Err(Error::Config(message)) => assert!(message.contains("API key"), "got: {}", message),
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_options_fall_back_to_defaults() {
    use gemini_agent::{DEFAULT_BASE_URL, DEFAULT_MODEL};

    let options = ConversationOptions::builder()
        .api_key("test-key")
        .build()
        .unwrap();

    assert_eq!(options.model, DEFAULT_MODEL);
    assert_eq!(options.base_url, DEFAULT_BASE_URL);
    assert!(options.tools.is_empty());
}

#[test]
fn test_conversation_creation_with_full_config() {
    let options = ConversationOptions::builder()
        .api_key("test-key")
        .system_instruction("Full test")
        .model("gemini-2.5-pro")
        .base_url("http://localhost:4010/v1beta")
        .build()
        .unwrap();

    let conversation = Conversation::new(options).unwrap();
    assert_eq!(conversation.history().len(), 0);
    assert!(!conversation.is_interrupted());
    assert!(conversation.usage().is_none());
}

#[test]
fn test_turn_construction_flow() {
    use gemini_agent::{StructMap, StructuredValue};

    let user = Turn::user_text("Hello");
    let model = Turn::model_part(Part::text("Hi there!"));

    let mut response = StructMap::new();
    response.insert(
        "now".to_string(),
        StructuredValue::String("2024-01-01T00:00:00Z".to_string()),
    );
    let function_response = Turn::function_response("get_utc_now", response);

    assert!(matches!(user.role, Role::User));
    assert!(matches!(model.role, Role::Model));
    // Function responses travel under the user role
    assert!(matches!(function_response.role, Role::User));
    assert!(!function_response.parts[0].is_function_call());
}

#[test]
fn test_structured_value_integration() {
    use gemini_agent::StructuredValue;
    use serde_json::json;

    // A bare array wraps under "data" on its way into a function response
    let wrapped = StructuredValue::struct_from_json(&json!([1, 2, 3])).unwrap();
    assert_eq!(wrapped.len(), 1);
    match wrapped.get("data") {
        Some(StructuredValue::List(items)) => assert_eq!(items.len(), 3),
        other => panic!("expected a wrapped list, got {:?}", other),
    }

    // A bare scalar has nowhere to go
    assert!(StructuredValue::struct_from_json(&json!(42)).is_err());
}

#[test]
fn test_tool_declarations_json_for_the_model() {
    use gemini_agent::{Tool, ToolDefinition, ToolRoute, ToolSet};

    let clock = Tool::new(
        ToolDefinition::builder("get_utc_now", "Returns the current UTC time.")
            .build()
            .unwrap(),
        ToolRoute::get("http://localhost:5120/api/time/now"),
    );
    let tools: ToolSet = vec![clock].into();

    let json = serde_json::to_value(tools.declarations()).unwrap();
    assert_eq!(json[0]["name"], "get_utc_now");
    assert_eq!(json[0]["description"], "Returns the current UTC time.");
    // Parameterless tools leave the parameters object out entirely
    assert!(json[0].get("parameters").is_none());
}

#[test]
fn test_api_keys_are_masked_in_debug_output() {
    use gemini_agent::ToolDispatcher;

    let options = ConversationOptions::builder()
        .api_key("super-secret")
        .build()
        .unwrap();
    let debug = format!("{:?}", options);
    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("***"));

    let dispatcher = ToolDispatcher::new().unwrap().with_api_key("super-secret");
    let debug = format!("{:?}", dispatcher);
    assert!(!debug.contains("super-secret"));
}

#[test]
fn test_function_call_display_integration() {
    use gemini_agent::FunctionCall;
    use serde_json::json;

    let call = FunctionCall::new("trades", json!({"from": "2024-01-01", "instrumentId": 7}));
    assert_eq!(call.to_string(), "trades(from: 2024-01-01, instrumentId: 7)");

    let bare = FunctionCall::new("get_utc_now", json!(null));
    assert_eq!(bare.to_string(), "get_utc_now()");
}

#[test]
fn test_interrupt_handle_is_shared() {
    let options = ConversationOptions::builder()
        .api_key("test-key")
        .build()
        .unwrap();
    let conversation = Conversation::new(options).unwrap();

    let handle = conversation.interrupt_handle();
    assert!(!conversation.is_interrupted());

    handle.store(true, std::sync::atomic::Ordering::SeqCst);
    assert!(conversation.is_interrupted());
}

#[test]
fn test_prelude_covers_typical_usage() {
    use gemini_agent::prelude::*;

    let options = ConversationOptions::builder()
        .api_key("test-key")
        .build()
        .unwrap();
    let conversation = Conversation::new(options).unwrap();
    assert!(conversation.history().is_empty());
}
