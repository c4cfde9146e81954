//! Configuration helpers for the Gemini agent SDK

use std::env;

use crate::types::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Default URL of the tool registry when none is configured
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:5050";

/// Get the Gemini API key from environment variable or fallback
///
/// Priority:
/// 1. GEMINI_API_KEY environment variable
/// 2. fallback parameter
///
/// Returns `None` when neither is set; there is no usable default for a
/// credential.
///
/// # Examples
///
/// ```rust,no_run
/// use gemini_agent::get_api_key;
///
/// // Read from environment
/// let key = get_api_key(None);
///
/// // With fallback
/// let key = get_api_key(Some("test-key"));
/// ```
pub fn get_api_key(fallback: Option<&str>) -> Option<String> {
    // Try environment variable first
    if let Ok(key) = env::var("GEMINI_API_KEY") {
        return Some(key);
    }

    // Use fallback
    fallback.map(|s| s.to_string())
}

/// Get the Gemini base URL from environment variable or fallback
///
/// Priority:
/// 1. GEMINI_BASE_URL environment variable
/// 2. fallback parameter
/// 3. the public `generativelanguage` endpoint
///
/// # Examples
///
/// ```rust,no_run
/// use gemini_agent::get_base_url;
///
/// // Read from environment
/// let url = get_base_url(None);
///
/// // With fallback
/// let url = get_base_url(Some("http://localhost:4010/v1beta"));
/// ```
pub fn get_base_url(fallback: Option<&str>) -> String {
    // Try environment variable first
    if let Ok(url) = env::var("GEMINI_BASE_URL") {
        return url;
    }

    // Use fallback or the public endpoint
    fallback.unwrap_or(DEFAULT_BASE_URL).to_string()
}

/// Get the model name from environment variable or fallback
///
/// Priority:
/// 1. GEMINI_MODEL environment variable
/// 2. fallback parameter
/// 3. the SDK's default model
///
/// # Examples
///
/// ```rust,no_run
/// use gemini_agent::get_model;
///
/// // Read from environment
/// let model = get_model(None);
///
/// // With fallback
/// let model = get_model(Some("gemini-2.5-pro"));
/// ```
pub fn get_model(fallback: Option<&str>) -> String {
    // Try environment variable first
    if let Ok(model) = env::var("GEMINI_MODEL") {
        return model;
    }

    // Use fallback or the default model
    fallback.unwrap_or(DEFAULT_MODEL).to_string()
}

/// Get the tool registry URL from environment variable or fallback
///
/// Priority:
/// 1. TOOL_REGISTRY_URL environment variable
/// 2. fallback parameter
/// 3. `http://localhost:5050`
///
/// # Examples
///
/// ```rust,no_run
/// use gemini_agent::get_registry_url;
///
/// // Read from environment
/// let url = get_registry_url(None);
///
/// // With fallback
/// let url = get_registry_url(Some("http://localhost:6000"));
/// ```
pub fn get_registry_url(fallback: Option<&str>) -> String {
    // Try environment variable first
    if let Ok(url) = env::var("TOOL_REGISTRY_URL") {
        return url;
    }

    // Use fallback or the local default
    fallback.unwrap_or(DEFAULT_REGISTRY_URL).to_string()
}
