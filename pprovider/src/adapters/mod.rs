//! Provider adapters: one variant per hosted provider behind a single interface.
//!
//! Each adapter only knows its endpoint, authentication header shape, request
//! body shape, and the JSON path holding the response text.

pub mod anthropic;
pub mod chat_completions;
pub mod google;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::{CompletionRequest, HttpRequest, ProviderError, ProviderKind};

pub use anthropic::AnthropicAdapter;
pub use chat_completions::ChatCompletionsAdapter;
pub use google::GoogleAdapter;

pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ProviderKind;

    fn build_request(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<HttpRequest, ProviderError>;

    fn parse_response(&self, body: &Value) -> Result<String, ProviderError>;

    fn models_request(&self, api_key: &str) -> HttpRequest;

    fn parse_models(&self, body: &Value) -> Result<Vec<String>, ProviderError> {
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::response_shape("model listing missing `data`"))?;

        Ok(data
            .iter()
            .filter_map(|entry| entry.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}

/// Reads a string at a JSON pointer, failing with a response-shape error naming `path`.
pub(crate) fn text_at(body: &Value, pointer: &str, path: &str) -> Result<String, ProviderError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::response_shape(format!("response missing `{path}`")))
}

pub(crate) fn to_json_body<T: serde::Serialize>(body: &T) -> Result<Value, ProviderError> {
    serde_json::to_value(body)
        .map_err(|err| ProviderError::invalid_request(format!("failed to encode request: {err}")))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Adapter lookup by provider, pre-populated with every supported provider.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
        };
        registry.register(AnthropicAdapter::default());
        registry.register(ChatCompletionsAdapter::openai());
        registry.register(GoogleAdapter::default());
        registry.register(ChatCompletionsAdapter::mistral());
        registry.register(ChatCompletionsAdapter::openrouter());
        registry
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the adapter registered for the adapter's provider.
    pub fn register<A>(&mut self, adapter: A)
    where
        A: ProviderAdapter + 'static,
    {
        self.adapters.insert(adapter.kind(), Arc::new(adapter));
    }

    pub fn get(&self, provider: ProviderKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
