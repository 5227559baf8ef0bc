//! Anthropic Messages API adapter.

use serde::Serialize;
use serde_json::Value;

use super::{ProviderAdapter, join_url, text_at, to_json_body};
use crate::{CompletionRequest, HttpRequest, ProviderError, ProviderKind};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    base_url: String,
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self {
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }
}

impl AnthropicAdapter {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn authenticate(request: HttpRequest, api_key: &str) -> HttpRequest {
        request
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }
}

#[derive(Debug, Serialize)]
struct AnthropicApiRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicApiMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn build_request(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<HttpRequest, ProviderError> {
        let body = AnthropicApiRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|message| AnthropicApiMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            max_tokens: request.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        };

        let request = HttpRequest::post(join_url(&self.base_url, "messages"), to_json_body(&body)?);
        Ok(Self::authenticate(request, api_key))
    }

    fn parse_response(&self, body: &Value) -> Result<String, ProviderError> {
        text_at(body, "/content/0/text", "content[0].text")
    }

    fn models_request(&self, api_key: &str) -> HttpRequest {
        Self::authenticate(HttpRequest::get(join_url(&self.base_url, "models")), api_key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::AnthropicAdapter;
    use crate::adapters::ProviderAdapter;
    use crate::{CompletionRequest, HttpMethod, ProviderErrorKind};

    #[test]
    fn build_request_uses_api_key_and_version_headers() {
        let request = AnthropicAdapter::default()
            .build_request(
                "sk-ant-123",
                &CompletionRequest::from_prompt("claude-3-opus-20240229", "hello"),
            )
            .expect("request builds");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(request.header_value("x-api-key"), Some("sk-ant-123"));
        assert_eq!(request.header_value("anthropic-version"), Some("2023-06-01"));
        assert_eq!(request.header_value("authorization"), None);
        assert_eq!(
            request.body,
            Some(json!({
                "model": "claude-3-opus-20240229",
                "messages": [{"role": "user", "content": "hello"}],
                "max_tokens": 4096
            }))
        );
    }

    #[test]
    fn parse_response_reads_first_content_block() {
        let body = json!({"content": [{"type": "text", "text": "hi there"}]});
        assert_eq!(
            AnthropicAdapter::default().parse_response(&body),
            Ok("hi there".to_string())
        );
    }

    #[test]
    fn parse_response_rejects_unexpected_shape() {
        let error = AnthropicAdapter::default()
            .parse_response(&json!({"content": []}))
            .expect_err("empty content should fail");
        assert_eq!(error.kind, ProviderErrorKind::ResponseShape);
    }
}
