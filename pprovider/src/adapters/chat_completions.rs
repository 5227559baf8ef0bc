//! OpenAI-compatible chat completions adapter shared by OpenAI, Mistral, and OpenRouter.

use serde::Serialize;
use serde_json::Value;

use super::{ProviderAdapter, join_url, text_at, to_json_body};
use crate::{CompletionRequest, HttpRequest, ProviderError, ProviderKind};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const DEFAULT_ATTRIBUTION_REFERER: &str = "https://github.com/parlance-workbench/parlance";
pub const DEFAULT_ATTRIBUTION_TITLE: &str = "Parlance";

#[derive(Debug, Clone)]
pub struct ChatCompletionsAdapter {
    kind: ProviderKind,
    base_url: String,
    extra_headers: Vec<(String, String)>,
}

impl ChatCompletionsAdapter {
    pub fn openai() -> Self {
        Self::new(ProviderKind::OpenAi, OPENAI_BASE_URL)
    }

    pub fn mistral() -> Self {
        Self::new(ProviderKind::Mistral, MISTRAL_BASE_URL)
    }

    pub fn openrouter() -> Self {
        Self::new(ProviderKind::OpenRouter, OPENROUTER_BASE_URL)
            .with_attribution(DEFAULT_ATTRIBUTION_REFERER, DEFAULT_ATTRIBUTION_TITLE)
    }

    fn new(kind: ProviderKind, base_url: &str) -> Self {
        Self {
            kind,
            base_url: base_url.to_string(),
            extra_headers: Vec::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the `HTTP-Referer` and `X-Title` headers OpenRouter uses for app attribution.
    pub fn with_attribution(
        mut self,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        self.extra_headers
            .retain(|(name, _)| name != "HTTP-Referer" && name != "X-Title");
        self.extra_headers
            .push(("HTTP-Referer".to_string(), referer.into()));
        self.extra_headers.push(("X-Title".to_string(), title.into()));
        self
    }

    fn authenticate(&self, request: HttpRequest, api_key: &str) -> HttpRequest {
        self.extra_headers
            .iter()
            .fold(request.bearer(api_key), |request, (name, value)| {
                request.header(name.clone(), value.clone())
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsApiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionsApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl ProviderAdapter for ChatCompletionsAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn build_request(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<HttpRequest, ProviderError> {
        let body = ChatCompletionsApiRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|message| ChatCompletionsApiMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
        };

        let request = HttpRequest::post(
            join_url(&self.base_url, "chat/completions"),
            to_json_body(&body)?,
        );
        Ok(self.authenticate(request, api_key))
    }

    fn parse_response(&self, body: &Value) -> Result<String, ProviderError> {
        text_at(
            body,
            "/choices/0/message/content",
            "choices[0].message.content",
        )
    }

    fn models_request(&self, api_key: &str) -> HttpRequest {
        self.authenticate(HttpRequest::get(join_url(&self.base_url, "models")), api_key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ChatCompletionsAdapter;
    use crate::adapters::ProviderAdapter;
    use crate::{CompletionRequest, HttpMethod, ProviderErrorKind, ProviderKind};

    fn build(adapter: &ChatCompletionsAdapter, model: &str) -> crate::HttpRequest {
        adapter
            .build_request("key-1", &CompletionRequest::from_prompt(model, "hello"))
            .expect("request builds")
    }

    #[test]
    fn each_variant_targets_its_endpoint_with_bearer_auth() {
        let cases = [
            (
                ChatCompletionsAdapter::openai(),
                ProviderKind::OpenAi,
                "https://api.openai.com/v1/chat/completions",
            ),
            (
                ChatCompletionsAdapter::mistral(),
                ProviderKind::Mistral,
                "https://api.mistral.ai/v1/chat/completions",
            ),
            (
                ChatCompletionsAdapter::openrouter(),
                ProviderKind::OpenRouter,
                "https://openrouter.ai/api/v1/chat/completions",
            ),
        ];

        for (adapter, kind, url) in cases {
            let request = build(&adapter, "some-model");
            assert_eq!(adapter.kind(), kind);
            assert_eq!(request.method, HttpMethod::Post);
            assert_eq!(request.url, url);
            assert_eq!(request.header_value("Authorization"), Some("Bearer key-1"));
            assert_eq!(
                request.body,
                Some(json!({
                    "model": "some-model",
                    "messages": [{"role": "user", "content": "hello"}]
                }))
            );
        }
    }

    #[test]
    fn openrouter_sends_attribution_headers() {
        let adapter =
            ChatCompletionsAdapter::openrouter().with_attribution("https://example.test", "Test");
        let request = build(&adapter, "openrouter/auto");

        assert_eq!(request.header_value("HTTP-Referer"), Some("https://example.test"));
        assert_eq!(request.header_value("X-Title"), Some("Test"));
        assert_eq!(
            request
                .headers
                .iter()
                .filter(|(name, _)| name == "X-Title")
                .count(),
            1
        );

        let openai = build(&ChatCompletionsAdapter::openai(), "gpt-4");
        assert_eq!(openai.header_value("X-Title"), None);
    }

    #[test]
    fn parse_response_reads_first_choice() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "pong"}}]});
        assert_eq!(
            ChatCompletionsAdapter::mistral().parse_response(&body),
            Ok("pong".to_string())
        );

        let error = ChatCompletionsAdapter::openai()
            .parse_response(&json!({"choices": [{"message": {}}]}))
            .expect_err("missing content should fail");
        assert_eq!(error.kind, ProviderErrorKind::ResponseShape);
        assert!(error.message.contains("choices[0].message.content"));
    }

    #[test]
    fn models_request_is_a_get_against_models() {
        let request = ChatCompletionsAdapter::openai().models_request("key-1");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://api.openai.com/v1/models");
        assert_eq!(request.body, None);

        let listed = ChatCompletionsAdapter::openai()
            .parse_models(&json!({"data": [{"id": "gpt-4"}, {"id": "gpt-3.5-turbo"}]}))
            .expect("listing parses");
        assert_eq!(listed, vec!["gpt-4", "gpt-3.5-turbo"]);
    }
}
