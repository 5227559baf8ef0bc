//! Google Generative Language (Gemini) adapter.

use serde::Serialize;
use serde_json::Value;

use super::{ProviderAdapter, join_url, text_at, to_json_body};
use crate::{CompletionRequest, HttpRequest, ProviderError, ProviderKind, Role};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    base_url: String,
}

impl Default for GoogleAdapter {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_BASE_URL.to_string(),
        }
    }
}

impl GoogleAdapter {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    model: &'a str,
    contents: Vec<GoogleContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GoogleContent<'a> {
    role: &'static str,
    parts: Vec<GooglePart<'a>>,
}

#[derive(Debug, Serialize)]
struct GooglePart<'a> {
    text: &'a str,
}

impl ProviderAdapter for GoogleAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn build_request(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<HttpRequest, ProviderError> {
        let body = GenerateContentRequest {
            model: &request.model,
            contents: request
                .messages
                .iter()
                .map(|message| GoogleContent {
                    role: match message.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    },
                    parts: vec![GooglePart {
                        text: &message.content,
                    }],
                })
                .collect(),
        };

        let url = join_url(
            &self.base_url,
            &format!("models/{}:generateContent", request.model),
        );
        Ok(HttpRequest::post(url, to_json_body(&body)?).bearer(api_key))
    }

    fn parse_response(&self, body: &Value) -> Result<String, ProviderError> {
        text_at(
            body,
            "/candidates/0/content/parts/0/text",
            "candidates[0].content.parts[0].text",
        )
    }

    fn models_request(&self, api_key: &str) -> HttpRequest {
        HttpRequest::get(join_url(&self.base_url, "models")).bearer(api_key)
    }

    fn parse_models(&self, body: &Value) -> Result<Vec<String>, ProviderError> {
        let models = body
            .get("models")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::response_shape("model listing missing `models`"))?;

        Ok(models
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .map(|name| name.trim_start_matches("models/").to_string())
            .collect())
    }
}
