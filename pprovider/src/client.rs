//! Provider-agnostic request dispatch over the HTTP transport seam.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::{
    AdapterRegistry, CompletionRequest, Credential, HttpRequest, HttpResponse, HttpTransport,
    NoopOperationHooks, ProviderError, ProviderOperationHooks, ReqwestTransport,
};

const OPERATION_COMPLETE: &str = "complete";
const OPERATION_LIST_MODELS: &str = "list_models";

/// Sends prompts to whichever provider a credential belongs to.
///
/// One attempt per call. Non-2xx responses become [`crate::ProviderErrorKind::Status`]
/// errors carrying the HTTP status and raw body; retries are left to callers.
#[derive(Clone)]
pub struct ProviderClient {
    transport: Arc<dyn HttpTransport>,
    adapters: AdapterRegistry,
    hooks: Arc<dyn ProviderOperationHooks>,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("transport", &self.transport)
            .field("adapters", &self.adapters.len())
            .finish()
    }
}

impl ProviderClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            adapters: AdapterRegistry::default(),
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    /// Client backed by reqwest with the given per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self::new(Arc::new(ReqwestTransport::with_timeout(timeout)?)))
    }

    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub async fn send(
        &self,
        credential: &Credential,
        model: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        self.complete(credential, CompletionRequest::from_prompt(model, prompt))
            .await
    }

    /// Validates the request, issues exactly one HTTP call, and extracts the response text.
    pub async fn complete(
        &self,
        credential: &Credential,
        request: CompletionRequest,
    ) -> Result<String, ProviderError> {
        request.validate()?;

        let provider = credential.provider;
        let adapter = self.adapters.get(provider).ok_or_else(|| {
            ProviderError::invalid_request(format!("no adapter registered for {provider}"))
        })?;

        let started = Instant::now();
        self.hooks.on_request_start(provider, OPERATION_COMPLETE);
        tracing::debug!(
            phase = "provider",
            event = "request_start",
            provider = %provider,
            model = %request.model,
            messages = request.messages.len()
        );

        let result = async {
            let http_request = adapter.build_request(credential.api_key(), &request)?;
            let body = self.execute_json(http_request).await?;
            adapter.parse_response(&body)
        }
        .await;

        self.report(provider, OPERATION_COMPLETE, started, &result);
        result
    }

    /// Lists the model identifiers the provider reports for this credential.
    pub async fn list_models(&self, credential: &Credential) -> Result<Vec<String>, ProviderError> {
        let provider = credential.provider;
        let adapter = self.adapters.get(provider).ok_or_else(|| {
            ProviderError::invalid_request(format!("no adapter registered for {provider}"))
        })?;

        let started = Instant::now();
        self.hooks.on_request_start(provider, OPERATION_LIST_MODELS);

        let result = async {
            let body = self
                .execute_json(adapter.models_request(credential.api_key()))
                .await?;
            adapter.parse_models(&body)
        }
        .await;

        self.report(provider, OPERATION_LIST_MODELS, started, &result);
        result
    }

    async fn execute_json(&self, request: HttpRequest) -> Result<Value, ProviderError> {
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(status_error(response));
        }

        serde_json::from_str(&response.body).map_err(|err| {
            ProviderError::response_shape(format!("response body is not valid JSON: {err}"))
        })
    }

    fn report<T>(
        &self,
        provider: crate::ProviderKind,
        operation: &str,
        started: Instant,
        result: &Result<T, ProviderError>,
    ) {
        let elapsed = started.elapsed();
        match result {
            Ok(_) => {
                self.hooks.on_success(provider, operation, elapsed);
                tracing::debug!(
                    phase = "provider",
                    event = "request_success",
                    provider = %provider,
                    operation,
                    elapsed_ms = elapsed.as_millis() as u64
                );
            }
            Err(error) => {
                self.hooks.on_failure(provider, operation, elapsed, error);
                tracing::warn!(
                    phase = "provider",
                    event = "request_failure",
                    provider = %provider,
                    operation,
                    kind = ?error.kind,
                    status = error.status,
                    error = %error.message
                );
            }
        }
    }
}

fn status_error(response: HttpResponse) -> ProviderError {
    let message = extract_error_message(&response.body)
        .unwrap_or_else(|| format!("request failed with status {}", response.status));
    ProviderError::status(response.status, response.body, message)
}

/// Pulls a human-readable message out of `{"error":{"message":..}}` or `{"error":".."}` bodies.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let error = parsed.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}
