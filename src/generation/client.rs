use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::GenerationConfig;
use crate::error::Result;

/// Per-call settings for a text generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: config.timeout_duration(),
        }
    }
}

/// Text generation collaborator: one prompt in, at most one answer out.
///
/// `Ok(None)` means the service answered without content. Retries, if any,
/// happen inside the implementation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Option<String>>;
}

#[cfg(feature = "openai-client")]
pub use openai::OpenAiChatClient;

#[cfg(feature = "openai-client")]
mod openai {
    use super::*;
    use crate::error::SynthBundleError;
    use serde_json::{Value, json};
    use url::Url;

    const BASE_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 8_000;

    /// Chat-completions client for an Azure OpenAI deployment.
    #[derive(Debug, Clone)]
    pub struct OpenAiChatClient {
        http: reqwest::Client,
        api_base: Url,
        api_key: String,
        api_version: String,
        max_retries: u32,
    }

    impl OpenAiChatClient {
        pub fn new(
            api_base: &str,
            api_key: impl Into<String>,
            api_version: impl Into<String>,
        ) -> Result<Self> {
            let mut api_base = Url::parse(api_base)?;
            if !api_base.path().ends_with('/') {
                let path = format!("{}/", api_base.path());
                api_base.set_path(&path);
            }
            Ok(Self {
                http: reqwest::Client::new(),
                api_base,
                api_key: api_key.into(),
                api_version: api_version.into(),
                max_retries: 5,
            })
        }

        /// Build a client from configuration; endpoint and key are required
        pub fn from_config(config: &GenerationConfig) -> Result<Self> {
            let api_base = config.api_base.as_deref().ok_or_else(|| {
                SynthBundleError::config("Generation endpoint (AZURE_OPENAI_API_BASE) is not set")
            })?;
            let api_key = config.api_key.clone().ok_or_else(|| {
                SynthBundleError::config("Generation API key (AZURE_OPENAI_KEY) is not set")
            })?;
            Ok(Self::new(api_base, api_key, config.api_version.clone())?
                .with_max_retries(config.max_retries))
        }

        pub fn with_max_retries(mut self, max_retries: u32) -> Self {
            self.max_retries = max_retries;
            self
        }

        fn endpoint(&self, model: &str) -> Result<Url> {
            let mut url = self
                .api_base
                .join(&format!("openai/deployments/{model}/chat/completions"))?;
            url.query_pairs_mut()
                .append_pair("api-version", &self.api_version);
            Ok(url)
        }

        async fn send_once(
            &self,
            url: &Url,
            body: &Value,
            timeout: Duration,
        ) -> std::result::Result<Value, Attempt> {
            let response = self
                .http
                .post(url.clone())
                .header("api-key", &self.api_key)
                .timeout(timeout)
                .json(body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() || e.is_connect() || e.is_request() {
                        Attempt::Retry(e.to_string())
                    } else {
                        Attempt::Fail(e.to_string())
                    }
                })?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| Attempt::Fail(format!("Invalid completion response: {e}")));
            }
            let detail = response.text().await.unwrap_or_default();
            let message = format!("Completion request failed with {status}: {detail}");
            if status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error() {
                Err(Attempt::Retry(message))
            } else {
                Err(Attempt::Fail(message))
            }
        }
    }

    enum Attempt {
        Retry(String),
        Fail(String),
    }

    #[async_trait]
    impl TextGenerator for OpenAiChatClient {
        async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Option<String>> {
            let url = self.endpoint(&params.model)?;
            let body = json!({
                "messages": [{"role": "user", "content": prompt}],
                "temperature": params.temperature,
                "max_tokens": params.max_tokens,
            });

            tracing::info!("GPT endpoint call initiating with engine {}", params.model);
            let mut attempt = 0;
            let completion = loop {
                match self.send_once(&url, &body, params.timeout).await {
                    Ok(completion) => break completion,
                    Err(Attempt::Retry(e)) if attempt < self.max_retries => {
                        let backoff = BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt));
                        let delay = Duration::from_millis(backoff.min(MAX_DELAY_MS));
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            "Completion request failed, retrying in {delay:?}: {e}"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(Attempt::Retry(e)) | Err(Attempt::Fail(e)) => {
                        tracing::error!("An error occurred while calling GPT endpoint: {e}");
                        return Err(SynthBundleError::generation(e));
                    }
                }
            };
            tracing::info!("GPT endpoint call successful with engine {}", params.model);

            let content = completion
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            if content.is_none() {
                tracing::error!("No content found in GPT response");
            }
            Ok(content)
        }
    }

}
