//! Settings for the completion endpoint, read from the process environment.

use std::env;
use std::fmt;

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "AIML_API_KEY";
/// Environment variable overriding the endpoint base URL.
pub const BASE_URL_ENV: &str = "AIML_BASE_URL";
/// Environment variable overriding the model identifier.
pub const MODEL_ENV: &str = "AIML_MODEL";
/// Environment variable overriding the output token bound.
pub const MAX_TOKENS_ENV: &str = "AIML_MAX_TOKENS";

/// Base URL of the hosted OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.aimlapi.com/";
/// Model answering the questions.
pub const DEFAULT_MODEL: &str = "o1-mini";
/// Upper bound on the size of a single answer.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Connection settings for [`crate::completion::CompletionClient`].
///
/// A missing credential is not an error here; the endpoint rejects the request.
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Bearer credential, if one was configured.
    pub api_key: Option<String>,
    /// Base URL the chat-completions path is appended to.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum number of tokens the model may generate.
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl CompletionConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset and an unparsable token bound falls back to
    /// [`DEFAULT_MAX_TOKENS`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: value(API_KEY_ENV),
            base_url: value(BASE_URL_ENV).unwrap_or(defaults.base_url),
            model: value(MODEL_ENV).unwrap_or(defaults.model),
            max_tokens: value(MAX_TOKENS_ENV)
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }

    /// Sets the credential and returns the updated configuration.
    pub fn with_api_key(mut self, api_key: impl Into<Option<String>>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the base URL and returns the updated configuration.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the model identifier and returns the updated configuration.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the token bound and returns the updated configuration.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Full URL of the chat-completions resource.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
