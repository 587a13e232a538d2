//! Blocking client for OpenAI-compatible chat-completion endpoints.
//!
//! One prompt goes out as a single user message; the text of the first choice
//! comes back.  There is no streaming and no retry: a failed request is
//! reported to the caller as a [`RequestError`] and the action ends there.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;

/// Anything able to turn a prompt into generated text.
#[cfg_attr(test, mockall::automock)]
pub trait Completer {
    /// Sends `prompt` and returns the generated answer.
    fn complete(&self, prompt: &str) -> Result<String, RequestError>;
}

/// Failures while contacting the endpoint or reading its answer.
#[derive(Debug)]
pub enum RequestError {
    /// The request could not be sent or the response body could not be read.
    Transport(reqwest::Error),
    /// The endpoint answered with a non-success status.
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the endpoint, or the raw body.
        message: String,
    },
    /// The response body was not the expected JSON document.
    Decode(serde_json::Error),
    /// The response carried no choice or no message content.
    EmptyResponse,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "Request failed: {err}"),
            Self::Api { status, message } => {
                write!(f, "Endpoint returned HTTP {status}: {message}")
            }
            Self::Decode(err) => write!(f, "Malformed completion response: {err}"),
            Self::EmptyResponse => write!(f, "Completion response contained no text"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Api { .. } | Self::EmptyResponse => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn build_request<'a>(config: &'a CompletionConfig, prompt: &'a str) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model: &config.model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens: config.max_tokens,
    }
}

/// Extracts the first choice's text from a chat-completion response body.
fn parse_completion(body: &str) -> Result<String, RequestError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(RequestError::EmptyResponse)
}

/// Picks the most useful message out of an error response body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// [`Completer`] backed by a remote chat-completions endpoint.
#[derive(Debug)]
pub struct CompletionClient {
    http: reqwest::blocking::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Creates a client for the given endpoint configuration.
    pub fn new(config: CompletionConfig) -> Result<Self, RequestError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("learning-assistant/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// Returns the configuration the client sends requests with.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

impl Completer for CompletionClient {
    fn complete(&self, prompt: &str) -> Result<String, RequestError> {
        let endpoint = self.config.endpoint();
        info!(
            "Requesting completion from {} (model {})",
            endpoint, self.config.model
        );
        debug!("Prompt length: {} bytes", prompt.len());

        let mut request = self
            .http
            .post(&endpoint)
            .json(&build_request(&self.config, prompt));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let err = RequestError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            };
            warn!("Completion request failed: {}", err);
            return Err(err);
        }

        let text = parse_completion(&body)?;
        debug!("Received {} bytes of completion text", text.len());
        Ok(text)
    }
}
