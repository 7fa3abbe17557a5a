use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the API credential
pub const API_KEY_VAR: &str = "LOAM_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned no choices")]
    EmptyResponse,
}

/// Trait for text generation implementations
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

// =============================================================================
// ApiGenerator - chat-completions client
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint
pub struct ApiGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ApiGenerator {
    pub fn new(endpoint: String, model: String, api_key: String) -> Result<Self, GenerateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            model,
            api_key,
        })
    }
}

impl Generator for ApiGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens: 256,
        };

        let mut last_error = GenerateError::EmptyResponse;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // linear backoff between attempts
                std::thread::sleep(Duration::from_secs(attempt as u64));
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = GenerateError::Http(e);
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                log::warn!("generation endpoint returned {}, retrying", status);
                if let Err(e) = response.error_for_status() {
                    last_error = GenerateError::Http(e);
                }
                continue;
            }

            let parsed: ChatResponse = response.error_for_status()?.json()?;
            return parsed
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or(GenerateError::EmptyResponse);
        }

        Err(last_error)
    }
}

// =============================================================================
// MockGenerator
// =============================================================================

/// Deterministic stand-in used when no API key is configured
pub struct MockGenerator;

impl Generator for MockGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        Ok(format!("Mock response: {}", prompt))
    }
}

// =============================================================================
// Generator factory
// =============================================================================

/// Get a generator for the configured endpoint. Falls back to the mock
/// when no API key is present or the client cannot be built.
pub fn get_generator(endpoint: &str, model: &str) -> Box<dyn Generator> {
    match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.is_empty() => {
            match ApiGenerator::new(endpoint.to_string(), model.to_string(), key) {
                Ok(generator) => Box::new(generator),
                Err(e) => {
                    log::warn!("failed to build api client ({}), using mock generator", e);
                    Box::new(MockGenerator)
                }
            }
        }
        _ => {
            eprintln!(
                "Warning: {} not set. Using mock generator.\n\
                 Set the variable to generate against {}",
                API_KEY_VAR, endpoint
            );
            Box::new(MockGenerator)
        }
    }
}

/// Generate with graceful degradation: any client failure becomes a mock
/// line instead of aborting the caller's cycle
pub fn generate_with_fallback(generator: &dyn Generator, prompt: &str) -> String {
    match generator.generate(prompt) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("generation failed ({}), falling back to mock", e);
            format!("Mock response due to error: {}", prompt)
        }
    }
}
