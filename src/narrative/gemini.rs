//! Google Gemini `generateContent` backend.

use std::thread;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{NarrativeError, TextGenerator};
use crate::config::NarrativeConfig;

/// Longest error body carried into a [`NarrativeError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Extract the first candidate's text (all parts concatenated).
pub(crate) fn parse_response(body: &str) -> Result<String, NarrativeError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| NarrativeError::Malformed(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(NarrativeError::Empty);
    }
    Ok(text)
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}

/// Blocking client with an explicit timeout and bounded retry.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    url: String,
    config: NarrativeConfig,
}

impl GeminiClient {
    pub fn new(config: NarrativeConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_http(config, http))
    }

    fn with_http(config: NarrativeConfig, http: reqwest::blocking::Client) -> Self {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        GeminiClient { http, url, config }
    }

    fn attempt(&self, prompt: &str) -> Result<String, NarrativeError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }
        parse_response(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> NarrativeError {
        if err.is_timeout() {
            NarrativeError::Timeout(self.config.timeout)
        } else {
            // Strip the URL so nothing request-specific leaks into the UI.
            NarrativeError::Transport(err.without_url().to_string())
        }
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let mut attempt = 0;
        loop {
            match self.attempt(prompt) {
                Err(err) if err.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    let delay = self.config.backoff * attempt;
                    log::warn!(
                        "narrative request failed ({err}); retry {attempt}/{} in {delay:?}",
                        self.config.retries
                    );
                    thread::sleep(delay);
                }
                Err(err) => {
                    log::error!("narrative request failed: {err}");
                    return Err(err);
                }
                Ok(text) => return Ok(text),
            }
        }
    }
}
