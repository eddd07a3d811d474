use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::QuizError;
use crate::config::QuizConfig;

/// Anything that turns a prompt into the model's complete raw reply.
pub trait Responder {
    fn respond(&self, prompt: &str) -> Result<String, QuizError>;
}

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at a local Ollama instance.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, QuizError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| QuizError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self, QuizError> {
        Self::new(&config.base_url, &config.model, config.timeout_secs)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama /api/generate. Context travels inside the
/// first question, so no system prompt is sent.
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Window length for runaway-repetition detection.
const REPEAT_WINDOW: usize = 30;
/// More repeats of one window than this and the reply is discarded.
const REPEAT_LIMIT: usize = 3;

impl OllamaClient {
    fn send_error(&self, e: reqwest::Error) -> QuizError {
        if e.is_connect() {
            QuizError::OllamaConnection(self.base_url.clone())
        } else if e.is_timeout() {
            QuizError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            QuizError::HttpClient(e.to_string())
        }
    }
}

impl Responder for OllamaClient {
    fn respond(&self, prompt: &str) -> Result<String, QuizError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuizError::OllamaError {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| QuizError::ResponseParsing(e.to_string()))?;
        finish_reply(&parsed.response)
    }
}

/// Normalize a raw model reply and reject empty or runaway output.
fn finish_reply(raw: &str) -> Result<String, QuizError> {
    let reply = normalize_reply(raw);
    if reply.is_empty() {
        return Err(QuizError::EmptyResponse);
    }
    if let Some((window, count)) = worst_repeat(&reply, REPEAT_WINDOW) {
        if count > REPEAT_LIMIT {
            tracing::warn!(
                count,
                window = %window.replace('\n', "-"),
                "Model reply is repeating itself"
            );
            return Err(QuizError::RepetitiveResponse(count));
        }
    }
    Ok(reply)
}

/// Typographic quotes and dashes become ASCII, line endings become `\n`.
fn normalize_reply(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .chars()
        .filter_map(|c| match c {
            '\u{201C}' | '\u{201D}' => Some('"'),
            '\u{2018}' | '\u{2019}' => Some('\''),
            '\u{2013}' | '\u{2014}' => Some('-'),
            // braille spinner glyphs
            '\u{2800}'..='\u{28FF}' => None,
            other => Some(other),
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Most frequent `len`-character window seen at least twice, ignoring
/// windows with three or fewer distinct characters (whitespace runs, rules).
fn worst_repeat(text: &str, len: usize) -> Option<(&str, usize)> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    if bounds.len() <= len {
        return None;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for pair in bounds.windows(len + 1) {
        *counts.entry(&text[pair[0]..pair[len]]).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(window, count)| {
            *count >= 2 && window.chars().collect::<HashSet<_>>().len() > 3
        })
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
}

/// Mock responder for testing. Replays scripted replies in order, then
/// repeats the fallback (if any).
pub struct MockResponder {
    script: Mutex<VecDeque<String>>,
    fallback: Option<String>,
}

impl MockResponder {
    pub fn new(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response.to_string()),
        }
    }

    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fallback: None,
        }
    }
}

impl Responder for MockResponder {
    fn respond(&self, _prompt: &str) -> Result<String, QuizError> {
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or(QuizError::ScriptExhausted)
    }
}
