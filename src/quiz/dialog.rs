use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{QuizError, Responder};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Split a raw reply into (reasoning, response).
///
/// Everything before the last `</think>` is reasoning, with `<think>` tags
/// removed; the rest is the response. Both are trimmed.
pub fn split_think(raw: &str) -> (String, String) {
    match raw.rsplit_once(THINK_CLOSE) {
        Some((before, after)) => {
            let think = before.replace(THINK_CLOSE, "").replace(THINK_OPEN, "");
            (think.trim().to_string(), after.trim().to_string())
        }
        None => (String::new(), raw.trim().to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Llm,
}

/// One side of one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub raw: String,
    pub content: String,
    pub think: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// A conversation with the model. Live dialogs record every prompt → raw
/// reply pair; a dialog built from a recorded cache replays it instead of
/// asking the model.
pub struct Dialog<'a, R: Responder + ?Sized> {
    responder: &'a R,
    cache: HashMap<String, String>,
    replay: bool,
    history: Vec<Turn>,
}

impl<'a, R: Responder + ?Sized> Dialog<'a, R> {
    pub fn new(responder: &'a R) -> Self {
        Self {
            responder,
            cache: HashMap::new(),
            replay: false,
            history: Vec::new(),
        }
    }

    /// Replay `cache`; the responder is never called.
    pub fn with_cache(responder: &'a R, cache: HashMap<String, String>) -> Self {
        Self {
            responder,
            cache,
            replay: true,
            history: Vec::new(),
        }
    }

    pub fn is_replay(&self) -> bool {
        self.replay
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn cache(&self) -> &HashMap<String, String> {
        &self.cache
    }

    pub fn into_parts(self) -> (Vec<Turn>, HashMap<String, String>) {
        (self.history, self.cache)
    }

    /// Ask `prompt` and return the model's turn.
    pub fn query(&mut self, prompt: &str) -> Result<&Turn, QuizError> {
        let started_at = Utc::now();
        self.history.push(Turn {
            role: Role::User,
            raw: prompt.to_string(),
            content: prompt.to_string(),
            think: String::new(),
            started_at,
            elapsed_ms: 0,
        });

        let timer = Instant::now();
        let raw = if self.replay {
            tracing::debug!("Dialog: replaying recorded reply");
            self.cache
                .get(prompt)
                .cloned()
                .ok_or(QuizError::NotRecorded)?
        } else {
            let raw = self.responder.respond(prompt)?;
            self.cache.insert(prompt.to_string(), raw.clone());
            raw
        };

        let (think, content) = split_think(&raw);
        self.history.push(Turn {
            role: Role::Llm,
            raw,
            content,
            think,
            started_at,
            elapsed_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
        });
        Ok(&self.history[self.history.len() - 1])
    }
}
