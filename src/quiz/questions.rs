//! Survey question files.
//!
//! Questions are separated by a `---` line. Within a block:
//! ```text
//! N: role                 name
//! A: line                 answer mode (no options only)
//! A1: Top                 option; `M` instead of `A` makes the question multi-choice
//! M2: Bottom
//! Which role fits you?    anything else is prompt text
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::QuizError;
use crate::answers::{AnswerError, AnswerMode};

const BLOCK_SEPARATOR: &str = "\n---\n";

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([AM])(\d+):(.*)$").expect("Invalid option line regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub code: u32,
    pub text: String,
    pub is_other: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    pub prompt_text: String,
    pub options: Vec<QuestionOption>,
    pub multi: bool,
    pub mode: AnswerMode,
}

impl Question {
    /// Option codes in declaration order.
    pub fn legal_values(&self) -> Vec<String> {
        self.options.iter().map(|o| o.code.to_string()).collect()
    }

    pub fn option_text(&self, code: u32) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.text.as_str())
    }
}

/// Parse the contents of a question file. Blocks without a name are skipped.
pub fn parse_questions(source: &str) -> Result<Vec<Question>, AnswerError> {
    let mut questions = Vec::new();

    for block in source.split(BLOCK_SEPARATOR) {
        let mut name = None;
        let mut declared_mode = AnswerMode::Free;
        let mut options = Vec::new();
        let mut multi = false;
        let mut prompt_lines = Vec::new();

        for line in block.trim().lines() {
            if let Some(rest) = line.strip_prefix("N:") {
                name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("A:") {
                declared_mode = rest.parse()?;
            } else if let Some(caps) = OPTION_LINE.captures(line) {
                if &caps[1] == "M" {
                    multi = true;
                }
                let Ok(code) = caps[2].parse() else {
                    tracing::warn!(line, "Skipping option with out-of-range code");
                    continue;
                };
                let text = caps[3].trim().to_string();
                options.push(QuestionOption {
                    code,
                    is_other: text.contains("Other"),
                    text,
                });
            } else {
                prompt_lines.push(line);
            }
        }

        let Some(name) = name.filter(|n| !n.is_empty()) else {
            continue;
        };

        let mode = if options.is_empty() {
            declared_mode
        } else if multi {
            AnswerMode::Multi
        } else {
            AnswerMode::Single
        };

        questions.push(Question {
            name,
            prompt_text: prompt_lines.join("\n"),
            options,
            multi,
            mode,
        });
    }

    tracing::debug!(count = questions.len(), "Parsed questions");
    Ok(questions)
}

/// Read and parse a question file.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, QuizError> {
    let source = std::fs::read_to_string(path)?;
    Ok(parse_questions(&source)?)
}
