use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::AnswerError;

/// Expected shape of the answer to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Context-only turn; nothing to extract.
    Ignore,
    /// The whole reply is the answer.
    Free,
    /// One line of text.
    Line,
    /// One whitespace-free token.
    Word,
    /// Digits, optionally with thousands commas.
    Number,
    /// ISO `YYYY-MM-DD`.
    Date,
    /// Exactly one code from the legal values.
    Single,
    /// One or more codes from the legal values.
    Multi,
}

impl AnswerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Free => "free",
            Self::Line => "line",
            Self::Word => "word",
            Self::Number => "number",
            Self::Date => "date",
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }

    /// Modes whose failures are appended to the failure log.
    pub fn logs_failures(&self) -> bool {
        matches!(self, Self::Number | Self::Date | Self::Single | Self::Multi)
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerMode {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "free" => Ok(Self::Free),
            "line" => Ok(Self::Line),
            "word" => Ok(Self::Word),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            _ => Err(AnswerError::UnknownMode(s.to_string())),
        }
    }
}

/// A normalized answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Empty,
    Text(String),
    Date(NaiveDate),
    /// Multi-choice codes, lexically sorted.
    Codes(Vec<String>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_codes(&self) -> Option<&[String]> {
        match self {
            Self::Codes(codes) => Some(codes),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Codes(codes) => f.write_str(&codes.join(",")),
        }
    }
}

/// Outcome of one extraction call.
///
/// `ok == false` carries either no value or the unparsed text, depending on
/// the mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub ok: bool,
    pub value: Option<AnswerValue>,
}

impl Extraction {
    pub fn success(value: AnswerValue) -> Self {
        Self {
            ok: true,
            value: Some(value),
        }
    }

    pub fn failure(value: Option<AnswerValue>) -> Self {
        Self { ok: false, value }
    }
}
