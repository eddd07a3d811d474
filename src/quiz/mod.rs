pub mod questions;
pub mod hints;
pub mod prompt;
pub mod ollama;
pub mod dialog;
pub mod runner;

pub use questions::*;
pub use hints::*;
pub use prompt::*;
pub use ollama::*;
pub use dialog::*;
pub use runner::*;

use thiserror::Error;

use crate::answers::AnswerError;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model reply repeated itself {0} times")]
    RepetitiveResponse(usize),

    #[error("No scripted response left for prompt")]
    ScriptExhausted,

    #[error("No recorded reply for prompt")]
    NotRecorded,

    #[error("Question '{0}' appears more than once")]
    DuplicateQuestion(String),

    #[error("Answer extraction error: {0}")]
    Answer(#[from] AnswerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
