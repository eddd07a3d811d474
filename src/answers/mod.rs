pub mod types;
pub mod templates;
pub mod matcher;
pub mod failure_log;
pub mod resolver;

pub use types::*;
pub use matcher::*;
pub use failure_log::*;
pub use resolver::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Invalid answer pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown answer mode '{0}'")]
    UnknownMode(String),

    #[error("Unknown {table} code '{code}'")]
    UnknownCode { table: &'static str, code: String },

    #[error("No {0} codes to compare")]
    EmptyCodes(&'static str),
}
