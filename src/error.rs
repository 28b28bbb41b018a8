use thiserror::Error;

use crate::scalar::ScalarKind;

#[derive(Error, Debug)]
pub enum RowloomError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No constructor of type '{type_name}' takes {arity} argument(s)")]
    NoMatchingConstructor { type_name: String, arity: usize },
    #[error("More than one constructor of type '{type_name}' takes {arity} argument(s)")]
    AmbiguousConstructor { type_name: String, arity: usize },
    #[error("Argument {index} ('{value}') cannot be converted to {kind}")]
    ArgumentConversion {
        index: usize,
        kind: ScalarKind,
        value: String,
    },
    #[error("Store execution error: {0}")]
    StoreExecution(String),
    #[error("Invalid record state: {0}")]
    InvalidRecordState(String),
}

pub type Result<T> = std::result::Result<T, RowloomError>;

// Helper conversions
impl From<rusqlite::Error> for RowloomError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StoreExecution(e.to_string())
    }
}
