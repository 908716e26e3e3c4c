// Error types shared by the domain model and the menu engine.
//
// Both are plain values: the core never logs or retries, it hands the
// failure back to whoever tried to build the value.

use thiserror::Error;

/// Raised when a value type (or a menu key/description) is built from
/// data that breaks one of its rules. The help message is meant to be
/// shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{help_msg}")]
pub struct ValidationError {
    help_msg: String,
}

impl ValidationError {
    pub fn new(help_msg: impl Into<String>) -> Self {
        ValidationError {
            help_msg: help_msg.into(),
        }
    }

    pub fn help_msg(&self) -> &str {
        &self.help_msg
    }
}

/// Misuse of `MenuBuilder`. These point at a badly assembled menu
/// definition, not at anything the user typed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    #[error("duplicate menu key: {0}")]
    DuplicateKey(String),

    #[error("menu must contain at least one exit entry")]
    MissingExit,

    #[error("menu builder was already used to build a menu")]
    BuilderConsumed,
}
