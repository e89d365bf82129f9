use serde_json::Value;
use thiserror::Error;

/// Structural misuse of the flow registry API. These are raised synchronously
/// to the caller and indicate a broken test setup, not a business-logic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("flow definitions require a non-empty name")]
    EmptyName,

    #[error("flow '{0}' is not registered")]
    NotRegistered(String),

    #[error("flow '{0}' is disabled and cannot be invoked")]
    Disabled(String),
}

/// Errors that can occur while evaluating an expression against the current
/// execution context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("trigger input '{0}' not found in the current run")]
    TriggerInputNotFound(String),

    #[error("action '{action}' has no recorded output '{output}'")]
    ActionOutputNotFound { action: String, output: String },

    #[error("a loop item was referenced outside of any apply-to-each iteration")]
    NoActiveLoop,

    #[error("the current loop item has no field '{0}'")]
    LoopItemFieldNotFound(String),

    #[error(
        "type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },
}

/// Errors raised by connector handlers while executing a leaf action.
/// The interpreter converts every one of these into a failed action result;
/// they never escape a run.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("no handler registered for action type '{0}'")]
    NoHandler(String),

    #[error("action type '{action_type}' requires the input '{input}'")]
    MissingInput { action_type: String, input: String },

    #[error("input '{input}' of action type '{action_type}' must be {expected}")]
    InvalidInput {
        action_type: String,
        input: String,
        expected: String,
    },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced by the record-store collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record '{entity_name}' with id '{id}' does not exist")]
    RecordNotFound { entity_name: String, id: String },

    #[error("the record store does not support the '{0}' operation")]
    Unsupported(&'static str),

    #[error("{0}")]
    Other(String),
}

/// Errors that can occur when converting an external flow document into a
/// `FlowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum FlowConversionError {
    #[error("invalid flow document: {0}")]
    InvalidDocument(String),
}
