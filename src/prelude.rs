//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and traits from the nagare crate,
//! so test code can pull in the whole surface with a single import.

// Engine surface
pub use crate::engine::{ExecutionHistory, FlowActionResult, FlowExecutionResult, FlowSimulator};

// Flow model
pub use crate::flow::{
    Action, ApplyToEachAction, ConditionAction, ConnectorAction, DoUntilAction, FlowDefinition,
    IntoFlow, MutationTrigger, ParallelAction, ParallelBranch, SwitchAction, SwitchCase, Trigger,
    TriggerMessage,
};

// Expressions and per-run state
pub use crate::context::{ExecutionContext, OutputMap};
pub use crate::expression::{Evaluator, Expression, Reference, is_truthy};

// Connector handlers
pub use crate::connector::{
    COMPOSE_ACTION_TYPE, ComposeHandler, ConnectorHandler, ConnectorRegistry, RecordStoreHandler,
};

// Record-store collaborator boundary
pub use crate::store::{
    Entity, EntityReference, FileData, ListPage, ListQuery, MutationEvent, MutationKind, OrderBy,
    RecordStore,
};

// Error types
pub use crate::error::{
    ConnectorError, EvaluationError, FlowConversionError, FlowError, StoreError,
};

// Collection types used throughout the crate's API surface
pub use ahash::{AHashMap, AHashSet};
