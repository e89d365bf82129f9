use super::compose::{COMPOSE_ACTION_TYPE, ComposeHandler};
use super::record_store::RecordStoreHandler;
use crate::context::{ExecutionContext, OutputMap};
use crate::error::ConnectorError;
use crate::flow::ConnectorAction;
use crate::store::RecordStore;
use ahash::AHashMap;
use std::sync::Arc;

/// Defines the contract for executing one leaf connector action.
///
/// Handlers return named outputs on success. Any error is caught by the
/// interpreter and converted into a failed action result carrying the error's
/// message; handlers never format interpreter-level records themselves.
pub trait ConnectorHandler: Send + Sync {
    /// Returns true if this handler understands the given action.
    fn can_handle(&self, action: &ConnectorAction) -> bool;

    /// Executes the action against the record store, returning its named
    /// outputs.
    fn execute(
        &self,
        action: &ConnectorAction,
        store: &dyn RecordStore,
        context: &mut ExecutionContext,
    ) -> Result<OutputMap, ConnectorError>;
}

/// Maps action-type names to pluggable handlers.
///
/// Cloning is cheap (handlers are shared), so each run executes against a
/// snapshot taken when it starts.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    handlers: AHashMap<String, Arc<dyn ConnectorHandler>>,
}

impl ConnectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in compose and record-store handlers
    /// registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(COMPOSE_ACTION_TYPE, Arc::new(ComposeHandler));
        let store_handler = Arc::new(RecordStoreHandler);
        for action_type in RecordStoreHandler::ACTION_TYPES {
            registry.register(*action_type, store_handler.clone());
        }
        registry
    }

    /// Registers a handler for one action type, replacing any prior handler
    /// for that type.
    pub fn register(&mut self, action_type: impl Into<String>, handler: Arc<dyn ConnectorHandler>) {
        self.handlers.insert(action_type.into(), handler);
    }

    /// Looks up the handler for an action's type. `None` is an ordinary
    /// action failure, not a fatal error.
    pub fn resolve(&self, action: &ConnectorAction) -> Option<Arc<dyn ConnectorHandler>> {
        self.handlers
            .get(&action.action_type)
            .filter(|handler| handler.can_handle(action))
            .cloned()
    }
}
