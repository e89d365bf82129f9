//! The test-facing engine: flow registry, trigger matcher, and run history.

use crate::connector::{ConnectorHandler, ConnectorRegistry};
use crate::error::FlowError;
use crate::flow::FlowDefinition;
use crate::store::{MutationEvent, RecordStore};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

mod history;
mod interpreter;
mod result;

pub use history::ExecutionHistory;
pub use result::{FlowActionResult, FlowExecutionResult};

use interpreter::Interpreter;

/// Stores named flow definitions, matches record mutations against their
/// triggers, runs matching flows, and records every run for verification.
///
/// A simulator is bound to one record-store collaborator for its lifetime.
/// The store is expected to call [`FlowSimulator::on_mutation`] once per
/// durable create, update, or delete.
pub struct FlowSimulator {
    store: Arc<dyn RecordStore>,
    // Keyed by lowercased name; a flow name maps to exactly one current
    // definition.
    flows: RwLock<AHashMap<String, FlowDefinition>>,
    handlers: RwLock<ConnectorRegistry>,
    history: ExecutionHistory,
}

impl FlowSimulator {
    /// Creates a simulator with the built-in compose and record-store
    /// handlers registered.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            flows: RwLock::new(AHashMap::new()),
            handlers: RwLock::new(ConnectorRegistry::with_builtins()),
            history: ExecutionHistory::new(),
        }
    }

    /// Stores a definition under its name, replacing any prior definition
    /// registered under the same (case-insensitive) name.
    pub fn register_flow(&self, flow: FlowDefinition) -> Result<(), FlowError> {
        if flow.name.trim().is_empty() {
            return Err(FlowError::EmptyName);
        }
        tracing::debug!(flow = %flow.name, "registered flow");
        self.flows.write().insert(flow.name.to_lowercase(), flow);
        Ok(())
    }

    /// Removes a definition by name. Returns whether one was registered.
    pub fn unregister_flow(&self, name: &str) -> bool {
        self.flows.write().remove(&name.to_lowercase()).is_some()
    }

    pub fn clear_flows(&self) {
        self.flows.write().clear();
    }

    /// Registers a connector handler for one action type, replacing any
    /// prior handler for that type (built-ins included).
    pub fn register_handler(
        &self,
        action_type: impl Into<String>,
        handler: Arc<dyn ConnectorHandler>,
    ) {
        self.handlers.write().register(action_type, handler);
    }

    /// Runs a flow by name with the given trigger inputs, recording the run.
    ///
    /// Action-level failures are reported inside the returned result, never
    /// as an `Err`; the error return is reserved for unknown or disabled
    /// names.
    pub fn simulate_trigger(
        &self,
        name: &str,
        inputs: AHashMap<String, Value>,
    ) -> Result<FlowExecutionResult, FlowError> {
        let flow = self
            .flows
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| FlowError::NotRegistered(name.to_string()))?;
        if !flow.enabled {
            return Err(FlowError::Disabled(flow.name.clone()));
        }
        tracing::debug!(flow = %flow.name, "manual trigger");
        let result = self.run_flow(&flow, inputs);
        self.history.append(result.clone());
        Ok(result)
    }

    /// The trigger feed. Runs every enabled flow whose trigger matches the
    /// event, seeding trigger inputs from the mutated record's attributes
    /// plus its `id` and `entityName`.
    ///
    /// Nothing escapes this boundary: a failing (or panicking) run is logged
    /// and recorded in history, and the mutation that caused it proceeds
    /// untouched. This mirrors the best-effort nature of the automation
    /// system being simulated.
    pub fn on_mutation(&self, event: &MutationEvent) {
        let matched: Vec<FlowDefinition> = {
            let flows = self.flows.read();
            flows
                .values()
                .filter(|flow| flow.enabled && flow.trigger.matches(event))
                .cloned()
                .collect()
        };
        // The lock is released here: a matched flow may mutate the store and
        // re-enter this method.
        for flow in matched {
            tracing::debug!(flow = %flow.name, kind = ?event.kind, "mutation trigger");
            // Each matched flow gets a fresh execution context; nothing
            // leaks between flows sharing one event.
            let inputs = trigger_inputs_for(event);
            let outcome = catch_unwind(AssertUnwindSafe(|| self.run_flow(&flow, inputs)));
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => panicked_result(&flow, payload),
            };
            if !result.success {
                tracing::warn!(
                    flow = %flow.name,
                    errors = %result.error_summary(),
                    "triggered flow run failed"
                );
            }
            self.history.append(result);
        }
    }

    fn run_flow(
        &self,
        flow: &FlowDefinition,
        trigger_inputs: AHashMap<String, Value>,
    ) -> FlowExecutionResult {
        // Snapshot the handlers so a registration mid-run cannot race the
        // interpreter.
        let handlers = self.handlers.read().clone();
        Interpreter::new(&handlers, self.store.as_ref()).run(flow, trigger_inputs)
    }

    pub fn history(&self) -> &ExecutionHistory {
        &self.history
    }

    /// How many times the named flow has run.
    pub fn triggered_count(&self, flow_name: &str) -> usize {
        self.history.count(flow_name)
    }

    /// All recorded runs of the named flow, oldest first.
    pub fn results(&self, flow_name: &str) -> Vec<FlowExecutionResult> {
        self.history.results(flow_name)
    }

    pub fn last_result(&self, flow_name: &str) -> Option<FlowExecutionResult> {
        self.history.last_result(flow_name)
    }

    /// # Panics
    ///
    /// Panics if the named flow never ran.
    #[track_caller]
    pub fn assert_triggered(&self, flow_name: &str) {
        self.history.assert_triggered(flow_name);
    }

    /// # Panics
    ///
    /// Panics if the named flow ran at least once.
    #[track_caller]
    pub fn assert_not_triggered(&self, flow_name: &str) {
        self.history.assert_not_triggered(flow_name);
    }

    pub fn clear_history(&self) {
        self.history.clear();
    }
}

fn trigger_inputs_for(event: &MutationEvent) -> AHashMap<String, Value> {
    let mut inputs = event.entity.attributes.clone();
    inputs.insert("id".to_string(), Value::String(event.entity.id.clone()));
    inputs.insert(
        "entityName".to_string(),
        Value::String(event.entity.logical_name.clone()),
    );
    inputs
}

/// A synthetic failed result standing in for a run that panicked.
fn panicked_result(flow: &FlowDefinition, payload: Box<dyn Any + Send>) -> FlowExecutionResult {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    };
    FlowExecutionResult {
        flow_name: flow.name.clone(),
        started_at: SystemTime::now(),
        duration: Duration::ZERO,
        success: false,
        action_results: Vec::new(),
        errors: vec![format!("run panicked: {message}")],
    }
}
