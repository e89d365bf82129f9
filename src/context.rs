use ahash::AHashMap;
use serde_json::Value;

/// The named outputs of one action.
pub type OutputMap = AHashMap<String, Value>;

/// Per-run mutable state threaded through one flow execution: the trigger
/// inputs the run started with, the outputs of every action executed so far,
/// and the stack of active apply-to-each items.
///
/// Created fresh for every run and discarded once the result is recorded.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    trigger_inputs: AHashMap<String, Value>,
    // One flat namespace for the whole run. Outputs recorded inside a nested
    // branch or loop iteration stay visible to later sibling and outer
    // actions, and re-using an action name overwrites the earlier entry.
    // The simulated automation platform behaves exactly this way; do not
    // turn this into lexical scoping.
    action_outputs: AHashMap<String, OutputMap>,
    loop_items: Vec<Value>,
}

impl ExecutionContext {
    pub fn new(trigger_inputs: AHashMap<String, Value>) -> Self {
        Self {
            trigger_inputs,
            action_outputs: AHashMap::new(),
            loop_items: Vec::new(),
        }
    }

    pub fn trigger_input(&self, name: &str) -> Option<&Value> {
        self.trigger_inputs.get(name)
    }

    pub fn trigger_inputs(&self) -> &AHashMap<String, Value> {
        &self.trigger_inputs
    }

    /// Records the named outputs of a completed action, replacing any earlier
    /// outputs recorded under the same name.
    pub fn record_output(&mut self, action: impl Into<String>, outputs: OutputMap) {
        self.action_outputs.insert(action.into(), outputs);
    }

    pub fn action_output(&self, action: &str, output: &str) -> Option<&Value> {
        self.action_outputs.get(action).and_then(|o| o.get(output))
    }

    pub fn outputs_of(&self, action: &str) -> Option<&OutputMap> {
        self.action_outputs.get(action)
    }

    pub fn push_loop_item(&mut self, item: Value) {
        self.loop_items.push(item);
    }

    pub fn pop_loop_item(&mut self) -> Option<Value> {
        self.loop_items.pop()
    }

    /// The item of the innermost apply-to-each iteration currently executing.
    pub fn current_loop_item(&self) -> Option<&Value> {
        self.loop_items.last()
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_items.len()
    }
}
