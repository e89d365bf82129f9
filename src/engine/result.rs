use crate::context::OutputMap;
use itertools::Itertools;
use std::time::{Duration, SystemTime};

/// The outcome of one executed action node. Write-once: the interpreter
/// appends these as each action completes and never revisits them.
#[derive(Debug, Clone)]
pub struct FlowActionResult {
    pub action_name: Option<String>,
    pub action_type: String,
    pub success: bool,
    pub outputs: OutputMap,
    pub error: Option<String>,
}

impl FlowActionResult {
    pub(crate) fn succeeded(
        action_name: Option<String>,
        action_type: impl Into<String>,
        outputs: OutputMap,
    ) -> Self {
        Self {
            action_name,
            action_type: action_type.into(),
            success: true,
            outputs,
            error: None,
        }
    }

    pub(crate) fn failed(
        action_name: Option<String>,
        action_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            action_name,
            action_type: action_type.into(),
            success: false,
            outputs: OutputMap::new(),
            error: Some(error.into()),
        }
    }

    /// The name this result is reported under: the action's name when it has
    /// one, otherwise its type.
    pub fn display_name(&self) -> &str {
        self.action_name.as_deref().unwrap_or(&self.action_type)
    }
}

/// The record of one completed flow run.
#[derive(Debug, Clone)]
pub struct FlowExecutionResult {
    pub flow_name: String,
    pub started_at: SystemTime,
    pub duration: Duration,
    pub success: bool,
    /// Per-action results in depth-first execution order; children of a
    /// composite precede the composite's own entry.
    pub action_results: Vec<FlowActionResult>,
    /// Failure messages, innermost first, each prefixed with the owning
    /// action's name.
    pub errors: Vec<String>,
}

impl FlowExecutionResult {
    /// All error messages joined for display.
    pub fn error_summary(&self) -> String {
        self.errors.iter().join("; ")
    }

    /// The most recent result recorded for the given action name.
    pub fn result_for(&self, action_name: &str) -> Option<&FlowActionResult> {
        self.action_results
            .iter()
            .rev()
            .find(|result| result.action_name.as_deref() == Some(action_name))
    }
}
