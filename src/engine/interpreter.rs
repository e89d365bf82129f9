use super::result::{FlowActionResult, FlowExecutionResult};
use crate::connector::ConnectorRegistry;
use crate::context::{ExecutionContext, OutputMap};
use crate::error::ConnectorError;
use crate::expression::Evaluator;
use crate::flow::{
    APPLY_TO_EACH_TYPE, Action, ApplyToEachAction, CONDITION_TYPE, ConditionAction,
    ConnectorAction, DO_UNTIL_TYPE, DoUntilAction, FlowDefinition, PARALLEL_TYPE, ParallelAction,
    SWITCH_TYPE, SwitchAction,
};
use crate::store::RecordStore;
use ahash::AHashMap;
use serde_json::Value;
use std::time::{Instant, SystemTime};

/// A failure that stops the enclosing sequence. Carried upward until the run
/// records it; the failing action's result has already been appended by the
/// time this is raised.
struct Halt {
    message: String,
}

/// Walks one flow's action tree against a fresh execution context, running it
/// to completion or to the first failure.
pub(crate) struct Interpreter<'a> {
    handlers: &'a ConnectorRegistry,
    store: &'a dyn RecordStore,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(handlers: &'a ConnectorRegistry, store: &'a dyn RecordStore) -> Self {
        Self { handlers, store }
    }

    pub(crate) fn run(
        &self,
        flow: &FlowDefinition,
        trigger_inputs: AHashMap<String, Value>,
    ) -> FlowExecutionResult {
        let started_at = SystemTime::now();
        let timer = Instant::now();
        let mut context = ExecutionContext::new(trigger_inputs);
        let mut results = Vec::new();

        let outcome = self.execute_sequence(&flow.actions, &mut context, &mut results);
        // Every apply-to-each pops on both exit paths, so nothing may linger.
        debug_assert_eq!(context.loop_depth(), 0);

        let errors = results
            .iter()
            .filter(|result| !result.success)
            .map(|result| {
                format!(
                    "{}: {}",
                    result.display_name(),
                    result.error.as_deref().unwrap_or("unknown failure")
                )
            })
            .collect();

        FlowExecutionResult {
            flow_name: flow.name.clone(),
            started_at,
            duration: timer.elapsed(),
            success: outcome.is_ok(),
            action_results: results,
            errors,
        }
    }

    /// Actions run in order; the first failure stops the whole sequence and
    /// later siblings never run.
    fn execute_sequence(
        &self,
        actions: &[Action],
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        for action in actions {
            self.execute_action(action, context, results)?;
        }
        Ok(())
    }

    fn execute_action(
        &self,
        action: &Action,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        match action {
            Action::Connector(leaf) => self.execute_connector(leaf, context, results),
            Action::Condition(condition) => self.execute_condition(condition, context, results),
            Action::Switch(switch) => self.execute_switch(switch, context, results),
            Action::ApplyToEach(each) => self.execute_apply_to_each(each, context, results),
            Action::DoUntil(until) => self.execute_do_until(until, context, results),
            Action::Parallel(parallel) => self.execute_parallel(parallel, context, results),
        }
    }

    fn execute_connector(
        &self,
        action: &ConnectorAction,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        let outcome = match self.handlers.resolve(action) {
            Some(handler) => handler.execute(action, self.store, context),
            None => Err(ConnectorError::NoHandler(action.action_type.clone())),
        };
        match outcome {
            Ok(outputs) => finish(
                action.name.clone(),
                &action.action_type,
                outputs,
                context,
                results,
            ),
            Err(error) => fail(
                action.name.clone(),
                &action.action_type,
                error.to_string(),
                results,
            ),
        }
    }

    fn execute_condition(
        &self,
        action: &ConditionAction,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        let taken = match Evaluator::new(context).evaluate_truthy(&action.expression) {
            Ok(taken) => taken,
            Err(error) => {
                return fail(action.name.clone(), CONDITION_TYPE, error.to_string(), results);
            }
        };
        let branch = if taken {
            &action.then_actions
        } else {
            &action.else_actions
        };
        if let Err(halt) = self.execute_sequence(branch, context, results) {
            return fail(action.name.clone(), CONDITION_TYPE, halt.message, results);
        }
        let outputs = output_map([
            ("expressionValue", Value::Bool(taken)),
            ("branch", Value::String(if taken { "true" } else { "false" }.to_string())),
        ]);
        finish(action.name.clone(), CONDITION_TYPE, outputs, context, results)
    }

    fn execute_switch(
        &self,
        action: &SwitchAction,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        let value = match Evaluator::new(context).evaluate(&action.expression) {
            Ok(value) => value,
            Err(error) => {
                return fail(action.name.clone(), SWITCH_TYPE, error.to_string(), results);
            }
        };
        let key = case_key(&value);
        let matched = action
            .cases
            .iter()
            .find(|case| case.value.eq_ignore_ascii_case(&key));
        let (branch, matched_case) = match matched {
            Some(case) => (&case.actions, case.value.clone()),
            None => (&action.default_actions, "default".to_string()),
        };
        if let Err(halt) = self.execute_sequence(branch, context, results) {
            return fail(action.name.clone(), SWITCH_TYPE, halt.message, results);
        }
        let outputs = output_map([("matchedCase", Value::String(matched_case))]);
        finish(action.name.clone(), SWITCH_TYPE, outputs, context, results)
    }

    fn execute_apply_to_each(
        &self,
        action: &ApplyToEachAction,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        let collection = match Evaluator::new(context).evaluate(&action.collection) {
            Ok(collection) => collection,
            Err(error) => {
                return fail(
                    action.name.clone(),
                    APPLY_TO_EACH_TYPE,
                    error.to_string(),
                    results,
                );
            }
        };
        // A non-array collection is treated as a single-element sequence.
        let items = match collection {
            Value::Array(items) => items,
            single => vec![single],
        };

        let mut iterations = 0usize;
        for (index, item) in items.into_iter().enumerate() {
            context.push_loop_item(item);
            let outcome = self.execute_sequence(&action.actions, context, results);
            // Popped on both exit paths so the stack top always reflects the
            // innermost live iteration.
            context.pop_loop_item();
            if let Err(halt) = outcome {
                return fail(
                    action.name.clone(),
                    APPLY_TO_EACH_TYPE,
                    format!("iteration {index} failed: {}", halt.message),
                    results,
                );
            }
            iterations += 1;
        }

        let outputs = output_map([("iterations", iterations.into())]);
        finish(
            action.name.clone(),
            APPLY_TO_EACH_TYPE,
            outputs,
            context,
            results,
        )
    }

    fn execute_do_until(
        &self,
        action: &DoUntilAction,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        let mut iterations: u32 = 0;
        loop {
            // Counted before the body runs, so the guard caps body executions
            // at exactly `max_iterations`.
            iterations += 1;
            if iterations > action.max_iterations {
                return fail(
                    action.name.clone(),
                    DO_UNTIL_TYPE,
                    format!(
                        "exceeded the maximum of {} iterations",
                        action.max_iterations
                    ),
                    results,
                );
            }
            if let Err(halt) = self.execute_sequence(&action.actions, context, results) {
                return fail(action.name.clone(), DO_UNTIL_TYPE, halt.message, results);
            }
            match Evaluator::new(context).evaluate_truthy(&action.expression) {
                Ok(true) => break,
                Ok(false) => {}
                Err(error) => {
                    return fail(action.name.clone(), DO_UNTIL_TYPE, error.to_string(), results);
                }
            }
        }

        let outputs = output_map([("iterations", iterations.into())]);
        finish(action.name.clone(), DO_UNTIL_TYPE, outputs, context, results)
    }

    /// Branches are logically independent but execute sequentially in
    /// declaration order; the first failing branch stops the whole group.
    fn execute_parallel(
        &self,
        action: &ParallelAction,
        context: &mut ExecutionContext,
        results: &mut Vec<FlowActionResult>,
    ) -> Result<(), Halt> {
        let mut completed = Vec::new();
        for branch in &action.branches {
            if let Err(halt) = self.execute_sequence(&branch.actions, context, results) {
                return fail(
                    action.name.clone(),
                    PARALLEL_TYPE,
                    format!("branch '{}' failed: {}", branch.name, halt.message),
                    results,
                );
            }
            completed.push(Value::String(branch.name.clone()));
        }
        let outputs = output_map([("completedBranches", Value::Array(completed))]);
        finish(action.name.clone(), PARALLEL_TYPE, outputs, context, results)
    }
}

/// Switch keys: strings match verbatim, other values through their JSON
/// rendering.
fn case_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn output_map<const N: usize>(entries: [(&str, Value); N]) -> OutputMap {
    entries
        .into_iter()
        .map(|(output, value)| (output.to_string(), value))
        .collect()
}

/// Records a successful action result and, when the action is named, its
/// outputs in the shared namespace.
fn finish(
    action_name: Option<String>,
    action_type: &str,
    outputs: OutputMap,
    context: &mut ExecutionContext,
    results: &mut Vec<FlowActionResult>,
) -> Result<(), Halt> {
    if let Some(name) = &action_name {
        context.record_output(name.clone(), outputs.clone());
    }
    results.push(FlowActionResult::succeeded(action_name, action_type, outputs));
    Ok(())
}

/// Records a failed action result and raises the halt that stops the
/// enclosing sequence.
fn fail(
    action_name: Option<String>,
    action_type: &str,
    message: String,
    results: &mut Vec<FlowActionResult>,
) -> Result<(), Halt> {
    results.push(FlowActionResult::failed(
        action_name,
        action_type,
        message.clone(),
    ));
    Err(Halt { message })
}
