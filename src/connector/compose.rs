use super::registry::ConnectorHandler;
use crate::context::{ExecutionContext, OutputMap};
use crate::error::ConnectorError;
use crate::expression::Evaluator;
use crate::flow::ConnectorAction;
use crate::store::RecordStore;

/// The action type the compose handler is registered under.
pub const COMPOSE_ACTION_TYPE: &str = "Compose";

/// Value passthrough: evaluates the `inputs` expression and returns the
/// result unchanged under the `outputs` key.
pub struct ComposeHandler;

impl ConnectorHandler for ComposeHandler {
    fn can_handle(&self, action: &ConnectorAction) -> bool {
        action.action_type == COMPOSE_ACTION_TYPE
    }

    fn execute(
        &self,
        action: &ConnectorAction,
        _store: &dyn RecordStore,
        context: &mut ExecutionContext,
    ) -> Result<OutputMap, ConnectorError> {
        let expression =
            action
                .inputs
                .get("inputs")
                .ok_or_else(|| ConnectorError::MissingInput {
                    action_type: action.action_type.clone(),
                    input: "inputs".to_string(),
                })?;
        let value = Evaluator::new(context).evaluate(expression)?;
        let mut outputs = OutputMap::new();
        outputs.insert("outputs".to_string(), value);
        Ok(outputs)
    }
}
