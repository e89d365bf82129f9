use crate::expression::Expression;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

pub(crate) const CONDITION_TYPE: &str = "Condition";
pub(crate) const SWITCH_TYPE: &str = "Switch";
pub(crate) const APPLY_TO_EACH_TYPE: &str = "ApplyToEach";
pub(crate) const DO_UNTIL_TYPE: &str = "DoUntil";
pub(crate) const PARALLEL_TYPE: &str = "Parallel";

/// A leaf action dispatched to a registered connector handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorAction {
    pub name: Option<String>,
    pub action_type: String,
    /// Expression-valued inputs, left unevaluated until run time.
    #[serde(default)]
    pub inputs: AHashMap<String, Expression>,
}

impl ConnectorAction {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            name: None,
            action_type: action_type.into(),
            inputs: AHashMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input(mut self, input: impl Into<String>, expression: Expression) -> Self {
        self.inputs.insert(input.into(), expression);
        self
    }
}

/// Runs exactly one of two branches depending on a boolean test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionAction {
    pub name: Option<String>,
    pub expression: Expression,
    #[serde(default)]
    pub then_actions: Vec<Action>,
    #[serde(default)]
    pub else_actions: Vec<Action>,
}

/// One arm of a switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    pub value: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Multi-way branch: the expression value is stringified and matched
/// case-insensitively against the case values, falling back to the default
/// branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchAction {
    pub name: Option<String>,
    pub expression: Expression,
    #[serde(default)]
    pub cases: Vec<SwitchCase>,
    #[serde(default)]
    pub default_actions: Vec<Action>,
}

/// Runs the body once per element of the collection expression. A non-array
/// collection value is treated as a single-element sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyToEachAction {
    pub name: Option<String>,
    pub collection: Expression,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Runs the body, then tests the exit expression, repeating while it is
/// falsy. Exceeding `max_iterations` fails the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoUntilAction {
    pub name: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    pub expression: Expression,
    pub max_iterations: u32,
}

/// One named branch of a parallel group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelBranch {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Logically independent branches, executed sequentially in declaration
/// order by this simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelAction {
    pub name: Option<String>,
    pub branches: Vec<ParallelBranch>,
}

/// One node of a flow's execution tree: either a leaf dispatched to a
/// connector handler, or a control-flow composite owning nested sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    Connector(ConnectorAction),
    Condition(ConditionAction),
    Switch(SwitchAction),
    ApplyToEach(ApplyToEachAction),
    DoUntil(DoUntilAction),
    Parallel(ParallelAction),
}

impl Action {
    /// The key this action's outputs are recorded under, when named.
    pub fn name(&self) -> Option<&str> {
        match self {
            Action::Connector(a) => a.name.as_deref(),
            Action::Condition(a) => a.name.as_deref(),
            Action::Switch(a) => a.name.as_deref(),
            Action::ApplyToEach(a) => a.name.as_deref(),
            Action::DoUntil(a) => a.name.as_deref(),
            Action::Parallel(a) => a.name.as_deref(),
        }
    }

    /// The action-type discriminator recorded in results.
    pub fn action_type(&self) -> &str {
        match self {
            Action::Connector(a) => &a.action_type,
            Action::Condition(_) => CONDITION_TYPE,
            Action::Switch(_) => SWITCH_TYPE,
            Action::ApplyToEach(_) => APPLY_TO_EACH_TYPE,
            Action::DoUntil(_) => DO_UNTIL_TYPE,
            Action::Parallel(_) => PARALLEL_TYPE,
        }
    }
}
