use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A reference to a value in the current execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum Reference {
    /// A named input the run was started with.
    TriggerInput { name: String },
    /// A named output of a previously executed action.
    ActionOutput { action: String, output: String },
    /// The innermost active apply-to-each item, optionally one object field deep.
    LoopItem { field: Option<String> },
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::TriggerInput { name } => write!(f, "$trigger.{}", name),
            Reference::ActionOutput { action, output } => {
                write!(f, "$outputs.{}.{}", action, output)
            }
            Reference::LoopItem { field: None } => write!(f, "$item"),
            Reference::LoopItem { field: Some(field) } => write!(f, "$item.{}", field),
        }
    }
}

/// The expression tree evaluated against a run's execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression {
    // Leaf nodes
    Literal(Value),
    Input(Reference),

    // Comparison
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    LessThan(Box<Expression>, Box<Expression>),
    LessThanOrEqual(Box<Expression>, Box<Expression>),

    // Logical
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn trigger_input(name: impl Into<String>) -> Self {
        Expression::Input(Reference::TriggerInput { name: name.into() })
    }

    pub fn action_output(action: impl Into<String>, output: impl Into<String>) -> Self {
        Expression::Input(Reference::ActionOutput {
            action: action.into(),
            output: output.into(),
        })
    }

    pub fn loop_item() -> Self {
        Expression::Input(Reference::LoopItem { field: None })
    }

    pub fn loop_item_field(field: impl Into<String>) -> Self {
        Expression::Input(Reference::LoopItem {
            field: Some(field.into()),
        })
    }

    pub fn equals(self, other: Expression) -> Self {
        Expression::Equal(Box::new(self), Box::new(other))
    }

    pub fn not_equals(self, other: Expression) -> Self {
        Expression::NotEqual(Box::new(self), Box::new(other))
    }

    pub fn greater_than(self, other: Expression) -> Self {
        Expression::GreaterThan(Box::new(self), Box::new(other))
    }

    pub fn greater_or_equal(self, other: Expression) -> Self {
        Expression::GreaterThanOrEqual(Box::new(self), Box::new(other))
    }

    pub fn less_than(self, other: Expression) -> Self {
        Expression::LessThan(Box::new(self), Box::new(other))
    }

    pub fn less_or_equal(self, other: Expression) -> Self {
        Expression::LessThanOrEqual(Box::new(self), Box::new(other))
    }

    pub fn and(self, other: Expression) -> Self {
        Expression::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expression) -> Self {
        Expression::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Self {
        Expression::Not(Box::new(self))
    }
}
