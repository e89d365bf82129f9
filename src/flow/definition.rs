use super::action::Action;
use crate::store::{MutationEvent, MutationKind};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// The message class a mutation trigger subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerMessage {
    Create,
    Update,
    Delete,
    CreateOrUpdate,
}

impl TriggerMessage {
    /// Whether this subscription covers the given mutation kind.
    /// `CreateOrUpdate` covers both creates and updates.
    pub fn covers(&self, kind: MutationKind) -> bool {
        match self {
            TriggerMessage::Create => kind == MutationKind::Create,
            TriggerMessage::Update => kind == MutationKind::Update,
            TriggerMessage::Delete => kind == MutationKind::Delete,
            TriggerMessage::CreateOrUpdate => {
                matches!(kind, MutationKind::Create | MutationKind::Update)
            }
        }
    }
}

/// An automatic data-mutation trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationTrigger {
    pub entity_logical_name: String,
    pub message: TriggerMessage,
    /// When non-empty, update events match only if at least one of these
    /// attributes was modified. Ignored for creates and deletes.
    #[serde(default)]
    pub filtered_attributes: AHashSet<String>,
}

/// When a flow runs automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Trigger {
    /// Fires on matching record mutations.
    Mutation(MutationTrigger),
    /// Never fires automatically; the flow runs only through
    /// [`FlowSimulator::simulate_trigger`](crate::engine::FlowSimulator::simulate_trigger).
    Manual,
}

impl Trigger {
    pub fn matches(&self, event: &MutationEvent) -> bool {
        let Trigger::Mutation(trigger) = self else {
            return false;
        };
        if !trigger
            .entity_logical_name
            .eq_ignore_ascii_case(&event.entity.logical_name)
        {
            return false;
        }
        if !trigger.message.covers(event.kind) {
            return false;
        }
        if event.kind == MutationKind::Update && !trigger.filtered_attributes.is_empty() {
            let Some(modified) = &event.modified_attributes else {
                return false;
            };
            return trigger
                .filtered_attributes
                .iter()
                .any(|attribute| modified.contains(attribute));
        }
        true
    }
}

/// A named, registrable automation definition: one trigger plus the root
/// action sequence. Never mutated once the registry holds it; runs execute
/// against clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub name: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn enabled_default() -> bool {
    true
}

impl FlowDefinition {
    pub fn new(name: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            trigger,
            actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
