//! The record-store collaborator boundary.
//!
//! The engine never stores records itself. An embedding supplies a
//! [`RecordStore`] implementation, and that store is expected to call
//! [`FlowSimulator::on_mutation`](crate::engine::FlowSimulator::on_mutation)
//! exactly once per create, update, or delete it performs, after the mutation
//! is durable.

use crate::context::OutputMap;
use crate::error::StoreError;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record held by the store: a logical entity name, an id assigned by the
/// store, and a flat attribute map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub logical_name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: AHashMap<String, Value>,
}

impl Entity {
    /// Creates a record with no id; the store assigns one on create.
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            id: String::new(),
            attributes: AHashMap::new(),
        }
    }

    pub fn with_id(logical_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            id: id.into(),
            attributes: AHashMap::new(),
        }
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn reference(&self) -> EntityReference {
        EntityReference {
            entity_name: self.logical_name.clone(),
            id: self.id.clone(),
        }
    }
}

/// A pointer to a record in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    pub entity_name: String,
    pub id: String,
}

/// A single ordering key for [`RecordStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub attribute: String,
    #[serde(default)]
    pub descending: bool,
}

/// The query shape accepted by [`RecordStore::list`]. The `filter` value is
/// passed through to the store uninterpreted.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub entity_name: String,
    pub filter: Option<Value>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
    pub order_by: Vec<OrderBy>,
    pub include_total_count: bool,
    pub page_token: Option<String>,
}

/// One page of list results.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub records: Vec<Entity>,
    pub total_count: Option<usize>,
    pub next_page_token: Option<String>,
}

/// Contents of a file column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// The kind of record mutation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// A durable record mutation, as reported by the store. For updates the
/// store also passes the set of attribute names that changed.
#[derive(Debug, Clone)]
pub struct MutationEvent {
    pub kind: MutationKind,
    pub entity: Entity,
    pub modified_attributes: Option<AHashSet<String>>,
}

impl MutationEvent {
    pub fn create(entity: Entity) -> Self {
        Self {
            kind: MutationKind::Create,
            entity,
            modified_attributes: None,
        }
    }

    pub fn update(entity: Entity, modified_attributes: AHashSet<String>) -> Self {
        Self {
            kind: MutationKind::Update,
            entity,
            modified_attributes: Some(modified_attributes),
        }
    }

    pub fn delete(entity: Entity) -> Self {
        Self {
            kind: MutationKind::Delete,
            entity,
            modified_attributes: None,
        }
    }
}

/// The operations the built-in record-store handler executes against the
/// external store.
///
/// Every method has a default body returning [`StoreError::Unsupported`], so
/// an embedding implements only the operations its scenarios touch.
pub trait RecordStore: Send + Sync {
    /// Stores a new record and returns the id the store assigned to it.
    fn create(&self, entity: Entity) -> Result<String, StoreError> {
        let _ = entity;
        Err(StoreError::Unsupported("create"))
    }

    /// Fetches one record. An empty `columns` slice means all attributes.
    fn retrieve(&self, entity_name: &str, id: &str, columns: &[String]) -> Result<Entity, StoreError> {
        let _ = (entity_name, id, columns);
        Err(StoreError::Unsupported("retrieve"))
    }

    /// Merges the given attributes into an existing record.
    fn update(&self, entity: Entity) -> Result<(), StoreError> {
        let _ = entity;
        Err(StoreError::Unsupported("update"))
    }

    fn delete(&self, entity_name: &str, id: &str) -> Result<(), StoreError> {
        let _ = (entity_name, id);
        Err(StoreError::Unsupported("delete"))
    }

    fn list(&self, query: ListQuery) -> Result<ListPage, StoreError> {
        let _ = query;
        Err(StoreError::Unsupported("list"))
    }

    fn relate(
        &self,
        entity_name: &str,
        id: &str,
        relationship_name: &str,
        related: Vec<EntityReference>,
    ) -> Result<(), StoreError> {
        let _ = (entity_name, id, relationship_name, related);
        Err(StoreError::Unsupported("relate"))
    }

    fn unrelate(
        &self,
        entity_name: &str,
        id: &str,
        relationship_name: &str,
        related: Vec<EntityReference>,
    ) -> Result<(), StoreError> {
        let _ = (entity_name, id, relationship_name, related);
        Err(StoreError::Unsupported("unrelate"))
    }

    /// Runs a store-defined custom action and returns its output parameters.
    fn execute_custom_action(
        &self,
        name: &str,
        parameters: OutputMap,
    ) -> Result<OutputMap, StoreError> {
        let _ = (name, parameters);
        Err(StoreError::Unsupported("execute_custom_action"))
    }

    fn upload_file(
        &self,
        entity_name: &str,
        id: &str,
        column_name: &str,
        file: FileData,
    ) -> Result<(), StoreError> {
        let _ = (entity_name, id, column_name, file);
        Err(StoreError::Unsupported("upload_file"))
    }

    fn download_file(
        &self,
        entity_name: &str,
        id: &str,
        column_name: &str,
    ) -> Result<FileData, StoreError> {
        let _ = (entity_name, id, column_name);
        Err(StoreError::Unsupported("download_file"))
    }
}
