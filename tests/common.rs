//! Common test utilities: an in-memory record store wired into the
//! simulator's trigger feed, plus flow-building helpers.
use nagare::prelude::*;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::{Arc, Weak};

/// One relationship association held by the in-memory store.
#[derive(Debug, Clone)]
pub struct Relation {
    pub entity_name: String,
    pub id: String,
    pub relationship_name: String,
    pub related: Vec<EntityReference>,
}

/// An in-memory record store that reports every durable mutation back to an
/// attached simulator, the way a real store collaborator is expected to.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<AHashMap<String, Vec<Entity>>>,
    relations: RwLock<Vec<Relation>>,
    files: RwLock<AHashMap<(String, String, String), FileData>>,
    next_id: Mutex<u64>,
    listener: RwLock<Option<Weak<FlowSimulator>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the trigger feed. Held weakly so the store and simulator can
    /// reference each other without leaking.
    pub fn attach(&self, simulator: &Arc<FlowSimulator>) {
        *self.listener.write() = Some(Arc::downgrade(simulator));
    }

    fn emit(&self, event: MutationEvent) {
        // No store lock may be held here: a triggered flow can call straight
        // back into this store.
        let listener = self.listener.read().clone();
        if let Some(simulator) = listener.and_then(|weak| weak.upgrade()) {
            simulator.on_mutation(&event);
        }
    }

    #[allow(dead_code)]
    pub fn record(&self, entity_name: &str, id: &str) -> Option<Entity> {
        self.records
            .read()
            .get(&entity_name.to_lowercase())
            .and_then(|records| records.iter().find(|record| record.id == id))
            .cloned()
    }

    #[allow(dead_code)]
    pub fn record_count(&self, entity_name: &str) -> usize {
        self.records
            .read()
            .get(&entity_name.to_lowercase())
            .map_or(0, Vec::len)
    }

    #[allow(dead_code)]
    pub fn relations(&self) -> Vec<Relation> {
        self.relations.read().clone()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn create(&self, mut entity: Entity) -> Result<String, StoreError> {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("{}-{}", entity.logical_name.to_lowercase(), next)
        };
        entity.id = id.clone();
        self.records
            .write()
            .entry(entity.logical_name.to_lowercase())
            .or_default()
            .push(entity.clone());
        self.emit(MutationEvent::create(entity));
        Ok(id)
    }

    fn retrieve(&self, entity_name: &str, id: &str, columns: &[String]) -> Result<Entity, StoreError> {
        let mut record = self
            .records
            .read()
            .get(&entity_name.to_lowercase())
            .and_then(|records| records.iter().find(|record| record.id == id))
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound {
                entity_name: entity_name.to_string(),
                id: id.to_string(),
            })?;
        if !columns.is_empty() {
            record
                .attributes
                .retain(|attribute, _| columns.contains(attribute));
        }
        Ok(record)
    }

    fn update(&self, entity: Entity) -> Result<(), StoreError> {
        let mut modified = AHashSet::new();
        let merged = {
            let mut records = self.records.write();
            let existing = records
                .get_mut(&entity.logical_name.to_lowercase())
                .and_then(|records| records.iter_mut().find(|record| record.id == entity.id))
                .ok_or_else(|| StoreError::RecordNotFound {
                    entity_name: entity.logical_name.clone(),
                    id: entity.id.clone(),
                })?;
            for (attribute, value) in entity.attributes {
                modified.insert(attribute.clone());
                existing.attributes.insert(attribute, value);
            }
            existing.clone()
        };
        self.emit(MutationEvent::update(merged, modified));
        Ok(())
    }

    fn delete(&self, entity_name: &str, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut records = self.records.write();
            let entries = records.get_mut(&entity_name.to_lowercase()).ok_or_else(|| {
                StoreError::RecordNotFound {
                    entity_name: entity_name.to_string(),
                    id: id.to_string(),
                }
            })?;
            let position = entries
                .iter()
                .position(|record| record.id == id)
                .ok_or_else(|| StoreError::RecordNotFound {
                    entity_name: entity_name.to_string(),
                    id: id.to_string(),
                })?;
            entries.remove(position)
        };
        self.emit(MutationEvent::delete(removed));
        Ok(())
    }

    fn list(&self, query: ListQuery) -> Result<ListPage, StoreError> {
        let mut records: Vec<Entity> = self
            .records
            .read()
            .get(&query.entity_name.to_lowercase())
            .cloned()
            .unwrap_or_default();

        // The filter shape this store understands is attribute equality.
        if let Some(Value::Object(filter)) = &query.filter {
            records.retain(|record| {
                filter
                    .iter()
                    .all(|(attribute, expected)| record.attributes.get(attribute) == Some(expected))
            });
        }

        for order in query.order_by.iter().rev() {
            records.sort_by(|a, b| {
                let ordering = value_cmp(
                    a.attributes.get(&order.attribute),
                    b.attributes.get(&order.attribute),
                );
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let total = records.len();
        let mut skip = query.skip.unwrap_or(0);
        if let Some(token) = &query.page_token {
            skip += token
                .parse::<usize>()
                .map_err(|_| StoreError::Other(format!("bad page token '{token}'")))?;
        }
        let mut page: Vec<Entity> = records.into_iter().skip(skip).collect();
        let mut next_page_token = None;
        if let Some(top) = query.top {
            if page.len() > top {
                next_page_token = Some((skip + top).to_string());
                page.truncate(top);
            }
        }
        Ok(ListPage {
            records: page,
            total_count: query.include_total_count.then_some(total),
            next_page_token,
        })
    }

    fn relate(
        &self,
        entity_name: &str,
        id: &str,
        relationship_name: &str,
        related: Vec<EntityReference>,
    ) -> Result<(), StoreError> {
        self.relations.write().push(Relation {
            entity_name: entity_name.to_string(),
            id: id.to_string(),
            relationship_name: relationship_name.to_string(),
            related,
        });
        Ok(())
    }

    fn unrelate(
        &self,
        entity_name: &str,
        id: &str,
        relationship_name: &str,
        related: Vec<EntityReference>,
    ) -> Result<(), StoreError> {
        let mut relations = self.relations.write();
        for relation in relations.iter_mut() {
            if relation.entity_name == entity_name
                && relation.id == id
                && relation.relationship_name == relationship_name
            {
                relation.related.retain(|reference| !related.contains(reference));
            }
        }
        relations.retain(|relation| !relation.related.is_empty());
        Ok(())
    }

    fn execute_custom_action(
        &self,
        _name: &str,
        parameters: OutputMap,
    ) -> Result<OutputMap, StoreError> {
        Ok(parameters)
    }

    fn upload_file(
        &self,
        entity_name: &str,
        id: &str,
        column_name: &str,
        file: FileData,
    ) -> Result<(), StoreError> {
        self.files.write().insert(
            (
                entity_name.to_lowercase(),
                id.to_string(),
                column_name.to_string(),
            ),
            file,
        );
        Ok(())
    }

    fn download_file(
        &self,
        entity_name: &str,
        id: &str,
        column_name: &str,
    ) -> Result<FileData, StoreError> {
        self.files
            .read()
            .get(&(
                entity_name.to_lowercase(),
                id.to_string(),
                column_name.to_string(),
            ))
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound {
                entity_name: entity_name.to_string(),
                id: id.to_string(),
            })
    }
}

fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .unwrap_or(f64::NAN)
                .partial_cmp(&b.as_f64().unwrap_or(f64::NAN))
                .unwrap_or(Ordering::Equal),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        },
    }
}

/// Creates a store and a simulator wired together through the trigger feed.
#[allow(dead_code)]
pub fn harness() -> (Arc<InMemoryRecordStore>, Arc<FlowSimulator>) {
    let store = Arc::new(InMemoryRecordStore::new());
    let simulator = Arc::new(FlowSimulator::new(store.clone()));
    store.attach(&simulator);
    (store, simulator)
}

/// A named compose action passing its expression through.
#[allow(dead_code)]
pub fn compose(name: &str, expression: Expression) -> Action {
    Action::Connector(
        ConnectorAction::new(COMPOSE_ACTION_TYPE)
            .named(name)
            .input("inputs", expression),
    )
}

#[allow(dead_code)]
pub fn manual_flow(name: &str, actions: Vec<Action>) -> FlowDefinition {
    FlowDefinition::new(name, Trigger::Manual).with_actions(actions)
}

#[allow(dead_code)]
pub fn mutation_flow(
    name: &str,
    entity: &str,
    message: TriggerMessage,
    actions: Vec<Action>,
) -> FlowDefinition {
    FlowDefinition::new(
        name,
        Trigger::Mutation(MutationTrigger {
            entity_logical_name: entity.to_string(),
            message,
            filtered_attributes: AHashSet::new(),
        }),
    )
    .with_actions(actions)
}

/// Builds a trigger-input map from literal pairs.
#[allow(dead_code)]
pub fn inputs(pairs: &[(&str, Value)]) -> AHashMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
