use super::registry::ConnectorHandler;
use crate::context::{ExecutionContext, OutputMap};
use crate::error::ConnectorError;
use crate::expression::Evaluator;
use crate::flow::ConnectorAction;
use crate::store::{Entity, EntityReference, FileData, ListQuery, OrderBy, RecordStore};
use ahash::AHashMap;
use serde_json::{Map, Value};

/// Executes the record-store operation family against the store collaborator.
///
/// One handler instance serves all ten action types; any error coming back
/// from the store becomes an ordinary action failure.
pub struct RecordStoreHandler;

impl RecordStoreHandler {
    /// The action types this handler is registered under by default.
    pub const ACTION_TYPES: &'static [&'static str] = &[
        "CreateRecord",
        "RetrieveRecord",
        "UpdateRecord",
        "DeleteRecord",
        "ListRecords",
        "RelateRecords",
        "UnrelateRecords",
        "ExecuteAction",
        "UploadFile",
        "DownloadFile",
    ];
}

impl ConnectorHandler for RecordStoreHandler {
    fn can_handle(&self, action: &ConnectorAction) -> bool {
        Self::ACTION_TYPES.contains(&action.action_type.as_str())
    }

    fn execute(
        &self,
        action: &ConnectorAction,
        store: &dyn RecordStore,
        context: &mut ExecutionContext,
    ) -> Result<OutputMap, ConnectorError> {
        let inputs = Inputs {
            action,
            context: &*context,
        };
        match action.action_type.as_str() {
            "CreateRecord" => {
                let mut entity = Entity::new(inputs.string("entityName")?);
                entity.attributes = inputs.object_or_default("attributes")?;
                let id = store.create(entity)?;
                Ok(single_output("id", Value::String(id)))
            }
            "RetrieveRecord" => {
                let entity_name = inputs.string("entityName")?;
                let id = inputs.string("id")?;
                let columns = inputs.string_list_or_default("columns")?;
                let record = store.retrieve(&entity_name, &id, &columns)?;
                Ok(single_output("record", record_to_value(record)))
            }
            "UpdateRecord" => {
                let mut entity =
                    Entity::with_id(inputs.string("entityName")?, inputs.string("id")?);
                entity.attributes = inputs.object_or_default("attributes")?;
                let id = entity.id.clone();
                store.update(entity)?;
                Ok(single_output("id", Value::String(id)))
            }
            "DeleteRecord" => {
                let entity_name = inputs.string("entityName")?;
                let id = inputs.string("id")?;
                store.delete(&entity_name, &id)?;
                Ok(OutputMap::new())
            }
            "ListRecords" => {
                let query = ListQuery {
                    entity_name: inputs.string("entityName")?,
                    filter: inputs.optional("filter")?,
                    top: inputs.optional_count("top")?,
                    skip: inputs.optional_count("skip")?,
                    order_by: inputs.order_by("orderBy")?,
                    include_total_count: inputs.bool_or_default("includeTotalCount")?,
                    page_token: inputs.optional_string("pageToken")?,
                };
                let page = store.list(query)?;
                let mut outputs = OutputMap::new();
                outputs.insert(
                    "records".to_string(),
                    Value::Array(page.records.into_iter().map(record_to_value).collect()),
                );
                if let Some(total) = page.total_count {
                    outputs.insert("totalCount".to_string(), total.into());
                }
                if let Some(token) = page.next_page_token {
                    outputs.insert("nextPageToken".to_string(), Value::String(token));
                }
                Ok(outputs)
            }
            "RelateRecords" | "UnrelateRecords" => {
                let entity_name = inputs.string("entityName")?;
                let id = inputs.string("id")?;
                let relationship = inputs.string("relationshipName")?;
                let related = inputs.references("relatedRecords")?;
                if action.action_type == "RelateRecords" {
                    store.relate(&entity_name, &id, &relationship, related)?;
                } else {
                    store.unrelate(&entity_name, &id, &relationship, related)?;
                }
                Ok(OutputMap::new())
            }
            "ExecuteAction" => {
                let name = inputs.string("actionName")?;
                let parameters = inputs.object_or_default("parameters")?;
                Ok(store.execute_custom_action(&name, parameters)?)
            }
            "UploadFile" => {
                let entity_name = inputs.string("entityName")?;
                let id = inputs.string("id")?;
                let column = inputs.string("columnName")?;
                let content = inputs.string("content")?;
                let file_name = inputs
                    .optional_string("fileName")?
                    .unwrap_or_else(|| column.clone());
                let file = FileData {
                    file_name,
                    content: content.into_bytes(),
                };
                store.upload_file(&entity_name, &id, &column, file)?;
                Ok(OutputMap::new())
            }
            "DownloadFile" => {
                let entity_name = inputs.string("entityName")?;
                let id = inputs.string("id")?;
                let column = inputs.string("columnName")?;
                let file = store.download_file(&entity_name, &id, &column)?;
                let mut outputs = OutputMap::new();
                outputs.insert("fileName".to_string(), Value::String(file.file_name));
                outputs.insert(
                    "content".to_string(),
                    Value::String(String::from_utf8_lossy(&file.content).into_owned()),
                );
                Ok(outputs)
            }
            other => Err(ConnectorError::NoHandler(other.to_string())),
        }
    }
}

fn single_output(output: &str, value: Value) -> OutputMap {
    let mut outputs = OutputMap::new();
    outputs.insert(output.to_string(), value);
    outputs
}

/// The attribute view of a record, with its id and entity name alongside.
fn record_to_value(record: Entity) -> Value {
    let mut fields: Map<String, Value> = record.attributes.into_iter().collect();
    fields.insert("id".to_string(), Value::String(record.id));
    fields.insert(
        "entityName".to_string(),
        Value::String(record.logical_name),
    );
    Value::Object(fields)
}

/// Evaluates and type-checks one action's expression inputs.
struct Inputs<'a> {
    action: &'a ConnectorAction,
    context: &'a ExecutionContext,
}

impl Inputs<'_> {
    fn optional(&self, input: &str) -> Result<Option<Value>, ConnectorError> {
        match self.action.inputs.get(input) {
            None => Ok(None),
            Some(expression) => Ok(Some(Evaluator::new(self.context).evaluate(expression)?)),
        }
    }

    fn required(&self, input: &str) -> Result<Value, ConnectorError> {
        self.optional(input)?
            .ok_or_else(|| ConnectorError::MissingInput {
                action_type: self.action.action_type.clone(),
                input: input.to_string(),
            })
    }

    fn invalid(&self, input: &str, expected: &str) -> ConnectorError {
        ConnectorError::InvalidInput {
            action_type: self.action.action_type.clone(),
            input: input.to_string(),
            expected: expected.to_string(),
        }
    }

    fn string(&self, input: &str) -> Result<String, ConnectorError> {
        match self.required(input)? {
            Value::String(s) => Ok(s),
            _ => Err(self.invalid(input, "a string")),
        }
    }

    fn optional_string(&self, input: &str) -> Result<Option<String>, ConnectorError> {
        match self.optional(input)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(self.invalid(input, "a string")),
        }
    }

    fn object_or_default(&self, input: &str) -> Result<AHashMap<String, Value>, ConnectorError> {
        match self.optional(input)? {
            None | Some(Value::Null) => Ok(AHashMap::new()),
            Some(Value::Object(fields)) => Ok(fields.into_iter().collect()),
            Some(_) => Err(self.invalid(input, "an object")),
        }
    }

    fn optional_count(&self, input: &str) -> Result<Option<usize>, ConnectorError> {
        match self.optional(input)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|n| Some(n as usize))
                .ok_or_else(|| self.invalid(input, "a non-negative integer")),
            Some(_) => Err(self.invalid(input, "a non-negative integer")),
        }
    }

    fn bool_or_default(&self, input: &str) -> Result<bool, ConnectorError> {
        match self.optional(input)? {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(b),
            Some(_) => Err(self.invalid(input, "a boolean")),
        }
    }

    fn string_list_or_default(&self, input: &str) -> Result<Vec<String>, ConnectorError> {
        match self.optional(input)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|_| self.invalid(input, "an array of strings")),
        }
    }

    /// Parses `["name", "name desc"]` style ordering keys.
    fn order_by(&self, input: &str) -> Result<Vec<OrderBy>, ConnectorError> {
        let keys = self.string_list_or_default(input)?;
        keys.iter()
            .map(|key| {
                let mut parts = key.split_whitespace();
                let attribute = parts
                    .next()
                    .ok_or_else(|| self.invalid(input, "an array of ordering keys"))?;
                let descending = match parts.next() {
                    None => false,
                    Some(direction) if direction.eq_ignore_ascii_case("desc") => true,
                    Some(direction) if direction.eq_ignore_ascii_case("asc") => false,
                    Some(_) => return Err(self.invalid(input, "an array of ordering keys")),
                };
                Ok(OrderBy {
                    attribute: attribute.to_string(),
                    descending,
                })
            })
            .collect()
    }

    fn references(&self, input: &str) -> Result<Vec<EntityReference>, ConnectorError> {
        let value = self.required(input)?;
        serde_json::from_value(value)
            .map_err(|_| self.invalid(input, "an array of entity references"))
    }
}
