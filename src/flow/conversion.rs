use super::definition::FlowDefinition;
use crate::error::FlowConversionError;

/// A trait for external flow-document parsers producing the canonical
/// [`FlowDefinition`].
///
/// The engine places no constraint on how a flow document is authored, only
/// on the shape of the parsed result. Implement this on whatever your parser
/// emits and hand the result to
/// [`FlowSimulator::register_flow`](crate::engine::FlowSimulator::register_flow).
pub trait IntoFlow {
    /// Consumes the object and converts it into a flow definition.
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError>;
}

impl IntoFlow for FlowDefinition {
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError> {
        Ok(self)
    }
}

/// The canonical JSON document shape deserializes directly.
impl IntoFlow for serde_json::Value {
    fn into_flow(self) -> Result<FlowDefinition, FlowConversionError> {
        serde_json::from_value(self).map_err(|e| FlowConversionError::InvalidDocument(e.to_string()))
    }
}
