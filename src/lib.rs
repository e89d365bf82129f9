//! # Nagare - Flow Simulation Engine
//!
//! **Nagare** is a deterministic flow simulation engine for testing
//! record-driven automation logic. Test code registers declarative "flow"
//! definitions (a trigger plus an ordered tree of actions); the engine fires
//! them automatically in reaction to record mutations or manually on demand,
//! interprets their action tree against a per-run execution context, and
//! records verifiable results, so that automation behavior downstream of
//! create/update/delete events can be asserted without a live automation
//! runtime.
//!
//! ## Core Workflow
//!
//! 1.  **Bind a store**: Create a [`FlowSimulator`](engine::FlowSimulator)
//!     over your [`RecordStore`](store::RecordStore) collaborator. The store
//!     reports every durable mutation back through
//!     [`on_mutation`](engine::FlowSimulator::on_mutation).
//! 2.  **Register flows**: Build [`FlowDefinition`](flow::FlowDefinition)s in
//!     code, or convert an externally parsed document through the
//!     [`IntoFlow`](flow::IntoFlow) trait.
//! 3.  **Exercise the system under test**: Mutate records, or call
//!     [`simulate_trigger`](engine::FlowSimulator::simulate_trigger) to run a
//!     flow by hand.
//! 4.  **Assert**: Inspect run results and the execution history
//!     (`assert_triggered`, `assert_not_triggered`, `triggered_count`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nagare::prelude::*;
//! use std::sync::Arc;
//!
//! // The record store is an external collaborator; implement only the
//! // operations your scenario touches.
//! struct NullStore;
//! impl RecordStore for NullStore {}
//!
//! fn main() {
//!     let simulator = FlowSimulator::new(Arc::new(NullStore));
//!
//!     // A manual flow with a single compose action echoing a trigger input.
//!     let flow = FlowDefinition::new("greet", Trigger::Manual).with_actions(vec![
//!         Action::Connector(
//!             ConnectorAction::new("Compose")
//!                 .named("greeting")
//!                 .input("inputs", Expression::trigger_input("who")),
//!         ),
//!     ]);
//!     simulator.register_flow(flow).unwrap();
//!
//!     let mut inputs = AHashMap::new();
//!     inputs.insert("who".to_string(), serde_json::json!("world"));
//!     let result = simulator.simulate_trigger("greet", inputs).unwrap();
//!
//!     assert!(result.success);
//!     assert_eq!(
//!         result.result_for("greeting").unwrap().outputs.get("outputs"),
//!         Some(&serde_json::json!("world"))
//!     );
//!     simulator.assert_triggered("greet");
//! }
//! ```

pub mod connector;
pub mod context;
pub mod engine;
pub mod error;
pub mod expression;
pub mod flow;
pub mod prelude;
pub mod store;
