pub mod compose;
pub mod record_store;
pub mod registry;

pub use compose::*;
pub use record_store::*;
pub use registry::*;
