//! Model list, selection, and load lifecycle.

pub mod state;
pub mod sync;

pub use state::{ModelPatch, ModelsState, PendingLoad, SnapshotOutcome};
pub use sync::ModelSync;
