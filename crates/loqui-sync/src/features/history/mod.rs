//! Generation history list.

pub mod state;
pub mod sync;

pub use state::HistoryState;
pub use sync::HistorySync;
