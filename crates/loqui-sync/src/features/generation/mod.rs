//! Generation form and submission.

pub mod state;
pub mod submit;

pub use state::{BlockedReason, GenerationForm, GenerationState};
pub use submit::{GenerateError, GenerationController};
