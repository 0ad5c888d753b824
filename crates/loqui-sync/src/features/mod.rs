//! Feature slices: pure state transformations plus the async controllers that
//! feed them.

pub mod generation;
pub mod history;
pub mod models;
pub mod system;
