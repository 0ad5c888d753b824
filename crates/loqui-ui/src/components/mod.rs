//! View components.

pub(crate) mod generate;
pub(crate) mod header;
pub(crate) mod history;
pub(crate) mod models;
pub(crate) mod stats;
pub(crate) mod toast;
