//! Command handlers grouped by concern.

pub(crate) mod generate;
pub(crate) mod history;
pub(crate) mod models;
pub(crate) mod stats;
pub(crate) mod watch;
