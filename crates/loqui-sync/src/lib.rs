#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused_must_use)]
#![allow(clippy::module_name_repetitions)]
//! Client-side synchronization core for the Loqui TTS web client.
//!
//! # Design
//! - One [`store::AppStore`] snapshot holds every slice the views read; writers go
//!   through [`store::StoreHandle::reduce`] so each change is a single replacement.
//! - Controllers talk to the backend through [`transport::TtsApi`], which the wasm
//!   front-end and the CLI implement over their own HTTP stacks.
//! - The push listener is generic over its socket and timer so the reconnect rules
//!   run identically in the browser, the terminal, and tests.
//! - Nothing here touches the DOM; everything is testable on the host target.

pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod format;
pub mod push;
pub mod stats;
pub mod store;
pub mod timer;
pub mod transport;

pub use config::{ConfigError, SyncConfig};
pub use error::{ApiError, ApiResult};
pub use push::reconnect::ReconnectPolicy;
pub use store::{AppStore, SessionStore, StoreHandle};
pub use timer::Timer;
pub use transport::TtsApi;
