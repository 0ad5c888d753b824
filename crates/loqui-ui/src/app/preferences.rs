//! Persistence and environment helpers for the app shell.

use crate::logic::{push_url_for, resolve_api_base};
use gloo::storage::{LocalStorage, Storage};
use gloo::utils::window;

pub(crate) const API_BASE_KEY: &str = "loqui.api_base";

pub(crate) fn api_base_url() -> String {
    let stored = LocalStorage::get::<String>(API_BASE_KEY).ok();
    resolve_api_base(stored.as_deref())
}

pub(crate) fn push_url(api_base: &str) -> String {
    let location = window().location();
    let protocol = location.protocol().unwrap_or_else(|_| "http:".to_string());
    let host = location.host().unwrap_or_default();
    push_url_for(&protocol, &host, api_base)
}
