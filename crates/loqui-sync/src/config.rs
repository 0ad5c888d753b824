//! Tunables shared by the controllers.

use crate::push::reconnect::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default API base path, relative to the page origin.
pub const DEFAULT_API_BASE: &str = "/api";

/// Synchronization settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base path or absolute URL of the REST API.
    pub api_base: String,
    /// Model status poll interval.
    pub poll_interval_ms: u64,
    /// System info poll interval.
    pub system_poll_interval_ms: u64,
    /// History page size.
    pub history_page_size: u32,
    /// How long an optimistic load may stay uncorroborated before it is rolled back.
    pub optimistic_timeout_ms: u64,
    /// Push channel reconnect schedule.
    pub reconnect: ReconnectPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval_ms: 5_000,
            system_poll_interval_ms: 10_000,
            history_page_size: 50,
            optimistic_timeout_ms: 30_000,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Invalid [`SyncConfig`] value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Offending field.
        field: &'static str,
    },
    /// History page size above the backend's accepted range.
    #[error("history_page_size must be at most {max}, got {value}")]
    PageTooLarge {
        /// Configured value.
        value: u32,
        /// Upper bound.
        max: u32,
    },
    /// Empty API base.
    #[error("api_base must not be empty")]
    EmptyBase,
}

/// Largest page the history endpoint accepts.
pub const MAX_HISTORY_PAGE: u32 = 200;

impl SyncConfig {
    /// Check every field, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an interval is zero, the page size is out of
    /// range, or the base is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::EmptyBase);
        }
        for (field, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("system_poll_interval_ms", self.system_poll_interval_ms),
            ("optimistic_timeout_ms", self.optimistic_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.history_page_size == 0 {
            return Err(ConfigError::Zero {
                field: "history_page_size",
            });
        }
        if self.history_page_size > MAX_HISTORY_PAGE {
            return Err(ConfigError::PageTooLarge {
                value: self.history_page_size,
                max: MAX_HISTORY_PAGE,
            });
        }
        Ok(())
    }
}
