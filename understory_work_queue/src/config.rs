// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sizing of a [`Runtime`](crate::Runtime).
///
/// Missing fields take their defaults and unknown fields are rejected:
///
/// ```rust
/// use understory_work_queue::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "worker_threads": 2 }"#).unwrap();
/// assert_eq!(config.worker_threads, 2);
/// assert_eq!(config.queue_capacity, None);
/// assert!(RuntimeConfig::from_json(r#"{ "workers": 2 }"#).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Number of background worker threads.
    pub worker_threads: usize,
    /// Bound of the owner queue; `None` is unbounded.
    pub queue_capacity: Option<usize>,
    /// Name prefix for spawned threads.
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            queue_capacity: None,
            thread_name: "understory-worker".to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input or unknown fields, and the
    /// matching variant if [`validate`](Self::validate) fails.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can build a runtime.
    ///
    /// # Errors
    ///
    /// Rejects zero workers, a zero-capacity queue and an empty thread name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.queue_capacity == Some(0) {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.thread_name.is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        Ok(())
    }

    /// Sets the number of worker threads.
    #[must_use]
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Bounds the owner queue.
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: Option<usize>) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Sets the thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.thread_name, "understory-worker");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(RuntimeConfig::from_json("{}").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn parses_every_field() {
        let config = RuntimeConfig::from_json(
            r#"{ "worker_threads": 1, "queue_capacity": 64, "thread_name": "io" }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            RuntimeConfig::default()
                .with_worker_threads(1)
                .with_queue_capacity(Some(64))
                .with_thread_name("io")
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            RuntimeConfig::from_json(r#"{ "worker_threads": 0 }"#),
            Err(ConfigError::ZeroWorkers)
        ));
        assert!(matches!(
            RuntimeConfig::from_json(r#"{ "queue_capacity": 0 }"#),
            Err(ConfigError::ZeroCapacity)
        ));
        assert!(matches!(
            RuntimeConfig::default().with_thread_name("").validate(),
            Err(ConfigError::EmptyThreadName)
        ));
        assert!(matches!(
            RuntimeConfig::from_json(r#"{ "threads": 2 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn serializes_back_to_json() {
        let config = RuntimeConfig::default().with_worker_threads(2);
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(RuntimeConfig::from_json(&text).unwrap(), config);
    }
}
