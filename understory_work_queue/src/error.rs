// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io;

use thiserror::Error;

/// Error returned when work cannot be queued or its result cannot be delivered.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The owner is gone; nothing will process the queue.
    #[error("the owner queue is closed")]
    Closed,
    /// The job was discarded before it ran.
    #[error("the job was dropped before it ran")]
    Dropped,
    /// The owner thread made a call that would wait on itself: a `run_sync`, or a send
    /// onto its own full queue.
    #[error("the owner thread would wait on itself")]
    WouldDeadlock,
    /// The worker pool was shut down.
    #[error("the worker pool is shut down")]
    PoolClosed,
    /// A thread could not be spawned.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] io::Error),
    /// The runtime configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error returned by [`RuntimeConfig`](crate::RuntimeConfig) parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for a runtime configuration.
    #[error("invalid runtime configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// `worker_threads` is zero.
    #[error("worker_threads must be at least 1")]
    ZeroWorkers,
    /// `queue_capacity` is `Some(0)`.
    #[error("queue_capacity must be at least 1 when set")]
    ZeroCapacity,
    /// `thread_name` is empty.
    #[error("thread_name must not be empty")]
    EmptyThreadName,
}
