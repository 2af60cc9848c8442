// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Work Queue: the single-writer concurrency model.
//!
//! ## Overview
//!
//! Element state is mutated by exactly one execution context, the [`Owner`]. Any number of
//! threads may *ask* for mutations by sending jobs through a [`WorkQueue`]; the owner runs
//! them one at a time, in enqueue order, so a job observes every job queued before it.
//!
//! - [`WorkQueue::dispatch`] queues a job and returns immediately.
//! - [`WorkQueue::run_sync`] queues a job and blocks until it ran, returning its result.
//!   It is the only blocking call, and refuses to run on the owner thread itself.
//! - [`WorkQueue::dispatch_once`] and [`WorkQueue::dispatch_guarded`] filter jobs on the
//!   owner with a [`OnceGuard`] or a [`CancelToken`].
//!
//! Slow work (network, disk) runs on a [`WorkerPool`] and reports back through the queue.
//! Tasks receive a token derived from the current [`NavigationScope`] lifetime; beginning a
//! new navigation cancels them, and results they still send are dropped on arrival.
//!
//! A [`Runtime`] bundles the three and is held by the owner state:
//!
//! ```rust
//! use std::time::Duration;
//! use understory_work_queue::{Owner, Runtime, RuntimeConfig};
//!
//! struct App {
//!     runtime: Runtime<App>,
//!     greeting: Option<String>,
//! }
//!
//! let config = RuntimeConfig::default().with_worker_threads(1);
//! let mut owner = Owner::with_runtime(&config, |runtime| App { runtime, greeting: None })?;
//!
//! owner.state().runtime.spawn(|token, queue| {
//!     let greeting = String::from("hello");
//!     let _ = queue.dispatch_guarded(token, move |app: &mut App| app.greeting = Some(greeting));
//! })?;
//!
//! assert!(owner.run_until(|app| app.greeting.is_some(), Duration::from_secs(10)));
//! # Ok::<(), understory_work_queue::QueueError>(())
//! ```
//!
//! [`spawn_owner`] instead runs the owner loop on a dedicated thread, so owner state that
//! is not `Send` can still be driven from anywhere through its queue.

mod cancel;
mod config;
mod error;
mod pool;
mod queue;
mod runtime;

pub use cancel::{CancelToken, NavigationScope};
pub use config::RuntimeConfig;
pub use error::{ConfigError, QueueError};
pub use pool::WorkerPool;
pub use queue::{OnceGuard, Owner, OwnerHandle, WorkQueue, spawn_owner};
pub use runtime::Runtime;
