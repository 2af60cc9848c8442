// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tracing::debug;

use crate::cancel::{CancelToken, NavigationScope};
use crate::config::RuntimeConfig;
use crate::error::QueueError;
use crate::pool::WorkerPool;
use crate::queue::WorkQueue;

/// Everything owner state needs to start background work.
///
/// A runtime bundles the owner's [`WorkQueue`], a [`WorkerPool`] and a
/// [`NavigationScope`]. It is an ordinary value held by the owner state, not a global, so
/// several independent runtimes can coexist in one process.
///
/// Dropping the runtime cancels every navigation lifetime, then joins the workers.
pub struct Runtime<T> {
    queue: WorkQueue<T>,
    navigation: NavigationScope,
    config: RuntimeConfig,
    pool: WorkerPool,
}

impl<T> core::fmt::Debug for Runtime<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runtime")
            .field("queue", &self.queue)
            .field("navigation", &self.navigation)
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish()
    }
}

impl<T> Runtime<T> {
    /// Starts the worker pool for `queue`'s owner.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or if a worker cannot be spawned.
    pub fn new(config: &RuntimeConfig, queue: WorkQueue<T>) -> Result<Self, QueueError> {
        Ok(Self {
            pool: WorkerPool::new(config)?,
            queue,
            navigation: NavigationScope::new(),
            config: config.clone(),
        })
    }

    /// The owner's queue.
    #[must_use]
    pub fn queue(&self) -> &WorkQueue<T> {
        &self.queue
    }

    /// The navigation scope tokens are derived from.
    #[must_use]
    pub fn navigation(&self) -> &NavigationScope {
        &self.navigation
    }

    /// The configuration this runtime was built with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Starts a new navigation lifetime, cancelling work derived from the previous one.
    pub fn begin_navigation(&self) -> CancelToken {
        debug!("beginning navigation");
        self.navigation.begin()
    }

    /// Cancels all background work and stops the workers.
    ///
    /// Off the owner thread this joins the workers. On the owner thread it only closes
    /// the pool: a task blocked in [`WorkQueue::run_sync`] needs the owner to keep
    /// processing, so workers finish after the owner resumes.
    pub fn shutdown(&mut self) {
        self.navigation.shutdown();
        if self.queue.is_owner_thread() {
            self.pool.close();
        } else {
            self.pool.shutdown();
        }
    }
}

impl<T: 'static> Runtime<T> {
    /// Runs `task` on a worker with a token derived from the current navigation.
    ///
    /// The task receives the token and a queue for reporting back to the owner. Returns
    /// the token so the caller can cancel the task.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::PoolClosed`] after [`shutdown`](Self::shutdown).
    pub fn spawn(
        &self,
        task: impl FnOnce(&CancelToken, &WorkQueue<T>) + Send + 'static,
    ) -> Result<CancelToken, QueueError> {
        let token = self.navigation.derive();
        self.spawn_with(token.clone(), task)?;
        Ok(token)
    }

    /// Runs `task` on a worker with an explicit token.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::PoolClosed`] after [`shutdown`](Self::shutdown).
    pub fn spawn_with(
        &self,
        token: CancelToken,
        task: impl FnOnce(&CancelToken, &WorkQueue<T>) + Send + 'static,
    ) -> Result<(), QueueError> {
        let queue = self.queue.clone();
        self.pool.spawn(token, move |token| task(token, &queue))
    }
}

impl<T> Drop for Runtime<T> {
    fn drop(&mut self) {
        self.navigation.shutdown();
    }
}
