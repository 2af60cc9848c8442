// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use tracing::{debug, trace, warn};

use crate::cancel::CancelToken;
use crate::config::RuntimeConfig;
use crate::error::QueueError;

type Task = Box<dyn FnOnce(&CancelToken) + Send>;

/// A fixed set of named background threads.
///
/// Tasks carry a [`CancelToken`]; a task whose token is cancelled before a worker picks
/// it up is skipped. Workers never touch owner state: they report back through a
/// [`WorkQueue`](crate::WorkQueue).
///
/// Dropping the pool waits for running tasks to return.
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<(CancelToken, Task)>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `config.worker_threads` workers named `<thread_name>-<index>`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or if a thread cannot be spawned.
    pub fn new(config: &RuntimeConfig) -> Result<Self, QueueError> {
        config.validate()?;
        let (sender, receiver) = channel::unbounded::<(CancelToken, Task)>();
        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(config.worker_threads),
        };
        for index in 0..config.worker_threads {
            let receiver = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name))
                .spawn(move || {
                    trace!(index, "worker started");
                    for (token, task) in receiver.iter() {
                        if token.is_cancelled() {
                            trace!(index, "skipping task cancelled before it started");
                            continue;
                        }
                        task(&token);
                    }
                    trace!(index, "worker stopped");
                })?;
            pool.workers.push(worker);
        }
        debug!(workers = pool.workers.len(), "worker pool started");
        Ok(pool)
    }

    /// Queues `task` for the next free worker.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::PoolClosed`] after [`shutdown`](Self::shutdown).
    pub fn spawn(
        &self,
        token: CancelToken,
        task: impl FnOnce(&CancelToken) + Send + 'static,
    ) -> Result<(), QueueError> {
        let sender = self.sender.as_ref().ok_or(QueueError::PoolClosed)?;
        sender
            .send((token, Box::new(task)))
            .map_err(|_| QueueError::PoolClosed)
    }

    /// Number of worker threads still attached to the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` once every worker was joined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Stops accepting tasks without waiting for the workers.
    ///
    /// Workers drain the queued tasks and exit on their own. Use this where joining could
    /// deadlock, such as on an owner thread that a running task is waiting for.
    pub fn close(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        self.workers.clear();
        debug!("worker pool closed");
    }

    /// Stops accepting tasks, lets queued ones drain and joins every worker.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        debug!("worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
