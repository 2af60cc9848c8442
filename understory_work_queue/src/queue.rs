// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The single-writer owner and its queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crossbeam::channel::{
    self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::cancel::CancelToken;
use crate::config::RuntimeConfig;
use crate::error::QueueError;
use crate::runtime::Runtime;

type Job<T> = Box<dyn FnOnce(&mut T) + Send>;

enum Message<T> {
    Run(Job<T>),
    Shutdown,
}

/// A cloneable, `Send` handle for submitting jobs to an [`Owner`].
///
/// Jobs run one at a time on the owner, in the order they were enqueued, with exclusive
/// access to its state.
pub struct WorkQueue<T> {
    sender: Sender<Message<T>>,
    // The thread currently driving the owner.
    owner_thread: Arc<RwLock<Option<ThreadId>>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            owner_thread: Arc::clone(&self.owner_thread),
        }
    }
}

impl<T> core::fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("pending", &self.sender.len())
            .field("owner_thread", &*self.owner_thread.read())
            .finish()
    }
}

impl<T> WorkQueue<T> {
    fn send(&self, message: Message<T>) -> Result<(), QueueError> {
        // The owner cannot drain its own full queue while blocked on it.
        if self.is_owner_thread() {
            return self.sender.try_send(message).map_err(|err| match err {
                TrySendError::Full(_) => QueueError::WouldDeadlock,
                TrySendError::Disconnected(_) => QueueError::Closed,
            });
        }
        self.sender.send(message).map_err(|_| QueueError::Closed)
    }

    /// Queues `job` without waiting for it.
    ///
    /// Producers block while a bounded queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the owner is gone, and
    /// [`QueueError::WouldDeadlock`] when the owner thread queues onto its own full queue.
    pub fn dispatch(&self, job: impl FnOnce(&mut T) + Send + 'static) -> Result<(), QueueError> {
        self.send(Message::Run(Box::new(job)))
    }

    /// Runs `job` on the owner and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::WouldDeadlock`] when called from the thread driving the owner,
    /// [`QueueError::Closed`] if the owner is gone, and [`QueueError::Dropped`] if the owner
    /// was dropped before reaching the job.
    pub fn run_sync<R: Send + 'static>(
        &self,
        job: impl FnOnce(&mut T) -> R + Send + 'static,
    ) -> Result<R, QueueError> {
        if self.is_owner_thread() {
            return Err(QueueError::WouldDeadlock);
        }
        let (reply, result) = channel::bounded(1);
        self.send(Message::Run(Box::new(move |state| {
            // The caller may have given up waiting; nothing to report then.
            let _ = reply.send(job(state));
        })))?;
        result.recv().map_err(|_| QueueError::Dropped)
    }

    /// Queues `job` to run at most once across every dispatch sharing `guard`.
    ///
    /// The guard is claimed on the owner, so racing producers may all enqueue and only
    /// the first job to reach the owner runs.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the owner is gone.
    pub fn dispatch_once(
        &self,
        guard: &OnceGuard,
        job: impl FnOnce(&mut T) + Send + 'static,
    ) -> Result<(), QueueError> {
        let guard = guard.clone();
        self.dispatch(move |state| {
            if guard.claim() {
                job(state);
            } else {
                trace!("skipping job whose once guard was already claimed");
            }
        })
    }

    /// Queues `job` to run only if `token` is still live when the owner reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the owner is gone.
    pub fn dispatch_guarded(
        &self,
        token: &CancelToken,
        job: impl FnOnce(&mut T) + Send + 'static,
    ) -> Result<(), QueueError> {
        let token = token.clone();
        self.dispatch(move |state| {
            if token.is_cancelled() {
                trace!("skipping job cancelled before it reached the owner");
            } else {
                job(state);
            }
        })
    }

    /// Asks the owner to stop after the jobs queued before this call.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the owner is already gone.
    pub fn shutdown(&self) -> Result<(), QueueError> {
        self.send(Message::Shutdown)
    }

    /// Number of messages waiting for the owner.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    /// Returns `true` if nothing is waiting for the owner.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    /// Returns `true` if the calling thread is the one driving the owner.
    #[must_use]
    pub fn is_owner_thread(&self) -> bool {
        *self.owner_thread.read() == Some(thread::current().id())
    }
}

/// A flag shared by [`WorkQueue::dispatch_once`] calls.
#[derive(Clone, Debug, Default)]
pub struct OnceGuard {
    claimed: Arc<AtomicBool>,
}

impl OnceGuard {
    /// Creates an unclaimed guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the guard; returns `true` only for the first caller.
    pub fn claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns `true` once the guard is claimed.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// The single execution context allowed to mutate `T`.
///
/// Jobs submitted through any [`WorkQueue`] clone run here, sequentially. Drive the owner
/// in place with [`process_pending`](Self::process_pending),
/// [`run_until`](Self::run_until) or [`run`](Self::run), or hand it a thread of its own
/// with [`spawn_owner`].
///
/// ```rust
/// use understory_work_queue::Owner;
///
/// let mut owner = Owner::new(0_u32);
/// let queue = owner.queue();
/// for _ in 0..3 {
///     queue.dispatch(|count| *count += 1).unwrap();
/// }
/// assert_eq!(owner.process_pending(), 3);
/// assert_eq!(*owner.state(), 3);
/// ```
pub struct Owner<T> {
    // Declared first so queued jobs are discarded before `state` drops.
    inbox: Inbox<T>,
    queue: WorkQueue<T>,
    shut_down: bool,
    state: T,
}

/// Receiving end of the queue; discards whatever is left when dropped, which fails the
/// `run_sync` callers still waiting on those jobs.
struct Inbox<T>(Receiver<Message<T>>);

impl<T> Drop for Inbox<T> {
    fn drop(&mut self) {
        while self.0.try_recv().is_ok() {}
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Owner<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Owner")
            .field("pending", &self.inbox.0.len())
            .field("shut_down", &self.shut_down)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T> Owner<T> {
    /// Creates an owner with an unbounded queue.
    pub fn new(state: T) -> Self {
        Self::with_capacity(None, |_| state)
    }

    /// Creates an owner whose state is built from its own queue.
    ///
    /// `capacity` bounds the queue; producers block while it is full.
    pub fn with_capacity(capacity: Option<usize>, init: impl FnOnce(WorkQueue<T>) -> T) -> Self {
        let (queue, inbox) = open(capacity);
        let state = init(queue.clone());
        Self::assemble(queue, inbox, state)
    }

    /// Creates an owner together with a [`Runtime`] for its state to hold.
    ///
    /// # Errors
    ///
    /// Fails if the worker threads cannot be spawned.
    pub fn with_runtime(
        config: &RuntimeConfig,
        init: impl FnOnce(Runtime<T>) -> T,
    ) -> Result<Self, QueueError> {
        let (queue, inbox) = open(config.queue_capacity);
        let runtime = Runtime::new(config, queue.clone())?;
        let state = init(runtime);
        Ok(Self::assemble(queue, inbox, state))
    }

    fn assemble(queue: WorkQueue<T>, inbox: Inbox<T>, state: T) -> Self {
        *queue.owner_thread.write() = Some(thread::current().id());
        Self {
            inbox,
            queue,
            shut_down: false,
            state,
        }
    }

    /// A new handle to this owner's queue.
    #[must_use]
    pub fn queue(&self) -> WorkQueue<T> {
        self.queue.clone()
    }

    /// The owned state.
    #[must_use]
    pub fn state(&self) -> &T {
        &self.state
    }

    /// The owned state, mutably.
    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    /// Consumes the owner, discarding queued jobs.
    pub fn into_state(self) -> T {
        self.state
    }

    /// Returns `true` once a shutdown message was processed.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Records the calling thread as the one driving this owner.
    fn bind(&self) {
        let current = Some(thread::current().id());
        if *self.queue.owner_thread.read() != current {
            *self.queue.owner_thread.write() = current;
        }
    }

    fn handle(&mut self, message: Message<T>) -> bool {
        match message {
            Message::Run(job) => {
                job(&mut self.state);
                true
            }
            Message::Shutdown => {
                debug!("owner received shutdown");
                self.shut_down = true;
                false
            }
        }
    }

    /// Runs every job already queued, without blocking.
    ///
    /// Jobs queued by those jobs also run. Stops at a shutdown message. Returns how many
    /// jobs ran.
    pub fn process_pending(&mut self) -> usize {
        self.bind();
        let mut ran = 0;
        while !self.shut_down {
            match self.inbox.0.try_recv() {
                Ok(message) => {
                    if self.handle(message) {
                        ran += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        ran
    }

    /// Processes jobs until `done` holds for the state or `timeout` elapses.
    ///
    /// Returns `true` if `done` held.
    pub fn run_until(&mut self, mut done: impl FnMut(&T) -> bool, timeout: Duration) -> bool {
        self.bind();
        let deadline = Instant::now() + timeout;
        loop {
            if done(&self.state) {
                return true;
            }
            if self.shut_down {
                return false;
            }
            match self.inbox.0.recv_deadline(deadline) {
                Ok(message) => {
                    self.handle(message);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return done(&self.state);
                }
            }
        }
    }

    /// Processes jobs until a shutdown message arrives.
    pub fn run(&mut self) {
        self.bind();
        debug!("owner loop started");
        while !self.shut_down {
            let Ok(message) = self.inbox.0.recv() else {
                break;
            };
            self.handle(message);
        }
        debug!("owner loop stopped");
    }
}

fn open<T>(capacity: Option<usize>) -> (WorkQueue<T>, Inbox<T>) {
    let (sender, receiver) = match capacity {
        Some(capacity) => channel::bounded(capacity),
        None => channel::unbounded(),
    };
    let queue = WorkQueue {
        sender,
        owner_thread: Arc::new(RwLock::new(None)),
    };
    (queue, Inbox(receiver))
}

/// An [`Owner`] running on its own thread, started by [`spawn_owner`].
pub struct OwnerHandle<T> {
    queue: WorkQueue<T>,
    thread: Option<JoinHandle<()>>,
}

impl<T> core::fmt::Debug for OwnerHandle<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OwnerHandle")
            .field("queue", &self.queue)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl<T> OwnerHandle<T> {
    /// The owner's queue.
    #[must_use]
    pub fn queue(&self) -> &WorkQueue<T> {
        &self.queue
    }

    /// Stops the owner after the jobs already queued and waits for its thread.
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        // Closed means the owner loop already exited.
        let _ = self.queue.shutdown();
        if thread.join().is_err() {
            warn!("owner thread panicked");
        }
    }
}

impl<T> Drop for OwnerHandle<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builds the owner state on a dedicated thread and runs the owner loop there.
///
/// The state never leaves that thread, so it need not be `Send`. `init` receives the
/// [`Runtime`] the state should keep for spawning background work.
///
/// # Errors
///
/// Fails if the owner thread or the worker threads cannot be spawned.
pub fn spawn_owner<T: 'static>(
    config: &RuntimeConfig,
    init: impl FnOnce(Runtime<T>) -> T + Send + 'static,
) -> Result<OwnerHandle<T>, QueueError> {
    let config = config.clone();
    let (ready, started) = channel::bounded(1);
    let thread = thread::Builder::new()
        .name(format!("{}-owner", config.thread_name))
        .spawn(move || match Owner::with_runtime(&config, init) {
            Ok(mut owner) => {
                if ready.send(Ok(owner.queue())).is_ok() {
                    owner.run();
                }
            }
            Err(err) => {
                let _ = ready.send(Err(err));
            }
        })?;
    match started.recv() {
        Ok(Ok(queue)) => {
            debug!("owner thread started");
            Ok(OwnerHandle {
                queue,
                thread: Some(thread),
            })
        }
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => {
            let _ = thread.join();
            Err(QueueError::Dropped)
        }
    }
}
