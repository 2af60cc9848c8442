// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    done: Receiver<()>,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    // Dropped on cancel, which disconnects `done`.
    trigger: Option<Sender<()>>,
    children: Vec<Weak<Inner>>,
}

/// A shareable, one-way cancellation flag.
///
/// Cancelling a token cancels every token derived from it with [`child`](Self::child).
/// Cancellation is terminal.
///
/// [`done`](Self::done) exposes a channel that disconnects on cancel, so a worker can wait
/// on cancellation and other work together:
///
/// ```rust
/// use crossbeam::channel::after;
/// use crossbeam::select;
/// use std::time::Duration;
/// use understory_work_queue::CancelToken;
///
/// let token = CancelToken::new();
/// token.cancel();
/// select! {
///     recv(token.done()) -> _ => {}
///     recv(after(Duration::from_secs(5))) -> _ => panic!("not cancelled"),
/// }
/// ```
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Creates a live root token.
    #[must_use]
    pub fn new() -> Self {
        let (trigger, done) = channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                done,
                state: Mutex::new(State {
                    trigger: Some(trigger),
                    children: Vec::new(),
                }),
            }),
        }
    }

    /// Derives a token that is cancelled with this one.
    ///
    /// A child of a cancelled token starts out cancelled.
    #[must_use]
    pub fn child(&self) -> Self {
        let child = Self::new();
        let mut state = self.inner.state.lock();
        if state.trigger.is_none() {
            drop(state);
            child.cancel();
        } else {
            state.children.retain(|c| c.strong_count() > 0);
            state.children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Cancels this token and every token derived from it.
    ///
    /// Cancelling twice does nothing.
    pub fn cancel(&self) {
        let children = {
            let mut state = self.inner.state.lock();
            let Some(trigger) = state.trigger.take() else {
                return;
            };
            self.inner.cancelled.store(true, Ordering::Release);
            drop(trigger);
            core::mem::take(&mut state.children)
        };
        for child in children.iter().filter_map(Weak::upgrade) {
            Self { inner: child }.cancel();
        }
    }

    /// Returns `true` once the token is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// A channel that never yields a message and disconnects on cancel.
    #[must_use]
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Blocks until the token is cancelled or `timeout` elapses.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.inner.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
        }
    }

    /// Returns `true` if both handles refer to the same token.
    #[must_use]
    pub fn same_token(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// The lifetime of the current navigation.
///
/// Background work derives its token from the current lifetime with
/// [`derive`](Self::derive). [`begin`](Self::begin) starts a new lifetime and cancels the
/// previous one, so everything started for the old page stops.
#[derive(Debug)]
pub struct NavigationScope {
    root: CancelToken,
    current: Mutex<CancelToken>,
}

impl Default for NavigationScope {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationScope {
    /// Creates a scope with a live first lifetime.
    #[must_use]
    pub fn new() -> Self {
        let root = CancelToken::new();
        let current = Mutex::new(root.child());
        Self { root, current }
    }

    /// The token of the current lifetime.
    #[must_use]
    pub fn current(&self) -> CancelToken {
        self.current.lock().clone()
    }

    /// Derives a token from the current lifetime.
    #[must_use]
    pub fn derive(&self) -> CancelToken {
        self.current.lock().child()
    }

    /// Cancels the current lifetime and starts a new one, returning its token.
    ///
    /// After [`shutdown`](Self::shutdown) the new lifetime starts out cancelled.
    pub fn begin(&self) -> CancelToken {
        let next = self.root.child();
        let previous = core::mem::replace(&mut *self.current.lock(), next.clone());
        previous.cancel();
        next
    }

    /// Cancels every lifetime, present and future.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// Returns `true` after [`shutdown`](Self::shutdown).
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}
