// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background data fetching built on transitions.
//!
//! Each element with registered fetchers owns an aggregate transition named
//! [`FETCH_TRANSITION`] and one child transition per property, named
//! `fetch/<property>`. [`Tree::fetch`] starts the aggregate and every child that has not
//! ended yet; each fetcher runs on a worker and its result is sent back to the owner.
//! Success writes the [`Category::Data`] property and ends the child, failure records a
//! [`FetchError`] and errors it. The aggregate ends once every child has ended.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace, warn};
use understory_property::Category;
use understory_transition::TransitionPhase;
use understory_value::{DecodeError, Value};
use understory_work_queue::{CancelToken, QueueError};

use crate::id::ElementId;
use crate::transitions::TransitionHooks;
use crate::tree::Tree;

/// Name of the aggregate fetch transition.
pub const FETCH_TRANSITION: &str = "fetch";

fn child_transition(property: &str) -> String {
    format!("{FETCH_TRANSITION}/{property}")
}

/// Why a fetch failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request itself failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The response could not be turned into a value.
    #[error("could not decode response: {0}")]
    Decode(String),
    /// The fetch was cancelled before it completed.
    #[error("fetch was cancelled")]
    Cancelled,
}

impl From<DecodeError> for FetchError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Produces the value of one property, on a worker thread.
///
/// Implementations should check the token around blocking work and return
/// [`FetchError::Cancelled`] once it fires. Implemented for closures.
pub trait Fetcher: Send + Sync {
    /// Fetches the value.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing the failure.
    fn fetch(&self, token: &CancelToken) -> Result<Value, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&CancelToken) -> Result<Value, FetchError> + Send + Sync,
{
    fn fetch(&self, token: &CancelToken) -> Result<Value, FetchError> {
        self(token)
    }
}

/// Fetchers and outstanding errors of one element.
#[derive(Default)]
pub(crate) struct FetchState {
    fetchers: Vec<(Arc<str>, Arc<dyn Fetcher>)>,
    errors: BTreeMap<Arc<str>, FetchError>,
}

impl Tree {
    /// Registers `fetcher` as the source of the `Data` property `property` on `id`.
    ///
    /// Registering the same property again replaces its fetcher. Adding a property to an
    /// element whose fetch already ended resets the aggregate so the next
    /// [`fetch`](Self::fetch) loads the new property.
    ///
    /// The per-property transition is `fetch/<property>`. If it was already defined with
    /// [`define_transition`](Self::define_transition), its hooks are kept and observe the
    /// outcome of every load.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn register_fetch(
        &mut self,
        id: ElementId,
        property: impl Into<Arc<str>>,
        fetcher: impl Fetcher + 'static,
    ) {
        let property = property.into();
        let fetcher: Arc<dyn Fetcher> = Arc::new(fetcher);
        let state = &mut self.element_mut(id).fetch;
        if let Some(entry) = state.fetchers.iter_mut().find(|(p, _)| *p == property) {
            entry.1 = fetcher;
            return;
        }
        state.fetchers.push((Arc::clone(&property), fetcher));

        if !self.has_transition(id, FETCH_TRANSITION) {
            self.define_transition(id, FETCH_TRANSITION, TransitionHooks::new());
        }
        let child = child_transition(&property);
        if !self.has_transition(id, &child) {
            self.define_transition(id, child.as_str(), TransitionHooks::new());
        }
        self.link_transitions(id, FETCH_TRANSITION, &child);
        if self.transition_phase(id, FETCH_TRANSITION) == Some(TransitionPhase::Ended) {
            self.invalidate_transition(id, FETCH_TRANSITION);
        }
        debug!(%id, %property, "registered fetcher");
    }

    /// Starts fetching every registered property of `id` that has not been loaded.
    ///
    /// Properties already loading or loaded are skipped, errored and cancelled ones are
    /// retried. Does nothing once the aggregate has ended; see
    /// [`invalidate_fetch`](Self::invalidate_fetch). Returns the number of fetchers
    /// started.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] if the tree has no runtime, or the pool error if a
    /// fetcher could not be spawned. In the latter case the property is marked errored.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn fetch(&mut self, id: ElementId) -> Result<usize, QueueError> {
        self.assert_alive(id);
        if self.runtime.is_none() {
            return Err(QueueError::Closed);
        }
        match self.transition_phase(id, FETCH_TRANSITION) {
            None | Some(TransitionPhase::Ended) => return Ok(0),
            Some(_) => {}
        }
        self.start_transition(id, FETCH_TRANSITION, Value::from(true));

        let due: Vec<(Arc<str>, Arc<dyn Fetcher>)> = {
            let element = self.element(id);
            element
                .fetch
                .fetchers
                .iter()
                .filter(|(property, _)| {
                    !matches!(
                        element.transitions.phase(&child_transition(property)),
                        Some(TransitionPhase::Pending | TransitionPhase::Ended)
                    )
                })
                .map(|(property, fetcher)| (Arc::clone(property), Arc::clone(fetcher)))
                .collect()
        };

        let mut started = 0;
        for (property, fetcher) in due {
            let child = child_transition(&property);
            self.element_mut(id).fetch.errors.remove(&property);
            self.start_transition(id, &child, Value::from(true));

            let Some(runtime) = self.runtime.as_ref() else {
                return Err(QueueError::Closed);
            };
            let task_property = Arc::clone(&property);
            let spawned = runtime.spawn(move |token, queue| {
                if token.is_cancelled() {
                    trace!(%id, property = %task_property, "fetch cancelled before it ran");
                    return;
                }
                let mut result = fetcher.fetch(token);
                if token.is_cancelled() {
                    result = Err(FetchError::Cancelled);
                }
                let reply = token.clone();
                let sent = if result == Err(FetchError::Cancelled) {
                    queue.dispatch(move |tree| {
                        tree.complete_fetch(id, &task_property, &reply, result);
                    })
                } else {
                    queue.dispatch_guarded(token, move |tree| {
                        tree.complete_fetch(id, &task_property, &reply, result);
                    })
                };
                if let Err(err) = sent {
                    debug!(%id, %err, "dropping fetch result");
                }
            });
            match spawned {
                Ok(token) => {
                    self.attach_token(id, &child, token);
                    started += 1;
                }
                Err(err) => {
                    warn!(%id, %property, %err, "could not spawn fetcher");
                    self.element_mut(id)
                        .fetch
                        .errors
                        .insert(property, FetchError::Request(err.to_string()));
                    self.error_transition(id, &child, Value::from(err.to_string()));
                    return Err(err);
                }
            }
        }
        debug!(%id, started, "fetch started");
        Ok(started)
    }

    /// Applies the outcome of a fetcher, on the owner.
    ///
    /// Results from a superseded run (its token is no longer attached) are ignored.
    fn complete_fetch(
        &mut self,
        id: ElementId,
        property: &Arc<str>,
        token: &CancelToken,
        result: Result<Value, FetchError>,
    ) {
        if !self.is_alive(id) {
            trace!(%id, %property, "fetch result for a deleted element");
            return;
        }
        let child = child_transition(property);
        if !self.holds_token(id, &child, token) {
            debug!(%id, %property, "ignoring stale fetch result");
            return;
        }
        match result {
            Ok(value) => {
                debug!(%id, %property, "fetch succeeded");
                self.set(id, Category::Data, property, value.clone());
                // Watchers may have deleted the element or restarted the load.
                if self.holds_token(id, &child, token) {
                    self.end_transition(id, &child, value);
                }
            }
            Err(FetchError::Cancelled) => {
                debug!(%id, %property, "fetch cancelled");
                self.cancel_transition(id, &child, Value::from(false));
            }
            Err(err) => {
                warn!(%id, %property, %err, "fetch failed");
                let message = Value::from(err.to_string());
                self.element_mut(id)
                    .fetch
                    .errors
                    .insert(Arc::clone(property), err);
                self.error_transition(id, &child, message);
            }
        }
    }

    /// Whether `id` is alive and `token` is the one attached to its transition `child`.
    fn holds_token(&self, id: ElementId, child: &str, token: &CancelToken) -> bool {
        self.try_element(id).is_some_and(|element| {
            element
                .transitions
                .attachment(child)
                .is_some_and(|attached| attached.same_token(token))
        })
    }

    /// Cancels every property of `id` still loading, firing their tokens.
    ///
    /// The aggregate is cancelled too, so a later [`fetch`](Self::fetch) retries the
    /// cancelled properties. Returns the number of properties cancelled.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn cancel_fetch(&mut self, id: ElementId) -> usize {
        let children: Vec<String> = self
            .element(id)
            .fetch
            .fetchers
            .iter()
            .map(|(property, _)| child_transition(property))
            .collect();
        let mut cancelled = 0;
        for child in &children {
            if self.transition_phase(id, child) == Some(TransitionPhase::Pending) {
                self.cancel_transition(id, child, Value::from(false));
                cancelled += 1;
            }
        }
        if self.transition_phase(id, FETCH_TRANSITION) == Some(TransitionPhase::Pending) {
            self.cancel_transition(id, FETCH_TRANSITION, Value::from(false));
        }
        if cancelled > 0 {
            debug!(%id, cancelled, "fetch cancelled");
        }
        cancelled
    }

    /// Marks a loaded `property` as stale so the next [`fetch`](Self::fetch) reloads it.
    ///
    /// Returns `false` if the property was not loaded.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or `property` has no fetcher.
    pub fn invalidate_fetch(&mut self, id: ElementId, property: &str) -> bool {
        self.invalidate_transition(id, &child_transition(property))
    }

    /// The phase of the aggregate fetch of `id`, or `None` without fetchers.
    #[must_use]
    pub fn fetch_phase(&self, id: ElementId) -> Option<TransitionPhase> {
        self.transition_phase(id, FETCH_TRANSITION)
    }

    /// The error of the last failed fetch of `property`, cleared when it is retried.
    #[must_use]
    pub fn fetch_error(&self, id: ElementId, property: &str) -> Option<&FetchError> {
        self.element(id).fetch.errors.get(property)
    }

    /// Every recorded fetch error of `id`, by property name.
    pub fn fetch_errors(&self, id: ElementId) -> impl Iterator<Item = (&str, &FetchError)> + '_ {
        self.element(id)
            .fetch
            .errors
            .iter()
            .map(|(property, err)| (&**property, err))
    }

    /// Returns `true` if the fetch of `id`, or any of its properties, was cancelled.
    #[must_use]
    pub fn is_fetch_cancelled(&self, id: ElementId) -> bool {
        let element = self.element(id);
        self.is_transition_cancelled(id, FETCH_TRANSITION)
            || element
                .fetch
                .fetchers
                .iter()
                .any(|(property, _)| self.is_transition_cancelled(id, &child_transition(property)))
    }

    /// Starts a new navigation lifetime.
    ///
    /// Cancels all background work derived from the previous one and every pending fetch
    /// in the tree. Returns the new lifetime's token, or `None` without a runtime.
    pub fn begin_navigation(&mut self) -> Option<CancelToken> {
        let token = self.runtime.as_ref()?.begin_navigation();
        let loading: Vec<ElementId> = self
            .ids()
            .filter(|&id| self.fetch_phase(id) == Some(TransitionPhase::Pending))
            .collect();
        for id in loading {
            self.cancel_fetch(id);
        }
        debug!("navigation began");
        Some(token)
    }
}
