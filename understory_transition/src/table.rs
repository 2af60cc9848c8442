// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-owner transition records.

use std::sync::Arc;

use hashbrown::HashMap;
use understory_mutation::{MutationEvent, MutationKey};
use understory_property::Category;
use understory_value::{TempObject, Value};

use crate::error::TransitionError;
use crate::event::{Fire, Firing, TransitionCallbacks, TransitionEvent};
use crate::phase::TransitionPhase;

#[derive(Debug)]
struct Record<H, C> {
    callbacks: TransitionCallbacks<H>,
    phase: TransitionPhase,
    payload: Option<Value>,
    cycle: u64,
    attachment: Option<C>,
    parent: Option<Arc<str>>,
    children: Vec<Arc<str>>,
}

/// The transitions of one owner, keyed by name.
///
/// `H` is the callback type and `C` an attachment stored per transition, such as the
/// cancellation handle of the work the transition tracks.
///
/// Every state-changing call returns the callbacks to fire ([`Firing`]) instead of running
/// them.
///
/// # Aggregates
///
/// [`TransitionTable::link`] makes one transition a child of another. When the last child
/// of a pending parent ends, the parent ends too, with an object of its children's
/// payloads. An errored or cancelled child leaves the parent pending, so retrying the
/// child can still complete it.
///
/// # Example
///
/// ```rust
/// use understory_transition::{TransitionCallbacks, TransitionPhase, TransitionTable};
/// use understory_value::Value;
///
/// let mut table = TransitionTable::<u32, &str>::new(1);
/// table.define("load", TransitionCallbacks::uniform("cb")).unwrap();
///
/// let firing = table.start("load", Value::from(true)).unwrap();
/// assert_eq!(firing.len(), 1);
/// // A second start while pending is a no-op.
/// assert!(table.start("load", Value::from(true)).unwrap().is_empty());
///
/// let firing = table.end("load", Value::from(42)).unwrap();
/// assert_eq!(firing[0].event.payload(), &Value::from(42));
/// assert_eq!(table.phase("load"), Some(TransitionPhase::Ended));
/// ```
#[derive(Debug)]
pub struct TransitionTable<K, H, C = ()> {
    owner: K,
    records: HashMap<Arc<str>, Record<H, C>>,
}

impl<K: Copy, H: Clone, C> TransitionTable<K, H, C> {
    /// Creates an empty table for `owner`.
    #[must_use]
    pub fn new(owner: K) -> Self {
        Self {
            owner,
            records: HashMap::new(),
        }
    }

    /// The owner of these transitions.
    #[must_use]
    pub fn owner(&self) -> K {
        self.owner
    }

    /// Registers a transition and its callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::AlreadyDefined`] if `name` is taken.
    pub fn define(
        &mut self,
        name: impl Into<Arc<str>>,
        callbacks: TransitionCallbacks<H>,
    ) -> Result<(), TransitionError> {
        let name = name.into();
        if self.records.contains_key(&name) {
            return Err(TransitionError::AlreadyDefined(name));
        }
        self.records.insert(
            name,
            Record {
                callbacks,
                phase: TransitionPhase::Idle,
                payload: None,
                cycle: 0,
                attachment: None,
                parent: None,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Returns `true` if `name` is defined.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    fn record(&self, name: &str) -> Result<&Record<H, C>, TransitionError> {
        self.records
            .get(name)
            .ok_or_else(|| TransitionError::Undefined(name.into()))
    }

    fn record_mut(&mut self, name: &str) -> Result<&mut Record<H, C>, TransitionError> {
        self.records
            .get_mut(name)
            .ok_or_else(|| TransitionError::Undefined(name.into()))
    }

    /// Moves `name` to Pending and yields `on_start`.
    ///
    /// Starting a pending transition does nothing. Starting an errored or cancelled one
    /// retries it, and starting an ended one begins a fresh cycle. The persisted payload
    /// of the previous resolution is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Undefined`] if `name` is not defined.
    pub fn start(&mut self, name: &str, payload: Value) -> Result<Firing<K, H>, TransitionError> {
        let owner = self.owner;
        let record = self.record_mut(name)?;
        if record.phase == TransitionPhase::Pending {
            return Ok(Firing::new());
        }
        record.phase = TransitionPhase::Pending;
        record.cycle += 1;
        let previous = record.payload.take();
        let mut firing = Firing::new();
        firing.push(fire(owner, name, record, payload, previous));
        Ok(firing)
    }

    /// Resolves a pending transition as Errored and yields `on_error`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is undefined or not pending.
    pub fn error(&mut self, name: &str, payload: Value) -> Result<Firing<K, H>, TransitionError> {
        self.resolve(name, TransitionPhase::Errored, payload)
    }

    /// Resolves a pending transition as Cancelled and yields `on_cancel`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is undefined or not pending.
    pub fn cancel(&mut self, name: &str, payload: Value) -> Result<Firing<K, H>, TransitionError> {
        self.resolve(name, TransitionPhase::Cancelled, payload)
    }

    /// Resolves a pending transition as Ended and yields `on_end`.
    ///
    /// If this completes a pending aggregate parent, the parent's `on_end` follows.
    ///
    /// # Errors
    ///
    /// Fails if `name` is undefined or not pending.
    pub fn end(&mut self, name: &str, payload: Value) -> Result<Firing<K, H>, TransitionError> {
        self.resolve(name, TransitionPhase::Ended, payload)
    }

    fn resolve(
        &mut self,
        name: &str,
        phase: TransitionPhase,
        payload: Value,
    ) -> Result<Firing<K, H>, TransitionError> {
        let owner = self.owner;
        let record = self.record_mut(name)?;
        if record.phase != TransitionPhase::Pending {
            return Err(TransitionError::NotPending {
                name: name.into(),
                phase: record.phase,
            });
        }
        record.phase = phase;
        let previous = record.payload.replace(payload.clone());
        let mut firing = Firing::new();
        firing.push(fire(owner, name, record, payload, previous));

        if phase == TransitionPhase::Ended {
            let mut parent = record.parent.clone();
            while let Some(name) = parent.take() {
                let Some(payload) = self.aggregate_payload(&name) else {
                    break;
                };
                let Ok(record) = self.record_mut(&name) else {
                    break;
                };
                record.phase = TransitionPhase::Ended;
                let previous = record.payload.replace(payload.clone());
                firing.push(fire(owner, &name, record, payload, previous));
                parent = record.parent.clone();
            }
        }
        Ok(firing)
    }

    /// Returns the combined payload if `name` is a pending aggregate whose children all
    /// ended.
    fn aggregate_payload(&self, name: &str) -> Option<Value> {
        let record = self.records.get(name)?;
        if record.phase != TransitionPhase::Pending || record.children.is_empty() {
            return None;
        }
        let mut payload = TempObject::new();
        for child in &record.children {
            let child = self.records.get(child)?;
            if child.phase != TransitionPhase::Ended {
                return None;
            }
        }
        for child in &record.children {
            if let Some(value) = self.records.get(child).and_then(|c| c.payload.clone()) {
                payload.insert(Arc::clone(child), value);
            }
        }
        Some(payload.commit().into())
    }

    /// Resets an Ended transition to Idle, along with every Ended ancestor aggregate.
    ///
    /// Returns `true` if `name` was reset.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Undefined`] if `name` is not defined.
    pub fn invalidate(&mut self, name: &str) -> Result<bool, TransitionError> {
        let record = self.record_mut(name)?;
        if record.phase != TransitionPhase::Ended {
            return Ok(false);
        }
        record.phase = TransitionPhase::Idle;
        record.payload = None;
        let mut parent = record.parent.clone();
        while let Some(name) = parent.take() {
            let Some(record) = self.records.get_mut(&name) else {
                break;
            };
            if record.phase != TransitionPhase::Ended {
                break;
            }
            record.phase = TransitionPhase::Idle;
            record.payload = None;
            parent = record.parent.clone();
        }
        Ok(true)
    }

    /// Makes `child` part of `parent`'s aggregate.
    ///
    /// # Errors
    ///
    /// Fails if either is undefined, if `child` already has a parent, or if the link would
    /// create a cycle.
    pub fn link(&mut self, parent: &str, child: &str) -> Result<(), TransitionError> {
        self.record(parent)?;
        if let Some(current) = &self.record(child)?.parent {
            return Err(TransitionError::AlreadyLinked {
                child: child.into(),
                parent: Arc::clone(current),
            });
        }
        let mut ancestor = Some(Arc::<str>::from(parent));
        while let Some(name) = ancestor {
            if &*name == child {
                return Err(TransitionError::Cycle {
                    parent: parent.into(),
                    child: child.into(),
                });
            }
            ancestor = self.records.get(&name).and_then(|r| r.parent.clone());
        }
        let child: Arc<str> = child.into();
        self.record_mut(parent)?.children.push(Arc::clone(&child));
        self.record_mut(&child)?.parent = Some(parent.into());
        Ok(())
    }

    /// Returns the children linked under `name`.
    #[must_use]
    pub fn children(&self, name: &str) -> &[Arc<str>] {
        self.records
            .get(name)
            .map(|r| r.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the aggregate parent of `name`.
    #[must_use]
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.records.get(name)?.parent.as_deref()
    }

    /// Stores an attachment on `name`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Undefined`] if `name` is not defined.
    pub fn attach(&mut self, name: &str, attachment: C) -> Result<Option<C>, TransitionError> {
        Ok(self.record_mut(name)?.attachment.replace(attachment))
    }

    /// Returns the attachment of `name`.
    #[must_use]
    pub fn attachment(&self, name: &str) -> Option<&C> {
        self.records.get(name)?.attachment.as_ref()
    }

    /// Removes and returns the attachment of `name`.
    pub fn detach(&mut self, name: &str) -> Option<C> {
        self.records.get_mut(name)?.attachment.take()
    }

    /// Removes every attachment.
    pub fn detach_all(&mut self) -> Vec<C> {
        self.records
            .values_mut()
            .filter_map(|r| r.attachment.take())
            .collect()
    }

    /// The phase of `name`, or `None` if undefined.
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<TransitionPhase> {
        self.records.get(name).map(|r| r.phase)
    }

    /// The payload persisted by the last resolution of `name`.
    #[must_use]
    pub fn payload(&self, name: &str) -> Option<&Value> {
        self.records.get(name)?.payload.as_ref()
    }

    /// How many times `name` was started.
    #[must_use]
    pub fn cycle(&self, name: &str) -> Option<u64> {
        self.records.get(name).map(|r| r.cycle)
    }

    /// Iterates over the names of pending transitions.
    pub fn pending(&self) -> impl Iterator<Item = &str> + '_ {
        self.records
            .iter()
            .filter(|(_, r)| r.phase == TransitionPhase::Pending)
            .map(|(name, _)| &**name)
    }

    /// Iterates over every defined name.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(|name| &**name)
    }
}

fn fire<K: Copy, H: Clone, C>(
    owner: K,
    name: &str,
    record: &Record<H, C>,
    payload: Value,
    previous: Option<Value>,
) -> Fire<K, H> {
    let handler = record
        .callbacks
        .for_phase(record.phase)
        .cloned()
        .unwrap_or_else(|| record.callbacks.on_start.clone());
    Fire {
        handler,
        event: TransitionEvent {
            mutation: MutationEvent::new(
                MutationKey::new(owner, Category::Internals, name),
                payload,
                previous,
            ),
            phase: record.phase,
            cycle: record.cycle,
        },
    }
}
