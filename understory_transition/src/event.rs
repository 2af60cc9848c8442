// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use smallvec::SmallVec;
use understory_mutation::MutationEvent;
use understory_value::Value;

use crate::phase::TransitionPhase;

/// The four phase callbacks of a transition.
#[derive(Clone, Debug)]
pub struct TransitionCallbacks<H> {
    /// Fired when the transition enters [`TransitionPhase::Pending`].
    pub on_start: H,
    /// Fired when it resolves as [`TransitionPhase::Errored`].
    pub on_error: H,
    /// Fired when it resolves as [`TransitionPhase::Cancelled`].
    pub on_cancel: H,
    /// Fired when it resolves as [`TransitionPhase::Ended`].
    pub on_end: H,
}

impl<H> TransitionCallbacks<H> {
    /// Uses the same handler for every phase.
    pub fn uniform(handler: H) -> Self
    where
        H: Clone,
    {
        Self {
            on_start: handler.clone(),
            on_error: handler.clone(),
            on_cancel: handler.clone(),
            on_end: handler,
        }
    }

    pub(crate) fn for_phase(&self, phase: TransitionPhase) -> Option<&H> {
        match phase {
            TransitionPhase::Idle => None,
            TransitionPhase::Pending => Some(&self.on_start),
            TransitionPhase::Ended => Some(&self.on_end),
            TransitionPhase::Errored => Some(&self.on_error),
            TransitionPhase::Cancelled => Some(&self.on_cancel),
        }
    }
}

/// What a transition callback receives.
///
/// The embedded [`MutationEvent`] is keyed `origin/internals/<name>`; its new value is the
/// payload of the call and its old value the payload persisted by the previous resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionEvent<K> {
    /// The change, as a mutation of the transition's internals property.
    pub mutation: MutationEvent<K>,
    /// The phase the transition just entered.
    pub phase: TransitionPhase,
    /// The cycle number; incremented by every start.
    pub cycle: u64,
}

impl<K: Copy> TransitionEvent<K> {
    /// The transition name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.mutation.property()
    }

    /// The element that owns the transition.
    #[must_use]
    pub fn origin(&self) -> K {
        self.mutation.origin()
    }

    /// The payload of the call.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.mutation.new_value
    }
}

/// One callback to invoke, with its event.
#[derive(Clone, Debug)]
pub struct Fire<K, H> {
    /// The callback.
    pub handler: H,
    /// Its argument.
    pub event: TransitionEvent<K>,
}

/// The callbacks a transition call produced, in the order they must run.
///
/// Calls on a [`TransitionTable`](crate::TransitionTable) hand callbacks back instead of
/// invoking them, so the owner of the table can pass itself to each one.
pub type Firing<K, H> = SmallVec<[Fire<K, H>; 2]>;
