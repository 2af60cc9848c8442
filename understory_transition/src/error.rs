// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use thiserror::Error;

use crate::phase::TransitionPhase;

/// Error returned by [`TransitionTable`](crate::TransitionTable) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// A transition with this name already exists.
    #[error("transition `{0}` is already defined")]
    AlreadyDefined(Arc<str>),
    /// No transition with this name exists.
    #[error("transition `{0}` is not defined")]
    Undefined(Arc<str>),
    /// A terminal call was made on a transition that is not pending.
    #[error("transition `{name}` is {phase}, not pending")]
    NotPending {
        /// The transition.
        name: Arc<str>,
        /// Its phase at the time of the call.
        phase: TransitionPhase,
    },
    /// The child already belongs to another aggregate.
    #[error("transition `{child}` is already linked under `{parent}`")]
    AlreadyLinked {
        /// The child transition.
        child: Arc<str>,
        /// Its current parent.
        parent: Arc<str>,
    },
    /// Linking would make a transition its own ancestor.
    #[error("linking `{child}` under `{parent}` would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: Arc<str>,
        /// The would-be child.
        child: Arc<str>,
    },
}
