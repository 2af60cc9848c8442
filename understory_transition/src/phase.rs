// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// The phase of a transition.
///
/// ```text
/// Idle ──start──▶ Pending ──end────▶ Ended
///                    │    ──error──▶ Errored   ──start──▶ Pending
///                    │    ──cancel─▶ Cancelled ──start──▶ Pending
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// Defined but never started, or invalidated.
    #[default]
    Idle,
    /// Started and not yet resolved.
    Pending,
    /// Resolved successfully.
    Ended,
    /// Resolved with an error; may be retried.
    Errored,
    /// Cancelled; may be retried.
    Cancelled,
}

impl TransitionPhase {
    /// Returns the stable name of this phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Ended => "ended",
            Self::Errored => "errored",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for the three resolved phases.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Errored | Self::Cancelled)
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
