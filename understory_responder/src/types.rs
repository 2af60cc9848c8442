// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core responder types: phases, dispatch entries and flags.

use bitflags::bitflags;

/// Propagation phase.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not propagating: before dispatch, after dispatch, or after an immediate stop.
    #[default]
    None,
    /// Root → parent of target.
    Capture,
    /// The target itself.
    Target,
    /// Parent of target → root.
    Bubble,
}

/// One step of a propagation sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch<K> {
    /// The phase of this step.
    pub phase: Phase,
    /// The node whose listeners run in this step.
    pub node: K,
}

impl<K> Dispatch<K> {
    /// A capture step for `node`.
    pub const fn capture(node: K) -> Self {
        Self {
            phase: Phase::Capture,
            node,
        }
    }

    /// The target step for `node`.
    pub const fn target(node: K) -> Self {
        Self {
            phase: Phase::Target,
            node,
        }
    }

    /// A bubble step for `node`.
    pub const fn bubble(node: K) -> Self {
        Self {
            phase: Phase::Bubble,
            node,
        }
    }
}

bitflags! {
    /// Options of a registered listener.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ListenerFlags: u8 {
        /// Run during the capture phase instead of the bubble phase.
        const CAPTURE = 1 << 0;
        /// Unregister after the first invocation, whatever the phase.
        const ONCE = 1 << 1;
    }
}

impl ListenerFlags {
    /// Returns `true` if a listener with these flags runs in `phase`.
    ///
    /// Capture listeners run in the capture phase, non-capture listeners in the bubble
    /// phase, and every listener at the target.
    #[must_use]
    pub fn matches(self, phase: Phase) -> bool {
        match phase {
            Phase::None => false,
            Phase::Capture => self.contains(Self::CAPTURE),
            Phase::Target => true,
            Phase::Bubble => !self.contains(Self::CAPTURE),
        }
    }
}

bitflags! {
    /// Options of a dispatched event.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// Run the bubble phase after the target.
        const BUBBLES = 1 << 0;
        /// Allow listeners to prevent the default action.
        const CANCELABLE = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_phase_matching() {
        let capture = ListenerFlags::CAPTURE;
        let bubble = ListenerFlags::empty();
        let once_capture = ListenerFlags::CAPTURE | ListenerFlags::ONCE;

        assert!(capture.matches(Phase::Capture));
        assert!(!capture.matches(Phase::Bubble));
        assert!(once_capture.matches(Phase::Capture));

        assert!(!bubble.matches(Phase::Capture));
        assert!(bubble.matches(Phase::Bubble));

        for flags in [capture, bubble, once_capture] {
            assert!(flags.matches(Phase::Target));
            assert!(!flags.matches(Phase::None));
        }
    }
}
