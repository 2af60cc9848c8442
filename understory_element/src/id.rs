// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

/// Identifier for an element in a [`Tree`](crate::Tree).
///
/// A slot index plus a generation counter.
///
/// ## Semantics
///
/// - On create, a fresh slot is allocated with generation `1`.
/// - On delete, the slot is freed; any existing `ElementId` that pointed to that slot is
///   now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct
///   `ElementId`.
///
/// Stale ids never alias a different live element because the generation must match.
/// Use [`Tree::is_alive`](crate::Tree::is_alive) to check.
///
/// `ElementId` is `Send`, so workers may carry it around and hand it back to the owner;
/// only the owner can resolve it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32, u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn slot(self) -> u32 {
        self.0
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_generation() {
        assert_eq!(ElementId::new(3, 2).to_string(), "3v2");
    }

    #[test]
    fn generations_distinguish_reused_slots() {
        assert_ne!(ElementId::new(0, 1), ElementId::new(0, 2));
        assert_eq!(ElementId::new(0, 2).idx(), 0);
        assert_eq!(ElementId::new(0, 2).generation(), 2);
    }
}
