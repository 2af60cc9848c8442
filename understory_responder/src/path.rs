// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root → target paths and their cache.

use alloc::rc::Rc;
use alloc::vec::Vec;

/// Returns the parent of a node.
///
/// Implemented for any `Fn(K) -> Option<K>`.
pub trait ParentLookup<K> {
    /// Returns the parent of `node`, or `None` for a root.
    fn parent_of(&self, node: K) -> Option<K>;
}

impl<K, F> ParentLookup<K> for F
where
    F: Fn(K) -> Option<K>,
{
    #[inline]
    fn parent_of(&self, node: K) -> Option<K> {
        self(node)
    }
}

/// Builds the root → target path of `target` by walking parents.
///
/// The lookup must describe a tree; a parent cycle would never terminate.
pub fn ancestor_path<K: Copy>(target: K, lookup: &impl ParentLookup<K>) -> Vec<K> {
    let mut path = alloc::vec![target];
    let mut current = target;
    while let Some(parent) = lookup.parent_of(current) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// A lazily computed, shared root → target path.
///
/// The path is computed on first use and reused until [`PathCache::invalidate`] is called,
/// typically after any structural change above the node.
#[derive(Clone, Debug)]
pub struct PathCache<K> {
    path: Option<Rc<[K]>>,
}

impl<K> Default for PathCache<K> {
    fn default() -> Self {
        Self { path: None }
    }
}

impl<K: Copy> PathCache<K> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached path, if any.
    #[must_use]
    pub fn get(&self) -> Option<Rc<[K]>> {
        self.path.clone()
    }

    /// Returns the cached path, computing it for `target` first if needed.
    pub fn get_or_compute(&mut self, target: K, lookup: &impl ParentLookup<K>) -> Rc<[K]> {
        Rc::clone(
            self.path
                .get_or_insert_with(|| ancestor_path(target, lookup).into()),
        )
    }

    /// Forgets the cached path. Returns `true` if one was cached.
    pub fn invalidate(&mut self) -> bool {
        self.path.take().is_some()
    }

    /// Returns `true` if a path is cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    fn parent(node: u32) -> Option<u32> {
        // 1 → 2 → 3, 4 is a root.
        match node {
            2 => Some(1),
            3 => Some(2),
            _ => None,
        }
    }

    #[test]
    fn path_runs_root_to_target() {
        assert_eq!(ancestor_path(3, &parent), [1, 2, 3]);
        assert_eq!(ancestor_path(4, &parent), [4]);
    }

    #[test]
    fn cache_computes_once_until_invalidated() {
        let calls = Cell::new(0);
        let counting = |node: u32| {
            calls.set(calls.get() + 1);
            parent(node)
        };
        let mut cache = PathCache::new();
        assert!(!cache.is_cached());

        let first = cache.get_or_compute(3, &counting);
        let walked = calls.get();
        let second = cache.get_or_compute(3, &counting);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), walked);

        assert!(cache.invalidate());
        assert!(!cache.invalidate());
        cache.get_or_compute(3, &counting);
        assert_eq!(calls.get(), walked * 2);
    }
}
