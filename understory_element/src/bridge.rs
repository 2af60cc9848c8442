// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hook a rendering backend implements.

use crate::ElementId;

/// Mirrors tree changes into a native view hierarchy.
///
/// The tree calls these synchronously, after its own bookkeeping, while it holds `&mut`
/// access to itself; implementations cannot reenter the tree. Every method defaults to
/// doing nothing.
pub trait NativeBridge {
    /// `child` was appended to `parent`.
    fn append_child(&mut self, _parent: ElementId, _child: ElementId) {}

    /// `child` was prepended to `parent`.
    fn prepend_child(&mut self, _parent: ElementId, _child: ElementId) {}

    /// `child` was inserted at `index` among `parent`'s children.
    fn insert_child(&mut self, _parent: ElementId, _index: usize, _child: ElementId) {}

    /// `new` took the place of `old` under `parent`.
    fn replace_child(&mut self, _parent: ElementId, _old: ElementId, _new: ElementId) {}

    /// `child` was detached from `parent`.
    fn remove_child(&mut self, _parent: ElementId, _child: ElementId) {}

    /// The first listener for `event_type` was registered on `target`; the backend should
    /// start forwarding that native event.
    fn listen(&mut self, _target: ElementId, _event_type: &str) {}
}

/// A bridge that ignores every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBridge;

impl NativeBridge for NoopBridge {}
