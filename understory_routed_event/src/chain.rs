// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ancestor chain resolution.
//!
//! A [`Route`] is a root→target snapshot of the chain for one occurrence.
//! It is resolved once and never re-walked, so tree mutations made by
//! handlers do not change the route of the occurrence in flight.
//!
//! Key and focus events use [`ChainKind::FocusScope`]: at every hop the
//! element's focus-scope parent wins over its visual parent, which lets a
//! popup route keyboard input back through the element that owns it.
//!
//! ```
//! use understory_routed_event::chain::{resolve_chain, ChainKind};
//! use understory_routed_event::tree::{ElementTree, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(None);
//! let owner = tree.insert(Some(root));
//! let popup = tree.insert(None);
//! let item = tree.insert(Some(popup));
//! tree.set_focus_scope_parent(popup, Some(owner));
//!
//! let visual = resolve_chain(&tree, item, ChainKind::Visual, 64).unwrap();
//! assert_eq!(visual.nodes(), &[popup, item]);
//!
//! let logical = resolve_chain(&tree, item, ChainKind::FocusScope, 64).unwrap();
//! assert_eq!(logical.nodes(), &[root, owner, popup, item]);
//! ```

use smallvec::SmallVec;

use crate::tree::ElementTree;

/// Which parent links a chain follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChainKind {
    /// Visual parents.
    Visual,
    /// Focus-scope parents where set, visual parents elsewhere.
    FocusScope,
}

/// Root→target element chain for one occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route<K> {
    nodes: SmallVec<[K; 16]>,
    captured: bool,
    truncated: bool,
}

impl<K: Copy> Route<K> {
    /// Elements from root to target.
    pub fn nodes(&self) -> &[K] {
        &self.nodes
    }

    /// The target, last in the chain.
    pub fn target(&self) -> K {
        // Routes are never empty.
        self.nodes[self.nodes.len() - 1]
    }

    /// The outer-most element reached.
    pub fn root(&self) -> K {
        self.nodes[0]
    }

    /// Number of elements, target included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the route has no elements. Resolved routes never do.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether pointer capture chose the target.
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Whether the walk stopped at the length bound or on a cycle.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn mark_captured(mut self) -> Self {
        self.captured = true;
        self
    }
}

/// Resolve the chain from `target` up to its root.
///
/// Returns `None` if `target` is dead. A root or detached element yields a
/// chain of length 1. Walks stop at dead links and after `max_len` elements.
pub fn resolve_chain<T: ElementTree>(
    tree: &T,
    target: T::Key,
    kind: ChainKind,
    max_len: usize,
) -> Option<Route<T::Key>> {
    if !tree.is_alive(target) {
        return None;
    }
    let max_len = max_len.max(1);
    let mut nodes: SmallVec<[T::Key; 16]> = SmallVec::new();
    nodes.push(target);
    let mut truncated = false;
    let mut cur = target;
    loop {
        let next = match kind {
            ChainKind::FocusScope => tree.focus_scope_parent(cur).or_else(|| tree.parent(cur)),
            ChainKind::Visual => tree.parent(cur),
        };
        let Some(next) = next.filter(|n| tree.is_alive(*n)) else {
            break;
        };
        if nodes.contains(&next) {
            tracing::warn!(node = ?next, "cycle in parent chain; route truncated");
            truncated = true;
            break;
        }
        if nodes.len() == max_len {
            tracing::warn!(max_len, target = ?target, "route length bound reached");
            truncated = true;
            break;
        }
        nodes.push(next);
        cur = next;
    }
    nodes.reverse();
    Some(Route {
        nodes,
        captured: false,
        truncated,
    })
}
