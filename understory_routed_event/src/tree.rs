// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element tree interface and a small arena-backed implementation.
//!
//! The router reads the tree through [`ElementTree`] and never mutates it.
//! [`Tree`] is a ready-made implementation with generational [`NodeId`]s,
//! useful for tests and for toolkits without their own hierarchy.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

/// Read-only view of an element hierarchy.
pub trait ElementTree {
    /// Element key. Usually a small generational handle.
    type Key: Copy + Eq + Hash + Debug;

    /// Visual parent of `node`, or `None` for a root or detached element.
    fn parent(&self, node: Self::Key) -> Option<Self::Key>;

    /// Returns `false` once `node` has been destroyed.
    fn is_alive(&self, node: Self::Key) -> bool;

    /// Returns `true` if `node` is alive and connected to a root.
    ///
    /// Defaults to [`is_alive`](Self::is_alive) for trees without detachment.
    fn is_attached(&self, node: Self::Key) -> bool {
        self.is_alive(node)
    }

    /// Logical focus-scope parent of `node`, if it differs from the visual one.
    ///
    /// Key and focus routes follow this link instead of [`parent`](Self::parent)
    /// wherever it is set (popups, flyouts).
    fn focus_scope_parent(&self, node: Self::Key) -> Option<Self::Key> {
        let _ = node;
        None
    }
}

/// Identifier for an element in a [`Tree`].
///
/// Slot index plus generation; a removed slot is reused with a bumped
/// generation, so stale ids never alias a live element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    /// `None` for a free slot.
    live: Option<LiveNode>,
}

#[derive(Clone, Debug)]
struct LiveNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    focus_scope_parent: Option<NodeId>,
    /// Inserted without a parent; roots count as attached.
    is_root: bool,
}

/// Arena-backed element hierarchy.
///
/// ```
/// use understory_routed_event::tree::{ElementTree, Tree};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(None);
/// let child = tree.insert(Some(root));
/// assert_eq!(tree.parent(child), Some(root));
///
/// tree.detach(child);
/// assert!(tree.is_alive(child));
/// assert!(!tree.is_attached(child));
///
/// let removed = tree.remove(root);
/// assert_eq!(removed, vec![root]);
/// assert!(!tree.is_alive(root));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    free: Vec<usize>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new element under `parent`, or as a new root when `None`.
    ///
    /// A dead `parent` yields a detached element.
    pub fn insert(&mut self, parent: Option<NodeId>) -> NodeId {
        let is_root = parent.is_none();
        let parent = parent.filter(|p| self.is_alive(*p));
        let live = LiveNode {
            parent,
            children: Vec::new(),
            focus_scope_parent: None,
            is_root,
        };
        let id = if let Some(idx) = self.free.pop() {
            let slot = &mut self.nodes[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.live = Some(live);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "free slots were allocated from u32 indices"
            )]
            let idx = idx as u32;
            NodeId(idx, slot.generation)
        } else {
            self.nodes.push(Node {
                generation: 1,
                live: Some(live),
            });
            #[expect(
                clippy::cast_possible_truncation,
                reason = "trees beyond u32::MAX slots are not supported"
            )]
            let idx = (self.nodes.len() - 1) as u32;
            NodeId(idx, 1)
        };
        if let Some(p) = parent
            && let Some(pn) = self.live_mut(p)
        {
            pn.children.push(id);
        }
        id
    }

    /// Destroy `node` and its subtree. Returns the destroyed ids, `node` first
    /// and descendants in depth-first order; empty if `node` was already dead.
    pub fn remove(&mut self, node: NodeId) -> Vec<NodeId> {
        if !self.is_alive(node) {
            return Vec::new();
        }
        self.unlink(node);
        let mut removed = Vec::new();
        let mut stack = alloc::vec![node];
        while let Some(id) = stack.pop() {
            if let Some(live) = self.nodes[id.idx()].live.take() {
                removed.push(id);
                stack.extend(live.children.iter().rev());
                self.free.push(id.idx());
            }
        }
        // Drop dangling focus-scope links into the removed subtree.
        for slot in &mut self.nodes {
            if let Some(live) = slot.live.as_mut()
                && live.focus_scope_parent.is_some_and(|f| removed.contains(&f))
            {
                live.focus_scope_parent = None;
            }
        }
        removed
    }

    /// Disconnect `node` from its parent. The subtree stays alive but detached.
    pub fn detach(&mut self, node: NodeId) {
        if !self.is_alive(node) {
            return;
        }
        self.unlink(node);
        if let Some(live) = self.live_mut(node) {
            live.is_root = false;
        }
    }

    /// Move `child` under `parent`. Returns `false` if either is dead or the
    /// move would create a cycle.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.is_alive(parent) || !self.is_alive(child) || parent == child {
            return false;
        }
        let mut cur = self.parent(parent);
        while let Some(p) = cur {
            if p == child {
                return false;
            }
            cur = self.parent(p);
        }
        self.unlink(child);
        if let Some(live) = self.live_mut(child) {
            live.parent = Some(parent);
            live.is_root = false;
        }
        if let Some(pn) = self.live_mut(parent) {
            pn.children.push(child);
        }
        true
    }

    /// Set or clear the logical focus-scope parent of `node`.
    pub fn set_focus_scope_parent(&mut self, node: NodeId, scope_parent: Option<NodeId>) {
        let scope_parent = scope_parent.filter(|p| self.is_alive(*p));
        if let Some(live) = self.live_mut(node) {
            live.focus_scope_parent = scope_parent;
        }
    }

    /// Children of `node` in insertion order; empty for dead nodes.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.live(node).map_or(&[], |live| live.children.as_slice())
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns `true` if the tree has no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self, node: NodeId) -> Option<&LiveNode> {
        let slot = self.nodes.get(node.idx())?;
        if slot.generation != node.1 {
            return None;
        }
        slot.live.as_ref()
    }

    fn live_mut(&mut self, node: NodeId) -> Option<&mut LiveNode> {
        let slot = self.nodes.get_mut(node.idx())?;
        if slot.generation != node.1 {
            return None;
        }
        slot.live.as_mut()
    }

    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.live_mut(node).and_then(|live| live.parent.take()) else {
            return;
        };
        if let Some(pn) = self.live_mut(parent) {
            pn.children.retain(|c| *c != node);
        }
    }
}

impl ElementTree for Tree {
    type Key = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.live(node)?.parent
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.live(node).is_some()
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = node;
        loop {
            let Some(live) = self.live(cur) else {
                return false;
            };
            match live.parent {
                Some(p) => cur = p,
                None => return live.is_root,
            }
        }
    }

    fn focus_scope_parent(&self, node: NodeId) -> Option<NodeId> {
        self.live(node)?.focus_scope_parent
    }
}
