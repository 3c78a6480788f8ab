// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler table: per-element, per-event ordered handler lists.
//!
//! Registration order is invocation order within a phase. Dispatch never
//! iterates the live lists; it takes a [`snapshot`](HandlerTable::snapshot)
//! up front, so handlers that register or remove handlers mid-dispatch only
//! affect later occurrences.
//!
//! The table is generic over the stored callback `H` so it can be exercised
//! without a router.
//!
//! ```
//! use understory_routed_event::event::{Category, RoutedEvent};
//! use understory_routed_event::handlers::{HandlerOptions, HandlerTable, Phase};
//!
//! let tap = RoutedEvent::new("Tap", Category::POINTER);
//! let mut table: HandlerTable<u32, &str> = HandlerTable::new();
//! let first = table.register(7, &tap, "first", HandlerOptions::bubbling());
//! table.register(7, &tap, "second", HandlerOptions::bubbling());
//!
//! let snap = table.entries_for(7, &tap, Phase::Bubbling);
//! assert!(table.remove(first));
//! // The snapshot still holds both entries.
//! let names: Vec<_> = snap.map(|e| e.callback).collect();
//! assert_eq!(names, ["first", "second"]);
//! ```

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::event::RoutedEvent;

/// Delivery phase a handler is registered for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root→target, before bubbling.
    Tunneling,
    /// Target→root.
    Bubbling,
}

/// Options for a handler registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Phase to run in.
    pub phase: Phase,
    /// Run even after an earlier handler marked the occurrence handled.
    pub invoke_if_handled: bool,
}

impl HandlerOptions {
    /// Bubbling, skipped once handled.
    pub const fn bubbling() -> Self {
        Self {
            phase: Phase::Bubbling,
            invoke_if_handled: false,
        }
    }

    /// Tunneling, skipped once handled.
    pub const fn tunneling() -> Self {
        Self {
            phase: Phase::Tunneling,
            invoke_if_handled: false,
        }
    }

    /// Set whether the handler runs after the occurrence is handled.
    #[must_use]
    pub const fn invoke_if_handled(mut self, yes: bool) -> Self {
        self.invoke_if_handled = yes;
        self
    }
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self::bubbling()
    }
}

/// Identifies exactly one registration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerToken(u64);

/// One registered handler.
#[derive(Clone, Debug)]
pub struct HandlerEntry<K, H> {
    /// Registration this entry belongs to.
    pub token: HandlerToken,
    /// Element the handler is attached to.
    pub element: K,
    /// Phase it runs in.
    pub phase: Phase,
    /// Runs even once the occurrence is handled.
    pub invoke_if_handled: bool,
    /// The callback.
    pub callback: H,
}

/// A point-in-time copy of handler entries.
pub type HandlerSnapshot<K, H> = smallvec::IntoIter<[HandlerEntry<K, H>; 4]>;

/// Tunneling and bubbling entries of one node, copied at dispatch start.
#[derive(Clone, Debug)]
pub struct NodeHandlers<K, H> {
    /// Tunneling entries in registration order.
    pub tunneling: SmallVec<[HandlerEntry<K, H>; 4]>,
    /// Bubbling entries in registration order.
    pub bubbling: SmallVec<[HandlerEntry<K, H>; 4]>,
}

impl<K, H> NodeHandlers<K, H> {
    /// No entries in either phase.
    pub fn new() -> Self {
        Self {
            tunneling: SmallVec::new(),
            bubbling: SmallVec::new(),
        }
    }

    /// Entries for `phase`.
    pub fn phase(&self, phase: Phase) -> &[HandlerEntry<K, H>] {
        match phase {
            Phase::Tunneling => &self.tunneling,
            Phase::Bubbling => &self.bubbling,
        }
    }

    /// Returns `true` if neither phase has entries.
    pub fn is_empty(&self) -> bool {
        self.tunneling.is_empty() && self.bubbling.is_empty()
    }
}

impl<K, H> Default for NodeHandlers<K, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-element, per-event handler lists.
#[derive(Debug)]
pub struct HandlerTable<K, H> {
    by_element: HashMap<K, HashMap<RoutedEvent, Vec<HandlerEntry<K, H>>>>,
    tokens: HashMap<HandlerToken, (K, RoutedEvent)>,
    next_token: u64,
}

impl<K, H> HandlerTable<K, H>
where
    K: Copy + Eq + Hash,
    H: Clone,
{
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            by_element: HashMap::new(),
            tokens: HashMap::new(),
            next_token: 1,
        }
    }

    /// Append a handler for (`element`, `event`).
    ///
    /// Registering the same callback twice yields two independent entries.
    /// Element liveness is the caller's concern.
    pub fn register(
        &mut self,
        element: K,
        event: &RoutedEvent,
        callback: H,
        options: HandlerOptions,
    ) -> HandlerToken {
        let token = HandlerToken(self.next_token);
        self.next_token += 1;
        self.by_element
            .entry(element)
            .or_default()
            .entry(event.clone())
            .or_default()
            .push(HandlerEntry {
                token,
                element,
                phase: options.phase,
                invoke_if_handled: options.invoke_if_handled,
                callback,
            });
        self.tokens.insert(token, (element, event.clone()));
        token
    }

    /// Remove exactly the entry for `token`. Returns `false` if it was already gone.
    pub fn remove(&mut self, token: HandlerToken) -> bool {
        let Some((element, event)) = self.tokens.remove(&token) else {
            return false;
        };
        let Some(events) = self.by_element.get_mut(&element) else {
            return false;
        };
        let mut removed = false;
        if let Some(list) = events.get_mut(&event) {
            let before = list.len();
            list.retain(|e| e.token != token);
            removed = list.len() != before;
            if list.is_empty() {
                events.remove(&event);
            }
        }
        if events.is_empty() {
            self.by_element.remove(&element);
        }
        removed
    }

    /// Remove every entry attached to `element`, across all events.
    /// Returns the number of entries removed.
    pub fn unregister_all(&mut self, element: K) -> usize {
        let Some(events) = self.by_element.remove(&element) else {
            return 0;
        };
        let mut count = 0;
        for entry in events.values().flatten() {
            self.tokens.remove(&entry.token);
            count += 1;
        }
        count
    }

    /// Snapshot of the entries for (`element`, `event`, `phase`).
    pub fn entries_for(
        &self,
        element: K,
        event: &RoutedEvent,
        phase: Phase,
    ) -> HandlerSnapshot<K, H> {
        self.list(element, event)
            .iter()
            .filter(|e| e.phase == phase)
            .cloned()
            .collect::<SmallVec<[_; 4]>>()
            .into_iter()
    }

    /// Snapshot of both phases for (`element`, `event`) in one pass.
    pub fn snapshot(&self, element: K, event: &RoutedEvent) -> NodeHandlers<K, H> {
        let mut out = NodeHandlers::new();
        for entry in self.list(element, event) {
            match entry.phase {
                Phase::Tunneling => out.tunneling.push(entry.clone()),
                Phase::Bubbling => out.bubbling.push(entry.clone()),
            }
        }
        out
    }

    /// Returns `true` if `token` is still registered.
    pub fn contains(&self, token: HandlerToken) -> bool {
        self.tokens.contains_key(&token)
    }

    /// Number of entries attached to `element`.
    pub fn count_for(&self, element: K) -> usize {
        self.by_element
            .get(&element)
            .map_or(0, |events| events.values().map(Vec::len).sum())
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn list(&self, element: K, event: &RoutedEvent) -> &[HandlerEntry<K, H>] {
        self.by_element
            .get(&element)
            .and_then(|events| events.get(event))
            .map_or(&[], Vec::as_slice)
    }
}

impl<K, H> Default for HandlerTable<K, H>
where
    K: Copy + Eq + Hash,
    H: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Category;
    use alloc::vec;

    fn names<K>(it: impl Iterator<Item = HandlerEntry<K, &'static str>>) -> Vec<&'static str> {
        it.map(|e| e.callback).collect()
    }

    #[test]
    fn registration_order_is_kept_per_phase() {
        let ev = RoutedEvent::new("Tap", Category::POINTER);
        let mut t: HandlerTable<u32, &str> = HandlerTable::new();
        t.register(1, &ev, "b1", HandlerOptions::bubbling());
        t.register(1, &ev, "t1", HandlerOptions::tunneling());
        t.register(1, &ev, "b2", HandlerOptions::bubbling());
        t.register(1, &ev, "t2", HandlerOptions::tunneling());
        assert_eq!(names(t.entries_for(1, &ev, Phase::Bubbling)), vec!["b1", "b2"]);
        assert_eq!(names(t.entries_for(1, &ev, Phase::Tunneling)), vec!["t1", "t2"]);

        let snap = t.snapshot(1, &ev);
        assert_eq!(snap.phase(Phase::Tunneling).len(), 2);
        assert_eq!(snap.bubbling[1].callback, "b2");
    }

    #[test]
    fn duplicate_callbacks_are_independent() {
        let ev = RoutedEvent::new("Tap", Category::POINTER);
        let mut t: HandlerTable<u32, &str> = HandlerTable::new();
        let a = t.register(1, &ev, "same", HandlerOptions::bubbling());
        let b = t.register(1, &ev, "same", HandlerOptions::bubbling());
        assert_ne!(a, b);
        assert_eq!(t.count_for(1), 2);
        assert!(t.remove(a));
        assert!(!t.remove(a));
        assert!(t.contains(b));
        assert_eq!(names(t.entries_for(1, &ev, Phase::Bubbling)), vec!["same"]);
    }

    #[test]
    fn lists_are_keyed_by_identity_not_name() {
        let a = RoutedEvent::new("Tap", Category::POINTER);
        let b = RoutedEvent::new("Tap", Category::POINTER);
        let mut t: HandlerTable<u32, &str> = HandlerTable::new();
        t.register(1, &a, "a", HandlerOptions::bubbling());
        assert_eq!(t.entries_for(1, &b, Phase::Bubbling).count(), 0);
        assert_eq!(t.entries_for(1, &a, Phase::Bubbling).count(), 1);
    }

    #[test]
    fn unregister_all_clears_every_event() {
        let a = RoutedEvent::new("A", Category::KEY);
        let b = RoutedEvent::new("B", Category::FOCUS);
        let mut t: HandlerTable<u32, &str> = HandlerTable::new();
        let ta = t.register(1, &a, "a", HandlerOptions::bubbling());
        t.register(1, &b, "b", HandlerOptions::tunneling());
        t.register(2, &a, "other", HandlerOptions::bubbling());
        assert_eq!(t.unregister_all(1), 2);
        assert_eq!(t.unregister_all(1), 0);
        assert!(!t.contains(ta));
        assert!(!t.remove(ta));
        assert_eq!(t.len(), 1);
        assert_eq!(t.count_for(2), 1);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let ev = RoutedEvent::new("Tap", Category::POINTER);
        let mut t: HandlerTable<u32, &str> = HandlerTable::new();
        let first = t.register(1, &ev, "first", HandlerOptions::bubbling());
        let snap = t.snapshot(1, &ev);
        t.register(1, &ev, "late", HandlerOptions::bubbling());
        t.remove(first);
        assert_eq!(snap.bubbling.len(), 1);
        assert_eq!(snap.bubbling[0].callback, "first");
        assert_eq!(names(t.entries_for(1, &ev, Phase::Bubbling)), vec!["late"]);
    }

    #[test]
    fn emptied_lists_are_pruned() {
        let ev = RoutedEvent::new("Tap", Category::POINTER);
        let mut t: HandlerTable<u32, &str> = HandlerTable::new();
        let always = HandlerOptions::bubbling().invoke_if_handled(true);
        let tok = t.register(3, &ev, "x", always);
        assert!(t.snapshot(3, &ev).bubbling[0].invoke_if_handled);
        t.remove(tok);
        assert!(t.is_empty());
        assert!(t.snapshot(3, &ev).is_empty());
        assert_eq!(t.count_for(3), 0);
    }
}
