// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routed event identities: a name, a category set, and a routing strategy.
//!
//! A [`RoutedEvent`] is the identity token handlers are registered against and
//! occurrences are raised with. Identities compare by instance: two events
//! built with the same name are distinct.
//!
//! ```
//! use understory_routed_event::event::{Category, RoutedEvent};
//!
//! let tap = RoutedEvent::new("Tapped", Category::POINTER | Category::GESTURE);
//! assert!(tap.is_pointer_event());
//! assert!(tap.is_gesture_event());
//! assert!(!tap.is_key_event());
//!
//! let other = RoutedEvent::new("Tapped", Category::POINTER | Category::GESTURE);
//! assert_ne!(tap, other);
//! assert_eq!(tap, tap.clone());
//! ```

use alloc::borrow::Cow;
use alloc::rc::Rc;
use core::fmt;
use core::hash::{Hash, Hasher};

bitflags::bitflags! {
    /// Interaction categories an event belongs to.
    ///
    /// An event may belong to zero or more categories.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Category: u8 {
        /// Pointer input (press, move, release, wheel, capture).
        const POINTER = 0b0000_0001;
        /// Recognized gestures (tap, hold).
        const GESTURE = 0b0000_0010;
        /// Keyboard input. Routed along the focus-scope chain.
        const KEY     = 0b0000_0100;
        /// Focus transitions. Routed along the focus-scope chain.
        const FOCUS   = 0b0000_1000;
    }
}

/// How an occurrence of an event walks its route.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Routing {
    /// Tunnel root→target, then bubble target→root.
    #[default]
    TunnelBubble,
    /// Bubble target→root only; tunneling handlers are never invoked.
    Bubble,
    /// Visit the target only: its tunneling handlers, then its bubbling handlers.
    Direct,
}

impl Routing {
    /// Returns `true` if this strategy runs a tunneling phase.
    pub const fn tunnels(self) -> bool {
        matches!(self, Self::TunnelBubble | Self::Direct)
    }
}

/// Construction options for a [`RoutedEvent`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EventOptions {
    /// Routing strategy.
    pub routing: Routing,
    /// Whether an occurrence ends pointer capture for its pointer id once it
    /// completes (pointer release and cancel events).
    pub ends_pointer_capture: bool,
}

#[derive(Debug)]
struct EventData {
    name: Cow<'static, str>,
    category: Category,
    options: EventOptions,
    is_pointer: bool,
    is_gesture: bool,
    is_key: bool,
    is_focus: bool,
}

/// Identity of a kind of routed event.
///
/// Cloning is cheap and yields the same identity. Equality and hashing are by
/// instance, never by name. The category predicates are computed once at
/// construction.
#[derive(Clone)]
pub struct RoutedEvent {
    inner: Rc<EventData>,
}

impl RoutedEvent {
    /// Create an identity with the default options (tunnel then bubble).
    pub fn new(name: impl Into<Cow<'static, str>>, category: Category) -> Self {
        Self::with_options(name, category, EventOptions::default())
    }

    /// Create an identity with explicit options.
    pub fn with_options(
        name: impl Into<Cow<'static, str>>,
        category: Category,
        options: EventOptions,
    ) -> Self {
        Self {
            inner: Rc::new(EventData {
                name: name.into(),
                category,
                options,
                is_pointer: category.contains(Category::POINTER),
                is_gesture: category.contains(Category::GESTURE),
                is_key: category.contains(Category::KEY),
                is_focus: category.contains(Category::FOCUS),
            }),
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The category set this identity was built with.
    pub fn category(&self) -> Category {
        self.inner.category
    }

    /// Routing strategy.
    pub fn routing(&self) -> Routing {
        self.inner.options.routing
    }

    /// Whether an occurrence releases pointer capture once it completes.
    pub fn ends_pointer_capture(&self) -> bool {
        self.inner.options.ends_pointer_capture
    }

    /// Belongs to [`Category::POINTER`].
    pub fn is_pointer_event(&self) -> bool {
        self.inner.is_pointer
    }

    /// Belongs to [`Category::GESTURE`].
    pub fn is_gesture_event(&self) -> bool {
        self.inner.is_gesture
    }

    /// Belongs to [`Category::KEY`].
    pub fn is_key_event(&self) -> bool {
        self.inner.is_key
    }

    /// Belongs to [`Category::FOCUS`].
    pub fn is_focus_event(&self) -> bool {
        self.inner.is_focus
    }

    /// Key and focus events resolve their route along the focus-scope chain.
    pub fn follows_focus_scope(&self) -> bool {
        self.inner.is_key || self.inner.is_focus
    }
}

impl PartialEq for RoutedEvent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RoutedEvent {}

impl Hash for RoutedEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for RoutedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RoutedEvent").field(&self.name()).finish()
    }
}

impl fmt::Display for RoutedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn predicates_follow_bits() {
        let all = [
            Category::POINTER,
            Category::GESTURE,
            Category::KEY,
            Category::FOCUS,
        ];
        // Every subset of the four categories.
        for mask in 0_u8..16 {
            let category = Category::from_bits_truncate(mask);
            let ev = RoutedEvent::new("Probe", category);
            let flags = [
                ev.is_pointer_event(),
                ev.is_gesture_event(),
                ev.is_key_event(),
                ev.is_focus_event(),
            ];
            for (bit, set) in all.iter().zip(flags) {
                assert_eq!(category.contains(*bit), set, "mask {mask:#06b}");
            }
        }
    }

    #[test]
    fn tap_is_pointer_and_gesture() {
        let tap = RoutedEvent::new("Tap", Category::POINTER | Category::GESTURE);
        assert!(tap.is_pointer_event());
        assert!(tap.is_gesture_event());
        assert!(!tap.is_key_event());
        assert!(!tap.is_focus_event());
    }

    #[test]
    fn empty_category_has_no_predicates() {
        let ev = RoutedEvent::new("Loaded", Category::empty());
        assert!(!ev.is_pointer_event());
        assert!(!ev.is_gesture_event());
        assert!(!ev.is_key_event());
        assert!(!ev.is_focus_event());
        assert!(!ev.follows_focus_scope());
    }

    #[test]
    fn identity_is_by_instance() {
        let a = RoutedEvent::new("KeyDown", Category::KEY);
        let b = RoutedEvent::new("KeyDown", Category::KEY);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn options_are_kept() {
        let up = RoutedEvent::with_options(
            "PointerReleased",
            Category::POINTER,
            EventOptions {
                routing: Routing::Bubble,
                ends_pointer_capture: true,
            },
        );
        assert_eq!(up.routing(), Routing::Bubble);
        assert!(!up.routing().tunnels());
        assert!(up.ends_pointer_capture());
        assert_eq!(format!("{up:?}"), "RoutedEvent(\"PointerReleased\")");
    }
}
