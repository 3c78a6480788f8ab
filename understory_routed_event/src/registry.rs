// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event registry: the set of identities a router knows about.
//!
//! A registry is built once with [`EventRegistryBuilder`] and is immutable
//! afterwards. It is passed to the [`Router`](crate::router::Router)
//! explicitly; there is no ambient global table.
//!
//! ```
//! use understory_routed_event::event::{Category, RoutedEvent};
//! use understory_routed_event::registry::EventRegistry;
//!
//! let swipe = RoutedEvent::new("Swipe", Category::POINTER | Category::GESTURE);
//! let events = EventRegistry::builder()
//!     .with_standard_events()
//!     .register(swipe.clone())
//!     .build();
//!
//! assert_eq!(events.get("Swipe"), Some(&swipe));
//! let std = events.standard_events().unwrap();
//! assert!(std.tapped.is_gesture_event());
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::event::{Category, EventOptions, RoutedEvent, Routing};

/// The standard pointer, gesture, key, and focus events.
///
/// Each call to [`StandardEvents::new`] creates fresh identities; share one
/// set through an [`EventRegistry`].
#[derive(Clone, Debug)]
pub struct StandardEvents {
    /// Pointer entered an element. Direct.
    pub pointer_entered: RoutedEvent,
    /// Pointer pressed.
    pub pointer_pressed: RoutedEvent,
    /// Pointer moved.
    pub pointer_moved: RoutedEvent,
    /// Pointer released. Ends pointer capture.
    pub pointer_released: RoutedEvent,
    /// Pointer exited an element. Direct.
    pub pointer_exited: RoutedEvent,
    /// Pointer canceled by the platform. Ends pointer capture.
    pub pointer_canceled: RoutedEvent,
    /// The element lost its pointer capture.
    pub pointer_capture_lost: RoutedEvent,
    /// Wheel rotated.
    pub pointer_wheel_changed: RoutedEvent,
    /// Tap gesture.
    pub tapped: RoutedEvent,
    /// Double-tap gesture.
    pub double_tapped: RoutedEvent,
    /// Secondary tap gesture.
    pub right_tapped: RoutedEvent,
    /// Press-and-hold gesture.
    pub holding: RoutedEvent,
    /// Key down, tunneling form.
    pub preview_key_down: RoutedEvent,
    /// Key down.
    pub key_down: RoutedEvent,
    /// Key up, tunneling form.
    pub preview_key_up: RoutedEvent,
    /// Key up.
    pub key_up: RoutedEvent,
    /// Element received focus. Bubbles.
    pub got_focus: RoutedEvent,
    /// Element lost focus. Bubbles.
    pub lost_focus: RoutedEvent,
}

impl StandardEvents {
    /// Create a fresh set of standard identities.
    pub fn new() -> Self {
        let direct = EventOptions {
            routing: Routing::Direct,
            ..EventOptions::default()
        };
        let ends_capture = EventOptions {
            ends_pointer_capture: true,
            ..EventOptions::default()
        };
        let bubble = EventOptions {
            routing: Routing::Bubble,
            ..EventOptions::default()
        };
        let pointer = Category::POINTER;
        let gesture = Category::POINTER | Category::GESTURE;
        Self {
            pointer_entered: RoutedEvent::with_options("PointerEntered", pointer, direct),
            pointer_pressed: RoutedEvent::new("PointerPressed", pointer),
            pointer_moved: RoutedEvent::new("PointerMoved", pointer),
            pointer_released: RoutedEvent::with_options("PointerReleased", pointer, ends_capture),
            pointer_exited: RoutedEvent::with_options("PointerExited", pointer, direct),
            pointer_canceled: RoutedEvent::with_options("PointerCanceled", pointer, ends_capture),
            pointer_capture_lost: RoutedEvent::with_options("PointerCaptureLost", pointer, bubble),
            pointer_wheel_changed: RoutedEvent::new("PointerWheelChanged", pointer),
            tapped: RoutedEvent::new("Tapped", gesture),
            double_tapped: RoutedEvent::new("DoubleTapped", gesture),
            right_tapped: RoutedEvent::new("RightTapped", gesture),
            holding: RoutedEvent::new("Holding", gesture),
            preview_key_down: RoutedEvent::new("PreviewKeyDown", Category::KEY),
            key_down: RoutedEvent::with_options("KeyDown", Category::KEY, bubble),
            preview_key_up: RoutedEvent::new("PreviewKeyUp", Category::KEY),
            key_up: RoutedEvent::with_options("KeyUp", Category::KEY, bubble),
            got_focus: RoutedEvent::with_options("GotFocus", Category::FOCUS, bubble),
            lost_focus: RoutedEvent::with_options("LostFocus", Category::FOCUS, bubble),
        }
    }

    /// All identities in declaration order.
    pub fn to_vec(&self) -> Vec<RoutedEvent> {
        [
            &self.pointer_entered,
            &self.pointer_pressed,
            &self.pointer_moved,
            &self.pointer_released,
            &self.pointer_exited,
            &self.pointer_canceled,
            &self.pointer_capture_lost,
            &self.pointer_wheel_changed,
            &self.tapped,
            &self.double_tapped,
            &self.right_tapped,
            &self.holding,
            &self.preview_key_down,
            &self.key_down,
            &self.preview_key_up,
            &self.key_up,
            &self.got_focus,
            &self.lost_focus,
        ]
        .into_iter()
        .cloned()
        .collect()
    }
}

impl Default for StandardEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable set of routed event identities.
///
/// Internally wraps an `Rc`, so cloning is cheap and clones share identities.
#[derive(Clone, Debug)]
pub struct EventRegistry {
    inner: Rc<RegistryData>,
}

#[derive(Debug, Default)]
struct RegistryData {
    /// Registration order.
    events: Vec<RoutedEvent>,
    standard: Option<StandardEvents>,
}

impl EventRegistry {
    /// Start building a registry.
    pub fn builder() -> EventRegistryBuilder {
        EventRegistryBuilder::default()
    }

    /// A registry holding only the [`StandardEvents`].
    pub fn standard() -> Self {
        Self::builder().with_standard_events().build()
    }

    /// The standard events, if the registry was built with them.
    pub fn standard_events(&self) -> Option<&StandardEvents> {
        self.inner.standard.as_ref()
    }

    /// First identity registered under `name`.
    pub fn get(&self, name: &str) -> Option<&RoutedEvent> {
        self.inner.events.iter().find(|ev| ev.name() == name)
    }

    /// Returns `true` if this exact identity is registered.
    pub fn contains(&self, event: &RoutedEvent) -> bool {
        self.inner.events.contains(event)
    }

    /// Iterate identities in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RoutedEvent> + '_ {
        self.inner.events.iter()
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.inner.events.len()
    }

    /// Returns `true` if no identities are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.events.is_empty()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`EventRegistry`].
#[derive(Debug, Default)]
pub struct EventRegistryBuilder {
    events: Vec<RoutedEvent>,
    standard: Option<StandardEvents>,
}

impl EventRegistryBuilder {
    /// Include a fresh set of [`StandardEvents`]. Calling this twice keeps the first set.
    #[must_use]
    pub fn with_standard_events(mut self) -> Self {
        if self.standard.is_none() {
            let standard = StandardEvents::new();
            self.events.extend(standard.to_vec());
            self.standard = Some(standard);
        }
        self
    }

    /// Add an identity. Registering the same instance twice is ignored.
    #[must_use]
    pub fn register(mut self, event: RoutedEvent) -> Self {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> EventRegistry {
        EventRegistry {
            inner: Rc::new(RegistryData {
                events: self.events,
                standard: self.standard,
            }),
        }
    }
}
