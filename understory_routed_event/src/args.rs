// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-occurrence event state carried along the route.

use kurbo::Point;

use crate::event::RoutedEvent;
use crate::handlers::Phase;

/// Identifies one pointer (mouse, pen, or touch contact).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u32);

/// Pointer payload.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerData {
    /// Pointer this sample belongs to.
    pub pointer_id: PointerId,
    /// Position in window coordinates.
    pub position: Point,
    /// Bitmask of pressed buttons, as reported by the platform.
    pub buttons: u32,
}

impl PointerData {
    /// A sample with no buttons pressed.
    pub const fn new(pointer_id: PointerId, position: Point) -> Self {
        Self {
            pointer_id,
            position,
            buttons: 0,
        }
    }
}

/// Keyboard payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyData {
    /// Platform-neutral key code.
    pub key: u32,
    /// Auto-repeat.
    pub repeat: bool,
}

/// Gesture payload from an external recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GestureData {
    /// Pointer that produced the gesture, if known.
    pub pointer_id: Option<PointerId>,
    /// Position in window coordinates.
    pub position: Point,
    /// Tap count for tap-style gestures.
    pub tap_count: u32,
}

/// Category-specific payload of an occurrence.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Payload {
    /// No payload (focus transitions, custom events).
    #[default]
    None,
    /// Pointer sample.
    Pointer(PointerData),
    /// Key press or release.
    Key(KeyData),
    /// Recognized gesture.
    Gesture(GestureData),
}

impl Payload {
    /// Pointer id carried by a pointer or gesture payload.
    pub fn pointer_id(&self) -> Option<PointerId> {
        match self {
            Self::Pointer(p) => Some(p.pointer_id),
            Self::Gesture(g) => g.pointer_id,
            Self::None | Self::Key(_) => None,
        }
    }

    /// Position carried by a pointer or gesture payload.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Pointer(p) => Some(p.position),
            Self::Gesture(g) => Some(g.position),
            Self::None | Self::Key(_) => None,
        }
    }
}

/// Mutable state of one event occurrence.
///
/// `handled` only ever goes from `false` to `true` within an occurrence.
#[derive(Clone, Debug)]
pub struct RoutedEventArgs<K> {
    event: RoutedEvent,
    source: K,
    current_target: K,
    phase: Phase,
    handled: bool,
    payload: Payload,
}

impl<K: Copy> RoutedEventArgs<K> {
    pub(crate) fn new(event: RoutedEvent, source: K, payload: Payload) -> Self {
        Self {
            event,
            source,
            current_target: source,
            phase: Phase::Tunneling,
            handled: false,
            payload,
        }
    }

    /// The event identity.
    pub fn event(&self) -> &RoutedEvent {
        &self.event
    }

    /// Element the occurrence was routed to: the hit-test target, or the
    /// capturing element when pointer capture redirected it.
    pub fn source(&self) -> K {
        self.source
    }

    /// Element whose handler is currently running.
    pub fn current_target(&self) -> K {
        self.current_target
    }

    /// Phase currently being walked.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a handler has marked the occurrence handled.
    pub fn handled(&self) -> bool {
        self.handled
    }

    /// Mark the occurrence handled. Later handlers without
    /// `invoke_if_handled` are skipped; every node is still visited.
    pub fn set_handled(&mut self) {
        self.handled = true;
    }

    /// Category-specific payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub(crate) fn enter(&mut self, node: K, phase: Phase) {
        self.current_target = node;
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Category;

    #[test]
    fn payload_accessors() {
        let p = Payload::Pointer(PointerData::new(PointerId(3), Point::new(1.0, 2.0)));
        assert_eq!(p.pointer_id(), Some(PointerId(3)));
        assert_eq!(p.position(), Some(Point::new(1.0, 2.0)));

        let g = Payload::Gesture(GestureData {
            pointer_id: None,
            position: Point::ORIGIN,
            tap_count: 2,
        });
        assert_eq!(g.pointer_id(), None);
        assert_eq!(g.position(), Some(Point::ORIGIN));

        let k = Payload::Key(KeyData {
            key: 13,
            repeat: false,
        });
        assert_eq!(k.pointer_id(), None);
        assert_eq!(Payload::default().position(), None);
    }

    #[test]
    fn handled_is_sticky() {
        let ev = RoutedEvent::new("KeyDown", Category::KEY);
        let mut args = RoutedEventArgs::new(ev, 1_u32, Payload::None);
        assert!(!args.handled());
        args.enter(2, Phase::Bubbling);
        args.set_handled();
        args.set_handled();
        assert!(args.handled());
        assert_eq!(args.current_target(), 2);
        assert_eq!(args.source(), 1);
        assert_eq!(args.phase(), Phase::Bubbling);
    }
}
