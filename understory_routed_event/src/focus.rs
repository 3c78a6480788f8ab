// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus state: which element receives key input.
//!
//! [`FocusState`] only records the focused element and reports transitions.
//! The router turns a transition into `LostFocus` / `GotFocus` occurrences
//! (see [`Router::focus`](crate::router::Router::focus)).
//!
//! ```
//! use understory_routed_event::focus::{FocusChange, FocusState};
//!
//! let mut f: FocusState<u32> = FocusState::new();
//! assert_eq!(f.set(Some(1)), Some(FocusChange { lost: None, got: Some(1) }));
//! assert_eq!(f.set(Some(1)), None);
//! assert_eq!(f.set(Some(2)), Some(FocusChange { lost: Some(1), got: Some(2) }));
//! assert_eq!(f.set(None), Some(FocusChange { lost: Some(2), got: None }));
//! ```

/// A focus transition. Leave is reported before enter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FocusChange<K> {
    /// Element that lost focus.
    pub lost: Option<K>,
    /// Element that gained focus.
    pub got: Option<K>,
}

/// The focused element, if any.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusState<K: Copy + Eq> {
    focused: Option<K>,
}

impl<K: Copy + Eq> FocusState<K> {
    /// Nothing focused.
    pub fn new() -> Self {
        Self { focused: None }
    }

    /// Currently focused element.
    pub fn focused(&self) -> Option<K> {
        self.focused
    }

    /// Move focus. Returns `None` when focus does not change.
    pub fn set(&mut self, next: Option<K>) -> Option<FocusChange<K>> {
        if self.focused == next {
            return None;
        }
        let lost = core::mem::replace(&mut self.focused, next);
        Some(FocusChange { lost, got: next })
    }

    /// Drop focus if `element` holds it, without reporting a transition.
    /// Used when the element is destroyed and can no longer be notified.
    pub fn forget(&mut self, element: K) -> bool {
        if self.focused == Some(element) {
            self.focused = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_focus_reports_only_got() {
        let mut f: FocusState<u32> = FocusState::new();
        let change = f.set(Some(7)).unwrap();
        assert_eq!(change.lost, None);
        assert_eq!(change.got, Some(7));
        assert_eq!(f.focused(), Some(7));
    }

    #[test]
    fn clearing_reports_lost() {
        let mut f: FocusState<u32> = FocusState::new();
        let _ = f.set(Some(7));
        assert_eq!(
            f.set(None),
            Some(FocusChange {
                lost: Some(7),
                got: None
            })
        );
        assert_eq!(f.set(None), None);
    }

    #[test]
    fn forget_only_matches_holder() {
        let mut f: FocusState<u32> = FocusState::new();
        let _ = f.set(Some(7));
        assert!(!f.forget(8));
        assert!(f.forget(7));
        assert_eq!(f.focused(), None);
    }
}
