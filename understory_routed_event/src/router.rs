// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router: handler registration, pointer capture, focus, and dispatch.
//!
//! The [`Router`] owns the element tree, the handler table, capture and focus
//! state. All methods take `&self` so handlers, which receive the router,
//! can register handlers, capture pointers, move focus, or raise nested
//! occurrences while a dispatch is in flight.
//!
//! ## Dispatch
//!
//! 1. Pointer events carrying a captured pointer id are redirected to the
//!    capturing element. Everything else targets the given element.
//! 2. The route is resolved once: visual parents, or focus-scope parents for
//!    key and focus events.
//! 3. Handler lists for every node on the route are snapshotted.
//! 4. The walk runs tunneling root→target and bubbling target→root.
//! 5. Pointer release and cancel events end capture for their pointer.
//!
//! ## Re-entrancy
//!
//! No `RefCell` borrow is held while a handler runs. Handlers may borrow the
//! tree through [`Router::tree_mut`] but must release it before returning or
//! raising another occurrence.
//!
//! ## Element lifetime
//!
//! Destroy elements with [`Router::remove_element`] (or call
//! [`Router::element_destroyed`] for each id when driving your own
//! [`ElementTree`]) so their handlers, captures and focus are dropped.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_routed_event::args::Payload;
//! use understory_routed_event::handlers::HandlerOptions;
//! use understory_routed_event::registry::EventRegistry;
//! use understory_routed_event::router::Router;
//! use understory_routed_event::tree::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(None);
//! let parent = tree.insert(Some(root));
//! let child = tree.insert(Some(parent));
//!
//! let events = EventRegistry::standard();
//! let tapped = events.standard_events().unwrap().tapped.clone();
//! let router = Router::new(tree, events);
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! for (node, name) in [(root, "root"), (parent, "parent"), (child, "child")] {
//!     let log = log.clone();
//!     router
//!         .add_handler(node, &tapped, move |_, _| {
//!             log.borrow_mut().push(name);
//!             Ok(())
//!         }, HandlerOptions::bubbling())
//!         .unwrap();
//! }
//!
//! let handled = router.dispatch(&tapped, child, Payload::None).unwrap();
//! assert!(!handled);
//! assert_eq!(*log.borrow(), ["child", "parent", "root"]);
//! ```

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;

use kurbo::Point;

use crate::args::{Payload, PointerData, PointerId, RoutedEventArgs};
use crate::capture::CaptureManager;
use crate::chain::{ChainKind, Route, resolve_chain};
use crate::dispatcher::{self, Dispatch, DispatchState, Plan, Report};
use crate::error::{Error, HandlerResult, InvalidOperation, Result};
use crate::event::RoutedEvent;
use crate::focus::FocusState;
use crate::handlers::{HandlerOptions, HandlerTable, HandlerToken};
use crate::registry::EventRegistry;
use crate::tree::{ElementTree, NodeId, Tree};

/// Element key of a tree.
pub type KeyOf<T> = <T as ElementTree>::Key;

/// Stored handler callback.
///
/// `Fn` rather than `FnMut`: a handler can be re-entered by a nested
/// occurrence it raised. Keep mutable state in `Cell`/`RefCell`.
pub type Handler<T> = Rc<dyn Fn(&Router<T>, &mut RoutedEventArgs<KeyOf<T>>) -> HandlerResult>;

type Table<T> = HandlerTable<KeyOf<T>, Handler<T>>;

/// Router limits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RouterConfig {
    /// Deepest allowed nesting of dispatches raised from handlers.
    /// The outer-most dispatch counts as depth 1.
    pub max_dispatch_depth: usize,
    /// Longest route resolved before truncation.
    pub max_route_len: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: 32,
            max_route_len: 1024,
        }
    }
}

/// Result of one dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport<K> {
    /// Final handled flag.
    pub handled: bool,
    /// Element the occurrence was delivered to, `None` if it was dropped
    /// because the target no longer exists.
    pub target: Option<K>,
    /// Whether pointer capture chose the target.
    pub captured: bool,
    /// Steps visited, in order.
    pub visited: Vec<Dispatch<K>>,
    /// Handlers invoked.
    pub invoked: usize,
    /// Handlers skipped.
    pub skipped: usize,
}

/// Routed event dispatcher over an element tree.
pub struct Router<T: ElementTree> {
    tree: RefCell<T>,
    events: EventRegistry,
    handlers: Rc<RefCell<Table<T>>>,
    captures: RefCell<CaptureManager<KeyOf<T>>>,
    focus: RefCell<FocusState<KeyOf<T>>>,
    config: RouterConfig,
    depth: Cell<usize>,
}

impl<T: ElementTree + fmt::Debug> fmt::Debug for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("tree", &self.tree)
            .field("events", &self.events.len())
            .field("handlers", &self.handlers.borrow().len())
            .field("captures", &self.captures)
            .field("focus", &self.focus)
            .field("config", &self.config)
            .field("depth", &self.depth.get())
            .finish()
    }
}

impl<T: ElementTree + 'static> Router<T> {
    /// Create a router with the default [`RouterConfig`].
    pub fn new(tree: T, events: EventRegistry) -> Self {
        Self::with_config(tree, events, RouterConfig::default())
    }

    /// Create a router with explicit limits.
    pub fn with_config(tree: T, events: EventRegistry, config: RouterConfig) -> Self {
        Self {
            tree: RefCell::new(tree),
            events,
            handlers: Rc::new(RefCell::new(HandlerTable::new())),
            captures: RefCell::new(CaptureManager::new()),
            focus: RefCell::new(FocusState::new()),
            config,
            depth: Cell::new(0),
        }
    }

    /// Shared access to the tree.
    pub fn tree(&self) -> Ref<'_, T> {
        self.tree.borrow()
    }

    /// Exclusive access to the tree. Release it before raising events.
    ///
    /// Destroying elements through this does not purge their handlers or
    /// captures; dispatch skips them until
    /// [`element_destroyed`](Self::element_destroyed) drops them. With the
    /// built-in [`Tree`], use [`remove_element`](Router::remove_element).
    pub fn tree_mut(&self) -> RefMut<'_, T> {
        self.tree.borrow_mut()
    }

    /// The registry this router was built with.
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Limits in effect.
    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Current nesting depth of dispatch; 0 when idle.
    pub fn dispatch_depth(&self) -> usize {
        self.depth.get()
    }

    /// Register `callback` on `element` for `event`.
    ///
    /// Fails with [`InvalidOperation::DestroyedElement`] if `element` is dead.
    /// A registration made during dispatch takes effect from the next occurrence.
    pub fn add_handler<F>(
        &self,
        element: KeyOf<T>,
        event: &RoutedEvent,
        callback: F,
        options: HandlerOptions,
    ) -> Result<HandlerToken>
    where
        F: Fn(&Self, &mut RoutedEventArgs<KeyOf<T>>) -> HandlerResult + 'static,
    {
        if !self.tree.borrow().is_alive(element) {
            return Err(InvalidOperation::DestroyedElement.into());
        }
        let token = self
            .handlers
            .borrow_mut()
            .register(element, event, Rc::new(callback), options);
        tracing::trace!(event = %event, node = ?element, ?token, "handler added");
        Ok(token)
    }

    /// Like [`add_handler`](Self::add_handler), but the registration is
    /// removed when the returned guard drops.
    pub fn add_scoped_handler<F>(
        &self,
        element: KeyOf<T>,
        event: &RoutedEvent,
        callback: F,
        options: HandlerOptions,
    ) -> Result<HandlerGuard<T>>
    where
        F: Fn(&Self, &mut RoutedEventArgs<KeyOf<T>>) -> HandlerResult + 'static,
    {
        let token = self.add_handler(element, event, callback, options)?;
        Ok(HandlerGuard {
            token,
            table: Rc::downgrade(&self.handlers),
        })
    }

    /// Remove one registration. Returns `false` if it was already removed.
    pub fn remove_handler(&self, token: HandlerToken) -> bool {
        self.handlers.borrow_mut().remove(token)
    }

    /// Remove every handler attached to `element`.
    pub fn unregister_all(&self, element: KeyOf<T>) -> usize {
        self.handlers.borrow_mut().unregister_all(element)
    }

    /// Number of handlers attached to `element`.
    pub fn handler_count(&self, element: KeyOf<T>) -> usize {
        self.handlers.borrow().count_for(element)
    }

    /// Tear down router state for a destroyed element: its handlers, the
    /// pointers it captured, and focus. No events are raised.
    pub fn element_destroyed(&self, element: KeyOf<T>) {
        let removed = self.unregister_all(element);
        let released = self.captures.borrow_mut().release_all_for(element);
        let unfocused = self.focus.borrow_mut().forget(element);
        tracing::debug!(
            node = ?element,
            handlers = removed,
            captures = released.len(),
            unfocused,
            "element torn down"
        );
    }

    /// Route every later event for `pointer_id` to `element`.
    ///
    /// Re-capturing by the current holder succeeds without change. Fails if
    /// another element holds the pointer, or `element` is dead or detached.
    pub fn capture_pointer(&self, pointer_id: PointerId, element: KeyOf<T>) -> Result<()> {
        {
            let tree = self.tree.borrow();
            if !tree.is_alive(element) {
                return Err(InvalidOperation::DestroyedElement.into());
            }
            if !tree.is_attached(element) {
                return Err(InvalidOperation::CaptureTargetDetached.into());
            }
        }
        if self.captures.borrow_mut().capture(pointer_id, element)? {
            tracing::debug!(pointer = ?pointer_id, node = ?element, "pointer captured");
        }
        Ok(())
    }

    /// Clear capture for `pointer_id` and notify the former holder with
    /// `PointerCaptureLost` when the registry defines it.
    ///
    /// Returns `Ok(false)` if nothing was captured.
    pub fn release_pointer_capture(&self, pointer_id: PointerId) -> Result<bool> {
        self.release_capture_at(pointer_id, Point::ZERO)
    }

    /// Element currently capturing `pointer_id`.
    pub fn captured(&self, pointer_id: PointerId) -> Option<KeyOf<T>> {
        self.captures.borrow().captured(pointer_id)
    }

    /// Focused element.
    pub fn focused(&self) -> Option<KeyOf<T>> {
        self.focus.borrow().focused()
    }

    /// Move focus to `element`, or clear it with `None`.
    ///
    /// Raises `LostFocus` on the old element, then `GotFocus` on the new one,
    /// when the registry defines them. Returns `Ok(false)` if focus did not move.
    pub fn focus(&self, element: Option<KeyOf<T>>) -> Result<bool> {
        if let Some(node) = element
            && !self.tree.borrow().is_alive(node)
        {
            return Err(InvalidOperation::DestroyedElement.into());
        }
        let Some(change) = self.focus.borrow_mut().set(element) else {
            return Ok(false);
        };
        tracing::debug!(lost = ?change.lost, got = ?change.got, "focus moved");
        let standard = self.events.standard_events();
        if let Some(lost) = change.lost
            && let Some(std) = standard
        {
            self.dispatch(&std.lost_focus, lost, Payload::None)?;
        }
        if let Some(got) = change.got
            && let Some(std) = standard
        {
            self.dispatch(&std.got_focus, got, Payload::None)?;
        }
        Ok(true)
    }

    /// Raise `event` at the focused element. Returns `Ok(false)` when nothing is focused.
    pub fn dispatch_to_focus(&self, event: &RoutedEvent, payload: Payload) -> Result<bool> {
        match self.focused() {
            Some(node) => self.dispatch(event, node, payload),
            None => Ok(false),
        }
    }

    /// Raise `event` at `target` and return the final handled flag.
    ///
    /// A dead target drops the occurrence and returns `Ok(false)`.
    /// A handler error aborts the remaining route and is returned as
    /// [`Error::HandlerFault`].
    pub fn dispatch(
        &self,
        event: &RoutedEvent,
        target: KeyOf<T>,
        payload: Payload,
    ) -> Result<bool> {
        self.dispatch_report(event, target, payload)
            .map(|r| r.handled)
    }

    /// Like [`dispatch`](Self::dispatch), also reporting what the walk did.
    pub fn dispatch_report(
        &self,
        event: &RoutedEvent,
        target: KeyOf<T>,
        payload: Payload,
    ) -> Result<DispatchReport<KeyOf<T>>> {
        let _depth = DepthGuard::enter(&self.depth, self.config.max_dispatch_depth)?;
        tracing::trace!(event = %event, node = ?target, state = ?DispatchState::Idle, "dispatch");

        let pointer_id = payload.pointer_id().filter(|_| event.is_pointer_event());
        let Some(route) = self.build_route(event, target, pointer_id) else {
            tracing::debug!(event = %event, node = ?target, "target destroyed; occurrence dropped");
            return Ok(DispatchReport {
                handled: false,
                target: None,
                captured: false,
                visited: Vec::new(),
                invoked: 0,
                skipped: 0,
            });
        };

        let plan = {
            let table = self.handlers.borrow();
            Plan::new(route.nodes(), event.routing(), |node| {
                table.snapshot(node, event)
            })
        };
        let mut args = RoutedEventArgs::new(event.clone(), route.target(), payload);
        let mut report = Report::default();
        let walk = dispatcher::run(
            &plan,
            &mut args,
            |node| self.tree.borrow().is_alive(node),
            |callback, args| callback(self, args),
            &mut report,
        );

        let ends_capture = pointer_id.filter(|_| event.ends_pointer_capture());
        if let Err(source) = walk {
            tracing::debug!(event = %event, "handler fault; route aborted");
            // Pointer-up still ends capture; the holder is not notified.
            if let Some(pointer_id) = ends_capture
                && let Some(holder) = self.captures.borrow_mut().release(pointer_id)
            {
                tracing::debug!(pointer = ?pointer_id, node = ?holder, "pointer capture released");
            }
            return Err(Error::HandlerFault {
                event: event.clone(),
                source,
            });
        }
        if let Some(pointer_id) = ends_capture {
            let position = payload.position().unwrap_or(Point::ZERO);
            self.release_capture_at(pointer_id, position)?;
        }

        Ok(DispatchReport {
            handled: args.handled(),
            target: Some(route.target()),
            captured: route.is_captured(),
            visited: report.visited,
            invoked: report.invoked,
            skipped: report.skipped,
        })
    }

    /// Resolve the route, honoring pointer capture. `None` if the target is dead.
    fn build_route(
        &self,
        event: &RoutedEvent,
        target: KeyOf<T>,
        pointer_id: Option<PointerId>,
    ) -> Option<Route<KeyOf<T>>> {
        let tree = self.tree.borrow();
        let holder = pointer_id.and_then(|id| {
            let holder = self.captures.borrow().captured(id)?;
            Some((id, holder))
        });
        if let Some((pointer_id, holder)) = holder {
            if tree.is_attached(holder) {
                let max_len = self.config.max_route_len;
                if let Some(route) = resolve_chain(&*tree, holder, ChainKind::Visual, max_len) {
                    return Some(route.mark_captured());
                }
            } else {
                // Never deliver to a capture target that is gone.
                self.captures.borrow_mut().release(pointer_id);
                tracing::debug!(pointer = ?pointer_id, node = ?holder, "stale capture cleared");
            }
        }
        let kind = if event.follows_focus_scope() {
            ChainKind::FocusScope
        } else {
            ChainKind::Visual
        };
        resolve_chain(&*tree, target, kind, self.config.max_route_len)
    }

    fn release_capture_at(&self, pointer_id: PointerId, position: Point) -> Result<bool> {
        let Some(holder) = self.captures.borrow_mut().release(pointer_id) else {
            return Ok(false);
        };
        tracing::debug!(pointer = ?pointer_id, node = ?holder, "pointer capture released");
        let alive = self.tree.borrow().is_alive(holder);
        if alive && let Some(std) = self.events.standard_events() {
            let payload = Payload::Pointer(PointerData::new(pointer_id, position));
            self.dispatch(&std.pointer_capture_lost, holder, payload)?;
        }
        Ok(true)
    }
}

impl Router<Tree> {
    /// Destroy `element` and its subtree, then tear down router state for
    /// every destroyed element. Returns the destroyed ids.
    pub fn remove_element(&self, element: NodeId) -> Vec<NodeId> {
        let removed = self.tree.borrow_mut().remove(element);
        for &node in &removed {
            self.element_destroyed(node);
        }
        removed
    }
}

/// Removes a handler registration when dropped.
///
/// Returned by [`Router::add_scoped_handler`]. Dropping after the router is
/// gone is a no-op.
pub struct HandlerGuard<T: ElementTree> {
    token: HandlerToken,
    table: Weak<RefCell<Table<T>>>,
}

impl<T: ElementTree> HandlerGuard<T> {
    /// The guarded registration.
    pub fn token(&self) -> HandlerToken {
        self.token
    }

    /// Keep the registration alive past the guard, returning its token.
    pub fn detach(mut self) -> HandlerToken {
        self.table = Weak::new();
        self.token
    }
}

impl<T: ElementTree> Drop for HandlerGuard<T> {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().remove(self.token);
        }
    }
}

impl<T: ElementTree> fmt::Debug for HandlerGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerGuard")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Tracks nesting depth for the lifetime of one dispatch.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>, limit: usize) -> Result<Self> {
        let next = depth.get() + 1;
        if next > limit {
            tracing::warn!(limit, "dispatch depth limit exceeded");
            return Err(Error::DispatchDepthExceeded { limit });
        }
        depth.set(next);
        Ok(Self { depth })
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
