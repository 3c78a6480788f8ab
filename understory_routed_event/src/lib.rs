// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Routed Event: a `no_std` routed-event engine for element trees.
//!
//! ## Overview
//!
//! An occurrence of a [`RoutedEvent`](crate::event::RoutedEvent) is raised at a target element
//! and travels along that element's ancestor chain.
//! Handlers registered on chain elements run in a deterministic order: tunneling from the root
//! down to the target, then bubbling from the target back up to the root.
//! The crate does not do hit testing or layout. It only needs parent links from an
//! [`ElementTree`](crate::tree::ElementTree).
//!
//! ## Events
//!
//! A [`RoutedEvent`](crate::event::RoutedEvent) is a name plus
//! [`Category`](crate::event::Category) flags (pointer, gesture, key, focus) and a
//! [`Routing`](crate::event::Routing) strategy.
//! Events compare by identity: two events with the same name are still different events.
//! [`EventRegistry`](crate::registry::EventRegistry) collects the events a router knows about,
//! including the standard pointer, gesture, key and focus set.
//!
//! ## Handlers
//!
//! Handlers are registered per element, event and [`Phase`](crate::handlers::Phase) and run in
//! registration order.
//! Once an occurrence is marked handled, the remaining handlers are skipped unless they asked for
//! [`invoke_if_handled`](crate::handlers::HandlerOptions::invoke_if_handled).
//! Skipped elements are still visited, so the walk always covers the full route.
//!
//! Handler lists are snapshotted when the occurrence starts. Registrations made by a handler
//! take effect from the next occurrence.
//!
//! ## Pointer capture
//!
//! While an element captures a pointer, pointer events for that pointer are routed to the
//! capturing element's chain no matter where they were raised.
//! Capture ends on explicit release, on pointer release or cancel, or when the capturing
//! element leaves the tree.
//!
//! ## Focus
//!
//! Key and focus events follow focus-scope links where an element has one, so input raised in a
//! popup can bubble through the element that owns it.
//! [`Router::focus`](crate::router::Router::focus) raises `LostFocus` then `GotFocus`.
//!
//! ## Errors
//!
//! A handler that returns an error aborts the rest of the route and the error is surfaced as
//! [`Error::HandlerFault`](crate::error::Error::HandlerFault).
//! Misuse such as capturing an already captured pointer is reported as
//! [`Error::InvalidOperation`](crate::error::Error::InvalidOperation).
//!
//! ## Example
//!
//! ```
//! use understory_routed_event::args::{Payload, PointerData, PointerId};
//! use understory_routed_event::handlers::HandlerOptions;
//! use understory_routed_event::registry::EventRegistry;
//! use understory_routed_event::router::Router;
//! use understory_routed_event::tree::Tree;
//! use kurbo::Point;
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(None);
//! let parent = tree.insert(Some(root));
//! let child = tree.insert(Some(parent));
//!
//! let events = EventRegistry::standard();
//! let moved = events.get("PointerMoved").unwrap().clone();
//! let router = Router::new(tree, events);
//!
//! router
//!     .add_handler(parent, &moved, |_, args| {
//!         args.set_handled();
//!         Ok(())
//!     }, HandlerOptions::bubbling())
//!     .unwrap();
//!
//! // Capture sends the move to `child`, whose chain still passes `parent`.
//! router.capture_pointer(PointerId(1), child).unwrap();
//! let payload = Payload::Pointer(PointerData::new(PointerId(1), Point::new(3.0, 4.0)));
//! let report = router.dispatch_report(&moved, root, payload).unwrap();
//! assert!(report.handled);
//! assert_eq!(report.target, Some(child));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod args;
pub mod capture;
pub mod chain;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod focus;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod tree;

pub use error::{BoxError, Error, HandlerResult, InvalidOperation, Result};
