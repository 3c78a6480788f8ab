// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::boxed::Box;

use crate::args::PointerId;
use crate::event::RoutedEvent;

/// Error returned by handler callbacks.
pub type BoxError = Box<dyn core::error::Error>;

/// Result type of handler callbacks.
pub type HandlerResult = Result<(), BoxError>;

/// Result type of router operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A request the router refuses in its current state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOperation {
    /// The element has been destroyed.
    #[error("element has been destroyed")]
    DestroyedElement,
    /// Another element already holds capture for this pointer.
    #[error("pointer {pointer_id:?} is already captured by another element")]
    PointerAlreadyCaptured {
        /// The contested pointer.
        pointer_id: PointerId,
    },
    /// Capture was requested for an element that is not attached to a root.
    #[error("capture target is not attached to the tree")]
    CaptureTargetDetached,
}

/// Router error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// See [`InvalidOperation`].
    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] InvalidOperation),
    /// A handler returned an error. The rest of the route was not visited.
    #[error("handler for `{event}` failed")]
    HandlerFault {
        /// Event being dispatched.
        event: RoutedEvent,
        /// The handler's error.
        #[source]
        source: BoxError,
    },
    /// Nested dispatch went deeper than
    /// [`RouterConfig::max_dispatch_depth`](crate::router::RouterConfig::max_dispatch_depth).
    #[error("nested dispatch depth limit of {limit} exceeded")]
    DispatchDepthExceeded {
        /// The configured limit.
        limit: usize,
    },
}

impl Error {
    /// Returns `true` for [`Error::InvalidOperation`].
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    /// Returns `true` for [`Error::HandlerFault`].
    pub fn is_handler_fault(&self) -> bool {
        matches!(self, Self::HandlerFault { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Category;
    use alloc::string::ToString;

    #[test]
    fn messages() {
        let e: Error = InvalidOperation::PointerAlreadyCaptured {
            pointer_id: PointerId(4),
        }
        .into();
        assert!(e.is_invalid_operation());
        assert_eq!(
            e.to_string(),
            "invalid operation: pointer PointerId(4) is already captured by another element"
        );

        let fault = Error::HandlerFault {
            event: RoutedEvent::new("Tapped", Category::GESTURE),
            source: "boom".into(),
        };
        assert!(fault.is_handler_fault());
        assert_eq!(fault.to_string(), "handler for `Tapped` failed");
        let source = core::error::Error::source(&fault).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
