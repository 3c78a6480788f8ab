// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer capture bookkeeping.
//!
//! At most one element holds capture per pointer. Element liveness is
//! validated by the router, which owns the tree; this type only records who
//! holds what.
//!
//! ```
//! use understory_routed_event::args::PointerId;
//! use understory_routed_event::capture::CaptureManager;
//!
//! let mut captures: CaptureManager<u32> = CaptureManager::new();
//! assert!(captures.capture(PointerId(1), 10).is_ok());
//! assert!(captures.capture(PointerId(1), 11).is_err());
//! assert_eq!(captures.captured(PointerId(1)), Some(10));
//! assert_eq!(captures.release(PointerId(1)), Some(10));
//! assert_eq!(captures.release(PointerId(1)), None);
//! ```

use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::args::PointerId;
use crate::error::InvalidOperation;

/// Current capture holder per pointer.
#[derive(Clone, Debug)]
pub struct CaptureManager<K> {
    captures: HashMap<PointerId, K>,
}

impl<K: Copy + Eq + Hash> CaptureManager<K> {
    /// No captures.
    pub fn new() -> Self {
        Self {
            captures: HashMap::new(),
        }
    }

    /// Bind `pointer_id` to `element`.
    ///
    /// Returns `Ok(true)` for a new capture and `Ok(false)` if `element`
    /// already holds it. Fails if a different element holds the pointer.
    pub fn capture(&mut self, pointer_id: PointerId, element: K) -> Result<bool, InvalidOperation> {
        match self.captures.get(&pointer_id) {
            Some(holder) if *holder == element => Ok(false),
            Some(_) => Err(InvalidOperation::PointerAlreadyCaptured { pointer_id }),
            None => {
                self.captures.insert(pointer_id, element);
                Ok(true)
            }
        }
    }

    /// Clear capture for `pointer_id`, returning the former holder.
    /// Releasing an uncaptured pointer is a no-op.
    pub fn release(&mut self, pointer_id: PointerId) -> Option<K> {
        self.captures.remove(&pointer_id)
    }

    /// Element holding `pointer_id`, if any.
    pub fn captured(&self, pointer_id: PointerId) -> Option<K> {
        self.captures.get(&pointer_id).copied()
    }

    /// Release every pointer held by `element`, returning those pointers in ascending order.
    pub fn release_all_for(&mut self, element: K) -> SmallVec<[PointerId; 2]> {
        let mut released: SmallVec<[PointerId; 2]> = self
            .captures
            .iter()
            .filter(|(_, holder)| **holder == element)
            .map(|(id, _)| *id)
            .collect();
        released.sort_unstable();
        for id in &released {
            self.captures.remove(id);
        }
        released
    }

    /// Iterate `(pointer, holder)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (PointerId, K)> + '_ {
        self.captures.iter().map(|(id, k)| (*id, *k))
    }

    /// Returns `true` if no pointer is captured.
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

impl<K: Copy + Eq + Hash> Default for CaptureManager<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recapture_by_holder_is_a_noop() {
        let mut c: CaptureManager<u32> = CaptureManager::new();
        assert_eq!(c.capture(PointerId(1), 5), Ok(true));
        assert_eq!(c.capture(PointerId(1), 5), Ok(false));
        assert_eq!(
            c.capture(PointerId(1), 6),
            Err(InvalidOperation::PointerAlreadyCaptured {
                pointer_id: PointerId(1)
            })
        );
        assert_eq!(c.captured(PointerId(1)), Some(5));
    }

    #[test]
    fn pointers_are_independent() {
        let mut c: CaptureManager<u32> = CaptureManager::new();
        c.capture(PointerId(1), 5).unwrap();
        c.capture(PointerId(2), 6).unwrap();
        assert_eq!(c.release(PointerId(1)), Some(5));
        assert_eq!(c.captured(PointerId(2)), Some(6));
        assert_eq!(c.iter().count(), 1);
    }

    #[test]
    fn release_all_for_element() {
        let mut c: CaptureManager<u32> = CaptureManager::new();
        c.capture(PointerId(3), 5).unwrap();
        c.capture(PointerId(1), 5).unwrap();
        c.capture(PointerId(2), 6).unwrap();
        assert_eq!(c.release_all_for(5).as_slice(), &[PointerId(1), PointerId(3)]);
        assert!(c.release_all_for(5).is_empty());
        assert_eq!(c.captured(PointerId(2)), Some(6));
        c.release(PointerId(2));
        assert!(c.is_empty());
    }
}
