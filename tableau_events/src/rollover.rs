// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rollover tracking: decide when the previous pointer target gets an out event.
//!
//! ## Usage
//!
//! 1) Pick the node under the pointer.
//! 2) Call [`Rollover::exit`] with that hit and the incoming event. If it returns an
//!    [`OutEvent`], deliver it to the previous target first.
//! 3) If the hit accepts the primary event, call [`Rollover::enter`].
//!
//! ```
//! use tableau_events::rollover::{OutEvent, Rollover};
//! use tableau_events::types::{PointerEvent, PointerKind};
//!
//! let mut r: Rollover<u32> = Rollover::new();
//! let mv = PointerEvent::new(PointerKind::Move, (5.0, 5.0));
//! assert_eq!(r.exit(Some(1), &mv), None);
//! r.enter(1);
//!
//! // Moving onto node 2 sends `Out` to node 1.
//! assert_eq!(r.exit(Some(2), &mv), Some(OutEvent { target: 1, kind: PointerKind::Out }));
//! assert_eq!(r.current(), None);
//! ```

use tracing::debug;

use crate::types::{PointerEvent, PointerKind};

/// An out notification for the previous target.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutEvent<K> {
    /// The node the pointer left.
    pub target: K,
    /// [`PointerKind::Out`] or [`PointerKind::TouchOut`].
    pub kind: PointerKind,
}

/// Remembers the last node that accepted a pointer event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rollover<K> {
    current: Option<K>,
}

impl<K: Copy + Eq + core::fmt::Debug> Rollover<K> {
    /// No current target.
    pub fn new() -> Self {
        Self { current: None }
    }

    /// The node that last accepted an event, if any.
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Work out whether the previous target must be told the pointer left it.
    ///
    /// When there is a previous target and either `hit` differs from it or `event`
    /// leaves the surface, the previous target is forgotten. The notification kind is
    /// [`PointerKind::Out`] when leaving the surface, when nothing was hit, or for
    /// mouse moves; [`PointerKind::TouchOut`] for touch moves; other kinds clear the
    /// target silently.
    pub fn exit(&mut self, hit: Option<K>, event: &PointerEvent) -> Option<OutEvent<K>> {
        let prev = self.current?;
        let leaving = event.leaves_surface();
        if hit == Some(prev) && !leaving {
            return None;
        }
        self.current = None;
        let kind = if leaving || hit.is_none() || event.kind == PointerKind::Move {
            PointerKind::Out
        } else if event.kind == PointerKind::TouchMove {
            PointerKind::TouchOut
        } else {
            debug!(target = ?prev, kind = ?event.kind, "rollover cleared without out event");
            return None;
        };
        debug!(target = ?prev, ?kind, "rollover out");
        Some(OutEvent { target: prev, kind })
    }

    /// Record `target` as the current pointer target.
    pub fn enter(&mut self, target: K) {
        self.current = Some(target);
    }

    /// Forget the current target, returning it.
    pub fn clear(&mut self) -> Option<K> {
        self.current.take()
    }
}
