// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: pointer kinds, pointer events, cursors, and dispatch records.
//!
//! These are produced by input adapters, consumed by the stage's dispatcher, and
//! handed to [`EventEmitter`](crate::emitter::EventEmitter) listeners.

use kurbo::Point;

/// Kinds of pointer input understood by the stage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerKind {
    /// A mouse button was pressed.
    Down,
    /// A mouse button was released.
    Up,
    /// The mouse moved.
    Move,
    /// The pointer left a node, or the surface.
    Out,
    /// A touch began.
    TouchStart,
    /// A touch moved.
    TouchMove,
    /// A touch ended.
    TouchEnd,
    /// A touch left a node.
    TouchOut,
}

impl PointerKind {
    /// Whether this kind comes from a touch device.
    pub const fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchOut
        )
    }
}

/// A pointer event flowing through the stage.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerKind,
    /// Position in page (host window) coordinates.
    pub page: Point,
    /// Position in stage coordinates. Filled in by the dispatcher.
    pub stage: Point,
    /// For [`PointerKind::Out`], whether the pointer went somewhere outside the
    /// drawing surface rather than to another node on it.
    pub left_surface: bool,
    /// Set on events the dispatcher generated itself (out notifications).
    pub synthetic: bool,
}

impl PointerEvent {
    /// A new event at `page` coordinates.
    pub fn new(kind: PointerKind, page: impl Into<Point>) -> Self {
        let page = page.into();
        Self {
            kind,
            page,
            stage: page,
            left_surface: false,
            synthetic: false,
        }
    }

    /// An [`PointerKind::Out`] event whose destination is outside the surface.
    pub fn leave(page: impl Into<Point>) -> Self {
        Self {
            left_surface: true,
            ..Self::new(PointerKind::Out, page)
        }
    }

    /// Whether this event means the pointer left the whole surface.
    pub fn leaves_surface(&self) -> bool {
        self.kind == PointerKind::Out && self.left_surface
    }

    /// A synthetic event of `kind` derived from this one.
    pub fn derived(&self, kind: PointerKind) -> Self {
        Self {
            kind,
            synthetic: true,
            ..*self
        }
    }
}

/// Cursor shape requested from the surface.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Cursor {
    /// Whatever the host shows by default.
    #[default]
    Default,
    /// The hand/pointer cursor.
    Pointer,
}

/// A single delivery produced by the stage's dispatcher: `event` went to `target`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Dispatch<K> {
    /// Receiver of the event.
    pub target: K,
    /// The event as delivered.
    pub event: PointerEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_marks_surface_exit() {
        let e = PointerEvent::leave((3.0, 4.0));
        assert!(e.leaves_surface());
        assert!(!PointerEvent::new(PointerKind::Out, (3.0, 4.0)).leaves_surface());
        assert!(!PointerEvent::new(PointerKind::Move, (3.0, 4.0)).leaves_surface());
    }

    #[test]
    fn derived_is_synthetic() {
        let e = PointerEvent::new(PointerKind::TouchMove, (1.0, 2.0));
        let out = e.derived(PointerKind::TouchOut);
        assert!(out.synthetic);
        assert_eq!(out.page, e.page);
        assert!(out.kind.is_touch());
        assert!(!PointerKind::Move.is_touch());
    }
}
