// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Events: pointer input plumbing for a 2D display list.
//!
//! ## Overview
//!
//! This crate does not hit test. The stage picks a target and uses these pieces to
//! decide who hears about it:
//!
//! - [`PointerEvent`](crate::types::PointerEvent) carries the kind, page and stage
//!   coordinates, and whether the pointer left the surface.
//! - [`EventEmitter`](crate::emitter::EventEmitter) is the listener registry embedded
//!   in every display node.
//! - [`Rollover`](crate::rollover::Rollover) remembers the last target and yields the
//!   out notification owed to it when the pointer moves on.
//! - [`Dispatch`](crate::types::Dispatch) records one delivery, so callers can replay
//!   the sequence against their own state.
//!
//! ## Ordering
//!
//! For a single incoming event the stage delivers, in order: the out event to the
//! previous target (if owed), the primary event to the new target (if it accepts
//! events and the event is not itself an out), then the event to the stage.

pub mod emitter;
pub mod rollover;
pub mod types;

pub use emitter::{Event, EventEmitter, ListenerId};
pub use rollover::{OutEvent, Rollover};
pub use types::{Cursor, Dispatch, PointerEvent, PointerKind};
