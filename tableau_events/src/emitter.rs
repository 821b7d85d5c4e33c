// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry keyed by event kind.
//!
//! Every display node embeds one [`EventEmitter`]. Listeners are plain closures
//! registered per kind and invoked in registration order.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tableau_events::emitter::EventEmitter;
//! use tableau_events::types::{PointerEvent, PointerKind};
//!
//! let clicks = Rc::new(Cell::new(0));
//! let mut emitter = EventEmitter::<PointerEvent>::new();
//! let seen = clicks.clone();
//! let id = emitter.on(PointerKind::Down, move |_| seen.set(seen.get() + 1));
//!
//! assert_eq!(emitter.emit(&PointerEvent::new(PointerKind::Down, (0.0, 0.0))), 1);
//! assert_eq!(emitter.emit(&PointerEvent::new(PointerKind::Up, (0.0, 0.0))), 0);
//! assert!(emitter.off(id));
//! assert_eq!(emitter.emit(&PointerEvent::new(PointerKind::Down, (0.0, 0.0))), 0);
//! assert_eq!(clicks.get(), 1);
//! ```

use core::fmt;

use crate::types::{PointerEvent, PointerKind};

/// An event that can be routed by kind.
pub trait Event {
    /// Discriminant listeners subscribe to.
    type Kind: Copy + Eq + fmt::Debug;
    /// The kind of this event.
    fn kind(&self) -> Self::Kind;
}

impl Event for PointerEvent {
    type Kind = PointerKind;
    fn kind(&self) -> PointerKind {
        self.kind
    }
}

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(u64);

struct Listener<E: Event> {
    id: ListenerId,
    kind: E::Kind,
    callback: Box<dyn FnMut(&E)>,
}

/// Per-object listener registry.
pub struct EventEmitter<E: Event = PointerEvent> {
    listeners: Vec<Listener<E>>,
    next_id: u64,
}

impl<E: Event> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<E::Kind> = self.listeners.iter().map(|l| l.kind).collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &kinds)
            .finish_non_exhaustive()
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventEmitter<E> {
    /// An emitter with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribe `callback` to events of `kind`.
    pub fn on(&mut self, kind: E::Kind, callback: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Remove every listener for `kind`, or every listener at all when `kind` is `None`.
    pub fn off_all(&mut self, kind: Option<E::Kind>) {
        match kind {
            Some(k) => self.listeners.retain(|l| l.kind != k),
            None => self.listeners.clear(),
        }
    }

    /// Whether anything listens for `kind`.
    pub fn has_listeners(&self, kind: E::Kind) -> bool {
        self.listeners.iter().any(|l| l.kind == kind)
    }

    /// Invoke the listeners registered for the event's kind, in registration order.
    /// Returns how many ran.
    pub fn emit(&mut self, event: &E) -> usize {
        let kind = event.kind();
        let mut count = 0;
        for l in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (l.callback)(event);
            count += 1;
        }
        count
    }
}
