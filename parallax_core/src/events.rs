// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node lifecycle events.
//!
//! Listeners are registered per node and per [`EventKind`] and are called in
//! registration order. They receive the event by reference and cannot reach
//! back into the tree; anything they need to trigger is queued by the
//! embedder and applied after the current call returns.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::geometry::{Bounds, Delta};
use crate::node::Measurements;

/// The kinds of event a node emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A snapshot was captured ahead of a layout update.
    WillUpdate,
    /// The new layout was measured.
    Measure,
    /// The layout update was resolved against the snapshot.
    DidUpdate,
    /// A layout animation was requested.
    AnimationStart,
    /// A layout animation completed.
    AnimationComplete,
    /// The projection transform changed.
    ProjectionUpdate,
    /// An exiting or idle lead has nothing left to animate.
    ExitComplete,
}

/// Payload of [`NodeEvent::DidUpdate`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutUpdate {
    /// The new layout box.
    pub layout: Bounds,
    /// The measurements taken before the update.
    pub snapshot: Measurements,
    /// Visual delta from the new layout to the snapshot.
    pub delta: Delta,
    /// Layout delta from the new layout box to the snapshot layout box.
    pub layout_delta: Delta,
    /// Whether the layout box moved or resized.
    pub has_layout_changed: bool,
    /// Whether the position relative to the closest projecting ancestor
    /// changed.
    pub has_relative_layout_changed: bool,
}

/// An event delivered to listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeEvent {
    /// See [`EventKind::WillUpdate`].
    WillUpdate,
    /// See [`EventKind::Measure`]. Carries the new layout box.
    Measure(Bounds),
    /// See [`EventKind::DidUpdate`].
    DidUpdate(LayoutUpdate),
    /// See [`EventKind::AnimationStart`].
    AnimationStart,
    /// See [`EventKind::AnimationComplete`].
    AnimationComplete,
    /// See [`EventKind::ProjectionUpdate`]. Carries the projection target.
    ProjectionUpdate(Bounds),
    /// See [`EventKind::ExitComplete`].
    ExitComplete,
}

impl NodeEvent {
    /// Returns the kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::WillUpdate => EventKind::WillUpdate,
            Self::Measure(_) => EventKind::Measure,
            Self::DidUpdate(_) => EventKind::DidUpdate,
            Self::AnimationStart => EventKind::AnimationStart,
            Self::AnimationComplete => EventKind::AnimationComplete,
            Self::ProjectionUpdate(_) => EventKind::ProjectionUpdate,
            Self::ExitComplete => EventKind::ExitComplete,
        }
    }
}

/// Handle returned when registering a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A boxed event callback.
pub type Listener = Box<dyn FnMut(&NodeEvent)>;

struct Entry {
    id: ListenerId,
    kind: EventKind,
    listener: Listener,
}

/// The listeners registered on one node.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<Entry>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.id, e.kind)))
            .finish()
    }
}

impl Listeners {
    /// Registers `listener` for `kind`.
    pub fn add(&mut self, id: ListenerId, kind: EventKind, listener: Listener) {
        self.entries.push(Entry { id, kind, listener });
    }

    /// Removes the listener registered as `id`. Returns whether it existed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Returns whether any listener is registered for `kind`.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Calls every listener registered for the event's kind, in order.
    pub fn notify(&mut self, event: &NodeEvent) {
        let kind = event.kind();
        for entry in self.entries.iter_mut().filter(|e| e.kind == kind) {
            (entry.listener)(event);
        }
    }

    /// Drops every listener.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
