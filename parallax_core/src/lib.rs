// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout projection and shared-element transitions.
//!
//! `parallax_core` animates layout changes with the FLIP technique: before
//! a layout change every affected element is measured, after it the new
//! layout is measured again, and a transform is computed that projects each
//! element from its new layout back onto where it was. Animating that
//! transform to identity makes the element glide into place, while the
//! real layout has already changed. It is `no_std` compatible (with
//! `alloc`) and never touches real elements; a
//! [`ProjectionHost`](host::ProjectionHost) measures and renders for it.
//!
//! # Architecture
//!
//! ```text
//!   will_update(node) ──► snapshot (measure, remove scroll + transforms)
//!                                 │
//!            embedder mutates the real layout
//!                                 │
//!   did_update() ──► microtask: root update
//!                                 │
//!     reset transforms ──► measure layouts ──► diff vs snapshot
//!                                 │
//!                                 ▼
//!     DidUpdate ──► start animation ──► sync flush (update, pre-render, render)
//!                                 │
//!   process_frame(ts) ◄───────────┘  (once per display frame)
//!     │
//!     ├─ Update:    tick animations, mix target deltas
//!     ├─ PreRender: propagate dirtiness, resolve targets, calc projection
//!     ├─ Render:    ProjectionStyles ──► ProjectionHost::apply_styles
//!     └─ PostRender: exit checks
//! ```
//!
//! **[`tree`]**: [`ProjectionTree`], the node arena, shared-element stacks
//! and the update protocol.
//!
//! **[`geometry`]** and **[`delta`]**: axis-separable boxes and the box
//! delta math projection is built on.
//!
//! **[`animation`]**, **[`easing`]** and **[`mix`]**: progress animations
//! driving layout transitions, and the value crossfade of shared elements.
//!
//! **[`correct`]**: scale correction for values that a projection
//! transform would distort, like border radii and shadows.
//!
//! **[`stack`]**: lead/follow bookkeeping for nodes sharing a layout id.
//!
//! **[`frameloop`]**: the step-ordered task batcher behind the frame and
//! microtask queues.
//!
//! **[`dirty`]**: dirty channels tracked with `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   projection change events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod config;
pub mod correct;
pub mod delta;
pub mod dirty;
pub mod easing;
pub mod error;
pub mod events;
pub mod flat_tree;
pub mod frameloop;
pub mod geometry;
pub mod host;
pub mod mix;
pub mod node;
pub mod stack;
pub mod styles;
pub mod trace;
pub mod tree;
pub mod values;

pub use config::ProjectionConfig;
pub use error::MeasureError;
pub use events::{EventKind, LayoutUpdate, ListenerId, NodeEvent};
pub use geometry::{Axis, AxisDelta, Bounds, Delta};
pub use host::ProjectionHost;
pub use node::{InstanceId, LayoutAnimation, Measurements, NodeId, NodeOptions};
pub use styles::ProjectionStyles;
pub use tree::{PromoteOptions, ProjectionTree};
pub use values::{Value, Values};
