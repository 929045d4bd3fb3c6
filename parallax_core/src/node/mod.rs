// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Projection nodes: handles, options, per-node state and storage.
//!
//! Nodes live in a struct-of-arrays store owned by the
//! [`ProjectionTree`](crate::tree::ProjectionTree). Callers hold [`NodeId`]
//! handles; a handle goes stale once its node is unmounted.

mod id;
mod options;
mod state;
pub(crate) mod store;
mod traverse;

pub use id::{INVALID, InstanceId, NodeId};
pub use options::{LayoutAnimation, NodeOptions, TransformTemplate};
pub use state::{Measurements, ScrollPhase, ScrollState};

pub(crate) use state::{AnimationSlot, MixState, ProjectionNode};
