// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Projection invalidation flows down the node tree: once an ancestor's
//! projection changes, every descendant has to re-resolve its target and
//! re-project. Parallax records these flags per node and, in parallel,
//! marks the channels below in an [`understory_dirty`] tracker whose
//! dependency edges run from child to parent. The propagation pass drains
//! the tracker to learn which descendants inherited dirtiness.
//!
//! Both channels are marked with
//! [`EagerPolicy`](understory_dirty::EagerPolicy), so marking a node also
//! marks its whole subtree.

use understory_dirty::Channel;

/// Layout or target changed: descendants must re-resolve and re-project.
pub const PROJECTION: Channel = Channel::new(0);

/// A value-driven transform changed: descendants must re-project.
pub const TRANSFORM: Channel = Channel::new(1);
