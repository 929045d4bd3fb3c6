// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The projection tree.
//!
//! [`ProjectionTree`] owns every projection node, the shared-element stacks
//! and the two task queues that drive them: the frame batcher, processed
//! once per display frame by [`ProjectionTree::process_frame`], and the
//! microtask batcher, drained by [`ProjectionTree::flush_microtasks`].
//!
//! A layout update runs in three phases:
//!
//! 1. [`will_update`](ProjectionTree::will_update) snapshots the node and
//!    marks it layout-dirty.
//! 2. The embedder mutates the real layout.
//! 3. [`did_update`](ProjectionTree::did_update) queues the root update,
//!    which resets transforms, measures the new layouts, diffs them against
//!    the snapshots, starts animations and flushes one frame synchronously.
//!
//! Every public method taking a [`NodeId`] ignores stale handles.

mod animate;
mod frame;
mod projection;
mod render;
mod shared;
mod update;

#[cfg(test)]
mod tests;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::Point;

use crate::config::ProjectionConfig;
use crate::correct::ScaleCorrectors;
use crate::events::{EventKind, ListenerId, NodeEvent};
use crate::flat_tree::FlatTree;
use crate::frameloop::Batcher;
use crate::geometry::{Bounds, Delta};
use crate::node::store::NodeStore;
use crate::node::{InstanceId, Measurements, NodeId, NodeOptions, ProjectionNode};
use crate::stack::NodeStack;
use crate::trace::FrameSummaryBuilder;
use crate::values::{Value, Values, keys};

pub use shared::PromoteOptions;

pub(crate) use frame::FrameTask;

/// The projection tree and its scheduler.
pub struct ProjectionTree {
    store: NodeStore,
    root: Option<NodeId>,
    len: usize,
    /// Mounted nodes, sorted by depth for the per-frame passes.
    nodes: FlatTree,
    shared_nodes: HashMap<String, NodeStack>,
    frame: Batcher<FrameTask>,
    microtasks: Batcher<FrameTask>,
    config: ProjectionConfig,
    scale_correctors: ScaleCorrectors,

    // -- Update cycle --
    animation_id: u64,
    is_updating: bool,
    update_blocked: bool,
    has_tree_animated: bool,
    update_scheduled: bool,
    projection_update_scheduled: bool,

    next_serial: u64,
    next_listener: u64,
    frame_index: u64,
    summary: Option<FrameSummaryBuilder>,
    #[cfg(feature = "trace-rich")]
    changes: Vec<crate::trace::ProjectionChange>,
}

impl fmt::Debug for ProjectionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionTree")
            .field("root", &self.root)
            .field("len", &self.len)
            .field("mounted", &self.nodes.len())
            .field("shared_stacks", &self.shared_nodes.len())
            .field("config", &self.config)
            .field("animation_id", &self.animation_id)
            .field("is_updating", &self.is_updating)
            .field("update_blocked", &self.update_blocked)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl Default for ProjectionTree {
    fn default() -> Self {
        Self::new(ProjectionConfig::new())
    }
}

impl ProjectionTree {
    /// Creates an empty tree with the default scale correctors installed.
    #[must_use]
    pub fn new(config: ProjectionConfig) -> Self {
        Self {
            store: NodeStore::new(),
            root: None,
            len: 0,
            nodes: FlatTree::new(),
            shared_nodes: HashMap::new(),
            frame: Batcher::new(true, config.default_elapsed_ms, config.max_elapsed_ms),
            microtasks: Batcher::new(false, config.default_elapsed_ms, config.max_elapsed_ms),
            config,
            scale_correctors: ScaleCorrectors::with_defaults(),
            animation_id: 0,
            is_updating: false,
            update_blocked: false,
            has_tree_animated: false,
            update_scheduled: false,
            projection_update_scheduled: false,
            next_serial: 0,
            next_listener: 0,
            frame_index: 0,
            summary: None,
            #[cfg(feature = "trace-rich")]
            changes: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect from the next layout update.
    pub fn set_config(&mut self, config: ProjectionConfig) {
        self.config = config;
    }

    /// Returns the scale corrector registry for modification.
    pub fn scale_correctors_mut(&mut self) -> &mut ScaleCorrectors {
        &mut self.scale_correctors
    }

    // -----------------------------------------------------------------------
    // Topology
    // -----------------------------------------------------------------------

    /// Returns the root node.
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the number of live nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the tree has no nodes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether `node` is live.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.store.is_alive(node)
    }

    /// Returns the parent of `node`.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        if !self.store.is_alive(node) {
            return None;
        }
        self.store.parent(node)
    }

    /// Returns the children of `node`, in insertion order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.store
            .is_alive(node)
            .then(|| self.store.children(node))
            .into_iter()
            .flatten()
    }

    /// Creates a node under `parent`.
    ///
    /// The first node created becomes the root. Without a parent, later
    /// nodes attach to the root. The node takes part in layout updates once
    /// [mounted](Self::mount).
    pub fn create_node(&mut self, parent: Option<NodeId>, options: NodeOptions) -> NodeId {
        let parent = match parent {
            Some(parent) if self.store.is_alive(parent) => Some(parent),
            Some(parent) => {
                tracing::debug!(?parent, "stale parent, attaching to root");
                self.root
            }
            None => self.root,
        };

        let mut path = Vec::new();
        if let Some(parent) = parent {
            path.extend_from_slice(&self.store.get(parent).path);
            path.push(parent);
        }
        for &ancestor in &path {
            self.store.get_mut(ancestor).should_reset_transform = true;
        }

        let serial = self.next_serial;
        self.next_serial += 1;
        let id = self
            .store
            .create(parent, ProjectionNode::new(serial, options, Values::new(), path));
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.len += 1;
        tracing::trace!(?id, ?parent, "create node");
        id
    }

    /// Attaches `node` to a host element.
    pub fn mount(&mut self, node: NodeId, instance: InstanceId) {
        let has_tree_animated = self.has_tree_animated;
        let Some(state) = self.node_mut(node) else {
            return;
        };
        if state.instance.is_some() {
            return;
        }
        state.instance = Some(instance);
        if has_tree_animated && state.options.tracks_layout() {
            state.is_layout_dirty = true;
        }
        let layout_id = state.options.layout_id.clone();

        let depth = self.store.depth(node);
        self.nodes.add(node, depth);
        if let Some(layout_id) = layout_id {
            self.register_shared_node(layout_id, node);
        }
        tracing::debug!(?node, ?instance, "mount");
    }

    /// Detaches `node` and its descendants and destroys them.
    ///
    /// A node with a layout id is snapshotted first, so the member promoted
    /// in its place can animate from where it was. Running animations snap
    /// to their end and complete.
    pub fn unmount(&mut self, host: &mut dyn crate::host::ProjectionHost, node: NodeId) {
        if !self.store.is_alive(node) {
            tracing::debug!(?node, "ignoring stale NodeId");
            return;
        }
        let children: Vec<NodeId> = self.store.children(node).collect();
        for child in children {
            self.unmount(host, child);
        }

        let state = self.store.get(node);
        let layout_id = state.options.layout_id.clone();
        if layout_id.is_some() && state.instance.is_some() {
            self.will_update_node(host, node, true);
        }
        let layout_dirty = self.store.get(node).is_layout_dirty;
        self.frame.schedule(
            crate::frameloop::Step::PostRender,
            FrameTask::CheckAfterUnmount { layout_dirty },
            false,
            false,
        );

        self.finish_animation_node(node);
        self.nodes.remove(node);
        if let Some(layout_id) = layout_id {
            self.remove_from_stack(node, &layout_id);
        }
        for task in [
            FrameTask::StartAnimation(node),
            FrameTask::Animate(node),
            FrameTask::Render(node),
            FrameTask::CheckExit(node),
        ] {
            self.frame.cancel(task);
        }

        let mut state = self.store.destroy(node);
        state.listeners.clear();
        if self.root == Some(node) {
            self.root = None;
        }
        self.len -= 1;
        tracing::debug!(?node, "unmount");
    }

    // -----------------------------------------------------------------------
    // Options and values
    // -----------------------------------------------------------------------

    /// Returns the options of `node`.
    #[must_use]
    pub fn options(&self, node: NodeId) -> Option<&NodeOptions> {
        self.store.try_get(node).map(|n| &n.options)
    }

    /// Replaces the options of `node`.
    ///
    /// Changing the layout id of a mounted node moves it between stacks.
    pub fn set_options(&mut self, node: NodeId, options: NodeOptions) {
        let Some(state) = self.node_mut(node) else {
            return;
        };
        let new_layout_id = options.layout_id.clone();
        let old = core::mem::replace(&mut state.options, options);
        let mounted = state.instance.is_some();
        if !mounted || old.layout_id == new_layout_id {
            return;
        }
        if let Some(old_id) = old.layout_id {
            self.remove_from_stack(node, &old_id);
        }
        if let Some(new_id) = new_layout_id {
            self.register_shared_node(new_id, node);
        }
    }

    /// Returns the latest rendered values of `node`.
    #[must_use]
    pub fn latest_values(&self, node: NodeId) -> Option<&Values> {
        self.store.try_get(node).map(|n| &n.latest_values)
    }

    /// Replaces the latest rendered values of `node`.
    pub fn set_latest_values(&mut self, node: NodeId, values: Values) {
        let Some(state) = self.node_mut(node) else {
            return;
        };
        state.latest_values = values;
        state.is_transform_dirty = true;
        self.schedule_update_projection();
        self.schedule_render(node, true);
    }

    /// Sets one latest value of `node`.
    pub fn set_value(&mut self, node: NodeId, key: &str, value: impl Into<Value>) {
        let Some(state) = self.node_mut(node) else {
            return;
        };
        state.latest_values.set(key, value);
        if is_transform_key(key) {
            state.is_transform_dirty = true;
            self.schedule_update_projection();
        }
        self.schedule_render(node, true);
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Registers a listener for events of `kind` on `node`.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        listener: impl FnMut(&NodeEvent) + 'static,
    ) -> Option<ListenerId> {
        let id = ListenerId(self.next_listener);
        let state = self.node_mut(node)?;
        state.listeners.add(id, kind, Box::new(listener));
        self.next_listener += 1;
        Some(id)
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        self.node_mut(node)
            .is_some_and(|state| state.listeners.remove(id))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Returns the host element of `node`, if mounted.
    #[must_use]
    pub fn instance(&self, node: NodeId) -> Option<InstanceId> {
        self.store.try_get(node).and_then(|n| n.instance)
    }

    /// Returns the most recent layout measurement.
    #[must_use]
    pub fn layout(&self, node: NodeId) -> Option<&Measurements> {
        self.store.try_get(node).and_then(|n| n.layout.as_ref())
    }

    /// Returns the snapshot taken ahead of the pending update.
    #[must_use]
    pub fn snapshot(&self, node: NodeId) -> Option<&Measurements> {
        self.store.try_get(node).and_then(|n| n.snapshot.as_ref())
    }

    /// Returns the box `node` is currently projected into.
    #[must_use]
    pub fn target(&self, node: NodeId) -> Option<Bounds> {
        self.store.try_get(node).and_then(|n| n.target)
    }

    /// Returns the delta projecting the corrected layout onto the target.
    #[must_use]
    pub fn projection_delta(&self, node: NodeId) -> Option<Delta> {
        self.store.try_get(node).and_then(|n| n.projection_delta)
    }

    /// Returns the accumulated scale of the ancestors of `node`.
    #[must_use]
    pub fn tree_scale(&self, node: NodeId) -> Option<Point> {
        self.store.try_get(node).map(|n| n.tree_scale)
    }

    /// Returns the progress of the layout animation, from 0 to 1.
    #[must_use]
    pub fn animation_progress(&self, node: NodeId) -> Option<f64> {
        self.store.try_get(node).map(|n| n.animation_progress)
    }

    /// Returns whether `node` has a layout animation pending or running.
    #[must_use]
    pub fn is_animating(&self, node: NodeId) -> bool {
        self.store.try_get(node).is_some_and(|n| {
            n.pending_animation.is_some() || n.owns_running_animation()
        })
    }

    /// Returns whether `node` is visible.
    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.store.try_get(node).is_some_and(|n| n.is_visible)
    }

    /// Returns whether `node` is present.
    #[must_use]
    pub fn is_present(&self, node: NodeId) -> bool {
        self.store.try_get(node).is_some_and(|n| n.is_present)
    }

    /// Returns whether a layout update is in progress.
    #[inline]
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.is_updating
    }

    /// Returns the id of the current update cycle.
    #[inline]
    #[must_use]
    pub fn animation_id(&self) -> u64 {
        self.animation_id
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ProjectionNode> {
        let node = self.store.try_get_mut(id);
        if node.is_none() {
            tracing::debug!(?id, "ignoring stale NodeId");
        }
        node
    }

    fn ordered_nodes(&mut self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.nodes.order_into(&mut order);
        order
    }

    fn notify(&mut self, id: NodeId, event: &NodeEvent) {
        if let Some(node) = self.store.try_get_mut(id) {
            node.listeners.notify(event);
        }
    }

    #[cfg(feature = "trace-rich")]
    fn record_change(&mut self, id: NodeId, field: crate::trace::ProjectionField) {
        self.changes.push(crate::trace::ProjectionChange {
            node_index: id.index(),
            field,
        });
    }
}

fn is_transform_key(key: &str) -> bool {
    matches!(
        key,
        keys::X
            | keys::Y
            | keys::Z
            | keys::SCALE
            | keys::SCALE_X
            | keys::SCALE_Y
            | keys::ROTATE
            | keys::ROTATE_X
            | keys::ROTATE_Y
            | keys::SKEW_X
            | keys::SKEW_Y
            | keys::TRANSFORM_PERSPECTIVE
    )
}
