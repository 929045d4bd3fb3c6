// Copyright 2026 the Parallax Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use kurbo::{Rect, Vec2};

use super::*;
use crate::animation::Transition;
use crate::config::ProjectionConfig;
use crate::error::MeasureError;
use crate::host::ProjectionHost;
use crate::styles::ProjectionStyles;

// ---------------------------------------------------------------------------
// Scripted host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestHost {
    boxes: BTreeMap<u64, Rect>,
    scrolls: BTreeMap<u64, Vec2>,
    measures: BTreeMap<u64, u32>,
    styles: Vec<(InstanceId, ProjectionStyles)>,
    resets: Vec<InstanceId>,
    now: f64,
}

impl TestHost {
    fn set_box(&mut self, instance: u64, x0: f64, y0: f64, x1: f64, y1: f64) {
        self.boxes.insert(instance, Rect::new(x0, y0, x1, y1));
    }

    fn measure_count(&self, instance: u64) -> u32 {
        self.measures.get(&instance).copied().unwrap_or(0)
    }

    fn last_styles(&self, instance: u64) -> Option<&ProjectionStyles> {
        self.styles
            .iter()
            .rev()
            .find(|(i, _)| *i == InstanceId(instance))
            .map(|(_, s)| s)
    }

    fn last_transform(&self, instance: u64) -> Option<&str> {
        self.last_styles(instance)
            .and_then(|s| s.transform.as_deref())
    }

    /// Runs frames 16ms apart until the tree stops asking for them.
    fn run_frames(&mut self, tree: &mut ProjectionTree) -> u32 {
        let mut frames = 0;
        while frames < 200 {
            self.now += 16.0;
            frames += 1;
            let now = self.now;
            if !tree.process_frame(self, now) {
                break;
            }
        }
        frames
    }
}

impl ProjectionHost for TestHost {
    fn measure_viewport_box(&mut self, instance: InstanceId) -> Result<Rect, MeasureError> {
        *self.measures.entry(instance.0).or_default() += 1;
        self.boxes
            .get(&instance.0)
            .copied()
            .ok_or(MeasureError::Unknown)
    }

    fn measure_scroll(&mut self, instance: InstanceId) -> Vec2 {
        self.scrolls.get(&instance.0).copied().unwrap_or(Vec2::ZERO)
    }

    fn reset_transform(&mut self, instance: InstanceId, _template: Option<&str>) {
        self.resets.push(instance);
    }

    fn apply_styles(&mut self, instance: InstanceId, styles: &ProjectionStyles) {
        self.styles.push((instance, styles.clone()));
    }

    fn now(&self) -> f64 {
        self.now
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup(config: ProjectionConfig) -> (ProjectionTree, TestHost, NodeId) {
    let mut tree = ProjectionTree::new(config);
    let mut host = TestHost::default();
    let root = tree.create_node(None, NodeOptions::default());
    host.set_box(0, 0.0, 0.0, 1000.0, 1000.0);
    tree.mount(root, InstanceId(0));
    (tree, host, root)
}

fn mount_child(
    tree: &mut ProjectionTree,
    parent: NodeId,
    instance: u64,
    options: NodeOptions,
) -> NodeId {
    let node = tree.create_node(Some(parent), options);
    tree.mount(node, InstanceId(instance));
    node
}

fn count(tree: &mut ProjectionTree, node: NodeId, kind: EventKind) -> Rc<Cell<u32>> {
    let counter = Rc::new(Cell::new(0));
    let handle = Rc::clone(&counter);
    tree.add_event_listener(node, kind, move |_| handle.set(handle.get() + 1))
        .expect("node is live");
    counter
}

/// Snapshot, move the box, then run the update.
fn move_node(
    tree: &mut ProjectionTree,
    host: &mut TestHost,
    node: NodeId,
    instance: u64,
    to: Rect,
) {
    tree.will_update(host, node);
    host.boxes.insert(instance, to);
    tree.did_update();
    tree.flush_microtasks(host);
}

// ---------------------------------------------------------------------------
// Snapshots and measurement
// ---------------------------------------------------------------------------

#[test]
fn snapshot_is_taken_once_per_update() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());

    tree.will_update(&mut host, child);
    tree.will_update(&mut host, child);

    assert_eq!(host.measure_count(1), 1, "second call is a no-op");
    let snapshot = tree.snapshot(child).expect("snapshot taken");
    assert_eq!(snapshot.layout_box, Bounds::from_edges(0.0, 0.0, 100.0, 100.0));
    assert!(tree.is_updating(), "update cycle started");
    assert_eq!(tree.animation_id(), 1);
}

#[test]
fn zero_sized_snapshots_are_discarded() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 10.0, 10.0, 10.0, 10.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());

    tree.will_update(&mut host, child);
    assert!(tree.snapshot(child).is_none(), "empty box has nothing to animate from");
}

#[test]
fn scroll_offsets_of_ancestors_are_added_to_layout() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 500.0, 500.0);
    host.scrolls.insert(1, Vec2::new(0.0, 50.0));
    let scroller = mount_child(
        &mut tree,
        root,
        1,
        NodeOptions::default().with_layout_scroll(true),
    );
    host.set_box(2, 0.0, 20.0, 100.0, 120.0);
    let child = mount_child(&mut tree, scroller, 2, NodeOptions::layout());

    tree.will_update(&mut host, child);
    let snapshot = tree.snapshot(child).expect("snapshot taken");
    assert_eq!(snapshot.measured_box.y.min, 20.0, "page box is untouched");
    assert_eq!(snapshot.layout_box.y.min, 70.0, "scroll offset is added back");
}

#[test]
fn failed_measurement_falls_back_to_an_empty_box() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let child = mount_child(&mut tree, root, 7, NodeOptions::layout());

    tree.will_update(&mut host, child);
    assert_eq!(host.measure_count(7), 1);
    assert!(tree.snapshot(child).is_none(), "zero box is discarded");
}

// ---------------------------------------------------------------------------
// Layout animations
// ---------------------------------------------------------------------------

#[test]
fn moved_node_is_projected_back_to_its_snapshot() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let completes = count(&mut tree, child, EventKind::AnimationComplete);
    let starts = count(&mut tree, child, EventKind::AnimationStart);

    move_node(&mut tree, &mut host, child, 1, Rect::new(200.0, 0.0, 300.0, 100.0));

    assert_eq!(starts.get(), 1, "animation requested");
    let delta = tree.projection_delta(child).expect("projected");
    assert_eq!(delta.x.translate, -200.0);
    assert_eq!(delta.x.scale, 1.0);
    assert_eq!(delta.y.translate, 0.0);
    assert_eq!(
        host.last_transform(1),
        Some("translate3d(-200px, 0px, 0px)"),
        "first frame renders at the snapshot"
    );
    assert!(tree.is_animating(child));

    host.run_frames(&mut tree);

    assert_eq!(completes.get(), 1, "completion reported once");
    assert!(!tree.is_animating(child));
    assert_eq!(host.last_transform(1), Some("none"), "rests on its layout");
    assert!(tree.projection_delta(child).is_some_and(|d| d.is_zero()));
}

#[test]
fn resized_node_is_scaled_back_to_its_snapshot() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());

    move_node(&mut tree, &mut host, child, 1, Rect::new(0.0, 0.0, 50.0, 100.0));

    let delta = tree.projection_delta(child).expect("projected");
    assert_eq!(delta.x.scale, 2.0);
    assert_eq!(delta.x.translate, 25.0);
    assert_eq!(delta.y.scale, 1.0);
}

#[test]
fn unchanged_layout_does_not_animate() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let starts = count(&mut tree, child, EventKind::AnimationStart);
    let exits = count(&mut tree, child, EventKind::ExitComplete);

    move_node(&mut tree, &mut host, child, 1, Rect::new(0.0, 0.0, 100.0, 100.0));

    assert_eq!(starts.get(), 0);
    assert_eq!(exits.get(), 1, "idle lead reports exit");
    assert!(!tree.is_animating(child));
    assert!(!tree.is_updating());
}

#[test]
fn events_follow_the_update_protocol() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());

    let seen = Rc::new(RefCell::new(Vec::new()));
    for kind in [
        EventKind::WillUpdate,
        EventKind::Measure,
        EventKind::DidUpdate,
        EventKind::AnimationStart,
        EventKind::AnimationComplete,
    ] {
        let seen = Rc::clone(&seen);
        tree.add_event_listener(child, kind, move |e| seen.borrow_mut().push(e.kind()));
    }

    move_node(&mut tree, &mut host, child, 1, Rect::new(0.0, 40.0, 100.0, 140.0));
    host.run_frames(&mut tree);

    assert_eq!(
        *seen.borrow(),
        vec![
            EventKind::WillUpdate,
            EventKind::Measure,
            EventKind::DidUpdate,
            EventKind::AnimationStart,
            EventKind::AnimationComplete,
        ]
    );
}

#[test]
fn did_update_payload_describes_the_change() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());

    let update = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&update);
    tree.add_event_listener(child, EventKind::DidUpdate, move |e| {
        if let NodeEvent::DidUpdate(u) = e {
            *slot.borrow_mut() = Some(u.clone());
        }
    });

    move_node(&mut tree, &mut host, child, 1, Rect::new(100.0, 0.0, 200.0, 100.0));

    let update = update.borrow().clone().expect("did update fired");
    assert!(update.has_layout_changed);
    assert!(!update.has_relative_layout_changed);
    assert_eq!(update.layout, Bounds::from_edges(100.0, 0.0, 200.0, 100.0));
    assert_eq!(update.delta.x.translate, -100.0);
    assert_eq!(update.layout_delta.x.translate, -100.0);
}

#[test]
fn interrupted_animation_completes_once() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let completes = count(&mut tree, child, EventKind::AnimationComplete);

    move_node(&mut tree, &mut host, child, 1, Rect::new(200.0, 0.0, 300.0, 100.0));
    for _ in 0..5 {
        host.now += 16.0;
        let now = host.now;
        tree.process_frame(&mut host, now);
    }
    let progress = tree.animation_progress(child).expect("live");
    assert!(progress > 0.0 && progress < 1.0, "mid-flight");

    move_node(&mut tree, &mut host, child, 1, Rect::new(400.0, 0.0, 500.0, 100.0));
    assert_eq!(completes.get(), 0, "a stopped animation never completes");

    host.run_frames(&mut tree);
    assert_eq!(completes.get(), 1);
    assert_eq!(host.last_transform(1), Some("none"));
}

#[test]
fn reduced_motion_completes_during_the_update() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::reduced_motion());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let completes = count(&mut tree, child, EventKind::AnimationComplete);

    move_node(&mut tree, &mut host, child, 1, Rect::new(200.0, 0.0, 300.0, 100.0));

    assert_eq!(completes.get(), 1, "instant transition finishes in the sync flush");
    assert!(!tree.is_animating(child));
    assert_eq!(tree.animation_progress(child), Some(1.0));
}

#[test]
fn finish_animation_snaps_to_the_end() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let completes = count(&mut tree, child, EventKind::AnimationComplete);

    move_node(&mut tree, &mut host, child, 1, Rect::new(200.0, 0.0, 300.0, 100.0));
    tree.finish_animation(child);

    assert_eq!(completes.get(), 1);
    assert_eq!(tree.animation_progress(child), Some(1.0));
    tree.finish_animation(child);
    assert_eq!(completes.get(), 1, "nothing left to complete");
}

#[test]
fn blocked_update_reports_exit_and_discards_measurements() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let exits = count(&mut tree, child, EventKind::ExitComplete);

    tree.block_update();
    tree.will_update(&mut host, child);
    assert_eq!(exits.get(), 1);
    assert!(tree.snapshot(child).is_none());
    assert!(!tree.is_updating());

    tree.update(&mut host);
    assert!(!tree.is_update_blocked(), "update lifts the block");
    assert!(tree.layout(child).is_none());
}

#[test]
fn blocked_subtree_jumps_without_animating() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let starts = count(&mut tree, child, EventKind::AnimationStart);

    tree.set_animation_blocked(root, true);
    move_node(&mut tree, &mut host, child, 1, Rect::new(200.0, 0.0, 300.0, 100.0));

    assert_eq!(starts.get(), 0);
    assert!(tree.target(child).is_none());
}

#[test]
fn one_shot_transition_is_cleared_after_the_update() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(
        &mut tree,
        root,
        1,
        NodeOptions::layout().with_transition(Transition::Instant),
    );
    let completes = count(&mut tree, child, EventKind::AnimationComplete);

    move_node(&mut tree, &mut host, child, 1, Rect::new(200.0, 0.0, 300.0, 100.0));

    assert_eq!(completes.get(), 1);
    assert!(tree.options(child).is_some_and(|o| o.transition.is_none()));
}

// ---------------------------------------------------------------------------
// Shared elements
// ---------------------------------------------------------------------------

/// Mounts `a`, snapshots it, then mounts `b` with the same layout id.
fn shared_pair(tree: &mut ProjectionTree, host: &mut TestHost, root: NodeId) -> (NodeId, NodeId) {
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let a = mount_child(tree, root, 1, NodeOptions::layout().with_layout_id("card"));
    tree.will_update(host, a);
    host.set_box(2, 300.0, 0.0, 400.0, 100.0);
    let b = mount_child(tree, root, 2, NodeOptions::layout().with_layout_id("card"));
    (a, b)
}

#[test]
fn new_member_takes_over_and_animates_from_the_previous_lead() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);

    assert!(tree.is_lead(b));
    assert!(!tree.is_lead(a));
    assert_eq!(tree.stack_members(a), &[a, b]);
    assert_eq!(
        tree.snapshot(b).map(|s| s.layout_box),
        Some(Bounds::from_edges(0.0, 0.0, 100.0, 100.0)),
        "snapshot inherited from the previous lead"
    );

    tree.did_update();
    tree.flush_microtasks(&mut host);

    let delta = tree.projection_delta(b).expect("lead projected");
    assert_eq!(delta.x.translate, -300.0);
    assert_eq!(
        host.last_styles(1).and_then(ProjectionStyles::opacity_number),
        Some(1.0),
        "follow starts fully visible"
    );
    assert_eq!(
        host.last_styles(1).and_then(|s| s.pointer_events.clone()).as_deref(),
        Some("none"),
        "follow ignores pointer events"
    );
}

#[test]
fn crossfade_hands_opacity_to_the_lead() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    let completes = count(&mut tree, b, EventKind::AnimationComplete);
    let follow_exits = count(&mut tree, a, EventKind::ExitComplete);

    tree.did_update();
    tree.flush_microtasks(&mut host);
    host.run_frames(&mut tree);

    assert_eq!(completes.get(), 1);
    assert!(follow_exits.get() >= 1, "follow is told it may leave");
    assert_eq!(
        host.last_styles(1).and_then(ProjectionStyles::opacity_number),
        Some(0.0),
        "follow fades out"
    );
    assert_eq!(host.last_transform(2), Some("none"), "lead rests on its layout");
    assert!(tree.is_visible(a), "crossfading keeps the follow visible");
}

#[test]
fn disabling_crossfade_hides_the_previous_lead() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let a = mount_child(&mut tree, root, 1, NodeOptions::layout().with_layout_id("card"));
    host.set_box(2, 300.0, 0.0, 400.0, 100.0);
    let b = mount_child(
        &mut tree,
        root,
        2,
        NodeOptions::layout()
            .with_layout_id("card")
            .with_crossfade(false),
    );

    assert!(tree.is_lead(b));
    assert!(!tree.is_visible(a));
    let styles = tree.get_projection_styles(a, None).expect("mounted");
    assert!(styles.is_hidden());
}

#[test]
fn unmounting_the_lead_promotes_the_remaining_member() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    tree.did_update();
    tree.flush_microtasks(&mut host);
    host.run_frames(&mut tree);

    tree.unmount(&mut host, b);

    assert!(!tree.is_alive(b));
    assert!(tree.is_lead(a));
    assert_eq!(tree.stack_members(a), &[a]);
    assert!(tree.is_visible(a));

    host.run_frames(&mut tree);
    assert!(!tree.is_updating(), "unmount update ran to completion");
    assert!(!tree.is_animating(a));
}

#[test]
fn relegating_hands_the_stack_back() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    tree.did_update();
    tree.flush_microtasks(&mut host);
    host.run_frames(&mut tree);

    assert!(tree.relegate(b));
    assert!(tree.is_lead(a));
    assert!(!tree.relegate(a), "nobody earlier to take over");
}

#[test]
fn unmounted_node_with_the_layout_id_cannot_take_the_lead() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    let c = tree.create_node(Some(root), NodeOptions::layout().with_layout_id("card"));

    tree.promote(c, PromoteOptions::default());

    assert_eq!(tree.lead(a), Some(b));
    assert!(tree.is_lead(b));
    assert!(!tree.is_lead(c));
    assert_eq!(tree.stack_members(a), &[a, b]);
}

#[test]
fn unmounted_member_cannot_be_promoted_again() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    tree.did_update();
    tree.flush_microtasks(&mut host);
    host.run_frames(&mut tree);

    tree.unmount(&mut host, b);
    tree.promote(b, PromoteOptions::default());

    assert_eq!(tree.lead(a), Some(a));
    assert!(!tree.is_lead(b));
    assert_eq!(tree.stack_members(a), &[a]);
    assert!(tree.is_visible(a));
}

#[test]
fn relegating_outside_the_stack_is_unhandled() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    let unmounted = tree.create_node(Some(root), NodeOptions::layout().with_layout_id("card"));
    let plain = mount_child(&mut tree, root, 3, NodeOptions::layout());
    let other = mount_child(&mut tree, root, 4, NodeOptions::layout().with_layout_id("other"));

    assert!(!tree.relegate(unmounted));
    assert!(!tree.relegate(plain));
    assert!(!tree.relegate(other));
    assert_eq!(tree.lead(a), Some(b));
    assert_eq!(tree.lead(other), Some(other));
    assert_eq!(tree.stack_members(a), &[a, b]);
}

#[test]
fn leaving_node_without_a_stack_exits_after_the_frame() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let exits = count(&mut tree, child, EventKind::ExitComplete);

    tree.set_present(&mut host, child, false);
    assert!(!tree.is_present(child));
    assert_eq!(exits.get(), 0);

    host.now += 16.0;
    let now = host.now;
    tree.process_frame(&mut host, now);
    assert!(exits.get() >= 1);
}

#[test]
fn leaving_lead_is_replaced_by_a_present_member() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let (a, b) = shared_pair(&mut tree, &mut host, root);
    tree.did_update();
    tree.flush_microtasks(&mut host);
    host.run_frames(&mut tree);

    tree.set_present(&mut host, b, false);
    assert!(tree.is_lead(a));

    tree.set_present(&mut host, b, true);
    assert!(tree.is_lead(b));
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

#[test]
fn hidden_node_renders_hidden() {
    let (mut tree, _host, root) = setup(ProjectionConfig::new());
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());

    tree.set_visible(child, false);
    let styles = tree.get_projection_styles(child, None).expect("mounted");
    assert!(styles.is_hidden());
}

#[test]
fn reset_styles_clear_opacity_and_transform() {
    let (mut tree, _host, root) = setup(ProjectionConfig::new());
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout().with_layout_id("card"));

    tree.promote(
        child,
        PromoteOptions {
            needs_reset: true,
            ..PromoteOptions::default()
        },
    );
    let styles = tree
        .get_projection_styles(child, Some("auto"))
        .expect("mounted");
    assert_eq!(styles.transform.as_deref(), Some("none"));
    assert_eq!(styles.opacity, Some(Value::Text(alloc::string::String::new())));
    assert_eq!(styles.pointer_events.as_deref(), Some("auto"));

    let again = tree.get_projection_styles(child, None).expect("mounted");
    assert_ne!(again, styles, "reset applies once");
}

#[test]
fn border_radius_is_corrected_while_scaled() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    tree.set_value(child, keys::BORDER_RADIUS, 10.0);

    move_node(&mut tree, &mut host, child, 1, Rect::new(0.0, 0.0, 200.0, 100.0));

    let styles = host.last_styles(1).expect("rendered");
    assert_eq!(
        styles.corrected.get(keys::BORDER_TOP_LEFT_RADIUS),
        Some(&Value::Text(alloc::string::String::from("10% 10%"))),
    );
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn stale_ids_are_ignored() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    tree.unmount(&mut host, child);
    assert_eq!(tree.len(), 1);

    tree.will_update(&mut host, child);
    tree.mount(child, InstanceId(9));
    tree.set_value(child, keys::X, 5.0);
    tree.finish_animation(child);
    assert!(tree.get_projection_styles(child, None).is_none());
    assert!(tree.add_event_listener(child, EventKind::Measure, |_| {}).is_none());
    assert!(!tree.is_updating());
    assert_eq!(host.measure_count(9), 0);
}

#[test]
fn parentless_nodes_attach_to_the_root() {
    let (mut tree, _host, root) = setup(ProjectionConfig::new());
    let node = tree.create_node(None, NodeOptions::layout());
    assert_eq!(tree.parent(node), Some(root));
    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![node]);
}

#[test]
fn unmount_removes_the_whole_subtree() {
    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    let a = mount_child(&mut tree, root, 1, NodeOptions::layout());
    let b = mount_child(&mut tree, a, 2, NodeOptions::layout());

    tree.unmount(&mut host, a);
    assert!(!tree.is_alive(a));
    assert!(!tree.is_alive(b));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root(), Some(root));
}

#[test]
fn changing_layout_id_moves_between_stacks() {
    let (mut tree, _host, root) = setup(ProjectionConfig::new());
    let a = mount_child(&mut tree, root, 1, NodeOptions::layout().with_layout_id("one"));
    let b = mount_child(&mut tree, root, 2, NodeOptions::layout().with_layout_id("one"));
    assert_eq!(tree.stack_members(a), &[a, b]);

    tree.set_options(b, NodeOptions::layout().with_layout_id("two"));
    assert_eq!(tree.stack_members(a), &[a]);
    assert!(tree.is_lead(a));
    assert_eq!(tree.stack_members(b), &[b]);
}

#[cfg(feature = "trace")]
#[test]
fn traced_frames_report_passes() {
    use crate::trace::{FrameSummary, PassEvent, TraceSink, Tracer};

    #[derive(Default)]
    struct Sink {
        passes: u32,
        summaries: Vec<FrameSummary>,
    }

    impl TraceSink for Sink {
        fn on_pass(&mut self, _e: &PassEvent) {
            self.passes += 1;
        }

        fn on_frame_summary(&mut self, s: &FrameSummary) {
            self.summaries.push(s.clone());
        }
    }

    let (mut tree, mut host, root) = setup(ProjectionConfig::new());
    host.set_box(1, 0.0, 0.0, 100.0, 100.0);
    let child = mount_child(&mut tree, root, 1, NodeOptions::layout());
    tree.will_update(&mut host, child);
    host.set_box(1, 200.0, 0.0, 300.0, 100.0);

    let mut sink = Sink::default();
    tree.update_traced(&mut host, &mut Tracer::new(&mut sink));

    assert_eq!(sink.passes, 4, "one projection update");
    assert_eq!(sink.summaries.len(), 1);
    let summary = &sink.summaries[0];
    assert!(summary.is_sync);
    assert_eq!(summary.passes, 4);
    assert!(summary.requested_frame, "animation keeps frames coming");
}
