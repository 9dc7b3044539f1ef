//! Frame Pipeline
//!
//! One host frame, in order:
//!
//! ```text
//! advance clock → fire due timers → evaluate visibility → run frame callbacks
//! ```
//!
//! Timers fire first so glyph transitions committed this frame use the new
//! time. Visibility runs before frame callbacks, so a block that enters the
//! view commits its transition in the same step. Frames requested by frame
//! callbacks (the parallax tick) wait for the next step.
//!
//! Hosts that lay out with taffy can copy computed layouts into node bounds
//! with [`sync_layout`] before stepping.

use taffy::{NodeId, TaffyTree};

use crate::animation::{controller, glyph, parallax};
use crate::engine::arrays::surface;
use crate::engine::{pointer, reset_registry, scheduler, visibility, NodeHandle};
use crate::types::{Bounds, Seconds};

/// What one [`step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Host time after the step.
    pub time: Seconds,
    /// Visibility entries delivered.
    pub visibility_entries: usize,
    /// Frame callbacks run.
    pub frame_callbacks: usize,
}

/// Run one host frame after `dt` seconds.
pub fn step(dt: Seconds) -> FrameReport {
    scheduler::advance(dt);
    let visibility_entries = visibility::process_visibility();
    let frame_callbacks = scheduler::run_frame();
    let report = FrameReport {
        time: scheduler::now(),
        visibility_entries,
        frame_callbacks,
    };
    log::trace!("[PIPELINE] {report:?}");
    report
}

/// Copy computed taffy layouts into node bounds.
///
/// Taffy locations are relative to the parent; bounds are absolute, so each
/// node's location is summed up its ancestor chain. Nodes without a computed
/// layout are skipped. Returns the number of nodes updated.
pub fn sync_layout<T>(tree: &TaffyTree<T>, nodes: &[(NodeHandle, NodeId)]) -> usize {
    let mut updated = 0;
    for &(handle, node_id) in nodes {
        if !handle.is_live() {
            continue;
        }
        let Ok(layout) = tree.layout(node_id) else {
            log::warn!("[PIPELINE] no layout for node {}", handle.index);
            continue;
        };

        let mut bounds = Bounds::from(layout);
        let mut ancestor = tree.parent(node_id);
        while let Some(parent) = ancestor {
            if let Ok(parent_layout) = tree.layout(parent) {
                bounds.x += parent_layout.location.x;
                bounds.y += parent_layout.location.y;
            }
            ancestor = tree.parent(parent);
        }

        surface::set_bounds(handle.index, bounds);
        updated += 1;
    }
    updated
}

/// Reset every runtime registry and the viewport (for testing).
pub fn reset_runtime() {
    reset_registry();
    scheduler::reset_scheduler();
    visibility::reset_visibility();
    pointer::reset_pointer();
    controller::reset_controllers();
    glyph::reset_glyph_reveals();
    parallax::reset_trackers();
    surface::reset_viewport();
}
