//! Visibility Watchers - Viewport occupancy tracking per node.
//!
//! A watcher observes one node with a threshold: the fraction of the node's
//! area that must lie inside the viewport for it to count as visible. The
//! watcher fires on its first evaluation and then every time the node crosses
//! the threshold, in either direction.
//!
//! Occupancy comes from one of two places:
//! - [`process_visibility`] computes it from node bounds and the viewport
//! - [`report_visibility`] takes a ratio the host measured itself
//!
//! Callbacks are collected first and run after the registry borrow is
//! released; a watcher removed by an earlier callback in the same pass is
//! skipped.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::arrays::surface;
use super::registry::NodeHandle;
use super::scheduler;
use crate::types::Seconds;

// =============================================================================
// TYPES
// =============================================================================

/// Handle to a registered watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(u64);

/// One visibility observation delivered to a watcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    /// Fraction of the node's area inside the viewport, in [0, 1].
    pub ratio: f32,
    /// Whether `ratio` meets the watcher's threshold.
    pub is_visible: bool,
    /// Host time of the observation.
    pub time: Seconds,
}

/// Visibility callback (Rc so it can be cloned out of the registry).
pub type VisibilityCallback = Rc<dyn Fn(VisibilityEntry)>;

struct Watcher {
    node: NodeHandle,
    threshold: f32,
    callback: VisibilityCallback,
    /// Last qualification delivered (None until the first evaluation).
    last: Option<bool>,
}

impl Watcher {
    fn qualifies(&self, ratio: f32) -> bool {
        if self.threshold <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.threshold
        }
    }
}

thread_local! {
    static WATCHERS: RefCell<BTreeMap<u64, Watcher>> = const { RefCell::new(BTreeMap::new()) };
    static NEXT_WATCHER: Cell<u64> = const { Cell::new(1) };
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Start watching `node` with the given threshold (clamped to [0, 1]).
pub fn observe(
    node: NodeHandle,
    threshold: f32,
    callback: impl Fn(VisibilityEntry) + 'static,
) -> WatcherId {
    let id = NEXT_WATCHER.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    let threshold = if threshold.is_finite() { threshold.clamp(0.0, 1.0) } else { 0.0 };
    WATCHERS.with(|watchers| {
        watchers.borrow_mut().insert(
            id,
            Watcher {
                node,
                threshold,
                callback: Rc::new(callback),
                last: None,
            },
        );
    });
    log::trace!("[VISIBILITY] observe node {} (threshold {threshold})", node.index);
    WatcherId(id)
}

/// Stop a watcher. Returns false if it was already removed.
pub fn unobserve(id: WatcherId) -> bool {
    WATCHERS.with(|watchers| watchers.borrow_mut().remove(&id.0).is_some())
}

/// Whether a watcher is still registered.
pub fn is_observing(id: WatcherId) -> bool {
    WATCHERS.with(|watchers| watchers.borrow().contains_key(&id.0))
}

/// Number of registered watchers.
pub fn watcher_count() -> usize {
    WATCHERS.with(|watchers| watchers.borrow().len())
}

/// Number of registered watchers on one node index.
pub fn watchers_for(index: usize) -> usize {
    WATCHERS.with(|watchers| {
        watchers
            .borrow()
            .values()
            .filter(|w| w.node.index == index)
            .count()
    })
}

// =============================================================================
// EVALUATION
// =============================================================================

/// Evaluate watchers and collect the callbacks whose qualification changed.
///
/// `measure` returns the occupancy ratio for a node, or None to skip it.
fn collect<F>(mut measure: F) -> Vec<(u64, VisibilityCallback, VisibilityEntry)>
where
    F: FnMut(&Watcher) -> Option<f32>,
{
    let time = scheduler::now();
    WATCHERS.with(|watchers| {
        let mut watchers = watchers.borrow_mut();
        let mut pending = Vec::new();
        for (&id, watcher) in watchers.iter_mut() {
            if !watcher.node.is_live() {
                continue;
            }
            let Some(ratio) = measure(watcher) else { continue };
            let is_visible = watcher.qualifies(ratio);
            if watcher.last == Some(is_visible) {
                continue;
            }
            watcher.last = Some(is_visible);
            pending.push((
                id,
                watcher.callback.clone(),
                VisibilityEntry { ratio, is_visible, time },
            ));
        }
        pending
    })
}

fn dispatch(pending: Vec<(u64, VisibilityCallback, VisibilityEntry)>) -> usize {
    let mut delivered = 0;
    for (id, callback, entry) in pending {
        if !is_observing(WatcherId(id)) {
            log::trace!("[VISIBILITY] watcher {id} removed mid-dispatch, skipping");
            continue;
        }
        callback(entry);
        delivered += 1;
    }
    delivered
}

/// Compute occupancy for every watched node from its bounds and the viewport,
/// delivering entries to watchers whose qualification changed.
///
/// Nodes without bounds are skipped. Returns the number of entries delivered.
pub fn process_visibility() -> usize {
    let viewport = surface::viewport();
    let pending = collect(|watcher| {
        surface::get_bounds(watcher.node.index).map(|bounds| bounds.visible_ratio(&viewport))
    });
    dispatch(pending)
}

/// Deliver a host-measured occupancy ratio for one node.
///
/// Returns the number of entries delivered.
pub fn report_visibility(index: usize, ratio: f32) -> usize {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let pending = collect(|watcher| (watcher.node.index == index).then_some(ratio));
    dispatch(pending)
}

/// Remove every watcher (for testing).
pub fn reset_visibility() {
    WATCHERS.with(|watchers| watchers.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================
