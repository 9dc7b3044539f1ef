//! Pointer Tracker - Pointer-driven background parallax for a container.
//!
//! Pointer moves are normalized against the container's bounds and stored as
//! the latest [`PointerSample`]. A frame callback reads that sample once per
//! tick, scales it by [`PARALLAX_AMPLITUDE`], writes the container's
//! background offset, and requests the next frame.
//!
//! Any number of moves between two frames collapse into one write.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::animation::parallax::PointerTracker;
//!
//! let tracker = PointerTracker::start(hero);
//! // each host frame: scheduler::run_frame()
//! tracker.stop();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::engine::arrays::{presentation, surface};
use crate::engine::pointer::{self, ListenerId, PointerAction};
use crate::engine::scheduler::{self, FrameId};
use crate::engine::NodeHandle;
use crate::types::{Bounds, Offset};

/// Maximum background shift on each axis.
pub const PARALLAX_AMPLITUDE: f32 = 20.0;

// =============================================================================
// SAMPLE
// =============================================================================

/// Pointer position relative to a container, each axis in [-1, 1].
///
/// (-1, -1) is the container's top-left corner, (0, 0) its center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
}

impl PointerSample {
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };

    /// Normalize a surface position against `container`.
    ///
    /// A container with zero or non-finite size gives the center.
    pub fn normalize(x: f32, y: f32, container: &Bounds) -> Self {
        let usable = container.width.is_finite()
            && container.height.is_finite()
            && container.width > 0.0
            && container.height > 0.0;
        if !usable {
            return Self::CENTER;
        }
        let axis = |value: f32, origin: f32, extent: f32| {
            let n = ((value - origin) / extent) * 2.0 - 1.0;
            if n.is_finite() { n.clamp(-1.0, 1.0) } else { 0.0 }
        };
        Self {
            x: axis(x, container.x, container.width),
            y: axis(y, container.y, container.height),
        }
    }

    /// Background offset for this sample.
    pub fn offset(&self, amplitude: f32) -> Offset {
        Offset::new(self.x, self.y).scale(amplitude)
    }
}

// =============================================================================
// TRACKER
// =============================================================================

struct Tracker {
    id: u64,
    container: NodeHandle,
    sample: Cell<PointerSample>,
    listener: Cell<Option<ListenerId>>,
    frame: Cell<Option<FrameId>>,
    stopped: Cell<bool>,
    offset: Signal<Offset>,
    ticks: Cell<u64>,
}

thread_local! {
    /// Running tracker per container index.
    static ACTIVE: RefCell<HashMap<usize, (u64, Weak<Tracker>)>> = RefCell::new(HashMap::new());
    static NEXT_TRACKER: Cell<u64> = const { Cell::new(1) };
}

impl Tracker {
    fn on_move(&self, x: f32, y: f32) {
        if self.stopped.get() {
            return;
        }
        let bounds = surface::get_bounds(self.container.index).unwrap_or_default();
        self.sample.set(PointerSample::normalize(x, y, &bounds));
    }

    fn tick(self: Rc<Self>) {
        if self.stopped.get() {
            return;
        }
        if !self.container.is_live() {
            log::debug!("[PARALLAX] container {} unmounted, stopping", self.container.index);
            self.stop();
            return;
        }

        let offset = self.sample.get().offset(PARALLAX_AMPLITUDE);
        presentation::set_background_offset(self.container.index, offset);
        self.offset.set(offset);
        self.ticks.set(self.ticks.get() + 1);

        schedule_tick(&self);
    }

    fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        if let Some(listener) = self.listener.take() {
            pointer::remove_listener(listener);
        }
        if let Some(frame) = self.frame.take() {
            scheduler::cancel_frame(frame);
        }
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.get(&self.container.index).is_some_and(|(id, _)| *id == self.id) {
                active.remove(&self.container.index);
            }
        });
        log::debug!("[PARALLAX] stopped tracker {} on node {}", self.id, self.container.index);
    }
}

fn schedule_tick(tracker: &Rc<Tracker>) {
    let weak = Rc::downgrade(tracker);
    let frame = scheduler::request_frame(move |_| {
        if let Some(tracker) = weak.upgrade() {
            tracker.tick();
        }
    });
    tracker.frame.set(Some(frame));
}

/// A running pointer tracker bound to one container. Stops on drop.
pub struct PointerTracker {
    tracker: Rc<Tracker>,
}

impl PointerTracker {
    /// Start tracking the pointer over `container`.
    ///
    /// A tracker already running on the same container is stopped first, so
    /// each container has at most one frame chain.
    pub fn start(container: NodeHandle) -> Self {
        let previous = ACTIVE.with(|active| {
            active
                .borrow()
                .get(&container.index)
                .and_then(|(_, weak)| weak.upgrade())
        });
        if let Some(previous) = previous {
            log::debug!("[PARALLAX] restarting on node {}", container.index);
            previous.stop();
        }

        let id = NEXT_TRACKER.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        let tracker = Rc::new(Tracker {
            id,
            container,
            sample: Cell::new(PointerSample::CENTER),
            listener: Cell::new(None),
            frame: Cell::new(None),
            stopped: Cell::new(false),
            offset: signal(Offset::ZERO),
            ticks: Cell::new(0),
        });

        let weak = Rc::downgrade(&tracker);
        let listener = pointer::on_pointer(move |event| {
            if event.action != PointerAction::Move || !event.has_position() {
                return;
            }
            if let Some(tracker) = weak.upgrade() {
                tracker.on_move(event.x, event.y);
            }
        });
        tracker.listener.set(Some(listener));

        schedule_tick(&tracker);

        ACTIVE.with(|active| {
            active
                .borrow_mut()
                .insert(container.index, (id, Rc::downgrade(&tracker)));
        });

        log::debug!("[PARALLAX] started tracker {id} on node {}", container.index);
        Self { tracker }
    }

    /// Cancel the frame chain and the pointer listener. Idempotent.
    pub fn stop(&self) {
        self.tracker.stop();
    }

    pub fn is_running(&self) -> bool {
        !self.tracker.stopped.get()
    }

    /// Latest normalized sample.
    pub fn sample(&self) -> PointerSample {
        self.tracker.sample.get()
    }

    /// Reactive background offset, updated once per tick.
    pub fn offset(&self) -> Signal<Offset> {
        self.tracker.offset.clone()
    }

    /// Frames in which this tracker wrote an offset.
    pub fn ticks(&self) -> u64 {
        self.tracker.ticks.get()
    }

    pub fn container(&self) -> NodeHandle {
        self.tracker.container
    }
}

impl Drop for PointerTracker {
    fn drop(&mut self) {
        self.tracker.stop();
    }
}

impl std::fmt::Debug for PointerTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerTracker")
            .field("container", &self.tracker.container)
            .field("running", &self.is_running())
            .field("sample", &self.sample())
            .finish()
    }
}

/// Number of containers with a running tracker.
pub fn active_tracker_count() -> usize {
    ACTIVE.with(|active| {
        active
            .borrow()
            .values()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    })
}

/// Forget every tracker (for testing).
pub fn reset_trackers() {
    ACTIVE.with(|active| active.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================
