//! Cursor Follower - A custom pointer indicator driven by raw pointer events.
//!
//! Tracks position plus three flags:
//!
//! - `HIDDEN` until the first move, and again after the pointer leaves the surface
//! - `CLICKED` between pointer down and up
//! - `HOVERED` while over an element that was interactive when the follower started
//!
//! The interactive set is captured once at [`CursorFollower::start`]. Nodes
//! marked interactive later are not tracked.
//!
//! The follower only runs on surfaces at least [`CURSOR_MIN_SURFACE_WIDTH`]
//! wide. The width is read once at start; later resizes do not enable or
//! disable a running follower.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bitflags::bitflags;
use spark_signals::{signal, Signal};

use crate::engine::arrays::surface;
use crate::engine::pointer::{self, ListenerId, PointerAction, PointerEvent};
use crate::engine::{self, NodeHandle};

/// Narrowest surface that shows the custom cursor.
pub const CURSOR_MIN_SURFACE_WIDTH: f32 = 1024.0;

// =============================================================================
// STATE
// =============================================================================

bitflags! {
    /// Discrete cursor flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CursorFlags: u8 {
        const HIDDEN = 1 << 0;
        const CLICKED = 1 << 1;
        const HOVERED = 1 << 2;
    }
}

/// Pointer position and flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
    pub flags: CursorFlags,
}

impl CursorState {
    /// Before any pointer movement: at the origin and hidden.
    pub const INITIAL: Self = Self {
        x: 0.0,
        y: 0.0,
        flags: CursorFlags::HIDDEN,
    };

    pub fn hidden(&self) -> bool {
        self.flags.contains(CursorFlags::HIDDEN)
    }

    pub fn clicked(&self) -> bool {
        self.flags.contains(CursorFlags::CLICKED)
    }

    pub fn hovered(&self) -> bool {
        self.flags.contains(CursorFlags::HOVERED)
    }

    /// Ring and dot presentation for this state.
    pub fn visual(&self) -> CursorVisual {
        let ring_scale = if self.hovered() {
            1.5
        } else if self.clicked() {
            0.9
        } else {
            1.0
        };
        CursorVisual {
            x: self.x,
            y: self.y,
            ring_scale,
            ring_opacity: if self.hidden() { 0.0 } else { 1.0 },
            dot_opacity: if self.hidden() || self.hovered() { 0.0 } else { 1.0 },
        }
    }
}

impl Default for CursorState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// What the host draws: a ring and a dot centered on the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorVisual {
    pub x: f32,
    pub y: f32,
    pub ring_scale: f32,
    pub ring_opacity: f32,
    pub dot_opacity: f32,
}

// =============================================================================
// FOLLOWER
// =============================================================================

struct Follower {
    state: Signal<CursorState>,
    /// Captured interactive nodes the pointer is currently inside.
    hovered: Cell<usize>,
    listeners: RefCell<Vec<ListenerId>>,
    tracked: Vec<NodeHandle>,
    /// Set by the first move. Until then nothing un-hides the cursor.
    seen_move: Cell<bool>,
    stopped: Cell<bool>,
}

impl Follower {
    fn update(&self, apply: impl FnOnce(&mut CursorState)) {
        if self.stopped.get() {
            return;
        }
        let mut state = self.state.get();
        apply(&mut state);
        if state != self.state.get() {
            self.state.set(state);
        }
    }

    fn on_pointer(&self, event: &PointerEvent) {
        if self.stopped.get() {
            return;
        }
        if event.action == PointerAction::Move {
            self.seen_move.set(true);
        }
        let seen_move = self.seen_move.get();
        self.update(|state| match event.action {
            PointerAction::Move => {
                state.x = event.x;
                state.y = event.y;
                state.flags.remove(CursorFlags::HIDDEN);
            }
            PointerAction::Down => state.flags.insert(CursorFlags::CLICKED),
            PointerAction::Up => state.flags.remove(CursorFlags::CLICKED),
            PointerAction::Leave => state.flags.insert(CursorFlags::HIDDEN),
            PointerAction::Enter => {
                if event.has_position() {
                    state.x = event.x;
                    state.y = event.y;
                }
                if seen_move {
                    state.flags.remove(CursorFlags::HIDDEN);
                }
            }
        });
    }

    fn on_hover(&self, inside: bool) {
        if self.stopped.get() {
            return;
        }
        let count = if inside {
            self.hovered.get() + 1
        } else {
            self.hovered.get().saturating_sub(1)
        };
        self.hovered.set(count);
        self.update(|state| state.flags.set(CursorFlags::HOVERED, count > 0));
    }

    fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in &listeners {
            pointer::remove_listener(*listener);
        }
        log::debug!("[CURSOR] stopped ({} listeners released)", listeners.len());
    }
}

/// A running cursor follower. Stops on drop.
///
/// On a surface narrower than [`CURSOR_MIN_SURFACE_WIDTH`] the follower is
/// disabled: it registers nothing and its state never changes.
pub struct CursorFollower {
    follower: Option<Rc<Follower>>,
    state: Signal<CursorState>,
}

impl CursorFollower {
    pub fn start() -> Self {
        let width = surface::viewport_width();
        if width < CURSOR_MIN_SURFACE_WIDTH {
            log::debug!("[CURSOR] surface width {width} below {CURSOR_MIN_SURFACE_WIDTH}, disabled");
            return Self {
                follower: None,
                state: signal(CursorState::INITIAL),
            };
        }

        let tracked: Vec<NodeHandle> = surface::interactive_indices()
            .into_iter()
            .filter(|&index| engine::is_allocated(index))
            .map(|index| NodeHandle {
                index,
                generation: engine::generation_of(index),
            })
            .collect();

        let state = signal(CursorState::INITIAL);
        let follower = Rc::new(Follower {
            state: state.clone(),
            hovered: Cell::new(0),
            listeners: RefCell::new(Vec::with_capacity(tracked.len() + 1)),
            tracked,
            seen_move: Cell::new(false),
            stopped: Cell::new(false),
        });

        let weak = Rc::downgrade(&follower);
        let surface_listener = pointer::on_pointer(move |event| {
            if let Some(follower) = weak.upgrade() {
                follower.on_pointer(event);
            }
        });
        follower.listeners.borrow_mut().push(surface_listener);

        for &node in &follower.tracked {
            let weak = Rc::downgrade(&follower);
            let listener = pointer::on_element_hover(node, move |inside| {
                if let Some(follower) = weak.upgrade() {
                    follower.on_hover(inside);
                }
            });
            follower.listeners.borrow_mut().push(listener);
        }

        log::debug!("[CURSOR] started, tracking {} interactive nodes", follower.tracked.len());
        Self {
            follower: Some(follower),
            state,
        }
    }

    /// Release every listener registered by `start`. Idempotent.
    pub fn stop(&self) {
        if let Some(follower) = &self.follower {
            follower.stop();
        }
    }

    /// Whether the surface was wide enough at start.
    pub fn is_enabled(&self) -> bool {
        self.follower.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.follower.as_ref().is_some_and(|f| !f.stopped.get())
    }

    pub fn state(&self) -> CursorState {
        self.state.get()
    }

    /// Reactive cursor state.
    pub fn state_signal(&self) -> Signal<CursorState> {
        self.state.clone()
    }

    /// What to draw, or None when disabled.
    pub fn visual(&self) -> Option<CursorVisual> {
        self.follower.as_ref().map(|_| self.state().visual())
    }

    /// Interactive nodes captured at start.
    pub fn tracked(&self) -> &[NodeHandle] {
        match &self.follower {
            Some(follower) => &follower.tracked,
            None => &[],
        }
    }
}

impl Drop for CursorFollower {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CursorFollower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorFollower")
            .field("enabled", &self.is_enabled())
            .field("running", &self.is_running())
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
