//! Pointer Bus - Raw pointer events and their listeners.
//!
//! The ambient surface's pointer listeners: additive, independent of one
//! another, and unordered relative to each other. Two kinds:
//!
//! - `on_pointer` - every pointer event on the surface (window-level)
//! - `on_element_hover` - enter/leave of one node's bounds (element-level)
//!
//! Does NOT own stdin; see [`crate::input`] for the crossterm bridge.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::engine::pointer::{self, PointerEvent};
//!
//! let id = pointer::on_pointer(|event| println!("{:?}", event));
//! pointer::dispatch_pointer(PointerEvent::move_to(12.0, 4.0));
//! pointer::remove_listener(id);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::arrays::surface;
use super::registry::NodeHandle;

// =============================================================================
// TYPES
// =============================================================================

/// Pointer action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    Down,
    Up,
    /// Pointer left the surface.
    Leave,
    /// Pointer re-entered the surface.
    Enter,
}

/// Pointer event in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(action: PointerAction, x: f32, y: f32) -> Self {
        Self { action, x, y }
    }

    pub fn move_to(x: f32, y: f32) -> Self {
        Self::new(PointerAction::Move, x, y)
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerAction::Down, x, y)
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerAction::Up, x, y)
    }

    pub fn leave() -> Self {
        Self::new(PointerAction::Leave, f32::NAN, f32::NAN)
    }

    pub fn enter(x: f32, y: f32) -> Self {
        Self::new(PointerAction::Enter, x, y)
    }

    /// Whether the event carries a usable position.
    pub fn has_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Handle to a registered listener of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Surface-level pointer callback.
pub type PointerCallback = Rc<dyn Fn(&PointerEvent)>;

/// Element hover callback: `true` on enter, `false` on leave.
pub type HoverCallback = Rc<dyn Fn(bool)>;

struct HoverListener {
    node: NodeHandle,
    callback: HoverCallback,
    inside: bool,
}

thread_local! {
    static NEXT_LISTENER: Cell<u64> = const { Cell::new(1) };
    static POINTER_LISTENERS: RefCell<BTreeMap<u64, PointerCallback>> = const { RefCell::new(BTreeMap::new()) };
    static HOVER_LISTENERS: RefCell<BTreeMap<u64, HoverListener>> = const { RefCell::new(BTreeMap::new()) };
    static LAST_POSITION: Cell<Option<(f32, f32)>> = const { Cell::new(None) };
}

fn next_listener_id() -> u64 {
    NEXT_LISTENER.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Listen to every pointer event on the surface.
pub fn on_pointer(handler: impl Fn(&PointerEvent) + 'static) -> ListenerId {
    let id = next_listener_id();
    POINTER_LISTENERS.with(|listeners| {
        listeners.borrow_mut().insert(id, Rc::new(handler));
    });
    ListenerId(id)
}

/// Listen to the pointer entering and leaving one node's bounds.
pub fn on_element_hover(node: NodeHandle, handler: impl Fn(bool) + 'static) -> ListenerId {
    let id = next_listener_id();
    HOVER_LISTENERS.with(|listeners| {
        listeners.borrow_mut().insert(
            id,
            HoverListener {
                node,
                callback: Rc::new(handler),
                inside: false,
            },
        );
    });
    ListenerId(id)
}

/// Remove a listener of either kind. Returns false if it was already removed.
pub fn remove_listener(id: ListenerId) -> bool {
    let removed = POINTER_LISTENERS.with(|listeners| listeners.borrow_mut().remove(&id.0).is_some());
    removed || HOVER_LISTENERS.with(|listeners| listeners.borrow_mut().remove(&id.0).is_some())
}

/// Whether a listener of either kind is still registered.
pub fn is_listening(id: ListenerId) -> bool {
    POINTER_LISTENERS.with(|listeners| listeners.borrow().contains_key(&id.0))
        || HOVER_LISTENERS.with(|listeners| listeners.borrow().contains_key(&id.0))
}

/// Number of surface-level listeners.
pub fn pointer_listener_count() -> usize {
    POINTER_LISTENERS.with(|listeners| listeners.borrow().len())
}

/// Number of element hover listeners.
pub fn hover_listener_count() -> usize {
    HOVER_LISTENERS.with(|listeners| listeners.borrow().len())
}

/// Last position seen on the surface, if any.
pub fn last_position() -> Option<(f32, f32)> {
    LAST_POSITION.with(|pos| pos.get())
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Work out which hover listeners flip, updating their state.
fn collect_hover_changes(event: &PointerEvent) -> Vec<(u64, HoverCallback, bool)> {
    HOVER_LISTENERS.with(|listeners| {
        let mut listeners = listeners.borrow_mut();
        let mut changes = Vec::new();
        for (&id, listener) in listeners.iter_mut() {
            let inside = match event.action {
                PointerAction::Leave => false,
                _ if !event.has_position() => continue,
                _ => {
                    listener.node.is_live()
                        && surface::get_bounds(listener.node.index)
                            .is_some_and(|bounds| bounds.contains(event.x, event.y))
                }
            };
            if inside != listener.inside {
                listener.inside = inside;
                changes.push((id, listener.callback.clone(), inside));
            }
        }
        changes
    })
}

/// Dispatch a pointer event to every listener.
///
/// Element enter/leave callbacks run first, then surface-level listeners.
/// A listener removed by an earlier callback in the same dispatch is skipped.
pub fn dispatch_pointer(event: PointerEvent) {
    if event.has_position() {
        LAST_POSITION.with(|pos| pos.set(Some((event.x, event.y))));
    }

    for (id, callback, inside) in collect_hover_changes(&event) {
        if HOVER_LISTENERS.with(|listeners| listeners.borrow().contains_key(&id)) {
            callback(inside);
        }
    }

    let listeners: Vec<(u64, PointerCallback)> = POINTER_LISTENERS.with(|listeners| {
        listeners
            .borrow()
            .iter()
            .map(|(&id, callback)| (id, callback.clone()))
            .collect()
    });
    for (id, callback) in listeners {
        if POINTER_LISTENERS.with(|listeners| listeners.borrow().contains_key(&id)) {
            callback(&event);
        }
    }
}

/// Remove every listener and forget the last position (for testing).
pub fn reset_pointer() {
    POINTER_LISTENERS.with(|listeners| listeners.borrow_mut().clear());
    HOVER_LISTENERS.with(|listeners| listeners.borrow_mut().clear());
    LAST_POSITION.with(|pos| pos.set(None));
}

// =============================================================================
// TESTS
// =============================================================================
