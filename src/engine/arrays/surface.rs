//! Surface Arrays
//!
//! Where each node sits on the host surface, as reported by the host:
//! - bounds: bounding rectangle (set directly or from a taffy layout)
//! - element: element kind a text node renders as
//! - className: host styling hook passed through untouched
//! - interactive: whether the node counts as a link/button for hover tracking
//!
//! Plus the surface-wide viewport rectangle.

use std::cell::{Cell, RefCell};

use spark_signals::{signal, Signal};

use super::ensure_len;
use crate::types::{Bounds, ElementKind};

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    static BOUNDS: RefCell<Vec<Option<Bounds>>> = const { RefCell::new(Vec::new()) };
    static ELEMENT: RefCell<Vec<ElementKind>> = const { RefCell::new(Vec::new()) };
    static CLASS_NAME: RefCell<Vec<Option<String>>> = const { RefCell::new(Vec::new()) };
    static INTERACTIVE: RefCell<Vec<bool>> = const { RefCell::new(Vec::new()) };

    /// Visible region of the surface.
    static VIEWPORT: Cell<Bounds> = const { Cell::new(Bounds::new(0.0, 0.0, 0.0, 0.0)) };
    static VIEWPORT_SIGNAL: Signal<Bounds> = signal(Bounds::default());
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    BOUNDS.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    ELEMENT.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    CLASS_NAME.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
    INTERACTIVE.with(|arr| ensure_len(&mut arr.borrow_mut(), index));
}

/// Clear values at index.
pub fn clear_at_index(index: usize) {
    BOUNDS.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    ELEMENT.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = ElementKind::default();
        }
    });
    CLASS_NAME.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    INTERACTIVE.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = false;
        }
    });
}

/// Reset all per-node arrays. The viewport is left alone.
pub fn reset() {
    BOUNDS.with(|arr| arr.borrow_mut().clear());
    ELEMENT.with(|arr| arr.borrow_mut().clear());
    CLASS_NAME.with(|arr| arr.borrow_mut().clear());
    INTERACTIVE.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Bounds
// =============================================================================

/// Bounding rectangle of a node, if the host has reported one.
pub fn get_bounds(index: usize) -> Option<Bounds> {
    BOUNDS.with(|arr| arr.borrow().get(index).copied().flatten())
}

pub fn set_bounds(index: usize, bounds: Bounds) {
    BOUNDS.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = Some(bounds);
    });
}

/// Set bounds from a computed taffy layout.
pub fn set_layout(index: usize, layout: &taffy::Layout) {
    set_bounds(index, Bounds::from(layout));
}

// =============================================================================
// Element Kind
// =============================================================================

pub fn get_element(index: usize) -> ElementKind {
    ELEMENT.with(|arr| arr.borrow().get(index).copied().unwrap_or_default())
}

pub fn set_element(index: usize, element: ElementKind) {
    ELEMENT.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = element;
    });
}

// =============================================================================
// Class Name
// =============================================================================

pub fn get_class_name(index: usize) -> Option<String> {
    CLASS_NAME.with(|arr| arr.borrow().get(index).cloned().flatten())
}

pub fn set_class_name(index: usize, class_name: Option<String>) {
    CLASS_NAME.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = class_name;
    });
}

// =============================================================================
// Interactive
// =============================================================================

pub fn is_interactive(index: usize) -> bool {
    INTERACTIVE.with(|arr| arr.borrow().get(index).copied().unwrap_or(false))
}

/// Mark a node as interactive (link/button) for cursor hover tracking.
pub fn set_interactive(index: usize, interactive: bool) {
    INTERACTIVE.with(|arr| {
        let mut arr = arr.borrow_mut();
        ensure_len(&mut arr, index);
        arr[index] = interactive;
    });
}

/// Indices currently marked interactive, ascending.
pub fn interactive_indices() -> Vec<usize> {
    INTERACTIVE.with(|arr| {
        arr.borrow()
            .iter()
            .enumerate()
            .filter(|&(_, &flag)| flag)
            .map(|(index, _)| index)
            .collect()
    })
}

// =============================================================================
// Viewport
// =============================================================================

pub fn viewport() -> Bounds {
    VIEWPORT.with(|v| v.get())
}

/// Width of the viewing surface.
pub fn viewport_width() -> f32 {
    viewport().width
}

pub fn set_viewport(bounds: Bounds) {
    VIEWPORT.with(|v| v.set(bounds));
    VIEWPORT_SIGNAL.with(|s| s.set(bounds));
}

/// Reactive viewport for hosts that derive layout from it.
pub fn viewport_signal() -> Signal<Bounds> {
    VIEWPORT_SIGNAL.with(|s| s.clone())
}

/// Reset the viewport to an empty rectangle (for testing).
pub fn reset_viewport() {
    set_viewport(Bounds::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        reset();
        reset_viewport();
    }

    #[test]
    fn test_bounds_roundtrip() {
        setup();
        assert_eq!(get_bounds(3), None);
        set_bounds(3, Bounds::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(get_bounds(3), Some(Bounds::new(1.0, 2.0, 3.0, 4.0)));
        clear_at_index(3);
        assert_eq!(get_bounds(3), None);
    }

    #[test]
    fn test_interactive_indices() {
        setup();
        set_interactive(2, true);
        set_interactive(5, true);
        set_interactive(2, false);
        set_interactive(7, true);
        assert_eq!(interactive_indices(), vec![5, 7]);
    }

    #[test]
    fn test_viewport_signal_follows() {
        setup();
        let signal = viewport_signal();
        set_viewport(Bounds::new(0.0, 0.0, 1280.0, 720.0));
        assert_eq!(viewport_width(), 1280.0);
        assert_eq!(signal.get().height, 720.0);
    }
}
