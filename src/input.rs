//! Input Module - Event conversion and polling
//!
//! Bridges crossterm's event system with the pointer bus and the viewport.
//! Provides event polling, conversion, and routing.
//!
//! # API
//!
//! - `convert_event` - Convert a crossterm Event to our InputEvent
//! - `convert_mouse_event` - Convert crossterm MouseEvent to a PointerEvent
//! - `poll_event` - Non-blocking event check with timeout
//! - `read_event` - Blocking event read
//! - `route_event` - Dispatch event to the pointer bus or viewport
//! - `enable_mouse` / `disable_mouse` - Control mouse capture
//!
//! Terminal cells map to surface units one to one.
//!
//! # Example
//!
//! ```ignore
//! use spark_reveal::input::{poll_event, route_event};
//! use spark_reveal::pipeline;
//! use std::time::Duration;
//!
//! // Event loop
//! loop {
//!     if let Ok(Some(event)) = poll_event(Duration::from_millis(16)) {
//!         route_event(event);
//!     }
//!     pipeline::step(0.016);
//! }
//! ```

use crossterm::event::{
    poll, read, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
    Event as CrosstermEvent, MouseEvent as CrosstermMouseEvent, MouseEventKind,
};
use crossterm::execute;
use std::io::stdout;
use std::time::Duration;

use crate::engine::arrays::surface;
use crate::engine::pointer::{self, PointerAction, PointerEvent};
use crate::types::Bounds;

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// Unified event type for the reveal runtime
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer event (move, down, up, leave, enter)
    Pointer(PointerEvent),
    /// Surface resize (new width, height)
    Resize(u16, u16),
    /// No event or unhandled event type
    None,
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Convert crossterm MouseEvent to a PointerEvent.
///
/// Scrolling is not a pointer movement and yields None.
pub fn convert_mouse_event(event: CrosstermMouseEvent) -> Option<PointerEvent> {
    let action = match event.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => PointerAction::Move,
        MouseEventKind::Down(_) => PointerAction::Down,
        MouseEventKind::Up(_) => PointerAction::Up,
        MouseEventKind::ScrollUp
        | MouseEventKind::ScrollDown
        | MouseEventKind::ScrollLeft
        | MouseEventKind::ScrollRight => return None,
    };
    Some(PointerEvent::new(action, f32::from(event.column), f32::from(event.row)))
}

/// Convert any crossterm event.
///
/// Focus changes stand in for the pointer leaving and re-entering the surface.
pub fn convert_event(event: CrosstermEvent) -> InputEvent {
    match event {
        CrosstermEvent::Mouse(mouse) => convert_mouse_event(mouse)
            .map(InputEvent::Pointer)
            .unwrap_or(InputEvent::None),
        CrosstermEvent::FocusLost => InputEvent::Pointer(PointerEvent::leave()),
        CrosstermEvent::FocusGained => {
            let (x, y) = pointer::last_position().unwrap_or((f32::NAN, f32::NAN));
            InputEvent::Pointer(PointerEvent::enter(x, y))
        }
        CrosstermEvent::Resize(w, h) => InputEvent::Resize(w, h),
        _ => InputEvent::None,
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout.
/// Returns None if no event within timeout.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(read_event()?))
    } else {
        Ok(None)
    }
}

/// Read the next event (blocking).
pub fn read_event() -> std::io::Result<InputEvent> {
    Ok(convert_event(read()?))
}

// =============================================================================
// EVENT ROUTING
// =============================================================================

/// Route an event to the pointer bus or the viewport.
/// Returns true if the event was handled.
pub fn route_event(event: InputEvent) -> bool {
    match event {
        InputEvent::Pointer(event) => {
            pointer::dispatch_pointer(event);
            true
        }
        InputEvent::Resize(w, h) => {
            let viewport = surface::viewport();
            surface::set_viewport(Bounds::new(viewport.x, viewport.y, f32::from(w), f32::from(h)));
            log::debug!("[INPUT] viewport resized to {w}x{h}");
            true
        }
        InputEvent::None => false,
    }
}

// =============================================================================
// MOUSE CAPTURE
// =============================================================================

/// Enable mouse capture and focus reporting.
pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture, EnableFocusChange)
}

/// Disable mouse capture and focus reporting.
pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture, DisableFocusChange)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> CrosstermMouseEvent {
        CrosstermMouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        }
    }

    #[test]
    fn test_convert_mouse_move_and_drag() {
        let event = convert_mouse_event(mouse(MouseEventKind::Moved, 10, 5)).unwrap();
        assert_eq!(event, PointerEvent::move_to(10.0, 5.0));

        let event = convert_mouse_event(mouse(MouseEventKind::Drag(MouseButton::Left), 3, 4)).unwrap();
        assert_eq!(event.action, PointerAction::Move);
    }

    #[test]
    fn test_convert_mouse_buttons() {
        let down = convert_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 1, 2)).unwrap();
        assert_eq!(down.action, PointerAction::Down);
        let up = convert_mouse_event(mouse(MouseEventKind::Up(MouseButton::Right), 1, 2)).unwrap();
        assert_eq!(up.action, PointerAction::Up);
    }

    #[test]
    fn test_scroll_is_ignored() {
        for kind in [
            MouseEventKind::ScrollUp,
            MouseEventKind::ScrollDown,
            MouseEventKind::ScrollLeft,
            MouseEventKind::ScrollRight,
        ] {
            assert!(convert_mouse_event(mouse(kind, 0, 0)).is_none());
        }
    }

    #[test]
    fn test_convert_focus_and_resize() {
        pointer::reset_pointer();

        let lost = convert_event(CrosstermEvent::FocusLost);
        assert!(matches!(lost, InputEvent::Pointer(e) if e.action == PointerAction::Leave));

        let gained = convert_event(CrosstermEvent::FocusGained);
        assert!(matches!(gained, InputEvent::Pointer(e) if e.action == PointerAction::Enter));

        assert_eq!(convert_event(CrosstermEvent::Resize(120, 40)), InputEvent::Resize(120, 40));

        let key = CrosstermEvent::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        assert_eq!(convert_event(key), InputEvent::None);
    }

    #[test]
    fn test_route_event() {
        pointer::reset_pointer();
        surface::reset_viewport();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        pointer::on_pointer(move |event| seen_clone.borrow_mut().push(event.action));

        assert!(route_event(InputEvent::Pointer(PointerEvent::down(1.0, 1.0))));
        assert!(route_event(InputEvent::Resize(200, 50)));
        assert!(!route_event(InputEvent::None));

        assert_eq!(*seen.borrow(), vec![PointerAction::Down]);
        assert_eq!(surface::viewport_width(), 200.0);
    }
}
