//! Pointer Effect Primitives - Parallax container and custom cursor.
//!
//! Neither takes configuration beyond what it is attached to: the parallax
//! amplitude is fixed and the cursor covers the whole surface.

use crate::animation::cursor::CursorFollower;
use crate::animation::parallax::PointerTracker;
use crate::engine::arrays::presentation;
use crate::engine::NodeHandle;
use crate::types::NodeKind;

/// Drive `container`'s background offset from the pointer.
///
/// The returned tracker stops when dropped.
pub fn pointer_parallax(container: NodeHandle) -> PointerTracker {
    presentation::set_kind(container.index, NodeKind::Container);
    PointerTracker::start(container)
}

/// Start the custom cursor for the current surface.
///
/// Disabled on surfaces narrower than the cursor's minimum width.
pub fn cursor_follower() -> CursorFollower {
    CursorFollower::start()
}
