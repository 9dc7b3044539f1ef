//! Transform Presets - Pre-reveal offsets per direction.
//!
//! The direction names where the element travels TO, so the starting offset
//! points the other way:
//!
//! ```text
//! up    -> (0, +d)   starts below, rises into place
//! down  -> (0, -d)   starts above, drops into place
//! left  -> (+d, 0)   starts right, slides left
//! right -> (-d, 0)   starts left, slides right
//! ```

use crate::types::{Direction, Offset, Presentation};

/// Default travel distance in pixels.
pub const DEFAULT_DISTANCE: f32 = 20.0;

/// Starting offset for a reveal travelling in `direction` over `distance`.
pub fn offset_for(direction: Direction, distance: f32) -> Offset {
    match direction {
        Direction::Up => Offset::new(0.0, distance),
        Direction::Down => Offset::new(0.0, -distance),
        Direction::Left => Offset::new(distance, 0.0),
        Direction::Right => Offset::new(-distance, 0.0),
    }
}

/// Same as [`offset_for`] but from a raw direction tag. Unknown tags travel up.
pub fn offset_for_tag(tag: &str, distance: f32) -> Offset {
    offset_for(Direction::parse(tag), distance)
}

/// Pre-reveal presentation: transparent at the preset offset.
pub fn hidden_presentation(direction: Direction, distance: f32) -> Presentation {
    Presentation::hidden(offset_for(direction, distance))
}

/// Post-reveal presentation: opaque at rest.
pub fn revealed_presentation() -> Presentation {
    Presentation::REVEALED
}
