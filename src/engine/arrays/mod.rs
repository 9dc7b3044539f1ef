//! Parallel Arrays
//!
//! All node state lives in these parallel arrays.
//! Each array index corresponds to one node.
//!
//! Reveal primitives write presentation values here; the host renderer reads
//! them back (sampling transitions at its own clock) and never needs to know
//! which primitive produced them.
//!
//! # Array Categories
//!
//! - **presentation**: Opacity/offset, transitions, text, glyph runs, background offset
//! - **surface**: Bounds, element kind, class name, interactive flag, viewport

pub mod presentation;
pub mod surface;

use self::presentation as presentation_arrays;
use self::surface as surface_arrays;

/// Grow a per-index vector so `index` is addressable.
pub(crate) fn ensure_len<T: Default>(values: &mut Vec<T>, index: usize) {
    if values.len() <= index {
        values.resize_with(index + 1, T::default);
    }
}

/// Ensure all arrays have capacity for the given index.
///
/// Called by registry when allocating.
pub fn ensure_all_capacity(index: usize) {
    presentation_arrays::ensure_capacity(index);
    surface_arrays::ensure_capacity(index);
}

/// Clear all array values at an index.
///
/// Called by registry when releasing.
pub fn clear_all_at_index(index: usize) {
    presentation_arrays::clear_at_index(index);
    surface_arrays::clear_at_index(index);
}

/// Reset all parallel arrays to release memory.
///
/// Called automatically when the last node is released. The viewport is
/// surface-wide state and survives this.
pub fn reset_all_arrays() {
    presentation_arrays::reset();
    surface_arrays::reset();
}
