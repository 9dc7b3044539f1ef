//! Animation - Reveal state machines, glyph staggering and pointer effects.
//!
//! - `presets`: direction → pre-reveal offset
//! - `transition`: eased interpolation sampled on the host clock
//! - `controller`: visibility-driven enter/exit state machine
//! - `glyph`: per-character staggered text reveals
//! - `parallax`: pointer-driven background offset per frame
//! - `cursor`: custom cursor state from raw pointer events

pub mod controller;
pub mod cursor;
pub mod glyph;
pub mod parallax;
pub mod presets;
pub mod transition;

pub use controller::{attach, reduce, RevealEffect, RevealHandle, RevealMode, RevealState, Step};
pub use cursor::{CursorFlags, CursorFollower, CursorState, CursorVisual, CURSOR_MIN_SURFACE_WIDTH};
pub use glyph::{schedule_reveal, split, GlyphReveal, GlyphSequence, GlyphUnit, GLYPH_DURATION, STAGGER_INTERVAL};
pub use parallax::{PointerSample, PointerTracker, PARALLAX_AMPLITUDE};
pub use presets::{hidden_presentation, offset_for};
pub use transition::{Easing, Transition};
