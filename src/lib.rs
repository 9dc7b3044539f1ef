//! # spark-reveal
//!
//! Scroll- and pointer-driven reveal animation primitives.
//!
//! Built on [spark-signals](https://crates.io/crates/spark-signals) for the
//! reactive phase, cursor and parallax values.
//!
//! ## Architecture
//!
//! Like spark-tui, nodes are indices into parallel arrays rather than objects.
//! Primitives write presentation values (opacity, offset, glyph runs,
//! background offset) into those arrays; the host surface reads them back and
//! samples committed transitions at its own clock.
//!
//! The host drives everything:
//! ```text
//! bounds/viewport ─┐
//! pointer events ──┼─▶ pipeline::step(dt) ─▶ presentation arrays ─▶ host render
//! clock ticks ─────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Direction, ElementKind, Offset, Bounds, Presentation)
//! - [`engine`] - Node registry, parallel arrays, scheduler, visibility, pointer bus
//! - [`animation`] - Reveal controller, glyph splitter, presets, parallax, cursor
//! - [`primitives`] - Text reveal, block reveal, parallax and cursor components
//! - [`config`] - JSON props loading
//! - [`input`] - crossterm event bridge
//! - [`pipeline`] - One host frame step

pub mod animation;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod primitives;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Result, RevealError};

pub use engine::{
    allocate_index, get_allocated_indices, get_id, get_index, is_allocated, on_destroy,
    pop_parent_context, push_parent_context, release_index, reset_registry, NodeHandle,
};

pub use animation::{
    attach, offset_for, reduce, split, CursorFlags, CursorFollower, CursorState, CursorVisual,
    Easing, GlyphSequence, GlyphUnit, PointerSample, PointerTracker, RevealEffect, RevealHandle,
    RevealMode, RevealState, Transition,
};

pub use primitives::{
    block_reveal, cursor_follower, pointer_parallax, text_reveal, BlockReveal, BlockRevealProps,
    Cleanup, TextReveal, TextRevealProps,
};

pub use pipeline::{reset_runtime, step, sync_layout, FrameReport};
