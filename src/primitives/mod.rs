//! Reveal Primitives - Component building blocks.
//!
//! This module provides the reveal primitives:
//! - [`text_reveal`] - Text revealed glyph by glyph on entering the view
//! - [`block_reveal`] - Opaque content that fades and slides into place
//! - [`pointer_parallax`] - Container background following the pointer
//! - [`cursor_follower`] - Custom ring-and-dot cursor
//!
//! # Architecture
//!
//! Components are indices into parallel arrays (ECS pattern). Each component:
//! 1. Mounts a node through the element factory
//! 2. Writes its initial presentation
//! 3. Attaches a controller or tracker that commits later writes
//! 4. Returns a handle that unmounts on drop (or a [`Cleanup`] closure)

mod types;
mod element;
mod text_reveal;
mod block_reveal;
mod pointer_effects;

pub use types::*;
pub use element::{element_spec, mount_element, ElementSpec};
pub use text_reveal::{text_reveal, TextReveal};
pub use block_reveal::{block_reveal, BlockReveal};
pub use pointer_effects::{cursor_follower, pointer_parallax};
