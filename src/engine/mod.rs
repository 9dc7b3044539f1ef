//! Reveal Engine - Node registry, parallel arrays, and the host-driven runtime.
//!
//! The engine manages the core data structures:
//! - Registry: Index allocation, ID mapping, generations, parent context
//! - Arrays: Parallel arrays for presentation and surface state
//! - Scheduler: Timers and frame callbacks on the host clock
//! - Visibility: Watchers comparing viewport occupancy against a threshold
//! - Pointer: Additive pointer listeners and element hover tracking
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are indices into parallel arrays:
//!
//! ```text
//! Index 0: Block     (opacity=0.0, offset=(0,20), bounds=(0,400,80,10), ...)
//! Index 1: Text      (opacity=1.0, glyphs=[h,i], bounds=(0,20,2,1),      ...)
//! Index 2: Container (background=(4,-2),          bounds=(0,0,80,24),     ...)
//! ```
//!
//! Primitives write presentation values; the host reads them back and renders.
//! A [`NodeHandle`] carries the index's generation, so callbacks scheduled for
//! an unmounted node see it as stale even after the index is reused.

mod registry;
pub mod arrays;
pub mod pointer;
pub mod scheduler;
pub mod visibility;

pub use registry::*;
