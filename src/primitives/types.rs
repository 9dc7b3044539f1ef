//! Primitive types - Props and cleanup.
//!
//! Props are plain structs with the same defaults whether they are built in
//! code (`..Default::default()`) or loaded from JSON through [`crate::config`].

use serde::Deserialize;

use crate::animation::presets::DEFAULT_DISTANCE;
use crate::error::{Result, RevealError};
use crate::types::{Direction, ElementKind, Seconds};

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by components.
///
/// Call this to unmount the component and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

/// Children builder, run once inside the parent's context.
pub type Children = Box<dyn FnOnce()>;

// =============================================================================
// Defaults
// =============================================================================

/// Visible fraction that triggers a text reveal.
pub const TEXT_REVEAL_THRESHOLD: f32 = 0.5;

/// Visible fraction that triggers a block reveal.
pub const BLOCK_REVEAL_THRESHOLD: f32 = 0.1;

/// Default block transition length.
pub const DEFAULT_BLOCK_DURATION: Seconds = 0.6;

fn default_once() -> bool {
    true
}

fn default_duration() -> Seconds {
    DEFAULT_BLOCK_DURATION
}

fn default_distance() -> f32 {
    DEFAULT_DISTANCE
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RevealError::InvalidValue { field, value })
    }
}

// =============================================================================
// Text Reveal Props
// =============================================================================

/// Properties for the text reveal primitive.
///
/// The text renders plainly until at least half of it is in view, then
/// reveals glyph by glyph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRevealProps {
    /// Optional node ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Text to reveal.
    pub text: String,

    /// Host styling hook, passed through untouched.
    #[serde(default)]
    pub class_name: Option<String>,

    /// Reveal only the first time the text comes into view.
    #[serde(default = "default_once")]
    pub once: bool,

    /// Seconds before the first glyph starts.
    #[serde(default)]
    pub delay: Seconds,

    /// Element the text renders as.
    #[serde(default, alias = "el")]
    pub element_kind: ElementKind,
}

impl Default for TextRevealProps {
    fn default() -> Self {
        Self {
            id: None,
            text: String::new(),
            class_name: None,
            once: true,
            delay: 0.0,
            element_kind: ElementKind::default(),
        }
    }
}

impl TextRevealProps {
    /// Reject negative or non-finite timings.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("delay", self.delay)
    }
}

// =============================================================================
// Block Reveal Props
// =============================================================================

/// Properties for the block reveal primitive.
///
/// The block starts transparent at the direction's offset and slides into
/// place once a tenth of it is in view.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRevealProps {
    /// Optional node ID.
    #[serde(default)]
    pub id: Option<String>,

    /// Host styling hook, passed through untouched.
    #[serde(default)]
    pub class_name: Option<String>,

    /// Direction of travel into place.
    #[serde(default)]
    pub direction: Direction,

    /// Seconds between the reveal trigger and the start of the transition.
    #[serde(default)]
    pub delay: Seconds,

    /// Transition length in seconds.
    #[serde(default = "default_duration")]
    pub duration: Seconds,

    /// Starting distance from the resting place.
    #[serde(default = "default_distance")]
    pub distance: f32,

    /// Reveal only the first time the block comes into view.
    #[serde(default = "default_once")]
    pub once: bool,

    /// Opaque child content, mounted under the block.
    #[serde(skip)]
    pub children: Option<Children>,
}

impl Default for BlockRevealProps {
    fn default() -> Self {
        Self {
            id: None,
            class_name: None,
            direction: Direction::Up,
            delay: 0.0,
            duration: DEFAULT_BLOCK_DURATION,
            distance: DEFAULT_DISTANCE,
            once: true,
            children: None,
        }
    }
}

impl BlockRevealProps {
    /// Reject negative or non-finite timings and distances.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("delay", self.delay)?;
        check_non_negative("duration", self.duration)?;
        check_non_negative("distance", f64::from(self.distance))
    }
}

impl std::fmt::Debug for BlockRevealProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRevealProps")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("direction", &self.direction)
            .field("delay", &self.delay)
            .field("duration", &self.duration)
            .field("distance", &self.distance)
            .field("once", &self.once)
            .field("children", &self.children.is_some())
            .finish()
    }
}
