//! Core types for spark-reveal.
//!
//! These types define the foundation that everything builds on.
//! They flow from the reveal primitives into the presentation arrays and define
//! what the host renderer understands.

use serde::{Deserialize, Deserializer};

use crate::error::RevealError;

// =============================================================================
// Time
// =============================================================================

/// Time in seconds on the host clock.
pub type Seconds = f64;

// =============================================================================
// Geometry
// =============================================================================

/// A 2D displacement in surface units (pixels on the web, cells in a terminal).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    /// No displacement.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale both axes by the same factor.
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Linear interpolation towards `to`.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
        )
    }
}

impl From<taffy::Point<f32>> for Offset {
    fn from(point: taffy::Point<f32>) -> Self {
        Self::new(point.x, point.y)
    }
}

impl From<Offset> for taffy::Point<f32> {
    fn from(offset: Offset) -> Self {
        taffy::Point { x: offset.x, y: offset.y }
    }
}

/// Axis-aligned bounding rectangle of a node on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area of the rectangle (zero for degenerate or negative sizes).
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Whether a point lies inside the rectangle (edges inclusive on the
    /// top/left, exclusive on the bottom/right).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Intersection with another rectangle, or None if they don't overlap.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Bounds::new(left, top, right - left, bottom - top))
    }

    /// Fraction of this rectangle's area that lies inside `viewport`, in [0, 1].
    ///
    /// A zero-area rectangle counts as fully visible when its origin is inside
    /// the viewport, matching how browsers report empty targets.
    pub fn visible_ratio(&self, viewport: &Bounds) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            let inside = self.x >= viewport.x
                && self.x <= viewport.right()
                && self.y >= viewport.y
                && self.y <= viewport.bottom();
            return if inside { 1.0 } else { 0.0 };
        }
        match self.intersection(viewport) {
            Some(overlap) => (overlap.area() / area).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

impl From<&taffy::Layout> for Bounds {
    fn from(layout: &taffy::Layout) -> Self {
        Self::new(
            layout.location.x,
            layout.location.y,
            layout.size.width,
            layout.size.height,
        )
    }
}

// =============================================================================
// Direction
// =============================================================================

/// Direction a block slides in from.
///
/// The name is the direction of travel: `Up` starts below its resting place
/// and moves up into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum Direction {
    #[default]
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Parse a direction tag. Unknown tags fall back to `Up`.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            other => {
                log::debug!("unknown direction {other:?}, using up");
                Self::Up
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl From<&str> for Direction {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

// =============================================================================
// Element Kind
// =============================================================================

/// The element a text reveal renders as.
///
/// Closed set: dispatch with `match` so new kinds are caught by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ElementKind {
    #[default]
    Block,
    Inline,
    Paragraph,
    Heading(HeadingLevel),
}

/// Heading level 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Create a heading level. Returns None outside 1..=6.
    pub const fn new(level: u8) -> Option<Self> {
        if level >= 1 && level <= 6 {
            Some(Self(level))
        } else {
            None
        }
    }

    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl ElementKind {
    /// Parse an element kind from either its descriptive name
    /// (`block`, `inline`, `paragraph`, `heading-1`..`heading-6`) or the
    /// matching HTML tag (`div`, `span`, `p`, `h1`..`h6`).
    pub fn parse(input: &str) -> Result<Self, RevealError> {
        let normalized = input.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "block" | "div" => Self::Block,
            "inline" | "span" => Self::Inline,
            "paragraph" | "p" => Self::Paragraph,
            other => {
                let level = other
                    .strip_prefix("heading-")
                    .or_else(|| other.strip_prefix('h'))
                    .and_then(|digits| digits.parse::<u8>().ok())
                    .and_then(HeadingLevel::new);
                match level {
                    Some(level) => Self::Heading(level),
                    None => return Err(RevealError::UnknownElementKind(input.to_string())),
                }
            }
        };
        Ok(kind)
    }

    /// HTML tag for web hosts.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Block => "div",
            Self::Inline => "span",
            Self::Paragraph => "p",
            Self::Heading(level) => match level.get() {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
        }
    }

    /// Whether the element starts on its own line.
    pub fn is_block_level(&self) -> bool {
        !matches!(self, Self::Inline)
    }
}

impl<'de> Deserialize<'de> for ElementKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::parse(&tag).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Presentation
// =============================================================================

/// The animatable presentation attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    /// 0.0 = transparent, 1.0 = opaque.
    pub opacity: f32,
    /// Positional displacement from the resting place.
    pub offset: Offset,
}

impl Presentation {
    /// Settled, fully visible state.
    pub const REVEALED: Self = Self {
        opacity: 1.0,
        offset: Offset::ZERO,
    };

    /// Pre-reveal state: transparent and displaced by `offset`.
    pub const fn hidden(offset: Offset) -> Self {
        Self { opacity: 0.0, offset }
    }

    /// Interpolate between two presentations.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self {
            opacity: self.opacity + (to.opacity - self.opacity) * t,
            offset: self.offset.lerp(to.offset, t),
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::REVEALED
    }
}

// =============================================================================
// Node Kind
// =============================================================================

/// What kind of node sits at an index in the presentation arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NodeKind {
    #[default]
    None = 0,
    /// Opaque child content revealed as one block.
    Block = 1,
    /// Text revealed glyph by glyph.
    Text = 2,
    /// Container driven by the pointer (parallax background).
    Container = 3,
}
