//! Transitions - Time-based interpolation between two presentations.
//!
//! A transition is committed once and sampled by the host at its own clock,
//! the same way a CSS transition is declared once and run by the browser.
//! Before `start` it yields `from`, after `start + duration` it yields `to`,
//! and in between the eased interpolation.

use crate::types::{Presentation, Seconds};

// =============================================================================
// EASING
// =============================================================================

/// Easing curve applied to transition progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Easing {
    Linear,
    /// CSS `ease`: cubic-bezier(0.25, 0.1, 0.25, 1.0)
    #[default]
    Ease,
    /// CSS `ease-out`: cubic-bezier(0.0, 0.0, 0.58, 1.0)
    EaseOut,
    /// CSS `ease-in-out`: cubic-bezier(0.42, 0.0, 0.58, 1.0)
    EaseInOut,
    /// Custom cubic bezier (x1, y1, x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Bezier control points, or None for a linear curve.
    pub fn control_points(&self) -> Option<(f32, f32, f32, f32)> {
        match *self {
            Self::Linear => None,
            Self::Ease => Some((0.25, 0.1, 0.25, 1.0)),
            Self::EaseOut => Some((0.0, 0.0, 0.58, 1.0)),
            Self::EaseInOut => Some((0.42, 0.0, 0.58, 1.0)),
            Self::CubicBezier(x1, y1, x2, y2) => Some((x1, y1, x2, y2)),
        }
    }

    /// Map linear progress in [0, 1] to eased progress.
    ///
    /// Invalid control points degrade to linear.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let Some((x1, y1, x2, y2)) = self.control_points() else {
            return t;
        };
        // Endpoints are exact for every valid curve
        if t <= 0.0 || t >= 1.0 {
            return t;
        }
        match bezier_easing::bezier_easing(x1, y1, x2, y2) {
            Ok(curve) => curve(t),
            Err(_) => {
                log::warn!("[EASING] invalid curve ({x1}, {y1}, {x2}, {y2}), using linear");
                t
            }
        }
    }
}

// =============================================================================
// TRANSITION
// =============================================================================

/// A committed presentation change running on the host clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Presentation,
    pub to: Presentation,
    /// Host time at which interpolation begins.
    pub start: Seconds,
    /// Length of the interpolation in seconds.
    pub duration: Seconds,
    pub easing: Easing,
}

impl Transition {
    pub fn new(
        from: Presentation,
        to: Presentation,
        start: Seconds,
        duration: Seconds,
        easing: Easing,
    ) -> Self {
        Self {
            from,
            to,
            start,
            duration: duration.max(0.0),
            easing,
        }
    }

    /// Host time at which the transition settles.
    pub fn end(&self) -> Seconds {
        self.start + self.duration
    }

    /// Linear progress at `now`, clamped to [0, 1].
    pub fn progress(&self, now: Seconds) -> f32 {
        if now < self.start {
            return 0.0;
        }
        if self.duration <= 0.0 || now >= self.end() {
            return 1.0;
        }
        ((now - self.start) / self.duration) as f32
    }

    pub fn has_started(&self, now: Seconds) -> bool {
        now >= self.start
    }

    pub fn is_complete(&self, now: Seconds) -> bool {
        now >= self.end()
    }

    /// Presentation at host time `now`.
    pub fn sample(&self, now: Seconds) -> Presentation {
        let progress = self.progress(now);
        if progress <= 0.0 {
            return self.from;
        }
        if progress >= 1.0 {
            return self.to;
        }
        self.from.lerp(self.to, self.easing.apply(progress))
    }
}
