//! Rail geometry.
//!
//! Pure math behind marker placement: mapping a note's time onto the
//! progress rail, and expressing the rail's screen rectangle relative to the
//! element the overlay layer is attached to.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// This rectangle expressed in the coordinate space of `origin`.
    ///
    /// Both rectangles are viewport-relative (as reported by the host); the
    /// result keeps the size and shifts the position.
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect {
            left: self.left - origin.left,
            top: self.top - origin.top,
            width: self.width,
            height: self.height,
        }
    }
}

/// A duration is usable for placement only when finite and positive.
pub fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

/// Fraction of the rail covered up to `time`, clamped to `[0, 1]`.
///
/// Returns `None` while the duration is unknown.
pub fn marker_fraction(time: f64, duration: Option<f64>) -> Option<f64> {
    let duration = usable_duration(duration)?;
    let fraction = if time.is_finite() { time / duration } else { 0.0 };
    Some(fraction.clamp(0.0, 1.0))
}

/// Marker position as a percentage of rail width, in `[0, 100]`.
pub fn marker_percent(time: f64, duration: Option<f64>) -> Option<f64> {
    marker_fraction(time, duration).map(|f| f * 100.0)
}

/// Marker horizontal offset in pixels from the rail's left edge.
pub fn marker_offset(time: f64, duration: Option<f64>, rail_width: f64) -> Option<f64> {
    marker_fraction(time, duration).map(|f| f * rail_width.max(0.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
