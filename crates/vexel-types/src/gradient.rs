use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::Point;

/// One color stop; `offset` is in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Gradient geometry. Angles are radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GradientKind {
    Linear { angle: f32 },
    Radial { center: Point, radius: f32 },
}

impl GradientKind {
    /// On-disk tag byte.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Linear { .. } => 0,
            Self::Radial { .. } => 1,
        }
    }
}

/// An entry in the shared gradient table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn linear(stops: Vec<GradientStop>, angle: f32) -> Self {
        Self {
            kind: GradientKind::Linear { angle },
            stops,
        }
    }

    pub fn radial(stops: Vec<GradientStop>, center: Point, radius: f32) -> Self {
        Self {
            kind: GradientKind::Radial { center, radius },
            stops,
        }
    }

    /// True when every stop offset is finite, in range, and non-decreasing.
    pub fn has_valid_stops(&self) -> bool {
        let in_range = self
            .stops
            .iter()
            .all(|s| s.offset.is_finite() && (0.0..=1.0).contains(&s.offset));
        in_range && self.stops.windows(2).all(|w| w[0].offset <= w[1].offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_validation() {
        let ok = Gradient::linear(
            vec![
                GradientStop::new(0.0, Color::BLACK),
                GradientStop::new(1.0, Color::WHITE),
            ],
            0.0,
        );
        assert!(ok.has_valid_stops());

        let unordered = Gradient::linear(
            vec![
                GradientStop::new(0.8, Color::BLACK),
                GradientStop::new(0.2, Color::WHITE),
            ],
            0.0,
        );
        assert!(!unordered.has_valid_stops());

        let out_of_range = Gradient::radial(
            vec![GradientStop::new(1.5, Color::BLACK)],
            Point::ORIGIN,
            1.0,
        );
        assert!(!out_of_range.has_valid_stops());
    }
}
