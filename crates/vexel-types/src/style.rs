use std::fmt;
use std::num::NonZeroU16;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;

bitflags! {
    /// Per-record state bits.
    ///
    /// `HAS_NAME` and `HAS_METADATA` mirror membership in the sparse name and
    /// metadata tables so that records without extensions never touch them.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ObjectFlags: u16 {
        const VISIBLE      = 1 << 0;
        const LOCKED       = 1 << 1;
        const HAS_FILL     = 1 << 2;
        const HAS_STROKE   = 1 << 3;
        const HAS_NAME     = 1 << 4;
        const HAS_METADATA = 1 << 5;
        const GROUPED      = 1 << 6;
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::HAS_STROKE
    }
}

/// Identifier of a drawing layer. Layer 0 is the default layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u8);

impl LayerId {
    pub const DEFAULT: Self = Self(0);
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer:{}", self.0)
    }
}

macro_rules! table_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonZeroU16);

        impl $name {
            /// Id for the entry at zero-based `index`, if it fits in 16 bits.
            pub fn from_index(index: usize) -> Option<Self> {
                let raw = u16::try_from(index.checked_add(1)?).ok()?;
                NonZeroU16::new(raw).map(Self)
            }

            /// Wrap a raw on-disk value. Zero means "none".
            pub fn from_raw(raw: u16) -> Option<Self> {
                NonZeroU16::new(raw).map(Self)
            }

            pub fn get(self) -> u16 {
                self.0.get()
            }

            /// Zero-based position in the owning table.
            pub fn index(self) -> usize {
                usize::from(self.0.get() - 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

table_id!(
    /// Reference into the gradient table.
    GradientId,
    "gradient"
);
table_id!(
    /// Reference into the pattern table.
    PatternId,
    "pattern"
);

/// Fixed-width style block carried by every record (24 bytes).
///
/// Colors are stored inline; gradients and patterns are referenced by id
/// and cost two bytes each when unset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f32,
    pub opacity: f32,
    pub flags: ObjectFlags,
    pub layer: LayerId,
    pub gradient: Option<GradientId>,
    pub pattern: Option<PatternId>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Color::TRANSPARENT,
            stroke: Color::BLACK,
            stroke_width: 1.0,
            opacity: 1.0,
            flags: ObjectFlags::default(),
            layer: LayerId::DEFAULT,
            gradient: None,
            pattern: None,
        }
    }
}

impl Style {
    pub fn on_layer(mut self, layer: LayerId) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = color;
        self.flags.insert(ObjectFlags::HAS_FILL);
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = color;
        self.stroke_width = width;
        self.flags.insert(ObjectFlags::HAS_STROKE);
        self
    }

    pub fn fill_color(&self) -> Option<Color> {
        self.flags.contains(ObjectFlags::HAS_FILL).then_some(self.fill)
    }

    pub fn stroke_color(&self) -> Option<Color> {
        self.flags.contains(ObjectFlags::HAS_STROKE).then_some(self.stroke)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ObjectFlags::VISIBLE)
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(ObjectFlags::LOCKED)
    }

    pub fn is_grouped(&self) -> bool {
        self.flags.contains(ObjectFlags::GROUPED)
    }

    /// Set opacity, clamping into `[0, 1]`. NaN becomes fully opaque.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_block_is_compact() {
        assert_eq!(std::mem::size_of::<Style>(), 24);
        assert_eq!(std::mem::size_of::<Option<GradientId>>(), 2);
    }

    #[test]
    fn default_style_strokes_black_without_fill() {
        let s = Style::default();
        assert_eq!(s.stroke_color(), Some(Color::BLACK));
        assert_eq!(s.fill_color(), None);
        assert_eq!(s.stroke_width, 1.0);
        assert!(s.is_visible());
        assert!(!s.is_locked());
    }

    #[test]
    fn opacity_is_clamped() {
        let mut s = Style::default();
        s.set_opacity(1.7);
        assert_eq!(s.opacity, 1.0);
        s.set_opacity(-0.2);
        assert_eq!(s.opacity, 0.0);
        s.set_opacity(f32::NAN);
        assert_eq!(s.opacity, 1.0);
    }

    #[test]
    fn table_ids_are_one_based() {
        let id = GradientId::from_index(0).unwrap();
        assert_eq!(id.get(), 1);
        assert_eq!(id.index(), 0);
        assert!(PatternId::from_raw(0).is_none());
        assert!(PatternId::from_index(u16::MAX as usize).is_none());
        assert_eq!(id.to_string(), "gradient:1");
    }
}
