use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Stable identifier for one stored object.
///
/// Handles are issued in strictly increasing order by the object store and
/// are never reused, even after the object they name has been deleted. A
/// stale handle therefore can never alias a newer object.
///
/// The zero value is reserved so that `Option<Handle>` stays eight bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// The first handle a fresh store issues.
    pub const FIRST: Self = match NonZeroU64::new(1) {
        Some(v) => Self(v),
        None => unreachable!(),
    };

    /// Wrap a raw handle value. Returns `None` for zero.
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The raw integer value.
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Zero-based position of this handle in a dense directory.
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// The handle issued immediately after this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed type tag for every primitive the store can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Line,
    Circle,
    Ellipse,
    Rectangle,
    Polygon,
    Polyline,
    Arc,
    Text,
    Path,
    Group,
}

impl ObjectType {
    /// Every type, in declaration order.
    pub const ALL: [ObjectType; 10] = [
        Self::Line,
        Self::Circle,
        Self::Ellipse,
        Self::Rectangle,
        Self::Polygon,
        Self::Polyline,
        Self::Arc,
        Self::Text,
        Self::Path,
        Self::Group,
    ];

    /// Lowercase name used as the JSON discriminant.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Rectangle => "rectangle",
            Self::Polygon => "polygon",
            Self::Polyline => "polyline",
            Self::Arc => "arc",
            Self::Text => "text",
            Self::Path => "path",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_handle() {
        assert!(Handle::from_raw(0).is_none());
        assert_eq!(Handle::from_raw(7).unwrap().get(), 7);
    }

    #[test]
    fn first_handle_indexes_slot_zero() {
        assert_eq!(Handle::FIRST.get(), 1);
        assert_eq!(Handle::FIRST.index(), 0);
        assert_eq!(Handle::FIRST.next().get(), 2);
    }

    #[test]
    fn option_handle_is_pointer_sized() {
        assert_eq!(std::mem::size_of::<Option<Handle>>(), 8);
    }

    #[test]
    fn handle_serializes_as_bare_integer() {
        let h = Handle::from_raw(42).unwrap();
        assert_eq!(serde_json::to_string(&h).unwrap(), "42");
    }
}
