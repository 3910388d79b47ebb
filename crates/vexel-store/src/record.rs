//! Compact per-type records and the struct-of-arrays table that holds them.
//!
//! Geometry, style blocks, and owning handles live in parallel columns so
//! that scans over one concern never pull the others into cache. Variable
//! length data is kept in shared arenas on the store and referenced here by
//! [`Span`].

use std::mem::size_of;

use vexel_types::{Handle, LineStyle, ObjectType, Point, Style, TextAlign, VerticalAlign};

use crate::error::{StoreError, StoreResult};

/// Slots addressable by a `u32` slot index.
const MAX_SLOTS: u64 = 1 << 32;

/// Where a handle's record lives: its type table and slot within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Locator {
    pub kind: ObjectType,
    pub slot: u32,
}

/// Range into one of the store's arenas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Span {
    pub offset: u32,
    pub len: u32,
}

impl Span {
    pub fn range(self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }

    /// Span covering `len` items appended at `offset`.
    pub fn new(offset: usize, len: usize) -> StoreResult<Self> {
        let offset = u32::try_from(offset)
            .map_err(|_| StoreError::CapacityExceeded("arena offset exceeds u32".into()))?;
        let len = u32::try_from(len)
            .map_err(|_| StoreError::CapacityExceeded("arena span exceeds u32".into()))?;
        Ok(Self { offset, len })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LineRecord {
    pub start: Point,
    pub end: Point,
    pub line_style: LineStyle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CircleRecord {
    pub center: Point,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EllipseRecord {
    pub center: Point,
    pub rx: f32,
    pub ry: f32,
    pub rotation: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RectRecord {
    pub top_left: Point,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ArcRecord {
    pub center: Point,
    pub radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PolygonRecord {
    pub points: Span,
    pub closed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PolylineRecord {
    pub points: Span,
    pub line_style: LineStyle,
}

pub(crate) const TEXT_BOLD: u8 = 1 << 0;
pub(crate) const TEXT_ITALIC: u8 = 1 << 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TextRecord {
    pub position: Point,
    pub font_size: f32,
    pub content: Span,
    pub font: u16,
    pub weight_style: u8,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PathRecord {
    pub commands: Span,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct GroupRecord {
    pub children: Vec<Handle>,
}

/// Dense record array for one primitive type.
#[derive(Debug)]
pub(crate) struct Table<G> {
    pub geom: Vec<G>,
    pub style: Vec<Style>,
    pub handle: Vec<Handle>,
    pub alive: Vec<bool>,
    live: usize,
}

impl<G> Default for Table<G> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<G> Table<G> {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            geom: Vec::with_capacity(n),
            style: Vec::with_capacity(n),
            handle: Vec::with_capacity(n),
            alive: Vec::with_capacity(n),
            live: 0,
        }
    }

    /// Append a record and return its slot.
    pub fn push(&mut self, handle: Handle, geom: G, style: Style) -> StoreResult<u32> {
        let slot = u32::try_from(self.geom.len())
            .map_err(|_| StoreError::CapacityExceeded("record table exceeds u32 slots".into()))?;
        self.geom.push(geom);
        self.style.push(style);
        self.handle.push(handle);
        self.alive.push(true);
        self.live += 1;
        Ok(slot)
    }

    /// Reserve room for `additional` more records, failing instead of
    /// aborting when the table cannot hold them.
    pub fn try_reserve(&mut self, additional: usize) -> StoreResult<()> {
        let fits = u64::try_from(additional)
            .ok()
            .and_then(|n| n.checked_add(self.geom.len() as u64))
            .is_some_and(|total| total <= MAX_SLOTS);
        if !fits {
            return Err(StoreError::CapacityExceeded(format!(
                "{additional} more records exceed u32 slots"
            )));
        }
        let oom = |e: std::collections::TryReserveError| StoreError::CapacityExceeded(e.to_string());
        self.geom.try_reserve(additional).map_err(oom)?;
        self.style.try_reserve(additional).map_err(oom)?;
        self.handle.try_reserve(additional).map_err(oom)?;
        self.alive.try_reserve(additional).map_err(oom)
    }

    /// Tombstone a slot. The record stays in place and is skipped by scans.
    pub fn kill(&mut self, slot: u32) {
        let slot = slot as usize;
        if self.alive[slot] {
            self.alive[slot] = false;
            self.live -= 1;
        }
    }

    pub fn live_len(&self) -> usize {
        self.live
    }

    /// Live `(handle, geometry, style)` triples in slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = (Handle, &G, &Style)> + '_ {
        (0..self.geom.len())
            .filter(|&i| self.alive[i])
            .map(|i| (self.handle[i], &self.geom[i], &self.style[i]))
    }

    /// Bytes held by the fixed-width columns.
    pub fn bytes(&self) -> usize {
        self.geom.len() * (size_of::<G>() + size_of::<Style>() + size_of::<Handle>() + 1)
    }
}

/// Type-erased view of a table, used wherever only the shared columns
/// matter and the geometry type is irrelevant.
pub(crate) trait Column {
    fn style(&self, slot: u32) -> &Style;
    fn style_mut(&mut self, slot: u32) -> &mut Style;
    fn kill(&mut self, slot: u32);
    fn try_reserve(&mut self, additional: usize) -> StoreResult<()>;
    fn live_len(&self) -> usize;
    fn bytes(&self) -> usize;
}

impl<G> Column for Table<G> {
    fn style(&self, slot: u32) -> &Style {
        &self.style[slot as usize]
    }

    fn style_mut(&mut self, slot: u32) -> &mut Style {
        &mut self.style[slot as usize]
    }

    fn kill(&mut self, slot: u32) {
        Table::kill(self, slot);
    }

    fn try_reserve(&mut self, additional: usize) -> StoreResult<()> {
        Table::try_reserve(self, additional)
    }

    fn live_len(&self) -> usize {
        Table::live_len(self)
    }

    fn bytes(&self) -> usize {
        Table::bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u64) -> Handle {
        Handle::from_raw(n).unwrap()
    }

    #[test]
    fn records_stay_compact() {
        assert!(size_of::<CircleRecord>() <= 12);
        assert!(size_of::<LineRecord>() <= 20);
        assert!(size_of::<TextRecord>() <= 28);
        assert_eq!(size_of::<Option<Locator>>(), 8);
    }

    #[test]
    fn kill_skips_slot_in_scans() {
        let mut t: Table<u8> = Table::default();
        t.push(h(1), 10, Style::default()).unwrap();
        t.push(h(2), 20, Style::default()).unwrap();
        t.push(h(3), 30, Style::default()).unwrap();
        t.kill(1);
        t.kill(1);
        assert_eq!(t.live_len(), 2);
        let live: Vec<_> = t.iter_live().map(|(h, g, _)| (h.get(), *g)).collect();
        assert_eq!(live, vec![(1, 10), (3, 30)]);
    }

    #[test]
    fn reserve_past_slot_space_fails_cleanly() {
        let mut t: Table<u8> = Table::default();
        t.push(h(1), 10, Style::default()).unwrap();
        assert!(matches!(
            t.try_reserve(usize::MAX),
            Err(StoreError::CapacityExceeded(_))
        ));
        t.try_reserve(16).unwrap();
        assert!(t.geom.capacity() >= 17);
        assert_eq!(t.live_len(), 1);
    }
}
