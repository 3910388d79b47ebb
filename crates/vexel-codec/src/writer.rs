use std::collections::HashSet;
use std::path::Path;

use tracing::debug;
use vexel_drawing::Drawing;
use vexel_store::ObjectStore;
use vexel_types::{GradientKind, Handle, ObjectType, Point, Shape, Style};

use crate::error::{CodecError, CodecResult};
use crate::format::{MAGIC, PRIMITIVE_SECTIONS, TEXT_BOLD, TEXT_ITALIC, VERSION};

/// Encodes a whole drawing into the binary format.
pub struct BinaryWriter<'a> {
    drawing: &'a Drawing,
    buf: Vec<u8>,
}

impl<'a> BinaryWriter<'a> {
    pub fn new(drawing: &'a Drawing) -> Self {
        Self {
            drawing,
            buf: Vec::new(),
        }
    }

    /// Write the encoded drawing to `path`, returning the byte count.
    pub fn finish(self, path: &Path) -> CodecResult<usize> {
        let bytes = self.finish_to_bytes()?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }

    /// Encode in memory (no disk I/O).
    pub fn finish_to_bytes(mut self) -> CodecResult<Vec<u8>> {
        let drawing = self.drawing;
        let store = drawing.store();

        // Header
        self.buf.extend_from_slice(MAGIC);
        self.put_u32(VERSION);
        self.put_f64(drawing.width());
        self.put_f64(drawing.height());
        self.put_u32(drawing.background().to_rgba32());
        self.put_u64(store.next_handle().get());
        self.put_str(drawing.name())?;

        self.put_count(drawing.layers().len())?;
        for layer in drawing.layers() {
            self.put_u8(layer.id.0);
            self.put_str(&layer.name)?;
            self.put_u8(u8::from(layer.visible));
            self.put_u8(u8::from(layer.locked));
            self.put_f32(layer.opacity);
            self.put_i32(layer.z_index);
            self.put_handles(&layer.objects)?;
        }

        for kind in PRIMITIVE_SECTIONS {
            let handles = store.handles_of(kind);
            self.put_count(handles.len())?;
            for handle in handles {
                self.put_record_head(store, handle)?;
                let shape = store.shape(handle)?;
                self.put_shape(&shape)?;
            }
        }

        let groups = group_order(store)?;
        self.put_count(groups.len())?;
        for group in groups {
            self.put_record_head(store, group)?;
            self.put_handles(store.children(group)?)?;
        }

        self.put_count(store.gradients().len())?;
        for gradient in store.gradients() {
            self.put_u8(gradient.kind.tag());
            match gradient.kind {
                GradientKind::Linear { angle } => self.put_f32(angle),
                GradientKind::Radial { center, radius } => {
                    self.put_point(center);
                    self.put_f32(radius);
                }
            }
            self.put_count(gradient.stops.len())?;
            for stop in &gradient.stops {
                self.put_f32(stop.offset);
                self.put_u32(stop.color.to_rgba32());
            }
        }

        self.put_count(store.patterns().len())?;
        for pattern in store.patterns() {
            self.put_str(pattern)?;
        }

        let named = store.named();
        self.put_count(named.len())?;
        for (handle, name) in named {
            self.put_u64(handle.get());
            self.put_str(name)?;
        }

        let tagged = store.with_metadata();
        self.put_count(tagged.len())?;
        for (handle, entries) in tagged {
            self.put_u64(handle.get());
            self.put_count(entries.len())?;
            for (key, value) in entries {
                self.put_str(key)?;
                self.put_str(value)?;
            }
        }

        debug!(
            bytes = self.buf.len(),
            objects = store.total_objects(),
            "drawing encoded"
        );
        Ok(self.buf)
    }

    fn put_record_head(&mut self, store: &ObjectStore, handle: Handle) -> CodecResult<()> {
        self.put_u64(handle.get());
        let style = store.style(handle)?;
        self.put_style(&style);
        Ok(())
    }

    fn put_style(&mut self, style: &Style) {
        self.put_u32(style.fill.to_rgba32());
        self.put_u32(style.stroke.to_rgba32());
        self.put_f32(style.stroke_width);
        self.put_f32(style.opacity);
        self.put_u16(style.flags.bits());
        self.put_u8(style.layer.0);
        self.put_u8(0);
        self.put_u16(style.gradient.map_or(0, |g| g.get()));
        self.put_u16(style.pattern.map_or(0, |p| p.get()));
    }

    fn put_shape(&mut self, shape: &Shape) -> CodecResult<()> {
        match shape {
            Shape::Line(l) => {
                self.put_point(l.start);
                self.put_point(l.end);
                self.put_u8(l.line_style as u8);
            }
            Shape::Circle(c) => {
                self.put_point(c.center);
                self.put_f32(c.radius);
            }
            Shape::Ellipse(e) => {
                self.put_point(e.center);
                self.put_f32(e.rx);
                self.put_f32(e.ry);
                self.put_f32(e.rotation);
            }
            Shape::Rectangle(r) => {
                self.put_point(r.top_left);
                self.put_f32(r.width);
                self.put_f32(r.height);
                self.put_f32(r.corner_radius);
            }
            Shape::Arc(a) => {
                self.put_point(a.center);
                self.put_f32(a.radius);
                self.put_f32(a.start_angle);
                self.put_f32(a.end_angle);
            }
            Shape::Polygon(p) => {
                self.put_u8(u8::from(p.closed));
                self.put_points(&p.points)?;
            }
            Shape::Polyline(p) => {
                self.put_u8(p.line_style as u8);
                self.put_points(&p.points)?;
            }
            Shape::Text(t) => {
                self.put_point(t.position);
                self.put_f32(t.font_size);
                self.put_u8(t.align as u8);
                self.put_u8(t.vertical_align as u8);
                let mut bits = 0;
                if t.bold {
                    bits |= TEXT_BOLD;
                }
                if t.italic {
                    bits |= TEXT_ITALIC;
                }
                self.put_u8(bits);
                self.put_str(&t.font_family)?;
                self.put_str(&t.content)?;
            }
            Shape::Path(p) => {
                self.put_count(p.commands.len())?;
                for cmd in &p.commands {
                    // Absolute command letters are ASCII.
                    self.put_u8(cmd.letter() as u8);
                    for v in cmd.params() {
                        self.put_f32(v);
                    }
                }
            }
            Shape::Group(g) => self.put_handles(&g.children)?,
        }
        Ok(())
    }

    fn put_count(&mut self, n: usize) -> CodecResult<()> {
        let n = u32::try_from(n).map_err(|_| CodecError::Corrupt {
            offset: self.buf.len() as u64,
            reason: format!("count {n} does not fit in 32 bits"),
        })?;
        self.put_u32(n);
        Ok(())
    }

    fn put_str(&mut self, s: &str) -> CodecResult<()> {
        self.put_count(s.len())?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn put_handles(&mut self, handles: &[Handle]) -> CodecResult<()> {
        self.put_count(handles.len())?;
        for h in handles {
            self.put_u64(h.get());
        }
        Ok(())
    }

    fn put_points(&mut self, points: &[Point]) -> CodecResult<()> {
        self.put_count(points.len())?;
        for p in points {
            self.put_point(*p);
        }
        Ok(())
    }

    fn put_point(&mut self, p: Point) {
        self.put_f32(p.x);
        self.put_f32(p.y);
    }

    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
}

/// Groups ordered so every nested group precedes the groups containing it.
fn group_order(store: &ObjectStore) -> CodecResult<Vec<Handle>> {
    let mut out = Vec::new();
    let mut done = HashSet::new();
    for root in store.handles_of(ObjectType::Group) {
        let mut stack = vec![(root, false)];
        while let Some((group, expanded)) = stack.pop() {
            if done.contains(&group) {
                continue;
            }
            if expanded {
                done.insert(group);
                out.push(group);
                continue;
            }
            stack.push((group, true));
            for &child in store.children(group)?.iter().rev() {
                if store.get_type(child)? == ObjectType::Group && !done.contains(&child) {
                    stack.push((child, false));
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use vexel_types::{Circle, LayerId};

    use super::*;
    use crate::format::HEADER_LEN;

    #[test]
    fn header_layout() {
        let drawing = Drawing::new(640.0, 480.0).unwrap();
        let bytes = BinaryWriter::new(&drawing).finish_to_bytes().unwrap();
        assert_eq!(&bytes[0..4], b"VXDR");
        assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), 1);
        assert_eq!(f64::from_be_bytes(bytes[8..16].try_into().unwrap()), 640.0);
        assert_eq!(f64::from_be_bytes(bytes[16..24].try_into().unwrap()), 480.0);
        assert_eq!(
            u32::from_be_bytes(bytes[24..28].try_into().unwrap()),
            0xFFFF_FFFF
        );
        assert_eq!(u64::from_be_bytes(bytes[28..36].try_into().unwrap()), 1);
        assert_eq!(HEADER_LEN, 36);
    }

    #[test]
    fn nested_groups_are_written_children_first() {
        let mut drawing = Drawing::new(100.0, 100.0).unwrap();
        let c = drawing
            .add_circle(
                Circle {
                    center: Point::new(1.0, 1.0),
                    radius: 1.0,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        let outer = drawing.add_group(&[], LayerId::DEFAULT).unwrap();
        let inner = drawing.add_group(&[c], LayerId::DEFAULT).unwrap();
        drawing.add_to_group(outer, inner).unwrap();
        assert_eq!(group_order(drawing.store()).unwrap(), vec![inner, outer]);
    }
}
