use std::path::Path;

use tracing::debug;
use vexel_drawing::{Drawing, DrawingConfig, Layer};
use vexel_store::ObjectStore;
use vexel_types::{
    Arc, Circle, Color, Ellipse, Gradient, GradientId, GradientStop, Group, Handle, LayerId,
    Line, LineStyle, ObjectFlags, ObjectType, PathCommand, PatternId, Point, Polygon, Polyline,
    Rectangle, Shape, Style, Text, TextAlign, VerticalAlign,
};

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::format::{
    HEADER_LEN, MAGIC, PRIMITIVE_SECTIONS, STYLE_LEN, TEXT_BOLD, TEXT_ITALIC, VERSION,
};

/// Bounds-checked big-endian cursor over an encoded drawing.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    config: &'a CodecConfig,
}

impl<'a> Cursor<'a> {
    fn corrupt(&self, reason: impl Into<String>) -> CodecError {
        CodecError::Corrupt {
            offset: self.pos as u64,
            reason: reason.into(),
        }
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.corrupt(format!("needs {n} more bytes, data ends")))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn bool(&mut self) -> CodecResult<bool> {
        Ok(self.u8()? != 0)
    }

    fn u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn f32(&mut self) -> CodecResult<f32> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    fn f64(&mut self) -> CodecResult<f64> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    fn point(&mut self) -> CodecResult<Point> {
        Ok(Point::new(self.f32()?, self.f32()?))
    }

    fn color(&mut self) -> CodecResult<Color> {
        Ok(Color::from_rgba32(self.u32()?))
    }

    /// A record count, checked against the configured limit.
    fn count(&mut self, what: &str) -> CodecResult<usize> {
        let n = self.u32()?;
        if n > self.config.max_records {
            return Err(self.corrupt(format!(
                "{what} count {n} exceeds limit {}",
                self.config.max_records
            )));
        }
        Ok(n as usize)
    }

    /// Capacity to reserve for `n` items of at least `min_size` bytes.
    fn capacity(&self, n: usize, min_size: usize) -> usize {
        n.min((self.data.len() - self.pos) / min_size.max(1))
    }

    fn string(&mut self) -> CodecResult<String> {
        let len = self.u32()?;
        if len > self.config.max_string_len {
            return Err(self.corrupt(format!(
                "string length {len} exceeds limit {}",
                self.config.max_string_len
            )));
        }
        let start = self.pos;
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::Corrupt {
            offset: start as u64,
            reason: "string is not UTF-8".into(),
        })
    }

    fn handle(&mut self) -> CodecResult<Handle> {
        let raw = self.u64()?;
        Handle::from_raw(raw).ok_or_else(|| self.corrupt("zero handle"))
    }

    fn handles(&mut self, what: &str) -> CodecResult<Vec<Handle>> {
        let n = self.count(what)?;
        let mut out = Vec::with_capacity(self.capacity(n, 8));
        for _ in 0..n {
            out.push(self.handle()?);
        }
        Ok(out)
    }

    fn points(&mut self) -> CodecResult<Vec<Point>> {
        let n = self.count("point")?;
        let mut out = Vec::with_capacity(self.capacity(n, 8));
        for _ in 0..n {
            out.push(self.point()?);
        }
        Ok(out)
    }

    fn style(&mut self) -> CodecResult<Style> {
        let fill = self.color()?;
        let stroke = self.color()?;
        let stroke_width = self.f32()?;
        let opacity = self.f32()?;
        let flags = ObjectFlags::from_bits_truncate(self.u16()?);
        let layer = LayerId(self.u8()?);
        let _reserved = self.u8()?;
        let gradient = GradientId::from_raw(self.u16()?);
        let pattern = PatternId::from_raw(self.u16()?);
        Ok(Style {
            fill,
            stroke,
            stroke_width,
            opacity,
            flags,
            layer,
            gradient,
            pattern,
        })
    }

    fn enum_byte<T>(&mut self, what: &str, decode: impl Fn(u8) -> Option<T>) -> CodecResult<T> {
        let v = self.u8()?;
        decode(v).ok_or_else(|| self.corrupt(format!("unknown {what} {v}")))
    }

    fn shape(&mut self, kind: ObjectType) -> CodecResult<Shape> {
        Ok(match kind {
            ObjectType::Line => Shape::Line(Line {
                start: self.point()?,
                end: self.point()?,
                line_style: self.enum_byte("line style", LineStyle::from_u8)?,
            }),
            ObjectType::Circle => Shape::Circle(Circle {
                center: self.point()?,
                radius: self.f32()?,
            }),
            ObjectType::Ellipse => Shape::Ellipse(Ellipse {
                center: self.point()?,
                rx: self.f32()?,
                ry: self.f32()?,
                rotation: self.f32()?,
            }),
            ObjectType::Rectangle => Shape::Rectangle(Rectangle {
                top_left: self.point()?,
                width: self.f32()?,
                height: self.f32()?,
                corner_radius: self.f32()?,
            }),
            ObjectType::Arc => Shape::Arc(Arc {
                center: self.point()?,
                radius: self.f32()?,
                start_angle: self.f32()?,
                end_angle: self.f32()?,
            }),
            ObjectType::Polygon => {
                let closed = self.bool()?;
                Shape::Polygon(Polygon {
                    points: self.points()?,
                    closed,
                })
            }
            ObjectType::Polyline => {
                let line_style = self.enum_byte("line style", LineStyle::from_u8)?;
                Shape::Polyline(Polyline {
                    points: self.points()?,
                    line_style,
                })
            }
            ObjectType::Text => {
                let position = self.point()?;
                let font_size = self.f32()?;
                let align = self.enum_byte("text alignment", TextAlign::from_u8)?;
                let vertical_align =
                    self.enum_byte("vertical alignment", VerticalAlign::from_u8)?;
                let bits = self.u8()?;
                let font_family = self.string()?;
                let content = self.string()?;
                Shape::Text(Text {
                    position,
                    content,
                    font_family,
                    font_size,
                    bold: bits & TEXT_BOLD != 0,
                    italic: bits & TEXT_ITALIC != 0,
                    align,
                    vertical_align,
                })
            }
            ObjectType::Path => {
                let n = self.count("path command")?;
                let mut commands = Vec::with_capacity(self.capacity(n, 1));
                for _ in 0..n {
                    let letter = char::from(self.u8()?);
                    let arity = PathCommand::arity(letter)
                        .ok_or_else(|| self.corrupt(format!("unknown path verb {letter:?}")))?;
                    let mut params = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        params.push(self.f32()?);
                    }
                    commands.push(PathCommand::from_letter_params(letter, &params)?);
                }
                Shape::Path(vexel_types::Path { commands })
            }
            ObjectType::Group => Shape::Group(Group {
                children: self.handles("group child")?,
            }),
        })
    }

    fn gradient(&mut self) -> CodecResult<Gradient> {
        let tag = self.u8()?;
        let mut gradient = match tag {
            0 => Gradient::linear(Vec::new(), self.f32()?),
            1 => {
                let center = self.point()?;
                Gradient::radial(Vec::new(), center, self.f32()?)
            }
            other => return Err(self.corrupt(format!("unknown gradient kind {other}"))),
        };
        let n = self.count("gradient stop")?;
        gradient.stops.reserve(self.capacity(n, 8));
        for _ in 0..n {
            let offset = self.f32()?;
            gradient.stops.push(GradientStop::new(offset, self.color()?));
        }
        Ok(gradient)
    }
}

/// One decoded record, not yet admitted to a store.
struct Record {
    handle: Handle,
    style: Style,
    shape: Shape,
}

/// Decodes the binary format into a new [`Drawing`].
///
/// The whole input is parsed before anything is built, and the result is a
/// fresh drawing, so a failed load has no side effects.
pub struct BinaryReader<'a> {
    config: &'a CodecConfig,
}

impl<'a> BinaryReader<'a> {
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config }
    }

    /// Read and decode a file.
    pub fn open(&self, path: &Path) -> CodecResult<Drawing> {
        let data = std::fs::read(path)?;
        self.from_bytes(&data)
    }

    pub fn from_bytes(&self, data: &[u8]) -> CodecResult<Drawing> {
        let magic = &data[..data.len().min(4)];
        if magic.len() == 4 && magic != MAGIC {
            return Err(CodecError::InvalidMagic {
                expected: hex::encode(MAGIC),
                actual: hex::encode(magic),
            });
        }
        if data.len() < HEADER_LEN {
            return Err(CodecError::Corrupt {
                offset: 0,
                reason: "data too short for header".into(),
            });
        }
        let mut cur = Cursor {
            data,
            pos: 4,
            config: self.config,
        };
        let version = cur.u32()?;
        if version != VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let width = cur.f64()?;
        let height = cur.f64()?;
        let background = cur.color()?;
        let next_handle = cur.handle()?;
        if next_handle.get() > self.config.max_handle {
            return Err(CodecError::Corrupt {
                offset: 28,
                reason: format!(
                    "next handle {next_handle} exceeds limit {}",
                    self.config.max_handle
                ),
            });
        }
        let name = cur.string()?;

        let layer_count = cur.count("layer")?;
        let mut layers = Vec::with_capacity(cur.capacity(layer_count, 14));
        for _ in 0..layer_count {
            let mut layer = Layer::new(LayerId(cur.u8()?), cur.string()?);
            layer.visible = cur.bool()?;
            layer.locked = cur.bool()?;
            layer.opacity = cur.f32()?;
            layer.z_index = cur.i32()?;
            layer.objects = cur.handles("layer object")?;
            layers.push(layer);
        }

        let mut records = Vec::new();
        for kind in PRIMITIVE_SECTIONS.into_iter().chain([ObjectType::Group]) {
            let n = cur.count(kind.name())?;
            records.reserve(cur.capacity(n, 8 + STYLE_LEN));
            for _ in 0..n {
                let at = cur.pos as u64;
                let handle = cur.handle()?;
                if handle >= next_handle {
                    return Err(CodecError::Corrupt {
                        offset: at,
                        reason: format!("{handle} is not below next handle {next_handle}"),
                    });
                }
                let style = cur.style()?;
                let shape = cur.shape(kind)?;
                records.push(Record {
                    handle,
                    style,
                    shape,
                });
            }
        }

        let n = cur.count("gradient")?;
        let mut gradients = Vec::with_capacity(cur.capacity(n, 9));
        for _ in 0..n {
            gradients.push(cur.gradient()?);
        }

        let n = cur.count("pattern")?;
        let mut patterns = Vec::with_capacity(cur.capacity(n, 4));
        for _ in 0..n {
            patterns.push(cur.string()?);
        }

        let n = cur.count("name")?;
        let mut names = Vec::with_capacity(cur.capacity(n, 12));
        for _ in 0..n {
            names.push((cur.handle()?, cur.string()?));
        }

        let n = cur.count("metadata")?;
        let mut metadata = Vec::new();
        for _ in 0..n {
            let handle = cur.handle()?;
            let entries = cur.count("metadata entry")?;
            for _ in 0..entries {
                metadata.push((handle, cur.string()?, cur.string()?));
            }
        }

        if cur.pos != data.len() {
            return Err(cur.corrupt(format!("{} trailing bytes", data.len() - cur.pos)));
        }

        let mut store = ObjectStore::new();
        for (i, gradient) in gradients.into_iter().enumerate() {
            let id = store.add_gradient(gradient)?;
            if id.index() != i {
                return Err(CodecError::Corrupt {
                    offset: 0,
                    reason: format!("gradient {i} was assigned {id}"),
                });
            }
        }
        for pattern in &patterns {
            store.add_pattern(pattern)?;
        }
        let object_count = records.len();
        for record in records {
            store.insert_with_handle(record.handle, record.shape, record.style)?;
        }
        for (handle, name) in &names {
            store.set_name(&[*handle], name)?;
        }
        for (handle, key, value) in &metadata {
            store.set_metadata(&[*handle], key, value)?;
        }
        store.resume_handles_at(next_handle);

        let config = DrawingConfig {
            name,
            width,
            height,
            background,
            ..DrawingConfig::default()
        };
        let drawing = Drawing::from_parts(config, store, layers)?;
        debug!(
            bytes = data.len(),
            objects = object_count,
            "drawing decoded"
        );
        Ok(drawing)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use vexel_store::StoreError;
    use vexel_types::Path as PathShape;

    use super::*;
    use crate::writer::BinaryWriter;

    fn sample() -> Drawing {
        let mut d = Drawing::new(320.0, 200.0).unwrap();
        d.rename("Roundtrip");
        d.set_background(Color::rgba(10, 20, 30, 128));
        let top = d.add_layer("Top").unwrap();
        d.set_layer_z_index(top, 3).unwrap();
        d.set_layer_opacity(top, 0.5).unwrap();

        let line = d
            .add_line(
                Line {
                    start: Point::new(0.0, 0.0),
                    end: Point::new(10.0, 4.0),
                    line_style: LineStyle::DashDot,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        let ellipse = d
            .add_ellipse(
                Ellipse {
                    center: Point::new(50.0, 50.0),
                    rx: 4.0,
                    ry: 2.0,
                    rotation: 0.3,
                },
                top,
            )
            .unwrap();
        let polygon = d
            .add_polygon(
                Polygon {
                    points: vec![
                        Point::new(0.0, 0.0),
                        Point::new(5.0, 0.0),
                        Point::new(5.0, 5.0),
                    ],
                    closed: false,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        let polyline = d
            .add_polyline(
                Polyline {
                    points: vec![Point::new(1.0, 1.0), Point::new(2.0, 3.0)],
                    line_style: LineStyle::Dotted,
                },
                top,
            )
            .unwrap();
        let mut label = Text::new(Point::new(5.0, 5.0), "héllo", 14.0);
        label.bold = true;
        label.align = TextAlign::Right;
        let text = d.add_text(label, top).unwrap();
        d.add_path_data("M 0 0 C 1 1 2 2 3 3 Z", LayerId::DEFAULT)
            .unwrap();
        let dot = d
            .add_circle(
                Circle {
                    center: Point::new(20.0, 20.0),
                    radius: 2.0,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        let doomed = d
            .add_circle(
                Circle {
                    center: Point::new(0.0, 0.0),
                    radius: 1.0,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        let inner = d.add_group(&[dot, line], LayerId::DEFAULT).unwrap();
        let outer = d.add_group(&[inner, polygon], top).unwrap();
        d.remove_object(doomed).unwrap();

        let gradient = d
            .add_linear_gradient(
                vec![
                    GradientStop::new(0.0, Color::BLACK),
                    GradientStop::new(1.0, Color::WHITE),
                ],
                0.5,
            )
            .unwrap();
        d.set_gradient(&[ellipse], Some(gradient)).unwrap();
        let pattern = d.add_pattern("hatch").unwrap();
        d.set_pattern(&[text], Some(pattern)).unwrap();
        d.set_object_name(&[dot], "dot").unwrap();
        d.set_metadata(&[outer], "role", "frame").unwrap();
        d.set_locked(&[polyline], true).unwrap();
        d.set_fill_color(&[polygon], Color::rgb(0, 128, 0)).unwrap();
        d
    }

    fn encode(d: &Drawing) -> Vec<u8> {
        BinaryWriter::new(d).finish_to_bytes().unwrap()
    }

    fn decode(bytes: &[u8]) -> CodecResult<Drawing> {
        BinaryReader::new(&CodecConfig::default()).from_bytes(bytes)
    }

    // ------------------------------------------------------------------
    // Roundtrip
    // ------------------------------------------------------------------

    #[test]
    fn roundtrip_preserves_every_record() {
        let d = sample();
        let back = decode(&encode(&d)).unwrap();

        assert_eq!(back.name(), "Roundtrip");
        assert_eq!(back.width(), 320.0);
        assert_eq!(back.height(), 200.0);
        assert_eq!(back.background(), Color::rgba(10, 20, 30, 128));
        assert_eq!(back.layers(), d.layers());
        assert_eq!(back.total_objects(), d.total_objects());

        let (a, b) = (d.store(), back.store());
        let mut handles: Vec<Handle> = a.handles().collect();
        handles.sort();
        let mut restored: Vec<Handle> = b.handles().collect();
        restored.sort();
        assert_eq!(handles, restored);
        for h in handles {
            assert_eq!(a.shape(h).unwrap(), b.shape(h).unwrap(), "{h}");
            assert_eq!(a.style(h).unwrap(), b.style(h).unwrap(), "{h}");
            assert_eq!(a.name(h), b.name(h));
            assert_eq!(a.all_metadata(h), b.all_metadata(h));
        }
        assert_eq!(a.gradients(), b.gradients());
        assert_eq!(a.patterns(), b.patterns());
        assert_eq!(a.next_handle(), b.next_handle());
    }

    #[test]
    fn deleted_handles_are_not_reissued_after_load() {
        let d = sample();
        let before = d.store().next_handle();
        let mut back = decode(&encode(&d)).unwrap();
        let fresh = back
            .add_circle(
                Circle {
                    center: Point::new(1.0, 1.0),
                    radius: 1.0,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        assert_eq!(fresh, before);
    }

    #[test]
    fn empty_drawing_roundtrips() {
        let d = Drawing::new(10.0, 10.0).unwrap();
        let back = decode(&encode(&d)).unwrap();
        assert_eq!(back.total_objects(), 0);
        assert_eq!(back.layers().len(), 1);
        assert_eq!(back.layers()[0].name, "Default");
    }

    #[test]
    fn path_commands_survive() {
        let mut d = Drawing::new(10.0, 10.0).unwrap();
        let h = d
            .add_path_data("M 1 2 L 3 4 Q 5 6 7 8 A 2 2 0 1 0 9 9 Z", LayerId::DEFAULT)
            .unwrap();
        let back = decode(&encode(&d)).unwrap();
        match (d.store().shape(h).unwrap(), back.store().shape(h).unwrap()) {
            (Shape::Path(PathShape { commands: a }), Shape::Path(PathShape { commands: b })) => {
                assert_eq!(a, b);
                assert!(b.len() >= 5);
                assert!(matches!(b.last(), Some(vexel_types::PathCommand::Close)));
            }
            other => panic!("expected paths, got {other:?}"),
        }
    }

    // ------------------------------------------------------------------
    // Rejection
    // ------------------------------------------------------------------

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encode(&sample());
        bytes[0] = b'X';
        let err = decode(&bytes).unwrap_err();
        match &err {
            CodecError::InvalidMagic { expected, actual } => {
                assert_eq!(expected, "56584452");
                assert_eq!(actual, "58584452");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_format_error());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = encode(&sample());
        bytes[4..8].copy_from_slice(&7u32.to_be_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            CodecError::UnsupportedVersion(7)
        ));
    }

    #[test]
    fn truncated_and_padded_data_is_corrupt() {
        let bytes = encode(&sample());
        for cut in [2, HEADER_LEN - 1, HEADER_LEN + 3, bytes.len() / 2, bytes.len() - 1] {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, CodecError::Corrupt { .. }), "cut at {cut}: {err}");
        }

        let mut padded = bytes.clone();
        padded.push(0);
        assert!(matches!(
            decode(&padded).unwrap_err(),
            CodecError::Corrupt { .. }
        ));
    }

    #[test]
    fn limits_bound_counts_and_strings() {
        let bytes = encode(&sample());
        let tight = CodecConfig {
            max_records: 0,
            ..CodecConfig::default()
        };
        assert!(matches!(
            BinaryReader::new(&tight).from_bytes(&bytes).unwrap_err(),
            CodecError::Corrupt { .. }
        ));

        let short = CodecConfig {
            max_string_len: 3,
            ..CodecConfig::default()
        };
        assert!(matches!(
            BinaryReader::new(&short).from_bytes(&bytes).unwrap_err(),
            CodecError::Corrupt { .. }
        ));
    }

    #[test]
    fn nan_stroke_width_is_rejected() {
        let mut d = Drawing::new(10.0, 10.0).unwrap();
        let c = d
            .add_circle(
                Circle {
                    center: Point::new(5.0, 5.0),
                    radius: 2.0,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        d.set_stroke_width(&[c], 7.25).unwrap();
        let mut bytes = encode(&d);
        let width = 7.25f32.to_be_bytes();
        let at = bytes
            .windows(4)
            .position(|w| w == width)
            .expect("stroke width is encoded");
        bytes[at..at + 4].copy_from_slice(&f32::NAN.to_be_bytes());

        let err = decode(&bytes).unwrap_err();
        assert!(
            matches!(err, CodecError::Store(StoreError::InvalidGeometry(_))),
            "{err}"
        );
        assert!(err.is_format_error());
    }

    #[test]
    fn zero_next_handle_is_corrupt() {
        let mut bytes = encode(&Drawing::new(10.0, 10.0).unwrap());
        bytes[28..36].copy_from_slice(&0u64.to_be_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            CodecError::Corrupt { offset: 36, .. }
        ));
    }

    #[test]
    fn handles_are_bounded_by_the_header() {
        let d = sample();
        let tight = CodecConfig {
            max_handle: 2,
            ..CodecConfig::default()
        };
        assert!(matches!(
            BinaryReader::new(&tight).from_bytes(&encode(&d)).unwrap_err(),
            CodecError::Corrupt { offset: 28, .. }
        ));

        let mut bytes = encode(&d);
        bytes[28..36].copy_from_slice(&1u64.to_be_bytes());
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            CodecError::Corrupt { .. }
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BinaryReader::new(&CodecConfig::default())
            .open(&dir.path().join("absent.vxd"))
            .unwrap_err();
        assert!(err.is_io_error());
        assert!(!err.is_format_error());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn corrupted_bytes_never_panic(index in any::<prop::sample::Index>(), byte in any::<u8>()) {
            let mut bytes = encode(&sample());
            let i = index.index(bytes.len());
            bytes[i] = byte;
            let _ = decode(&bytes);
        }
    }
}
