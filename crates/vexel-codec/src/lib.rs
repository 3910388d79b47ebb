//! # vexel-codec
//!
//! Persistence for Vexel drawings: a compact binary format for saving and
//! loading, and the interchange JSON document for exchange with other
//! tools.
//!
//! # Key Types
//!
//! - [`BinaryWriter`] / [`BinaryReader`] -- the `VXDR` binary format
//! - [`DrawingDoc`] -- serde model of the interchange document
//! - [`CodecConfig`] -- decode limits and output options
//!
//! # Design Rules
//!
//! 1. Loading builds a new drawing; a failed load changes nothing.
//! 2. Binary files restore handles exactly, including the next handle to
//!    issue. JSON import assigns fresh handles.
//! 3. Every count and string length read from disk is checked against
//!    [`CodecConfig`] before memory is reserved for it.

pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod json;
pub mod reader;
pub mod writer;

use std::path::Path;

use vexel_drawing::Drawing;

pub use config::CodecConfig;
pub use document::DrawingDoc;
pub use error::{CodecError, CodecResult};
pub use json::{from_document, from_json, load_json, save_json, to_document, to_json};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Encode `drawing` in the binary format.
pub fn to_bytes(drawing: &Drawing) -> CodecResult<Vec<u8>> {
    BinaryWriter::new(drawing).finish_to_bytes()
}

/// Decode a binary drawing with default limits.
pub fn from_bytes(data: &[u8]) -> CodecResult<Drawing> {
    BinaryReader::new(&CodecConfig::default()).from_bytes(data)
}

/// Save `drawing` to `path` in the binary format, returning the byte count.
pub fn save_binary(drawing: &Drawing, path: &Path) -> CodecResult<usize> {
    let written = BinaryWriter::new(drawing).finish(path)?;
    tracing::debug!(path = %path.display(), bytes = written, "drawing saved");
    Ok(written)
}

pub fn load_binary(path: &Path, config: &CodecConfig) -> CodecResult<Drawing> {
    BinaryReader::new(config).open(path)
}

#[cfg(test)]
mod tests {
    use vexel_types::{Circle, LayerId, ObjectType, Point};

    use super::*;

    #[test]
    fn binary_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.vxd");

        let mut d = Drawing::new(800.0, 600.0).unwrap();
        let ids = d
            .create_grid(
                ObjectType::Circle,
                3,
                4,
                10.0,
                10.0,
                Point::new(0.0, 0.0),
                LayerId::DEFAULT,
            )
            .unwrap();
        assert_eq!(ids.len(), 12);

        let written = save_binary(&d, &path).unwrap();
        assert_eq!(written as u64, std::fs::metadata(&path).unwrap().len());

        let back = load_binary(&path, &CodecConfig::default()).unwrap();
        assert_eq!(back.total_objects(), 12);
        assert!(back
            .get_bounding_box()
            .approx_eq(&d.get_bounding_box(), 0.0));
    }

    #[test]
    fn binary_and_json_agree() {
        let mut d = Drawing::new(100.0, 100.0).unwrap();
        let c = d
            .add_circle(
                Circle {
                    center: Point::new(100.0, 100.0),
                    radius: 50.0,
                },
                LayerId::DEFAULT,
            )
            .unwrap();
        d.translate(&[c], 10.0, 20.0).unwrap();

        let from_bin = from_bytes(&to_bytes(&d).unwrap()).unwrap();
        let from_doc = from_json(&to_json(&d, &CodecConfig::compact()).unwrap()).unwrap();
        for drawing in [&from_bin, &from_doc] {
            let bbox = drawing.get_bounding_box();
            assert!((bbox.min_x - 60.0).abs() < 1e-4);
            assert!((bbox.min_y - 70.0).abs() < 1e-4);
            assert!((bbox.max_x - 160.0).abs() < 1e-4);
            assert!((bbox.max_y - 170.0).abs() < 1e-4);
        }
    }
}
