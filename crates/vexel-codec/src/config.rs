use serde::{Deserialize, Serialize};

/// Limits and options for encoding and decoding.
///
/// Decode limits bound the memory an untrusted file can make the reader
/// allocate before its content is validated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Largest record count accepted for any one section or list.
    pub max_records: u32,
    /// Largest next-handle value accepted. The store indexes objects by
    /// handle, so this bounds its directory size.
    pub max_handle: u64,
    /// Longest string accepted, in bytes.
    pub max_string_len: u32,
    /// Indent JSON output.
    pub pretty_json: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_records: 1 << 26,
            max_handle: 1 << 26,
            max_string_len: 1 << 24,
            pretty_json: true,
        }
    }
}

impl CodecConfig {
    /// Compact JSON output, default limits.
    pub fn compact() -> Self {
        Self {
            pretty_json: false,
            ..Default::default()
        }
    }
}
