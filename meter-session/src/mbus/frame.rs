//! Raw frame pair as received from the meter
//!
//! # Frame Format
//!
//! The readout arrives as two consecutive M-Bus long frames:
//! ```text
//! 0x68 L1 L1 0x68 | C A CI ... payload ... | CS 0x16    (L1 + 6 bytes)
//! 0x68 L2 L2 0x68 | C A CI ... payload ... | CS 0x16    (L2 + 6 bytes)
//! ```
//! Only the start marker of the first frame and the end marker of the
//! second one delimit the pair inside the byte stream.

use crate::error::{MeterError, MeterResult};
use bytes::Bytes;

/// Start marker of an M-Bus long frame
pub const FRAME_START: u8 = 0x68;

/// End marker of an M-Bus long frame
pub const FRAME_END: u8 = 0x16;

/// Total length of the frame pair pushed by the supported meter
pub const DEFAULT_FRAME_LENGTH: usize = 376;

/// Fixed shape of the frame pair on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Total length of both frames
    pub length: usize,
    /// First byte of the pair
    pub start: u8,
    /// Last byte of the pair
    pub end: u8,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            length: DEFAULT_FRAME_LENGTH,
            start: FRAME_START,
            end: FRAME_END,
        }
    }
}

impl FrameLayout {
    /// Create a layout with the standard markers and a custom length
    pub fn with_length(length: usize) -> Self {
        Self {
            length,
            ..Self::default()
        }
    }

    /// Whether a short read plausibly holds the beginning of a frame
    ///
    /// The meter repeats the L field (bytes 1 and 2), which tells a genuine
    /// partial frame apart from line noise. This only holds for the observed
    /// device. Bytes missing from a very short read compare equal to each
    /// other, so a lone start marker also qualifies.
    pub fn looks_like_partial(&self, bytes: &[u8]) -> bool {
        bytes.len() < self.length
            && bytes.first() == Some(&self.start)
            && bytes.get(1) == bytes.get(2)
    }

    /// Check length and markers of a candidate frame
    pub fn validate(&self, bytes: &[u8]) -> MeterResult<()> {
        if bytes.len() != self.length {
            return Err(MeterError::Sync(format!(
                "expected {} bytes, got {}",
                self.length,
                bytes.len()
            )));
        }
        match bytes.first() {
            Some(&first) if first == self.start => {}
            found => {
                return Err(MeterError::Sync(format!(
                    "start byte {} instead of 0x{:02X}",
                    describe(found),
                    self.start
                )));
            }
        }
        match bytes.last() {
            Some(&last) if last == self.end => {}
            found => {
                return Err(MeterError::Sync(format!(
                    "end byte {} instead of 0x{:02X}",
                    describe(found),
                    self.end
                )));
            }
        }
        Ok(())
    }
}

fn describe(byte: Option<&u8>) -> String {
    byte.map_or_else(|| "missing".to_string(), |b| format!("0x{:02X}", b))
}

/// A complete, marker-checked frame pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Bytes,
}

impl RawFrame {
    /// Wrap bytes that pass the layout checks
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Sync` if the length or markers do not match.
    pub fn new(layout: &FrameLayout, bytes: impl Into<Bytes>) -> MeterResult<Self> {
        let bytes = bytes.into();
        layout.validate(&bytes)?;
        Ok(Self { bytes })
    }

    /// Frame content
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the frame is empty (never true for a validated frame)
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[0] = FRAME_START;
        bytes[len - 1] = FRAME_END;
        bytes
    }

    #[test]
    fn test_raw_frame_accepts_valid_pair() {
        let layout = FrameLayout::with_length(32);
        let frame = RawFrame::new(&layout, framed(32)).unwrap();
        assert_eq!(frame.len(), 32);
        assert_eq!(frame.as_bytes()[0], FRAME_START);
    }

    #[test]
    fn test_validate_rejects_wrong_markers_and_length() {
        let layout = FrameLayout::with_length(32);

        let mut bad_start = framed(32);
        bad_start[0] = 0x10;
        assert!(matches!(layout.validate(&bad_start), Err(MeterError::Sync(_))));

        let mut bad_end = framed(32);
        bad_end[31] = 0x00;
        assert!(matches!(layout.validate(&bad_end), Err(MeterError::Sync(_))));

        assert!(matches!(layout.validate(&framed(31)), Err(MeterError::Sync(_))));
        assert!(matches!(layout.validate(&[]), Err(MeterError::Sync(_))));
    }

    #[test]
    fn test_zero_length_layout_rejects_empty_input() {
        let layout = FrameLayout {
            length: 0,
            ..FrameLayout::default()
        };
        let err = layout.validate(&[]).unwrap_err();
        assert!(matches!(err, MeterError::Sync(_)));
        assert!(err.to_string().contains("start byte missing"));
    }

    #[test]
    fn test_looks_like_partial() {
        let layout = FrameLayout::default();
        assert!(layout.looks_like_partial(&[0x68, 0xFA, 0xFA, 0x68, 0x53]));
        assert!(!layout.looks_like_partial(&[0x68, 0xFA, 0xF9, 0x68]));
        assert!(!layout.looks_like_partial(&[0x16, 0xFA, 0xFA]));
        assert!(layout.looks_like_partial(&[0x68]));
        assert!(!layout.looks_like_partial(&[0x68, 0xFA]));
    }
}
