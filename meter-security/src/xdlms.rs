//! xDLMS security header fields
//!
//! # System Title
//!
//! An 8-byte identifier that uniquely identifies the sending meter. The
//! meter transmits it in clear in every frame.
//!
//! # Frame Counter
//!
//! A 32-bit invocation counter, incremented by the meter for every encrypted
//! frame. Together with the system title it forms the GCM initialization
//! vector, so no two frames are encrypted under the same nonce.

use crate::error::{MeterError, MeterResult};
use std::fmt;

/// System Title of the sending device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SystemTitle {
    value: [u8; 8],
}

impl SystemTitle {
    pub const LENGTH: usize = 8;

    pub fn new(bytes: [u8; 8]) -> Self {
        Self { value: bytes }
    }

    /// Create System Title from slice
    ///
    /// # Errors
    /// Returns error if bytes length is not 8
    pub fn from_slice(bytes: &[u8]) -> MeterResult<Self> {
        let value: [u8; 8] = bytes.try_into().map_err(|_| {
            MeterError::InvalidData(format!(
                "System Title must be {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { value })
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.value
    }
}

impl fmt::Display for SystemTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.value))
    }
}

/// Frame counter (invocation counter) of an encrypted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameCounter(u32);

impl FrameCounter {
    pub const LENGTH: usize = 4;

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Parse the big-endian wire form
    pub fn from_slice(bytes: &[u8]) -> MeterResult<Self> {
        let value: [u8; 4] = bytes.try_into().map_err(|_| {
            MeterError::InvalidData(format!(
                "Frame counter must be {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(u32::from_be_bytes(value)))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// 12-byte GCM initialization vector: system title followed by frame counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; 12]);

impl Nonce {
    pub const LENGTH: usize = 12;

    pub fn new(system_title: &SystemTitle, frame_counter: FrameCounter) -> Self {
        let mut value = [0u8; 12];
        value[..SystemTitle::LENGTH].copy_from_slice(system_title.as_bytes());
        value[SystemTitle::LENGTH..].copy_from_slice(&frame_counter.to_bytes());
        Self(value)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn system_title(&self) -> SystemTitle {
        let mut title = [0u8; 8];
        title.copy_from_slice(&self.0[..SystemTitle::LENGTH]);
        SystemTitle::new(title)
    }

    pub fn frame_counter(&self) -> FrameCounter {
        let mut counter = [0u8; 4];
        counter.copy_from_slice(&self.0[SystemTitle::LENGTH..]);
        FrameCounter::new(u32::from_be_bytes(counter))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_concatenates_title_and_counter() {
        let title = SystemTitle::new([0x4B, 0x46, 0x4D, 0x10, 0x20, 0x00, 0x00, 0x01]);
        let nonce = Nonce::new(&title, FrameCounter::new(0x0000_0A1B));

        assert_eq!(
            nonce.as_bytes(),
            &[0x4B, 0x46, 0x4D, 0x10, 0x20, 0x00, 0x00, 0x01, 0x00, 0x00, 0x0A, 0x1B]
        );
        assert_eq!(nonce.system_title(), title);
        assert_eq!(nonce.frame_counter().value(), 0x0A1B);
        assert_eq!(nonce.to_string(), "4B464D102000000100000A1B");
    }

    #[test]
    fn test_from_slice_checks_length() {
        assert!(SystemTitle::from_slice(&[0u8; 7]).is_err());
        assert_eq!(FrameCounter::from_slice(&[0, 0, 1, 0]).unwrap().value(), 256);
        assert!(FrameCounter::from_slice(&[0, 1]).is_err());
    }
}
