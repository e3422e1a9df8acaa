use crate::error::{MeterError, MeterResult};
use std::fmt;
use std::str::FromStr;

/// OBIS (Object Identification System) code tagging a measured quantity
///
/// OBIS codes are 6-byte identifiers. On the wire they travel as a 6-byte
/// octet string; in reports and lookups they are rendered as six
/// dot-separated decimal values, e.g. `1.0.32.7.0.255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObisCode {
    bytes: [u8; 6],
}

impl ObisCode {
    /// Length of an OBIS code on the wire
    pub const LENGTH: usize = 6;

    /// Create a new OBIS code from its six value groups
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            bytes: [a, b, c, d, e, f],
        }
    }

    /// Create an OBIS code from the raw octet string carried in a PDU
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not exactly 6 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> MeterResult<Self> {
        let bytes: [u8; 6] = bytes.try_into().map_err(|_| {
            MeterError::InvalidData(format!(
                "OBIS code must be {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse an OBIS code from string format
    ///
    /// Supports formats like:
    /// - "1.0.32.7.0.255"
    /// - "1-0:32.7.0*255"
    /// - "1-0:32.7.0" (F defaults to 255)
    pub fn from_string(s: &str) -> MeterResult<Self> {
        if let Ok(code) = Self::parse_dot_format(s) {
            return Ok(code);
        }

        if let Ok(code) = Self::parse_extended_format(s) {
            return Ok(code);
        }

        Err(MeterError::InvalidData(format!("Invalid OBIS code format: {}", s)))
    }

    fn parse_dot_format(s: &str) -> MeterResult<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 6 {
            return Err(MeterError::InvalidData("Expected 6 dot-separated values".to_string()));
        }

        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            *slot = parse_group(part)?;
        }
        Ok(Self { bytes })
    }

    fn parse_extended_format(s: &str) -> MeterResult<Self> {
        let (medium, rest) = s
            .split_once(':')
            .ok_or_else(|| MeterError::InvalidData("Missing ':' separator".to_string()))?;
        let (a, b) = medium
            .split_once('-')
            .ok_or_else(|| MeterError::InvalidData("Missing '-' separator".to_string()))?;
        let (cde, f) = match rest.split_once('*') {
            Some((cde, f)) => (cde, parse_group(f)?),
            None => (rest, 255),
        };

        let cde: Vec<&str> = cde.split('.').collect();
        if cde.len() != 3 {
            return Err(MeterError::InvalidData("Expected C.D.E value groups".to_string()));
        }

        Ok(Self::new(
            parse_group(a)?,
            parse_group(b)?,
            parse_group(cde[0])?,
            parse_group(cde[1])?,
            parse_group(cde[2])?,
            f,
        ))
    }

    /// Get the OBIS code as a byte array
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }
}

fn parse_group(part: &str) -> MeterResult<u8> {
    part.trim()
        .parse::<u8>()
        .map_err(|_| MeterError::InvalidData(format!("Invalid byte value: {}", part)))
}

impl FromStr for ObisCode {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl fmt::Display for ObisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.bytes[0], self.bytes[1], self.bytes[2],
            self.bytes[3], self.bytes[4], self.bytes[5]
        )
    }
}
