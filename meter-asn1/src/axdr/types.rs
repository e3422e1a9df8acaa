//! A-XDR types for DLMS/COSEM

use crate::error::{MeterError, MeterResult};

/// A-XDR tag values for different data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxdrTag {
    Null = 0x00,
    Array = 0x01,
    Structure = 0x02,
    Boolean = 0x03,
    BitString = 0x04,
    Integer32 = 0x05,
    Unsigned32 = 0x06,
    OctetString = 0x09,
    VisibleString = 0x0A,
    Utf8String = 0x0C,
    Bcd = 0x0D,
    Integer8 = 0x0F,
    Integer16 = 0x10,
    Unsigned8 = 0x11,
    Unsigned16 = 0x12,
    CompactArray = 0x13,
    Integer64 = 0x14,
    Unsigned64 = 0x15,
    Enumerate = 0x16,
    Float32 = 0x17,
    Float64 = 0x18,
    DateTime = 0x19,
    Date = 0x1A,
    Time = 0x1B,
    DontCare = 0xFF,
}

impl AxdrTag {
    /// Get tag from u8 value
    pub fn from_u8(value: u8) -> MeterResult<Self> {
        match value {
            0x00 => Ok(AxdrTag::Null),
            0x01 => Ok(AxdrTag::Array),
            0x02 => Ok(AxdrTag::Structure),
            0x03 => Ok(AxdrTag::Boolean),
            0x04 => Ok(AxdrTag::BitString),
            0x05 => Ok(AxdrTag::Integer32),
            0x06 => Ok(AxdrTag::Unsigned32),
            0x09 => Ok(AxdrTag::OctetString),
            0x0A => Ok(AxdrTag::VisibleString),
            0x0C => Ok(AxdrTag::Utf8String),
            0x0D => Ok(AxdrTag::Bcd),
            0x0F => Ok(AxdrTag::Integer8),
            0x10 => Ok(AxdrTag::Integer16),
            0x11 => Ok(AxdrTag::Unsigned8),
            0x12 => Ok(AxdrTag::Unsigned16),
            0x13 => Ok(AxdrTag::CompactArray),
            0x14 => Ok(AxdrTag::Integer64),
            0x15 => Ok(AxdrTag::Unsigned64),
            0x16 => Ok(AxdrTag::Enumerate),
            0x17 => Ok(AxdrTag::Float32),
            0x18 => Ok(AxdrTag::Float64),
            0x19 => Ok(AxdrTag::DateTime),
            0x1A => Ok(AxdrTag::Date),
            0x1B => Ok(AxdrTag::Time),
            0xFF => Ok(AxdrTag::DontCare),
            _ => Err(MeterError::Decode(format!(
                "Unknown A-XDR tag: 0x{:02X}",
                value
            ))),
        }
    }

    /// Convert tag to u8 value
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Length encoding for variable-length types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthEncoding {
    /// Short form: length < 128, encoded in 1 byte
    Short(u8),
    /// Long form: length-of-length byte (0x80 | n) followed by n length bytes
    Long(usize),
}

impl LengthEncoding {
    /// Pick the shortest encoding for `len`
    pub fn for_len(len: usize) -> Self {
        match u8::try_from(len) {
            Ok(short) if short < 0x80 => LengthEncoding::Short(short),
            _ => LengthEncoding::Long(len),
        }
    }

    /// The encoded length value
    pub fn len(&self) -> usize {
        match self {
            LengthEncoding::Short(len) => *len as usize,
            LengthEncoding::Long(len) => *len,
        }
    }

    /// Encode length to bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            LengthEncoding::Short(len) => vec![*len],
            LengthEncoding::Long(len) => {
                let bytes: Vec<u8> = len
                    .to_be_bytes()
                    .into_iter()
                    .skip_while(|b| *b == 0)
                    .collect();
                let mut result = Vec::with_capacity(bytes.len() + 1);
                result.push(0x80 | bytes.len() as u8);
                result.extend_from_slice(&bytes);
                result
            }
        }
    }

    /// Decode length from bytes, returning the length and the bytes consumed
    pub fn decode(bytes: &[u8]) -> MeterResult<(Self, usize)> {
        let first_byte = *bytes
            .first()
            .ok_or_else(|| MeterError::Decode("Not enough bytes for length".to_string()))?;

        if (first_byte & 0x80) == 0 {
            return Ok((LengthEncoding::Short(first_byte), 1));
        }

        let length_of_length = (first_byte & 0x7F) as usize;
        if length_of_length == 0 || length_of_length > 4 {
            return Err(MeterError::Decode(format!(
                "Invalid length-of-length: {}",
                length_of_length
            )));
        }
        let len_bytes = bytes
            .get(1..1 + length_of_length)
            .ok_or_else(|| MeterError::Decode("Not enough bytes for long length".to_string()))?;

        let len = len_bytes
            .iter()
            .fold(0usize, |acc, &byte| (acc << 8) | byte as usize);
        Ok((LengthEncoding::Long(len), 1 + length_of_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_encoding_short() {
        let enc = LengthEncoding::for_len(10);
        assert_eq!(enc, LengthEncoding::Short(10));
        assert_eq!(enc.encode(), vec![10]);
    }

    #[test]
    fn test_length_encoding_long() {
        let enc = LengthEncoding::for_len(347);
        assert_eq!(enc.encode(), vec![0x82, 0x01, 0x5B]);
        let (decoded, consumed) = LengthEncoding::decode(&[0x82, 0x01, 0x5B, 0xAA]).unwrap();
        assert_eq!(decoded.len(), 347);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_length_encoding_truncated() {
        assert!(LengthEncoding::decode(&[]).is_err());
        assert!(LengthEncoding::decode(&[0x82, 0x01]).is_err());
        assert!(LengthEncoding::decode(&[0x80]).is_err());
    }

    #[test]
    fn test_tag_round_trip() {
        assert_eq!(AxdrTag::from_u8(0x12).unwrap(), AxdrTag::Unsigned16);
        assert_eq!(AxdrTag::Unsigned32.to_u8(), 0x06);
        assert!(AxdrTag::from_u8(0x07).is_err());
    }
}
