//! A-XDR decoder for DLMS/COSEM

use crate::axdr::types::{AxdrTag, LengthEncoding};
use crate::error::{MeterError, MeterResult};
use meter_core::DataObject;

/// Nesting limit for arrays and structures
pub const MAX_DEPTH: usize = 32;

/// A-XDR decoder reading DataObjects from a byte buffer
pub struct AxdrDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    depth: usize,
}

impl<'a> AxdrDecoder<'a> {
    /// Create a new decoder
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            depth: 0,
        }
    }

    /// Decode a tagged DataObject
    pub fn decode_data_object(&mut self) -> MeterResult<DataObject> {
        let tag = self.decode_tag()?;

        let obj = match tag {
            AxdrTag::Null | AxdrTag::DontCare => DataObject::Null,
            AxdrTag::Boolean => DataObject::Boolean(self.read_byte()? != 0x00),
            AxdrTag::Integer8 => DataObject::Integer8(i8::from_be_bytes(self.read_array()?)),
            AxdrTag::Integer16 => DataObject::Integer16(i16::from_be_bytes(self.read_array()?)),
            AxdrTag::Integer32 => DataObject::Integer32(i32::from_be_bytes(self.read_array()?)),
            AxdrTag::Integer64 => DataObject::Integer64(i64::from_be_bytes(self.read_array()?)),
            AxdrTag::Unsigned8 => DataObject::Unsigned8(self.read_byte()?),
            AxdrTag::Unsigned16 => DataObject::Unsigned16(self.decode_u16()?),
            AxdrTag::Unsigned32 => DataObject::Unsigned32(self.decode_u32()?),
            AxdrTag::Unsigned64 => DataObject::Unsigned64(u64::from_be_bytes(self.read_array()?)),
            AxdrTag::Float32 => DataObject::Float32(f32::from_be_bytes(self.read_array()?)),
            AxdrTag::Float64 => DataObject::Float64(f64::from_be_bytes(self.read_array()?)),
            AxdrTag::Enumerate => DataObject::Enumerate(self.read_byte()?),
            AxdrTag::Bcd => DataObject::Bcd(self.read_byte()?),
            AxdrTag::OctetString => DataObject::OctetString(self.decode_octet_string()?),
            AxdrTag::VisibleString => DataObject::VisibleString(self.decode_octet_string()?),
            AxdrTag::Utf8String => DataObject::Utf8String(self.decode_octet_string()?),
            AxdrTag::BitString => self.decode_bit_string()?,
            AxdrTag::Date => DataObject::Date(self.read_array()?),
            AxdrTag::Time => DataObject::Time(self.read_array()?),
            AxdrTag::DateTime => DataObject::DateTime(self.read_array()?),
            AxdrTag::Array => {
                let items = self.decode_sequence()?;
                DataObject::new_array(items).map_err(|e| MeterError::Decode(e.to_string()))?
            }
            AxdrTag::Structure => DataObject::Structure(self.decode_sequence()?),
            AxdrTag::CompactArray => {
                return Err(MeterError::Decode(
                    "CompactArray decoding is not supported".to_string(),
                ));
            }
        };
        Ok(obj)
    }

    /// Decode a tag
    pub fn decode_tag(&mut self) -> MeterResult<AxdrTag> {
        let byte = self.read_byte()?;
        AxdrTag::from_u8(byte)
    }

    /// Decode a u16 (big-endian)
    pub fn decode_u16(&mut self) -> MeterResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Decode a u32 (big-endian)
    pub fn decode_u32(&mut self) -> MeterResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Decode a length prefix
    pub fn decode_length(&mut self) -> MeterResult<usize> {
        let (len_enc, consumed) = LengthEncoding::decode(&self.buffer[self.position..])?;
        self.position += consumed;
        Ok(len_enc.len())
    }

    /// Decode a length-prefixed octet string (without tag)
    pub fn decode_octet_string(&mut self) -> MeterResult<Vec<u8>> {
        let len = self.decode_length()?;
        self.decode_fixed_bytes(len)
    }

    fn decode_bit_string(&mut self) -> MeterResult<DataObject> {
        let bits = self.decode_length()?;
        let bytes = self.decode_fixed_bytes(bits.div_ceil(8))?;
        Ok(DataObject::BitString { bits, bytes })
    }

    fn decode_sequence(&mut self) -> MeterResult<Vec<DataObject>> {
        let len = self.decode_length()?;
        if self.depth >= MAX_DEPTH {
            return Err(MeterError::Decode(format!(
                "Nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }

        self.depth += 1;
        // every element takes at least one byte, so the remaining length bounds the capacity
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(self.decode_data_object()?);
        }
        self.depth -= 1;
        Ok(items)
    }

    /// Decode fixed-length bytes
    pub fn decode_fixed_bytes(&mut self, len: usize) -> MeterResult<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    fn take(&mut self, len: usize) -> MeterResult<&'a [u8]> {
        let bytes = self
            .buffer
            .get(self.position..self.position.saturating_add(len))
            .ok_or_else(|| {
                MeterError::Decode(format!(
                    "Not enough bytes: need {}, have {}",
                    len,
                    self.remaining()
                ))
            })?;
        self.position += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> MeterResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a single byte
    pub fn read_byte(&mut self) -> MeterResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Peek at the next byte without consuming it
    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.get(self.position).copied()
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }
}
