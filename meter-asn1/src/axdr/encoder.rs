//! A-XDR encoder for DLMS/COSEM
//!
//! Used to build Data-Notification PDUs, e.g. for simulated meters and test
//! fixtures.

use crate::axdr::types::{AxdrTag, LengthEncoding};
use meter_core::DataObject;

/// A-XDR encoder writing DataObjects into a byte buffer
#[derive(Debug, Default)]
pub struct AxdrEncoder {
    buffer: Vec<u8>,
}

impl AxdrEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a tagged DataObject
    pub fn encode_data_object(&mut self, obj: &DataObject) {
        match obj {
            DataObject::Null => self.encode_tag(AxdrTag::Null),
            DataObject::Boolean(b) => {
                self.encode_tag(AxdrTag::Boolean);
                self.encode_u8(if *b { 0xFF } else { 0x00 });
            }
            DataObject::Integer8(i) => {
                self.encode_tag(AxdrTag::Integer8);
                self.encode_bytes(&i.to_be_bytes());
            }
            DataObject::Integer16(i) => {
                self.encode_tag(AxdrTag::Integer16);
                self.encode_bytes(&i.to_be_bytes());
            }
            DataObject::Integer32(i) => {
                self.encode_tag(AxdrTag::Integer32);
                self.encode_bytes(&i.to_be_bytes());
            }
            DataObject::Integer64(i) => {
                self.encode_tag(AxdrTag::Integer64);
                self.encode_bytes(&i.to_be_bytes());
            }
            DataObject::Unsigned8(u) => {
                self.encode_tag(AxdrTag::Unsigned8);
                self.encode_u8(*u);
            }
            DataObject::Unsigned16(u) => {
                self.encode_tag(AxdrTag::Unsigned16);
                self.encode_bytes(&u.to_be_bytes());
            }
            DataObject::Unsigned32(u) => {
                self.encode_tag(AxdrTag::Unsigned32);
                self.encode_bytes(&u.to_be_bytes());
            }
            DataObject::Unsigned64(u) => {
                self.encode_tag(AxdrTag::Unsigned64);
                self.encode_bytes(&u.to_be_bytes());
            }
            DataObject::Float32(f) => {
                self.encode_tag(AxdrTag::Float32);
                self.encode_bytes(&f.to_be_bytes());
            }
            DataObject::Float64(f) => {
                self.encode_tag(AxdrTag::Float64);
                self.encode_bytes(&f.to_be_bytes());
            }
            DataObject::Enumerate(e) => {
                self.encode_tag(AxdrTag::Enumerate);
                self.encode_u8(*e);
            }
            DataObject::Bcd(b) => {
                self.encode_tag(AxdrTag::Bcd);
                self.encode_u8(*b);
            }
            DataObject::OctetString(s) => {
                self.encode_tag(AxdrTag::OctetString);
                self.encode_octet_string(s);
            }
            DataObject::VisibleString(s) => {
                self.encode_tag(AxdrTag::VisibleString);
                self.encode_octet_string(s);
            }
            DataObject::Utf8String(s) => {
                self.encode_tag(AxdrTag::Utf8String);
                self.encode_octet_string(s);
            }
            DataObject::BitString { bits, bytes } => {
                self.encode_tag(AxdrTag::BitString);
                self.encode_length(*bits);
                self.encode_bytes(bytes);
            }
            DataObject::Date(d) => {
                self.encode_tag(AxdrTag::Date);
                self.encode_bytes(d);
            }
            DataObject::Time(t) => {
                self.encode_tag(AxdrTag::Time);
                self.encode_bytes(t);
            }
            DataObject::DateTime(dt) => {
                self.encode_tag(AxdrTag::DateTime);
                self.encode_bytes(dt);
            }
            DataObject::Array(items) => {
                self.encode_tag(AxdrTag::Array);
                self.encode_sequence(items);
            }
            DataObject::Structure(items) => {
                self.encode_tag(AxdrTag::Structure);
                self.encode_sequence(items);
            }
        }
    }

    fn encode_sequence(&mut self, items: &[DataObject]) {
        self.encode_length(items.len());
        for item in items {
            self.encode_data_object(item);
        }
    }

    /// Encode a tag
    pub fn encode_tag(&mut self, tag: AxdrTag) {
        self.buffer.push(tag.to_u8());
    }

    /// Encode a length prefix
    pub fn encode_length(&mut self, len: usize) {
        self.buffer.extend_from_slice(&LengthEncoding::for_len(len).encode());
    }

    /// Encode a length-prefixed octet string (without tag)
    pub fn encode_octet_string(&mut self, bytes: &[u8]) {
        self.encode_length(bytes.len());
        self.encode_bytes(bytes);
    }

    /// Encode a u8
    pub fn encode_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Encode raw bytes
    pub fn encode_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Get encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
