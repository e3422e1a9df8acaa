//! Data object tree for A-XDR encoded application data

use crate::error::{MeterError, MeterResult};
use std::fmt;
use std::ops::ControlFlow;

/// A node of the decoded application data tree
///
/// Leaves carry a typed value; `Array` and `Structure` are branches holding
/// their children in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum DataObject {
    /// Null data (also used for don't-care)
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer 8-bit
    Integer8(i8),
    /// Integer 16-bit
    Integer16(i16),
    /// Integer 32-bit
    Integer32(i32),
    /// Integer 64-bit
    Integer64(i64),
    /// Unsigned integer 8-bit
    Unsigned8(u8),
    /// Unsigned integer 16-bit
    Unsigned16(u16),
    /// Unsigned integer 32-bit
    Unsigned32(u32),
    /// Unsigned integer 64-bit
    Unsigned64(u64),
    /// Float 32-bit
    Float32(f32),
    /// Float 64-bit
    Float64(f64),
    /// Enumeration (8-bit)
    Enumerate(u8),
    /// BCD (Binary Coded Decimal)
    Bcd(u8),
    /// Octet string
    OctetString(Vec<u8>),
    /// Visible string
    VisibleString(Vec<u8>),
    /// UTF-8 string
    Utf8String(Vec<u8>),
    /// Bit string, `bits` significant bits packed MSB first
    BitString { bits: usize, bytes: Vec<u8> },
    /// Date (5 raw bytes)
    Date([u8; 5]),
    /// Time (4 raw bytes)
    Time([u8; 4]),
    /// Date and time (12 raw bytes)
    DateTime([u8; 12]),
    /// Array of DataObjects of the same type
    Array(Vec<DataObject>),
    /// Structure (ordered list of DataObjects)
    Structure(Vec<DataObject>),
}

/// Type tag of a DataObject node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataObjectType {
    NullData,
    Boolean,
    Integer,
    LongInteger,
    DoubleLong,
    Long64,
    Unsigned,
    LongUnsigned,
    DoubleLongUnsigned,
    Long64Unsigned,
    Float32,
    Float64,
    Enumerate,
    Bcd,
    OctetString,
    VisibleString,
    Utf8String,
    BitString,
    Date,
    Time,
    DateTime,
    Array,
    Structure,
}

impl DataObject {
    /// Get the type tag of this node
    pub fn get_type(&self) -> DataObjectType {
        match self {
            DataObject::Null => DataObjectType::NullData,
            DataObject::Boolean(_) => DataObjectType::Boolean,
            DataObject::Integer8(_) => DataObjectType::Integer,
            DataObject::Integer16(_) => DataObjectType::LongInteger,
            DataObject::Integer32(_) => DataObjectType::DoubleLong,
            DataObject::Integer64(_) => DataObjectType::Long64,
            DataObject::Unsigned8(_) => DataObjectType::Unsigned,
            DataObject::Unsigned16(_) => DataObjectType::LongUnsigned,
            DataObject::Unsigned32(_) => DataObjectType::DoubleLongUnsigned,
            DataObject::Unsigned64(_) => DataObjectType::Long64Unsigned,
            DataObject::Float32(_) => DataObjectType::Float32,
            DataObject::Float64(_) => DataObjectType::Float64,
            DataObject::Enumerate(_) => DataObjectType::Enumerate,
            DataObject::Bcd(_) => DataObjectType::Bcd,
            DataObject::OctetString(_) => DataObjectType::OctetString,
            DataObject::VisibleString(_) => DataObjectType::VisibleString,
            DataObject::Utf8String(_) => DataObjectType::Utf8String,
            DataObject::BitString { .. } => DataObjectType::BitString,
            DataObject::Date(_) => DataObjectType::Date,
            DataObject::Time(_) => DataObjectType::Time,
            DataObject::DateTime(_) => DataObjectType::DateTime,
            DataObject::Array(_) => DataObjectType::Array,
            DataObject::Structure(_) => DataObjectType::Structure,
        }
    }

    /// Constructs an array data
    ///
    /// # Errors
    ///
    /// Returns an error if array elements have different types
    pub fn new_array(array: Vec<DataObject>) -> MeterResult<Self> {
        if let Some(first) = array.first() {
            let array_type = first.get_type();
            if let Some((index, sub)) = array
                .iter()
                .enumerate()
                .find(|(_, sub)| sub.get_type() != array_type)
            {
                return Err(MeterError::InvalidData(format!(
                    "Array is of type {:?}, but element at {} is of type {:?}",
                    array_type,
                    index,
                    sub.get_type()
                )));
            }
        }
        Ok(DataObject::Array(array))
    }

    /// Children of a branch node; empty for leaves
    pub fn children(&self) -> &[DataObject] {
        match self {
            DataObject::Array(items) | DataObject::Structure(items) => items,
            _ => &[],
        }
    }

    /// Visit this node and its descendants in pre-order (document order)
    ///
    /// The visitor stops the walk early by returning `ControlFlow::Break`.
    pub fn walk<'a, B>(
        &'a self,
        visitor: &mut impl FnMut(&'a DataObject) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        visitor(self)?;
        for child in self.children() {
            child.walk(visitor)?;
        }
        ControlFlow::Continue(())
    }

    /// First node (this one included) for which `pick` returns a value
    pub fn find_map<'a, T>(&'a self, mut pick: impl FnMut(&'a DataObject) -> Option<T>) -> Option<T> {
        match self.walk(&mut |node| match pick(node) {
            Some(found) => ControlFlow::Break(found),
            None => ControlFlow::Continue(()),
        }) {
            ControlFlow::Break(found) => Some(found),
            ControlFlow::Continue(()) => None,
        }
    }

    /// First structure in the tree, this node included
    pub fn first_structure(&self) -> Option<&[DataObject]> {
        self.find_map(|node| match node {
            DataObject::Structure(items) => Some(items.as_slice()),
            _ => None,
        })
    }

    /// First octet-string leaf below or at this node
    pub fn first_octet_string(&self) -> Option<&[u8]> {
        self.find_map(|node| match node {
            DataObject::OctetString(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// First unsigned 16-bit leaf below or at this node
    pub fn first_unsigned16(&self) -> Option<u16> {
        self.find_map(|node| match node {
            DataObject::Unsigned16(value) => Some(*value),
            _ => None,
        })
    }

    /// First unsigned 32-bit leaf below or at this node
    pub fn first_unsigned32(&self) -> Option<u32> {
        self.find_map(|node| match node {
            DataObject::Unsigned32(value) => Some(*value),
            _ => None,
        })
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    bytes.iter().try_for_each(|byte| write!(f, "{:02X}", byte))
}

impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataObject::Null => write!(f, "NULL_DATA"),
            DataObject::Boolean(b) => write!(f, "BOOLEAN: {}", b),
            DataObject::Integer8(i) => write!(f, "INTEGER: {}", i),
            DataObject::Integer16(i) => write!(f, "LONG_INTEGER: {}", i),
            DataObject::Integer32(i) => write!(f, "DOUBLE_LONG: {}", i),
            DataObject::Integer64(i) => write!(f, "LONG64: {}", i),
            DataObject::Unsigned8(u) => write!(f, "UNSIGNED: {}", u),
            DataObject::Unsigned16(u) => write!(f, "LONG_UNSIGNED: {}", u),
            DataObject::Unsigned32(u) => write!(f, "DOUBLE_LONG_UNSIGNED: {}", u),
            DataObject::Unsigned64(u) => write!(f, "LONG64_UNSIGNED: {}", u),
            DataObject::Float32(fl) => write!(f, "FLOAT32: {}", fl),
            DataObject::Float64(fl) => write!(f, "FLOAT64: {}", fl),
            DataObject::Enumerate(e) => write!(f, "ENUMERATE: {}", e),
            DataObject::Bcd(b) => write!(f, "BCD: {}", b),
            DataObject::OctetString(s) => {
                write!(f, "OCTET_STRING: ")?;
                write_hex(f, s)
            }
            DataObject::VisibleString(s) => {
                write!(f, "VISIBLE_STRING: {}", String::from_utf8_lossy(s))
            }
            DataObject::Utf8String(s) => {
                write!(f, "UTF8_STRING: {}", String::from_utf8_lossy(s))
            }
            DataObject::BitString { bits, bytes } => {
                write!(f, "BIT_STRING({}): ", bits)?;
                write_hex(f, bytes)
            }
            DataObject::Date(d) => {
                write!(f, "DATE: ")?;
                write_hex(f, d)
            }
            DataObject::Time(t) => {
                write!(f, "TIME: ")?;
                write_hex(f, t)
            }
            DataObject::DateTime(dt) => {
                write!(f, "DATE_TIME: ")?;
                write_hex(f, dt)
            }
            DataObject::Array(arr) => {
                write!(f, "ARRAY: {} element(s)", arr.len())?;
                for (i, elem) in arr.iter().enumerate() {
                    write!(f, "\n  [{}]: {}", i, elem)?;
                }
                Ok(())
            }
            DataObject::Structure(s) => {
                write!(f, "STRUCTURE: {} element(s)", s.len())?;
                for (i, elem) in s.iter().enumerate() {
                    write!(f, "\n  [{}]: {}", i, elem)?;
                }
                Ok(())
            }
        }
    }
}
