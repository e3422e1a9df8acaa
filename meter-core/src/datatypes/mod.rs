//! Decoded data tree produced by the PDU decoder

pub mod data_object;

pub use data_object::{DataObject, DataObjectType};
