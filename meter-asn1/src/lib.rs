//! A-XDR processing for the meter readout pipeline
//!
//! This crate turns a decrypted application PDU into a [`DataObject`] tree.
//! The pipeline only depends on the [`PduDecoder`] trait; [`AxdrPduDecoder`]
//! is the default implementation of the DLMS A-XDR tag grammar.
//!
//! [`DataObject`]: meter_core::DataObject

pub mod error;
pub mod axdr;
pub mod apdu;

pub use error::{MeterError, MeterResult};
pub use axdr::{AxdrEncoder, AxdrDecoder};
pub use axdr::types::{AxdrTag, LengthEncoding};
pub use apdu::{AxdrPduDecoder, DataNotification, PduDecoder, DATA_NOTIFICATION_TAG};
