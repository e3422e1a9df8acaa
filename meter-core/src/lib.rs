//! Core types and utilities for the meter readout pipeline
//!
//! This crate provides the error taxonomy shared by every stage, the OBIS
//! identifier type and the decoded data tree handed from the PDU decoder to
//! the structure decoder.

pub mod error;
pub mod obis_code;
pub mod datatypes;

pub use error::{MeterError, MeterResult};
pub use obis_code::ObisCode;
pub use datatypes::{DataObject, DataObjectType};
