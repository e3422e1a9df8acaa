//! Application layer of the meter readout
//!
//! Walks the decoded Data-Notification tree for OBIS-tagged registers and
//! assembles the tracked ones into a [`Reading`].

pub mod fields;
pub mod reading;
pub mod structure;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use fields::{Classification, Field, classify};
pub use reading::{Reading, ReadingAssembler, capture_time, missing_fields};
pub use structure::{ObisEntry, StructureDecoder};
