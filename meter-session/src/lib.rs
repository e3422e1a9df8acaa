//! Session layer module for the meter readout
//!
//! The meter pushes its readout as two back-to-back M-Bus long frames. This
//! crate recognizes that frame pair inside the raw byte stream and hands
//! complete frames to the security layer.

pub mod error;
pub mod mbus;

pub use error::{MeterError, MeterResult};
pub use mbus::{FrameLayout, FrameReader, RawFrame};
