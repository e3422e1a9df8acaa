//! Transport layer module for the meter readout
//!
//! This crate provides the pull-style byte-stream abstraction the frame
//! reader consumes and its serial port implementation.

pub mod error;
pub mod stream;
pub mod serial;

pub use error::{MeterError, MeterResult};
pub use stream::{IoStream, StreamAccessor, TransportLayer};
pub use serial::{SerialSettings, SerialTransport};

pub use tokio_serial::{DataBits, FlowControl, Parity, StopBits};
