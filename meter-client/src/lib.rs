//! Readout client for encrypted M-Bus smart meters
//!
//! Wires the transport, frame reader, cipher unpacker and decoders into a
//! [`ReadoutLoop`] that runs until shutdown or until errors pile up.

pub mod config;
pub mod logging;
pub mod readout;
pub mod reliability;
pub mod shutdown;
pub mod sink;

pub use config::ReadoutConfig;
pub use readout::ReadoutLoop;
pub use reliability::{ErrorBreaker, LoopState, StopReason};
pub use sink::{ReadingSink, ReportSink};
