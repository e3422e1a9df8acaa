//! Error types re-exported from `meter-core`

pub use meter_core::error::{MeterError, MeterResult};
