//! Destinations for completed readings

use meter_application::Reading;
use meter_core::MeterResult;
use std::io::{self, Stdout, Write};

/// Receives every reading the loop assembles
pub trait ReadingSink {
    fn emit(&mut self, reading: &Reading) -> MeterResult<()>;
}

/// Collects readings in memory
impl ReadingSink for Vec<Reading> {
    fn emit(&mut self, reading: &Reading) -> MeterResult<()> {
        self.push(reading.clone());
        Ok(())
    }
}

/// Writes the text report of each reading, preceded by a blank line
#[derive(Debug)]
pub struct ReportSink<W> {
    out: W,
}

impl ReportSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ReportSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReadingSink for ReportSink<W> {
    fn emit(&mut self, reading: &Reading) -> MeterResult<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", reading)?;
        self.out.flush()?;
        Ok(())
    }
}
