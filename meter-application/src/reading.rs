//! Assembly of a complete reading from extracted registers

use crate::fields::{Classification, Field, classify};
use crate::structure::ObisEntry;
use chrono::{DateTime, Local, TimeDelta};
use log::{debug, info};
use meter_core::{MeterError, MeterResult};
use std::fmt;

/// Seconds between sampling a readout and finishing its transmission
pub const CAPTURE_DELAY_SECS: i64 = 2;

/// Width of the label column in the report
const LABEL_WIDTH: usize = 19;

/// Estimated sampling time of a readout received at `received`
pub fn capture_time(received: DateTime<Local>) -> DateTime<Local> {
    received - TimeDelta::seconds(CAPTURE_DELAY_SECS)
}

/// One complete readout with every tracked field present
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    timestamp: DateTime<Local>,
    values: [u32; 12],
}

impl Reading {
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Raw register value as sent by the meter
    pub fn raw(&self, field: Field) -> u32 {
        self.values[field as usize]
    }

    /// Value in the field's reporting unit
    pub fn value(&self, field: Field) -> f64 {
        field.scale(self.raw(field))
    }

    /// Power drawn minus power fed in, in W
    pub fn net_real_power(&self) -> i64 {
        i64::from(self.raw(Field::RealPowerIn)) - i64::from(self.raw(Field::RealPowerOut))
    }
}

fn line(f: &mut fmt::Formatter<'_>, label: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "{:<width$}{}", format!("{}:", label), value, width = LABEL_WIDTH)
}

/// Scaled value in its shortest exact decimal form, whole numbers with one
/// decimal place (`230.0 V`, `1.2 A`, `12345.678 kWh`)
struct Scaled(f64, &'static str);

impl fmt::Display for Scaled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1} {}", self.0, self.1)
        } else {
            write!(f, "{} {}", self.0, self.1)
        }
    }
}

fn scaled(reading: &Reading, field: Field) -> Scaled {
    Scaled(reading.value(field), field.unit())
}

impl fmt::Display for Reading {
    /// Line-oriented report, one quantity per line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        line(f, "Timestamp", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        for field in &Field::ALL[..6] {
            line(f, field.name(), scaled(self, *field))?;
        }
        line(f, "RealPower", format!("{} W", self.net_real_power()))?;
        for field in &Field::ALL[6..8] {
            line(f, field.name(), format!("{} {}", self.raw(*field), field.unit()))?;
        }
        for field in &Field::ALL[8..11] {
            line(f, field.name(), scaled(self, *field))?;
        }
        let last = Field::ReactiveEnergyOut;
        write!(
            f,
            "{:<width$}{}",
            format!("{}:", last.name()),
            scaled(self, last),
            width = LABEL_WIDTH
        )
    }
}

/// Fields absent from an incomplete readout, given the names that were found
pub fn missing_fields(found: &[String]) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|field| !found.iter().any(|name| name == field.name()))
        .collect()
}

/// Collects tracked registers into a [`Reading`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingAssembler;

impl ReadingAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build a reading stamped with `timestamp`
    ///
    /// Registers outside the tracked set are skipped; codes the meter is not
    /// known to send are logged.
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Incomplete` unless all tracked fields carry a value.
    pub fn assemble(&self, entries: &[ObisEntry], timestamp: DateTime<Local>) -> MeterResult<Reading> {
        let mut values: [Option<u32>; 12] = [None; 12];
        let mut found = Vec::new();

        for entry in entries {
            match classify(&entry.code) {
                Classification::Tracked(field) => {
                    if let Some(value) = entry.value {
                        if values[field as usize].replace(value).is_none() {
                            found.push(field);
                        }
                    }
                }
                Classification::Ignored => {}
                Classification::Unknown => {
                    info!("Message contains new and untracked OBIS code: {}", entry.code);
                }
            }
        }

        if found.len() != Field::ALL.len() {
            let fields: Vec<String> = found.iter().map(|f| f.name().to_string()).collect();
            debug!("Missing fields: {:?}", missing_fields(&fields));
            return Err(MeterError::Incomplete {
                found: found.len(),
                fields,
            });
        }

        let mut complete = [0u32; 12];
        for (slot, value) in complete.iter_mut().zip(values) {
            *slot = value.unwrap_or_default();
        }

        Ok(Reading {
            timestamp,
            values: complete,
        })
    }
}
