//! Quantities reported by the meter and their OBIS codes

use meter_core::ObisCode;
use std::fmt;

/// Clock of the meter, carried in every readout
pub const OBIS_DATE_TIME: ObisCode = ObisCode::new(0, 0, 1, 0, 0, 255);
/// Meter number assigned by the grid operator
pub const OBIS_METER_ID: ObisCode = ObisCode::new(0, 0, 96, 1, 0, 255);
/// COSEM logical device name (meter type)
pub const OBIS_DEVICE_NAME: ObisCode = ObisCode::new(0, 0, 42, 0, 0, 255);

/// Tracked measurement of a readout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    VoltageL1,
    VoltageL2,
    VoltageL3,
    CurrentL1,
    CurrentL2,
    CurrentL3,
    RealPowerIn,
    RealPowerOut,
    RealEnergyIn,
    RealEnergyOut,
    ReactiveEnergyIn,
    ReactiveEnergyOut,
}

impl Field {
    /// Every tracked field, in report order
    pub const ALL: [Field; 12] = [
        Field::VoltageL1,
        Field::VoltageL2,
        Field::VoltageL3,
        Field::CurrentL1,
        Field::CurrentL2,
        Field::CurrentL3,
        Field::RealPowerIn,
        Field::RealPowerOut,
        Field::RealEnergyIn,
        Field::RealEnergyOut,
        Field::ReactiveEnergyIn,
        Field::ReactiveEnergyOut,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::VoltageL1 => "VoltageL1",
            Field::VoltageL2 => "VoltageL2",
            Field::VoltageL3 => "VoltageL3",
            Field::CurrentL1 => "CurrentL1",
            Field::CurrentL2 => "CurrentL2",
            Field::CurrentL3 => "CurrentL3",
            Field::RealPowerIn => "RealPowerIn",
            Field::RealPowerOut => "RealPowerOut",
            Field::RealEnergyIn => "RealEnergyIn",
            Field::RealEnergyOut => "RealEnergyOut",
            Field::ReactiveEnergyIn => "ReactiveEnergyIn",
            Field::ReactiveEnergyOut => "ReactiveEnergyOut",
        }
    }

    pub fn obis(&self) -> ObisCode {
        match self {
            Field::VoltageL1 => ObisCode::new(1, 0, 32, 7, 0, 255),
            Field::VoltageL2 => ObisCode::new(1, 0, 52, 7, 0, 255),
            Field::VoltageL3 => ObisCode::new(1, 0, 72, 7, 0, 255),
            Field::CurrentL1 => ObisCode::new(1, 0, 31, 7, 0, 255),
            Field::CurrentL2 => ObisCode::new(1, 0, 51, 7, 0, 255),
            Field::CurrentL3 => ObisCode::new(1, 0, 71, 7, 0, 255),
            Field::RealPowerIn => ObisCode::new(1, 0, 1, 7, 0, 255),
            Field::RealPowerOut => ObisCode::new(1, 0, 2, 7, 0, 255),
            Field::RealEnergyIn => ObisCode::new(1, 0, 1, 8, 0, 255),
            Field::RealEnergyOut => ObisCode::new(1, 0, 2, 8, 0, 255),
            Field::ReactiveEnergyIn => ObisCode::new(1, 0, 3, 8, 0, 255),
            Field::ReactiveEnergyOut => ObisCode::new(1, 0, 4, 8, 0, 255),
        }
    }

    pub fn from_obis(code: &ObisCode) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.obis() == *code)
    }

    /// Divisor turning the raw register value into the reported unit
    pub fn divisor(&self) -> u32 {
        match self {
            Field::VoltageL1 | Field::VoltageL2 | Field::VoltageL3 => 10,
            Field::CurrentL1 | Field::CurrentL2 | Field::CurrentL3 => 100,
            Field::RealPowerIn | Field::RealPowerOut => 1,
            Field::RealEnergyIn
            | Field::RealEnergyOut
            | Field::ReactiveEnergyIn
            | Field::ReactiveEnergyOut => 1000,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Field::VoltageL1 | Field::VoltageL2 | Field::VoltageL3 => "V",
            Field::CurrentL1 | Field::CurrentL2 | Field::CurrentL3 => "A",
            Field::RealPowerIn | Field::RealPowerOut => "W",
            Field::RealEnergyIn | Field::RealEnergyOut => "kWh",
            // reactive energy keeps the meter's label
            Field::ReactiveEnergyIn | Field::ReactiveEnergyOut => "kvar",
        }
    }

    /// Scale a raw register value into the reported unit
    pub fn scale(&self, raw: u32) -> f64 {
        f64::from(raw) / f64::from(self.divisor())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the assembler treats an OBIS code found in a readout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Tracked(Field),
    /// Known but not part of a reading
    Ignored,
    Unknown,
}

pub fn classify(code: &ObisCode) -> Classification {
    if let Some(field) = Field::from_obis(code) {
        Classification::Tracked(field)
    } else if [OBIS_DATE_TIME, OBIS_METER_ID, OBIS_DEVICE_NAME].contains(code) {
        Classification::Ignored
    } else {
        Classification::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obis_codes_are_unique() {
        for (i, a) in Field::ALL.iter().enumerate() {
            for b in &Field::ALL[i + 1..] {
                assert_ne!(a.obis(), b.obis(), "{} and {}", a, b);
            }
        }
    }

    #[test]
    fn test_classify() {
        let voltage: ObisCode = "1.0.32.7.0.255".parse().unwrap();
        assert_eq!(classify(&voltage), Classification::Tracked(Field::VoltageL1));
        assert_eq!(classify(&OBIS_METER_ID), Classification::Ignored);
        assert_eq!(classify(&OBIS_DATE_TIME), Classification::Ignored);
        assert_eq!(
            classify(&ObisCode::new(1, 0, 13, 7, 0, 255)),
            Classification::Unknown
        );
    }

    #[test]
    fn test_scale() {
        assert_eq!(Field::VoltageL1.scale(2319), 231.9);
        assert_eq!(Field::CurrentL2.scale(125), 1.25);
        assert_eq!(Field::RealPowerOut.scale(830), 830.0);
        assert_eq!(Field::ReactiveEnergyIn.scale(1500), 1.5);
        assert_eq!(Field::ReactiveEnergyOut.unit(), "kvar");
    }
}
