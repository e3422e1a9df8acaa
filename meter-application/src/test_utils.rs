//! Readout fixtures shaped like the notifications of the supported meter

use crate::fields::{Field, OBIS_DATE_TIME, OBIS_DEVICE_NAME, OBIS_METER_ID};
use meter_asn1::DataNotification;
use meter_core::DataObject;

/// COSEM date-time 2024-03-15 12:30:00, deviation and status unspecified
pub const SAMPLE_DATE_TIME: [u8; 12] = [
    0x07, 0xE8, 0x03, 0x0F, 0x05, 0x0C, 0x1E, 0x00, 0x00, 0x80, 0x00, 0x00,
];

/// Raw values of [`SampleReadout::default`], in `Field::ALL` order
pub const SAMPLE_VALUES: [u32; 12] = [
    2319, 2325, 2301, 125, 48, 230, 830, 0, 12_345_678, 1_234, 2_345, 456_789,
];

/// Register structure: OBIS code, value, scaler/unit pair
pub fn register(code: [u8; 6], value: DataObject) -> DataObject {
    DataObject::Structure(vec![
        DataObject::OctetString(code.to_vec()),
        value,
        DataObject::Structure(vec![DataObject::Integer8(0), DataObject::Enumerate(255)]),
    ])
}

fn field_register(field: Field, raw: u32) -> DataObject {
    let value = match field {
        Field::VoltageL1
        | Field::VoltageL2
        | Field::VoltageL3
        | Field::CurrentL1
        | Field::CurrentL2
        | Field::CurrentL3 => {
            DataObject::Unsigned16(u16::try_from(raw).expect("voltage and current are 16-bit registers"))
        }
        _ => DataObject::Unsigned32(raw),
    };
    let (scaler, unit) = match field.divisor() {
        10 => (-1, 35),
        100 => (-2, 33),
        1 => (0, 27),
        _ => (0, 30),
    };
    DataObject::Structure(vec![
        DataObject::OctetString(field.obis().as_bytes().to_vec()),
        value,
        DataObject::Structure(vec![DataObject::Integer8(scaler), DataObject::Enumerate(unit)]),
    ])
}

/// Builder for a Data-Notification carrying a full readout
#[derive(Debug, Clone)]
pub struct SampleReadout {
    pub invoke_id: u32,
    pub values: Vec<(Field, u32)>,
    /// Registers appended after the tracked ones
    pub extra: Vec<DataObject>,
}

impl Default for SampleReadout {
    fn default() -> Self {
        Self {
            invoke_id: 0x0001_E240,
            values: Field::ALL.into_iter().zip(SAMPLE_VALUES).collect(),
            extra: Vec::new(),
        }
    }
}

impl SampleReadout {
    /// Drop a tracked field from the readout
    pub fn without(mut self, field: Field) -> Self {
        self.values.retain(|(f, _)| *f != field);
        self
    }

    /// Override the raw value of a tracked field
    pub fn with_value(mut self, field: Field, raw: u32) -> Self {
        for (f, value) in &mut self.values {
            if *f == field {
                *value = raw;
            }
        }
        self
    }

    pub fn with_register(mut self, register: DataObject) -> Self {
        self.extra.push(register);
        self
    }

    /// Notification body: clock, device name and meter number, then the values
    pub fn body(&self) -> DataObject {
        let mut registers = vec![
            DataObject::Structure(vec![
                DataObject::OctetString(OBIS_DATE_TIME.as_bytes().to_vec()),
                DataObject::OctetString(SAMPLE_DATE_TIME.to_vec()),
            ]),
            DataObject::Structure(vec![
                DataObject::OctetString(OBIS_DEVICE_NAME.as_bytes().to_vec()),
                DataObject::VisibleString(b"KFM5KAIFA".to_vec()),
            ]),
            DataObject::Structure(vec![
                DataObject::OctetString(OBIS_METER_ID.as_bytes().to_vec()),
                DataObject::VisibleString(b"1KFM0200000001".to_vec()),
            ]),
        ];
        registers.extend(self.values.iter().map(|(field, raw)| field_register(*field, *raw)));
        registers.extend(self.extra.iter().cloned());
        DataObject::Structure(registers)
    }

    /// Notification without header date-time; the clock travels in the body
    pub fn notification(&self) -> DataNotification {
        DataNotification {
            invoke_id: self.invoke_id,
            date_time: None,
            body: self.body(),
        }
    }

    /// Plaintext PDU bytes
    pub fn to_pdu(&self) -> Vec<u8> {
        self.notification().encode()
    }
}
