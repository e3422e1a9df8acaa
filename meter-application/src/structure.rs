//! Extraction of OBIS-tagged values from a Data-Notification
//!
//! The notification body of the supported meter is one structure whose
//! direct children each describe a register:
//! ```text
//! structure
//!   structure
//!     octet-string  OBIS code (6 bytes)
//!     value         uint16 / uint32 / visible-string / ...
//!     structure     scaler and unit
//!   structure
//!     ...
//! ```

use meter_asn1::{AxdrPduDecoder, PduDecoder};
use meter_core::{DataObject, MeterError, MeterResult, ObisCode};

/// One register of a readout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObisEntry {
    pub code: ObisCode,
    /// Numeric value, absent for non-numeric registers such as the clock
    pub value: Option<u32>,
}

/// Turns a plaintext PDU into OBIS/value pairs in document order
#[derive(Debug, Clone, Default)]
pub struct StructureDecoder<D = AxdrPduDecoder> {
    decoder: D,
}

impl StructureDecoder<AxdrPduDecoder> {
    /// Decoder using the built-in A-XDR grammar
    pub fn new() -> Self {
        Self::with_decoder(AxdrPduDecoder)
    }
}

impl<D: PduDecoder> StructureDecoder<D> {
    pub fn with_decoder(decoder: D) -> Self {
        Self { decoder }
    }

    /// Decode a PDU and extract its registers
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Decode` if the PDU does not parse or a register
    /// lacks a valid OBIS code.
    pub fn decode(&self, pdu: &[u8]) -> MeterResult<Vec<ObisEntry>> {
        let notification = self.decoder.decode_pdu(pdu)?;
        extract_entries(&notification.body)
    }
}

/// Extract registers from a notification body
pub fn extract_entries(body: &DataObject) -> MeterResult<Vec<ObisEntry>> {
    let registers = body
        .first_structure()
        .ok_or_else(|| MeterError::Decode("Notification body contains no structure".to_string()))?;

    registers
        .iter()
        .filter(|child| matches!(child, DataObject::Structure(_)))
        .map(entry)
        .collect()
}

fn entry(register: &DataObject) -> MeterResult<ObisEntry> {
    let raw = register
        .first_octet_string()
        .ok_or_else(|| MeterError::Decode("Register without OBIS code".to_string()))?;
    let code = ObisCode::from_bytes(raw).map_err(|_| {
        MeterError::Decode(format!("OBIS code of {} bytes instead of {}", raw.len(), ObisCode::LENGTH))
    })?;

    let value = register
        .first_unsigned16()
        .map(u32::from)
        .or_else(|| register.first_unsigned32());

    Ok(ObisEntry { code, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SampleReadout, register};

    #[test]
    fn test_decode_sample_readout() {
        let pdu = SampleReadout::default().to_pdu();
        let entries = StructureDecoder::new().decode(&pdu).unwrap();

        assert_eq!(entries.len(), 15);
        assert_eq!(entries[0].code, ObisCode::new(0, 0, 1, 0, 0, 255));
        assert_eq!(entries[0].value, None);

        let voltage = entries
            .iter()
            .find(|e| e.code == ObisCode::new(1, 0, 32, 7, 0, 255))
            .unwrap();
        assert_eq!(voltage.value, Some(2319));
    }

    #[test]
    fn test_only_direct_structure_children_are_registers() {
        let body = DataObject::Structure(vec![
            register([1, 0, 1, 8, 0, 255], DataObject::Unsigned32(7)),
            DataObject::Unsigned8(3),
            DataObject::Array(vec![register([1, 0, 2, 8, 0, 255], DataObject::Unsigned32(9))]),
        ]);

        let entries = extract_entries(&body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, Some(7));
    }

    #[test]
    fn test_uint16_takes_precedence_over_uint32() {
        let reg = DataObject::Structure(vec![
            DataObject::OctetString(vec![1, 0, 32, 7, 0, 255]),
            DataObject::Unsigned32(1),
            DataObject::Structure(vec![DataObject::Unsigned16(2)]),
        ]);
        let entries = extract_entries(&DataObject::Structure(vec![reg])).unwrap();
        assert_eq!(entries[0].value, Some(2));
    }

    #[test]
    fn test_outer_structure_may_be_nested() {
        let body = DataObject::Array(vec![DataObject::Structure(vec![register(
            [1, 0, 31, 7, 0, 255],
            DataObject::Unsigned16(125),
        )])]);
        assert_eq!(extract_entries(&body).unwrap()[0].value, Some(125));
    }

    #[test]
    fn test_malformed_registers_abort_decoding() {
        let no_code = DataObject::Structure(vec![DataObject::Structure(vec![DataObject::Unsigned16(1)])]);
        assert!(matches!(extract_entries(&no_code), Err(MeterError::Decode(_))));

        let short_code = DataObject::Structure(vec![DataObject::Structure(vec![
            DataObject::OctetString(vec![1, 0, 32]),
            DataObject::Unsigned16(1),
        ])]);
        assert!(matches!(extract_entries(&short_code), Err(MeterError::Decode(_))));

        assert!(matches!(extract_entries(&DataObject::Unsigned8(1)), Err(MeterError::Decode(_))));
    }

    #[test]
    fn test_unknown_registers_are_kept() {
        let pdu = SampleReadout::default()
            .with_register(register([1, 0, 13, 7, 0, 255], DataObject::Unsigned16(998)))
            .to_pdu();
        let entries = StructureDecoder::new().decode(&pdu).unwrap();

        assert_eq!(entries.len(), 16);
        assert_eq!(entries[15].code, ObisCode::new(1, 0, 13, 7, 0, 255));
        assert_eq!(entries[15].value, Some(998));
    }

    #[test]
    fn test_garbage_pdu_is_decode_error() {
        let err = StructureDecoder::new().decode(&[0x0F, 0x00]).unwrap_err();
        assert!(matches!(err, MeterError::Decode(_)));
    }
}
