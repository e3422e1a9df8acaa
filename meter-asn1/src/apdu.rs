//! Data-Notification APDU and the PDU decoder boundary
//!
//! Push-mode meters wrap every readout in a DLMS Data-Notification:
//! ```text
//! 0x0F                          data-notification tag
//! long-invoke-id-and-priority   4 bytes
//! date-time                     OCTET STRING, 0x00 when absent
//! notification-body             A-XDR Data
//! ```

use crate::axdr::{AxdrDecoder, AxdrEncoder, AxdrTag};
use crate::error::{MeterError, MeterResult};
use meter_core::DataObject;

/// APDU tag of a Data-Notification
pub const DATA_NOTIFICATION_TAG: u8 = 0x0F;

/// Decoded Data-Notification
#[derive(Debug, Clone, PartialEq)]
pub struct DataNotification {
    /// Long invoke id and priority
    pub invoke_id: u32,
    /// Raw COSEM date-time of the notification, if the meter sends one
    pub date_time: Option<Vec<u8>>,
    /// Notification body tree
    pub body: DataObject,
}

impl DataNotification {
    /// Decode a Data-Notification from PDU bytes
    ///
    /// Bytes following the body are ignored.
    pub fn decode(pdu: &[u8]) -> MeterResult<Self> {
        let mut decoder = AxdrDecoder::new(pdu);

        let tag = decoder.read_byte()?;
        if tag != DATA_NOTIFICATION_TAG {
            return Err(MeterError::Decode(format!(
                "Expected Data-Notification tag 0x{:02X}, got 0x{:02X}",
                DATA_NOTIFICATION_TAG, tag
            )));
        }

        let invoke_id = decoder.decode_u32()?;

        let date_time = match decoder.peek_byte() {
            Some(0x00) => {
                decoder.read_byte()?;
                None
            }
            Some(tag) if tag == AxdrTag::OctetString.to_u8() => {
                decoder.read_byte()?;
                Some(decoder.decode_octet_string()?)
            }
            Some(_) => Some(decoder.decode_octet_string()?),
            None => {
                return Err(MeterError::Decode(
                    "Data-Notification truncated before date-time".to_string(),
                ));
            }
        };

        let body = decoder.decode_data_object()?;

        Ok(Self {
            invoke_id,
            date_time,
            body,
        })
    }

    /// Encode this notification to PDU bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = AxdrEncoder::new();
        encoder.encode_u8(DATA_NOTIFICATION_TAG);
        encoder.encode_bytes(&self.invoke_id.to_be_bytes());
        match &self.date_time {
            Some(date_time) => encoder.encode_octet_string(date_time),
            None => encoder.encode_u8(0x00),
        }
        encoder.encode_data_object(&self.body);
        encoder.into_bytes()
    }
}

/// Boundary to the structural PDU decoder
///
/// The readout pipeline treats the decoder as opaque: it hands over the
/// decrypted PDU and receives the parsed tree, or a decode fault.
pub trait PduDecoder {
    /// Parse a plaintext PDU into a Data-Notification tree
    fn decode_pdu(&self, pdu: &[u8]) -> MeterResult<DataNotification>;
}

/// Default decoder implementing the DLMS A-XDR grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct AxdrPduDecoder;

impl PduDecoder for AxdrPduDecoder {
    fn decode_pdu(&self, pdu: &[u8]) -> MeterResult<DataNotification> {
        DataNotification::decode(pdu)
    }
}
