//! Builds encrypted frame pairs the way the meter emits them
//!
//! Used to simulate a meter: test fixtures, replay captures and bench
//! setups without real hardware.

use crate::encryption::{ASSOCIATED_DATA, AesGcmEncryption, BlockCipherKey, TAG_LENGTH};
use crate::error::{MeterError, MeterResult};
use crate::xdlms::{FrameCounter, Nonce, SystemTitle};

const START: u8 = 0x68;
const END: u8 = 0x16;
/// Control field: SND_UD
const CONTROL: u8 = 0x53;
/// Broadcast address
const ADDRESS: u8 = 0xFF;
const CI_FIRST: u8 = 0x00;
const CI_LAST: u8 = 0x11;
/// STSAP and DTSAP of the DLMS transport header
const TSAP: [u8; 2] = [0x01, 0x67];
/// general-glo-ciphering tag
const GLO_CIPHERING: u8 = 0xDB;
/// Security control: encryption and authentication, suite 0
const SECURITY_CONTROL: u8 = 0x21;

/// Header bytes of the first frame before its ciphertext part
const FIRST_OVERHEAD: usize = 23;
/// Header bytes of the second frame inside its L field
const SECOND_OVERHEAD: usize = 5;
/// L field the meter uses for the first frame
pub const DEFAULT_FIRST_LENGTH: u8 = 250;

/// Encrypts PDUs into M-Bus frame pairs
#[derive(Debug)]
pub struct FrameSealer {
    cipher: AesGcmEncryption,
    system_title: SystemTitle,
    first_length: u8,
}

impl FrameSealer {
    pub fn new(key: &BlockCipherKey, system_title: SystemTitle) -> Self {
        Self {
            cipher: AesGcmEncryption::new(key),
            system_title,
            first_length: DEFAULT_FIRST_LENGTH,
        }
    }

    /// Encrypt `pdu` and wrap it into a frame pair
    pub fn seal(&self, pdu: &[u8], frame_counter: FrameCounter) -> MeterResult<Vec<u8>> {
        let nonce = Nonce::new(&self.system_title, frame_counter);
        let ciphertext = self.cipher.encrypt(pdu, &nonce, ASSOCIATED_DATA)?;

        let first_part = ciphertext
            .len()
            .min(usize::from(self.first_length) - FIRST_OVERHEAD);
        let (first, second) = ciphertext.split_at(first_part);

        let l1 = u8::try_from(first.len() + FIRST_OVERHEAD)
            .map_err(|_| MeterError::InvalidData("First frame too long".to_string()))?;
        let l2 = u8::try_from(second.len() + SECOND_OVERHEAD).map_err(|_| {
            MeterError::InvalidData(format!(
                "PDU of {} bytes does not fit into two frames",
                pdu.len()
            ))
        })?;

        let mut frame = Vec::with_capacity(usize::from(l1) + usize::from(l2) + 12);

        let apdu_len = u16::try_from(1 + FrameCounter::LENGTH + ciphertext.len())
            .map_err(|_| MeterError::InvalidData("Ciphertext too long".to_string()))?;
        frame.extend_from_slice(&[START, l1, l1, START, CONTROL, ADDRESS, CI_FIRST]);
        frame.extend_from_slice(&TSAP);
        frame.extend_from_slice(&[GLO_CIPHERING, SystemTitle::LENGTH as u8]);
        frame.extend_from_slice(self.system_title.as_bytes());
        frame.push(0x82);
        frame.extend_from_slice(&apdu_len.to_be_bytes());
        frame.push(SECURITY_CONTROL);
        frame.extend_from_slice(&frame_counter.to_bytes());
        frame.extend_from_slice(first);
        frame.push(checksum(&frame[4..]));
        frame.push(END);

        let second_start = frame.len();
        frame.extend_from_slice(&[START, l2, l2, START, CONTROL, ADDRESS, CI_LAST]);
        frame.extend_from_slice(&TSAP);
        frame.extend_from_slice(second);
        frame.push(checksum(&frame[second_start + 4..]));
        frame.push(END);

        Ok(frame)
    }

    /// Seal `pdu` into a frame pair of exactly `length` bytes
    ///
    /// The plaintext is padded with zero bytes, which the PDU decoder
    /// ignores after the notification body.
    pub fn seal_to_length(
        &self,
        pdu: &[u8],
        frame_counter: FrameCounter,
        length: usize,
    ) -> MeterResult<Vec<u8>> {
        let natural = pdu.len() + TAG_LENGTH + FIRST_OVERHEAD + SECOND_OVERHEAD + 12;
        if length < natural {
            return Err(MeterError::InvalidData(format!(
                "PDU of {} bytes needs at least {} frame bytes, {} requested",
                pdu.len(),
                natural,
                length
            )));
        }

        let mut padded = pdu.to_vec();
        padded.resize(pdu.len() + length - natural, 0);
        self.seal(&padded, frame_counter)
    }
}

/// M-Bus checksum: arithmetic sum modulo 256
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}
