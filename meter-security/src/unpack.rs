//! Ciphertext extraction and decryption of a frame pair
//!
//! # Layout
//!
//! ```text
//! offset          field
//! 1               L1, length of the first frame
//! 11..19          system title
//! 23..27          frame counter
//! 27..L1+4        ciphertext, first part
//! L1+7            L2, length of the second frame
//! L1+15..L1+10+L2 ciphertext, second part (ends with the GCM tag)
//! ```

use crate::encryption::{ASSOCIATED_DATA, AesGcmEncryption, BlockCipherKey, TAG_LENGTH};
use crate::error::{MeterError, MeterResult};
use crate::xdlms::{FrameCounter, Nonce, SystemTitle};
use log::trace;
use meter_session::RawFrame;
use std::ops::Range;

const SYSTEM_TITLE: Range<usize> = 11..19;
const FRAME_COUNTER: Range<usize> = 23..27;
const FIRST_SPAN_START: usize = 27;

/// Read-only view over the header fields of a frame pair
#[derive(Debug, Clone, Copy)]
pub struct FrameHeader<'a> {
    bytes: &'a [u8],
}

impl<'a> FrameHeader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn field(&self, range: Range<usize>, name: &str) -> MeterResult<&'a [u8]> {
        self.bytes.get(range.clone()).ok_or_else(|| {
            MeterError::Format(format!(
                "{} at {:?} lies outside the {}-byte frame",
                name,
                range,
                self.bytes.len()
            ))
        })
    }

    fn byte(&self, index: usize, name: &str) -> MeterResult<u8> {
        self.field(index..index + 1, name).map(|b| b[0])
    }

    pub fn system_title(&self) -> MeterResult<SystemTitle> {
        SystemTitle::from_slice(self.field(SYSTEM_TITLE, "system title")?)
    }

    pub fn frame_counter(&self) -> MeterResult<FrameCounter> {
        FrameCounter::from_slice(self.field(FRAME_COUNTER, "frame counter")?)
    }

    /// L field of the first frame
    pub fn first_length(&self) -> MeterResult<usize> {
        let len = self.byte(1, "first frame length")?;
        if len == 0 {
            return Err(MeterError::Format("first frame length is zero".to_string()));
        }
        Ok(usize::from(len))
    }

    /// L field of the second frame
    pub fn second_length(&self) -> MeterResult<usize> {
        let len = self.byte(self.first_length()? + 7, "second frame length")?;
        if len == 0 {
            return Err(MeterError::Format("second frame length is zero".to_string()));
        }
        Ok(usize::from(len))
    }

    /// Byte range of the first ciphertext part
    pub fn first_span(&self) -> MeterResult<Range<usize>> {
        let end = self.first_length()? + 4;
        self.checked_span(FIRST_SPAN_START..end, "first ciphertext part")
    }

    /// Byte range of the second ciphertext part
    pub fn second_span(&self) -> MeterResult<Range<usize>> {
        let l1 = self.first_length()?;
        let l2 = self.second_length()?;
        self.checked_span(l1 + 15..l1 + 10 + l2, "second ciphertext part")
    }

    fn checked_span(&self, span: Range<usize>, name: &str) -> MeterResult<Range<usize>> {
        if span.end < span.start {
            return Err(MeterError::Format(format!(
                "{} has negative length ({:?})",
                name, span
            )));
        }
        self.field(span.clone(), name)?;
        Ok(span)
    }

    /// Nonce derived from system title and frame counter
    pub fn nonce(&self) -> MeterResult<Nonce> {
        Ok(Nonce::new(&self.system_title()?, self.frame_counter()?))
    }
}

/// Ciphertext and nonce extracted from one frame pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextBundle {
    pub nonce: Nonce,
    /// Both ciphertext parts in wire order, tag included
    pub ciphertext: Vec<u8>,
}

/// Plaintext PDU recovered from a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu(Vec<u8>);

impl Pdu {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Uppercase hex rendering for diagnostics
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl AsRef<[u8]> for Pdu {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Turns frame pairs into plaintext PDUs with the pre-shared key
#[derive(Debug)]
pub struct CipherUnpacker {
    cipher: AesGcmEncryption,
}

impl CipherUnpacker {
    pub fn new(key: &BlockCipherKey) -> Self {
        Self {
            cipher: AesGcmEncryption::new(key),
        }
    }

    /// Extract nonce and ciphertext from a frame pair
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Format` if the declared lengths do not fit the
    /// frame or leave no room for the authentication tag.
    pub fn unpack(&self, frame: &RawFrame) -> MeterResult<CiphertextBundle> {
        let header = FrameHeader::new(frame.as_bytes());
        let bytes = frame.as_bytes();

        let first = header.first_span()?;
        let second = header.second_span()?;
        let mut ciphertext = Vec::with_capacity(first.len() + second.len());
        ciphertext.extend_from_slice(&bytes[first]);
        ciphertext.extend_from_slice(&bytes[second]);

        if ciphertext.len() < TAG_LENGTH {
            return Err(MeterError::Format(format!(
                "Ciphertext of {} bytes cannot hold the {}-byte tag",
                ciphertext.len(),
                TAG_LENGTH
            )));
        }

        Ok(CiphertextBundle {
            nonce: header.nonce()?,
            ciphertext,
        })
    }

    /// Authenticate and decrypt an extracted bundle
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Auth` if the tag does not verify under the key.
    pub fn decrypt(&self, bundle: &CiphertextBundle) -> MeterResult<Pdu> {
        let plaintext = self
            .cipher
            .decrypt(&bundle.ciphertext, &bundle.nonce, ASSOCIATED_DATA)?;
        let pdu = Pdu::new(plaintext);
        trace!(
            "Decrypted frame {} from {}: {}",
            bundle.nonce.frame_counter().value(),
            bundle.nonce.system_title(),
            pdu.to_hex()
        );
        Ok(pdu)
    }

    /// Unpack and decrypt in one step
    pub fn open(&self, frame: &RawFrame) -> MeterResult<Pdu> {
        let bundle = self.unpack(frame)?;
        self.decrypt(&bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sealer::FrameSealer;
    use meter_session::FrameLayout;

    const TITLE: [u8; 8] = [0x4B, 0x46, 0x4D, 0x67, 0x00, 0x00, 0x12, 0x34];

    fn key() -> BlockCipherKey {
        BlockCipherKey::from_hex("5AD84121D9D20B364B7A11F3C1B5827F").unwrap()
    }

    fn plaintext() -> Vec<u8> {
        (0..=255u8).cycle().take(300).collect()
    }

    fn sealed() -> Vec<u8> {
        FrameSealer::new(&key(), SystemTitle::new(TITLE))
            .seal(&plaintext(), FrameCounter::new(0x0102))
            .unwrap()
    }

    fn raw(bytes: Vec<u8>) -> RawFrame {
        RawFrame::new(&FrameLayout::with_length(bytes.len()), bytes).unwrap()
    }

    #[test]
    fn test_header_fields() {
        let bytes = sealed();
        let header = FrameHeader::new(&bytes);

        assert_eq!(header.system_title().unwrap().as_bytes(), &TITLE);
        assert_eq!(header.frame_counter().unwrap().value(), 0x0102);
        assert_eq!(header.first_length().unwrap(), 250);
        assert_eq!(header.first_span().unwrap(), 27..254);
        assert_eq!(header.second_span().unwrap().end, bytes.len() - 2);
    }

    #[test]
    fn test_open_recovers_exact_plaintext() {
        let frame = raw(sealed());
        let unpacker = CipherUnpacker::new(&key());

        let bundle = unpacker.unpack(&frame).unwrap();
        assert_eq!(bundle.ciphertext.len(), plaintext().len() + TAG_LENGTH);
        assert_eq!(&bundle.nonce.as_bytes()[..8], &TITLE);

        let pdu = unpacker.open(&frame).unwrap();
        assert_eq!(pdu.as_bytes(), &plaintext()[..]);
        assert!(pdu.to_hex().starts_with("000102"));
    }

    #[test]
    fn test_tampered_ciphertext_fails_authentication() {
        let unpacker = CipherUnpacker::new(&key());

        let mut bytes = sealed();
        bytes[40] ^= 0x01;
        assert!(matches!(unpacker.open(&raw(bytes)), Err(MeterError::Auth(_))));

        let mut bytes = sealed();
        let tag_byte = bytes.len() - 3;
        bytes[tag_byte] ^= 0x80;
        assert!(matches!(unpacker.open(&raw(bytes)), Err(MeterError::Auth(_))));
    }

    #[test]
    fn test_wrong_key_or_counter_fails_authentication() {
        let frame = raw(sealed());
        let other = CipherUnpacker::new(&BlockCipherKey::new([0u8; 16]));
        assert!(matches!(other.open(&frame), Err(MeterError::Auth(_))));

        let mut bytes = sealed();
        bytes[26] ^= 0x01;
        let unpacker = CipherUnpacker::new(&key());
        assert!(matches!(unpacker.open(&raw(bytes)), Err(MeterError::Auth(_))));
    }

    #[test]
    fn test_zero_length_fields_are_format_errors() {
        let unpacker = CipherUnpacker::new(&key());

        let mut bytes = sealed();
        bytes[1] = 0;
        assert!(matches!(unpacker.unpack(&raw(bytes)), Err(MeterError::Format(_))));

        let mut bytes = sealed();
        bytes[250 + 7] = 0;
        assert!(matches!(unpacker.unpack(&raw(bytes)), Err(MeterError::Format(_))));
    }

    #[test]
    fn test_out_of_range_spans_are_format_errors() {
        let unpacker = CipherUnpacker::new(&key());

        let mut bytes = sealed();
        bytes[250 + 7] = 0xFF;
        assert!(matches!(unpacker.unpack(&raw(bytes)), Err(MeterError::Format(_))));

        // L1 below the header size gives a negative first part
        let mut bytes = sealed();
        bytes[1] = 10;
        assert!(matches!(unpacker.unpack(&raw(bytes)), Err(MeterError::Format(_))));

        let short = vec![0x68, 0x04, 0x04, 0x68, 0x00, 0x16];
        assert!(matches!(unpacker.unpack(&raw(short)), Err(MeterError::Format(_))));
    }

    /// Frame pair encrypted outside this crate: key 00..0F, title
    /// 4B464D6700001234, counter 01020304, plaintext 00..C7, L1 173, L2 67
    const KNOWN_FRAME: [&str; 8] = [
        "68ADAD6853FF000167DB084B464D67000012348200D9210102030446F406C76F",
        "2EBF250D45C34B689659B857586E097C676E9113EC26542B1750BC77543A231D",
        "D2E71A7EA6A1D9D29F896206C2D92644C379FBF84A0EAB839707CA4EAD2E84A7",
        "9427F173BD2F15DC8376FE62968474A95E9B9D3E52BD60715BA807A4DA4083B7",
        "AF5B6002D6BC4454E33ABB8395CD58F491E926ED7786952EE308E308B531C067",
        "9A4F3E4D21B42850647A9F07598B2F4C8239166843436853FF1101672859F5FF",
        "5AFED8F9983F6D3BC9056974B6A2EA539838F0000A07A7E35B54B7C2BD4B9CFF",
        "B4B1A44DC488E09E5CC07F5B48F1B12103ED2FA5B1A798A8541F3E16",
    ];

    #[test]
    fn test_open_known_frame() {
        let bytes = hex::decode(KNOWN_FRAME.concat()).unwrap();
        assert_eq!(bytes.len(), 252);
        let key = BlockCipherKey::from_hex("000102030405060708090A0B0C0D0E0F").unwrap();
        let unpacker = CipherUnpacker::new(&key);

        let bundle = unpacker.unpack(&raw(bytes.clone())).unwrap();
        assert_eq!(bundle.nonce.to_string(), "4B464D670000123401020304");
        assert_eq!(bundle.ciphertext.len(), 212);
        assert_eq!(hex::encode_upper(&bundle.ciphertext[200..]), "B12103ED2FA5B1A798A8541F");

        let pdu = unpacker.open(&raw(bytes)).unwrap();
        let expected: Vec<u8> = (0..200u8).collect();
        assert_eq!(pdu.as_bytes(), &expected[..]);
    }
}
