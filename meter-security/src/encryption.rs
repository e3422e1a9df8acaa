//! AES-GCM primitives for meter frames

use crate::error::{MeterError, MeterResult};
use crate::xdlms::Nonce;
use aes::Aes128;
use aes_gcm::{AesGcm, Key};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use std::fmt;

/// Length of the GCM authentication tag appended by the meter (DLMS uses 12)
pub const TAG_LENGTH: usize = 12;

/// Associated data the meter authenticates with every frame
pub const ASSOCIATED_DATA: &[u8] = b"0";

/// AES-128-GCM with a 96-bit nonce and a truncated 96-bit tag
type MeterGcm = AesGcm<Aes128, U12, U12>;

/// Pre-shared AES-128 block cipher key
#[derive(Clone, PartialEq, Eq)]
pub struct BlockCipherKey([u8; 16]);

impl BlockCipherKey {
    /// Key length in bytes
    pub const LENGTH: usize = 16;

    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parse a key written as 32 hex digits
    pub fn from_hex(text: &str) -> MeterResult<Self> {
        let bytes = hex::decode(text.trim())
            .map_err(|e| MeterError::Config(format!("Invalid block cipher key: {}", e)))?;
        let bytes: [u8; 16] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            MeterError::Config(format!(
                "Invalid AES-128 key length: expected {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for BlockCipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlockCipherKey(..)")
    }
}

/// AES-GCM encryption context
pub struct AesGcmEncryption {
    cipher: MeterGcm,
}

impl AesGcmEncryption {
    /// Create a new AES-GCM encryption context
    pub fn new(key: &BlockCipherKey) -> Self {
        Self {
            cipher: MeterGcm::new(Key::<MeterGcm>::from_slice(key.as_bytes())),
        }
    }

    /// Encrypt data, appending the authentication tag
    pub fn encrypt(&self, plaintext: &[u8], nonce: &Nonce, aad: &[u8]) -> MeterResult<Vec<u8>> {
        let payload = Payload { msg: plaintext, aad };
        self.cipher
            .encrypt(aes_gcm::Nonce::<U12>::from_slice(nonce.as_bytes()), payload)
            .map_err(|e| MeterError::InvalidData(format!("Encryption failed: {}", e)))
    }

    /// Decrypt data whose last [`TAG_LENGTH`] bytes are the authentication tag
    ///
    /// # Errors
    ///
    /// * `MeterError::Format` if the input cannot even hold a tag
    /// * `MeterError::Auth` if the tag does not verify
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &Nonce, aad: &[u8]) -> MeterResult<Vec<u8>> {
        if ciphertext.len() < TAG_LENGTH {
            return Err(MeterError::Format(format!(
                "Ciphertext of {} bytes is shorter than the {}-byte tag",
                ciphertext.len(),
                TAG_LENGTH
            )));
        }

        let payload = Payload { msg: ciphertext, aad };
        self.cipher
            .decrypt(aes_gcm::Nonce::<U12>::from_slice(nonce.as_bytes()), payload)
            .map_err(|_| MeterError::Auth(format!("tag mismatch for nonce {}", nonce)))
    }
}

impl fmt::Debug for AesGcmEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEncryption").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdlms::{FrameCounter, SystemTitle};

    const KEY: &str = "000102030405060708090A0B0C0D0E0F";

    fn nonce() -> Nonce {
        Nonce::new(&SystemTitle::new(*b"KFM\x10\x20\x30\x40\x50"), FrameCounter::new(7))
    }

    #[test]
    fn test_key_from_hex() {
        let key = BlockCipherKey::from_hex(KEY).unwrap();
        assert_eq!(key.as_bytes()[15], 0x0F);
        assert_eq!(format!("{:?}", key), "BlockCipherKey(..)");

        assert!(matches!(BlockCipherKey::from_hex("0011"), Err(MeterError::Config(_))));
        assert!(matches!(BlockCipherKey::from_hex("zz"), Err(MeterError::Config(_))));
    }

    #[test]
    fn test_aes_gcm_encrypt_decrypt() {
        let enc = AesGcmEncryption::new(&BlockCipherKey::from_hex(KEY).unwrap());
        let plaintext = b"Hello, World!";

        let ciphertext = enc.encrypt(plaintext, &nonce(), ASSOCIATED_DATA).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LENGTH);

        let decrypted = enc.decrypt(&ciphertext, &nonce(), ASSOCIATED_DATA).unwrap();
        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_decrypt_rejects_wrong_aad_and_short_input() {
        let enc = AesGcmEncryption::new(&BlockCipherKey::new([0x42; 16]));
        let ciphertext = enc.encrypt(b"payload", &nonce(), ASSOCIATED_DATA).unwrap();

        let err = enc.decrypt(&ciphertext, &nonce(), b"").unwrap_err();
        assert!(matches!(err, MeterError::Auth(_)));

        let err = enc.decrypt(&ciphertext[..TAG_LENGTH - 1], &nonce(), ASSOCIATED_DATA).unwrap_err();
        assert!(matches!(err, MeterError::Format(_)));
    }

    #[test]
    fn test_encrypt_matches_known_vector() {
        let enc = AesGcmEncryption::new(&BlockCipherKey::from_hex(KEY).unwrap());
        let nonce = Nonce::new(
            &SystemTitle::new([0x4B, 0x46, 0x4D, 0x67, 0x00, 0x00, 0x12, 0x34]),
            FrameCounter::new(0x0102_0304),
        );
        let plaintext = [0x0F, 0x00, 0x00, 0x00, 0x01, 0x00];
        let expected = hex::decode("49F504C46A2BBACFA43D6C2C597CF35D2C74").unwrap();

        assert_eq!(enc.encrypt(&plaintext, &nonce, ASSOCIATED_DATA).unwrap(), expected);
        assert_eq!(enc.decrypt(&expected, &nonce, ASSOCIATED_DATA).unwrap(), plaintext);
    }
}
