//! Security layer for the meter readout
//!
//! Extracts the encrypted payload from a frame pair, derives the GCM nonce
//! from the clear-text header and authenticates and decrypts it with the
//! pre-shared block cipher key.

pub mod encryption;
pub mod error;
pub mod sealer;
pub mod unpack;
pub mod xdlms;

pub use encryption::{AesGcmEncryption, BlockCipherKey, ASSOCIATED_DATA, TAG_LENGTH};
pub use error::{MeterError, MeterResult};
pub use sealer::FrameSealer;
pub use unpack::{CipherUnpacker, CiphertextBundle, FrameHeader, Pdu};
pub use xdlms::{FrameCounter, Nonce, SystemTitle};
