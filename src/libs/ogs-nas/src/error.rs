//! NAS error types

use ogs_core::PkbufError;
use thiserror::Error;

/// NAS error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NasError {
    /// Buffer too short for decoding
    #[error("Buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// Invalid message type
    #[error("Invalid message type: {0:#04x}")]
    InvalidMessageType(u8),

    /// Invalid protocol discriminator
    #[error("Invalid protocol discriminator: {0}")]
    InvalidProtocolDiscriminator(u8),

    /// Invalid security header type
    #[error("Invalid security header type: {0}")]
    InvalidSecurityHeaderType(u8),

    /// Unknown NAS security algorithm identifier
    #[error("Invalid NAS security algorithm: {0}")]
    InvalidAlgorithm(u8),

    /// Received MAC does not match the recomputed one
    #[error("MAC verification failed: received {received:02x?}, expected {expected:02x?}")]
    MacVerificationFailed { received: [u8; 4], expected: [u8; 4] },

    /// IE value longer than its length octet can carry
    #[error("Invalid IE length: {ie} is {len} bytes, at most {max} allowed")]
    IeTooLong { ie: &'static str, len: usize, max: usize },

    /// Encoding error
    #[error("Encoding error: {0}")]
    EncodingError(#[from] PkbufError),
}

/// NAS result type
pub type NasResult<T> = Result<T, NasError>;
