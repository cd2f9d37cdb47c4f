//! S1AP Error Types

use ogs_core::PkbufError;
use thiserror::Error;

/// S1AP Result type
pub type S1apResult<T> = Result<T, S1apError>;

/// S1AP Error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum S1apError {
    /// UE S1AP ID does not fit the 16-bit encoding
    #[error("{ie} {value} exceeds 0xffff")]
    UeIdOutOfRange { ie: &'static str, value: u32 },

    /// IE payload too long for its length field
    #[error("{ie} is {len} bytes, at most {max} allowed")]
    IeTooLong { ie: &'static str, len: usize, max: usize },

    /// PDU value too long for its length field
    #[error("PDU value is {len} bytes, at most {max} allowed")]
    ValueTooLong { len: usize, max: usize },

    /// Input ended early
    #[error("Buffer too short: expected {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    /// Declared length disagrees with the data
    #[error("Length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Not a Downlink NAS Transport initiating message
    #[error("Unexpected PDU: type {pdu_type}, procedure code {procedure_code}")]
    UnexpectedPdu { pdu_type: u8, procedure_code: u8 },

    /// Invalid criticality value
    #[error("Invalid criticality: {0}")]
    InvalidCriticality(u8),

    /// Missing or misplaced mandatory IE
    #[error("Missing mandatory IE: {0}")]
    MissingMandatoryIe(&'static str),

    /// Invalid IE value
    #[error("Invalid IE value for {ie_name}: {reason}")]
    InvalidIeValue { ie_name: &'static str, reason: String },

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(#[from] PkbufError),
}
