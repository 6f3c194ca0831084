use std::num::ParseIntError;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong outside of the generation hot path.
///
/// Generating an id never fails; these errors come from construction,
/// decoding and the JSON wire format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Node identity does not fit the configured node field.
    #[error("node number must be between 0 and {max}, got {node}")]
    NodeOutOfRange { node: i64, max: i64 },

    /// Machine identity does not fit the dual-mode machine field.
    #[error("machine id must be between 0 and {max}, got {machine}")]
    MachineOutOfRange { machine: u64, max: u64 },

    /// Node and step widths leave no room for the timestamp.
    #[error("node bits ({node_bits}) + step bits ({step_bits}) must not exceed 62")]
    InvalidLayout { node_bits: u8, step_bits: u8 },

    /// Epoch too far from 1970 to be represented.
    #[error("epoch {epoch} ms is out of range")]
    EpochOutOfRange { epoch: i64 },

    /// The current time no longer fits the timestamp field.
    #[error("{elapsed} ms since the epoch does not fit in {time_bits} timestamp bits")]
    TimestampOverflow { elapsed: i64, time_bits: u8 },

    #[error("invalid base32")]
    InvalidBase32,

    #[error("invalid base58")]
    InvalidBase58,

    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// Digits (in any base) that are malformed or do not fit in 64 bits.
    #[error("invalid {base} digits: {reason}")]
    InvalidDigits { base: u32, reason: String },

    /// Decoded value does not fit in 64 bits.
    #[error("decoded value overflows 64 bits")]
    Overflow,

    /// The raw bytes were not a quoted JSON string.
    #[error("invalid snowflake ID {:?}", String::from_utf8_lossy(.0))]
    JsonSyntax(Vec<u8>),

    /// Correctly quoted, but not a base-10 signed 64-bit integer.
    #[error(transparent)]
    JsonParse(#[from] ParseIntError),

    #[error("rendered id exceeds {max} bytes")]
    JsonTooLarge { max: usize },
}
