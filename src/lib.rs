pub mod cea708;
pub mod decode;
pub mod eia608;
pub mod encode;
pub mod frame;
pub mod nal;
pub mod parser;
pub mod rbsp;
pub mod render;
pub mod sei;
pub mod store;
pub mod varint;

pub use cea708::{Cea708, CcType};
pub use frame::{CaptionFrame, DecodeStatus};
pub use sei::{SeiMessage, SeiPayloadType};
pub use store::SeiStore;

/// Broad category of an [`Error`], used by callers to decide whether to drop
/// the current unit, resynchronize timestamps, or just skip a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    ProtocolInvariantViolation,
    UnsupportedPayload,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid NAL header")]
    InvalidNalHeader,
    #[error("NAL unit type {0} is not SEI")]
    NotSei(u8),
    #[error("Unexpected end of data")]
    UnexpectedEof,
    #[error("SEI payload truncated: declared {declared} bytes, {available} available")]
    TruncatedPayload { declared: usize, available: usize },
    #[error("Destination buffer too small: capacity {capacity}")]
    BufferTooSmall { capacity: usize },
    #[error("Timestamp is NaN")]
    NanTimestamp,
    #[error("Decode time moved backward: {dts} after {last}")]
    DtsRegression { last: f64, dts: f64 },
    #[error("Presentation time {pts} precedes decode time {dts}")]
    PtsBeforeDts { pts: f64, dts: f64 },
    #[error("Malformed CEA-708 user data: {0}")]
    MalformedCea708(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidNalHeader
            | Error::NotSei(_)
            | Error::UnexpectedEof
            | Error::TruncatedPayload { .. }
            | Error::BufferTooSmall { .. } => ErrorKind::MalformedInput,
            Error::NanTimestamp | Error::DtsRegression { .. } | Error::PtsBeforeDts { .. } => {
                ErrorKind::ProtocolInvariantViolation
            }
            Error::MalformedCea708(_) => ErrorKind::UnsupportedPayload,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
