use crate::{Error, Result};

/// `nal_unit_type` of an SEI NAL unit.
pub const SEI_NAL_TYPE: u8 = 6;

/// Trailing `rbsp_stop_one_bit` plus alignment zeros.
pub const RBSP_STOP: u8 = 0x80;

/// Splits a NAL unit into its `nal_unit_type` and the still-escaped body.
///
/// Only the low five bits of the header are inspected; `forbidden_zero_bit`
/// and `nal_ref_idc` are not validated.
pub fn split_header(nalu: &[u8]) -> Result<(u8, &[u8])> {
    match nalu.split_first() {
        Some((&header, body)) => Ok((header & 0x1F, body)),
        None => Err(Error::InvalidNalHeader),
    }
}
