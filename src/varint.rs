//! `payloadType` / `payloadSize` fields of an SEI message: a run of `0xFF`
//! bytes, each worth 255, followed by a final byte below 255.

use crate::{Error, Result};

/// Reads one field from the front of `data`, returning the value and the
/// number of bytes consumed.
pub fn decode(data: &[u8]) -> Result<(u32, usize)> {
    let mut value = 0u32;

    for (i, &byte) in data.iter().enumerate() {
        value = value.saturating_add(byte as u32);
        if byte != 0xFF {
            return Ok((value, i + 1));
        }
    }

    Err(Error::UnexpectedEof)
}

pub fn encoded_len(value: u32) -> usize {
    value as usize / 255 + 1
}

pub fn encode(value: u32, out: &mut Vec<u8>) {
    let ff_count = value as usize / 255;
    out.reserve(ff_count + 1);
    out.extend(std::iter::repeat(0xFF).take(ff_count));
    out.push((value % 255) as u8);
}
