//! Emulation prevention for NAL unit payloads.
//!
//! Inside a NAL unit the byte pattern `00 00 0x` with `x <= 3` must never
//! appear, so encoders insert an `0x03` after every pair of zero bytes that
//! would otherwise be followed by such a byte. [`escape`] performs that
//! insertion and [`unescape`] removes it again.

use crate::{Error, Result};

pub const EMULATION_PREVENTION_BYTE: u8 = 0x03;

/// Upper bound on the escaped length of `len` raw bytes.
///
/// The worst case is a run of zeros, which gains one byte for every two
/// input bytes.
pub fn max_escaped_len(len: usize) -> usize {
    len + (len + 1) / 2
}

// Feeds the unescaped form of `src` to `emit`, stopping early if it refuses
// a byte. Returns false on early stop.
fn unescape_with(src: &[u8], mut emit: impl FnMut(u8) -> bool) -> bool {
    let mut zero_count = 0;

    for &byte in src {
        if zero_count >= 2 && byte == EMULATION_PREVENTION_BYTE {
            zero_count = 0;
            continue;
        }

        if !emit(byte) {
            return false;
        }

        if byte == 0x00 {
            zero_count += 1;
        } else {
            zero_count = 0;
        }
    }

    true
}

/// Copies `src` into `dst`, dropping the `03` of every `00 00 03` marker.
///
/// Returns the number of bytes written. Running out of room in `dst` before
/// all of `src` has been consumed means the caller sized the destination for
/// a shorter payload than the source holds, and is reported as
/// [`Error::BufferTooSmall`].
pub fn unescape_into(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let capacity = dst.len();

    if src.len() < 3 {
        if capacity < src.len() {
            return Err(Error::BufferTooSmall { capacity });
        }
        dst[..src.len()].copy_from_slice(src);
        return Ok(src.len());
    }

    let mut written = 0;
    let complete = unescape_with(src, |byte| {
        if written == capacity {
            return false;
        }
        dst[written] = byte;
        written += 1;
        true
    });

    if complete {
        Ok(written)
    } else {
        Err(Error::BufferTooSmall { capacity })
    }
}

pub fn unescape(src: &[u8]) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(src.len());
    unescape_with(src, |byte| {
        rbsp.push(byte);
        true
    });
    rbsp
}

// Feeds the escaped form of `raw` to `emit`, stopping early if it refuses a
// byte. Returns false on early stop.
fn escape_with(raw: &[u8], mut emit: impl FnMut(u8) -> bool) -> bool {
    let mut zero_count = 0;

    for &byte in raw {
        if zero_count == 2 && byte <= 0x03 {
            if !emit(EMULATION_PREVENTION_BYTE) {
                return false;
            }
            zero_count = 0;
        }

        if !emit(byte) {
            return false;
        }

        if byte == 0x00 {
            zero_count += 1;
        } else {
            zero_count = 0;
        }
    }

    true
}

pub fn escape(raw: &[u8]) -> Vec<u8> {
    let mut ebsp = Vec::with_capacity(raw.len() + raw.len() / 3);
    escape_with(raw, |byte| {
        ebsp.push(byte);
        true
    });
    ebsp
}

/// Escapes `raw` into `dst`, returning the number of bytes written.
///
/// Fails without writing past `dst` if the escaped form does not fit; size
/// `dst` with [`max_escaped_len`] to rule that out.
pub fn escape_into(raw: &[u8], dst: &mut [u8]) -> Result<usize> {
    let capacity = dst.len();
    let mut written = 0;

    let complete = escape_with(raw, |byte| {
        if written == capacity {
            return false;
        }
        dst[written] = byte;
        written += 1;
        true
    });

    if complete {
        Ok(written)
    } else {
        Err(Error::BufferTooSmall { capacity })
    }
}
