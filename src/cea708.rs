//! ATSC A/53 caption user data as carried in an ITU-T T.35 SEI payload.
//!
//! ```text
//! country_code(0xB5) provider_code(0x0031) user_identifier("GA94")
//! user_data_type_code(0x03) flags|cc_count em_data(0xFF)
//! cc_count * { marker|cc_valid|cc_type  cc_data_1  cc_data_2 }
//! marker_bits(0xFF)
//! ```

use crate::{Error, Result};

pub const MAX_CC_COUNT: usize = 31;

const COUNTRY_CODE_US: u8 = 0xB5;
const PROVIDER_CODE_ATSC: u16 = 0x0031;
const USER_IDENTIFIER_GA94: &[u8; 4] = b"GA94";
const USER_DATA_TYPE_CC: u8 = 0x03;
const PROCESS_CC_DATA_FLAG: u8 = 0x40;
const MARKER_BITS: u8 = 0xFF;

/// Size of a rendered payload holding a full set of pairs.
pub const MAX_RENDER_SIZE: usize = 3 + 4 + 1 + 2 + MAX_CC_COUNT * 3 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcType {
    NtscField1,
    NtscField2,
    DtvccPacketData,
    DtvccPacketStart,
}

impl CcType {
    fn as_u8(&self) -> u8 {
        match self {
            Self::NtscField1 => 0,
            Self::NtscField2 => 1,
            Self::DtvccPacketData => 2,
            Self::DtvccPacketStart => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::NtscField1,
            1 => Self::NtscField2,
            2 => Self::DtvccPacketData,
            _ => Self::DtvccPacketStart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcData {
    pub valid: bool,
    pub cc_type: CcType,
    pub data: u16,
}

/// Accumulator for up to [`MAX_CC_COUNT`] caption pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cea708 {
    cc: Vec<CcData>,
}

impl Cea708 {
    pub fn new() -> Self {
        Self {
            cc: Vec::with_capacity(MAX_CC_COUNT),
        }
    }

    pub fn cc_count(&self) -> usize {
        self.cc.len()
    }

    pub fn is_full(&self) -> bool {
        self.cc.len() >= MAX_CC_COUNT
    }

    /// Appends a pair, returning false if the accumulator is already full.
    pub fn add_cc_data(&mut self, valid: bool, cc_type: CcType, data: u16) -> bool {
        if self.is_full() {
            return false;
        }
        self.cc.push(CcData {
            valid,
            cc_type,
            data,
        });
        true
    }

    pub fn cc_data(&self, index: usize) -> Option<CcData> {
        self.cc.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CcData> {
        self.cc.iter()
    }

    pub fn render(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(MAX_RENDER_SIZE);
        data.push(COUNTRY_CODE_US);
        data.extend_from_slice(&PROVIDER_CODE_ATSC.to_be_bytes());
        data.extend_from_slice(USER_IDENTIFIER_GA94);
        data.push(USER_DATA_TYPE_CC);
        data.push(PROCESS_CC_DATA_FLAG | self.cc.len() as u8);
        data.push(0xFF); // em_data

        for cc in &self.cc {
            data.push(0xF8 | (cc.valid as u8) << 2 | cc.cc_type.as_u8());
            data.extend_from_slice(&cc.data.to_be_bytes());
        }

        data.push(MARKER_BITS);
        data
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 10 {
            return Err(Error::MalformedCea708(format!(
                "{} bytes is shorter than the header",
                data.len()
            )));
        }

        if data[0] != COUNTRY_CODE_US {
            return Err(Error::MalformedCea708(format!(
                "country code {:#04x}",
                data[0]
            )));
        }

        let provider = u16::from_be_bytes([data[1], data[2]]);
        if provider != PROVIDER_CODE_ATSC {
            return Err(Error::MalformedCea708(format!(
                "provider code {:#06x}",
                provider
            )));
        }

        if &data[3..7] != USER_IDENTIFIER_GA94 {
            return Err(Error::MalformedCea708("missing GA94 identifier".into()));
        }

        if data[7] != USER_DATA_TYPE_CC {
            return Err(Error::MalformedCea708(format!(
                "user data type {:#04x}",
                data[7]
            )));
        }

        let cc_count = (data[8] & 0x1F) as usize;
        let triples = &data[10..];
        if triples.len() < cc_count * 3 {
            return Err(Error::MalformedCea708(format!(
                "{} cc pairs declared, {} bytes available",
                cc_count,
                triples.len()
            )));
        }

        let cc = triples
            .chunks_exact(3)
            .take(cc_count)
            .map(|t| CcData {
                valid: t[0] & 0x04 != 0,
                cc_type: CcType::from_bits(t[0]),
                data: u16::from_be_bytes([t[1], t[2]]),
            })
            .collect();

        Ok(Self { cc })
    }
}
