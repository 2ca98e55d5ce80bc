use std::fmt;

/// `payloadType` of an ITU-T T.35 registered user data message, the carrier
/// of ATSC caption data.
pub const USER_DATA_REGISTERED_ITU_T_T35: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeiPayloadType {
    UserDataRegisteredItuTT35,
    Other(u32),
}

impl SeiPayloadType {
    pub fn as_u32(&self) -> u32 {
        match self {
            Self::UserDataRegisteredItuTT35 => USER_DATA_REGISTERED_ITU_T_T35,
            Self::Other(v) => *v,
        }
    }
}

impl From<u32> for SeiPayloadType {
    fn from(value: u32) -> Self {
        match value {
            USER_DATA_REGISTERED_ITU_T_T35 => Self::UserDataRegisteredItuTT35,
            v => Self::Other(v),
        }
    }
}

/// One SEI message with its payload already stripped of emulation
/// prevention bytes. Messages are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SeiMessage {
    payload_type: u32,
    pts: f64,
    payload: Vec<u8>,
}

impl SeiMessage {
    pub fn new(payload_type: u32, payload: Vec<u8>, pts: f64) -> Self {
        Self {
            payload_type,
            pts,
            payload,
        }
    }

    pub fn payload_type(&self) -> u32 {
        self.payload_type
    }

    pub fn kind(&self) -> SeiPayloadType {
        SeiPayloadType::from(self.payload_type)
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn pts(&self) -> f64 {
        self.pts
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl fmt::Display for SeiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type {} size {} pts {:.3}:",
            self.payload_type,
            self.payload.len(),
            self.pts
        )?;
        for byte in &self.payload {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}
