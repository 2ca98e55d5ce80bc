use crate::cea708::{Cea708, CcType};
use crate::frame::{CaptionFrame, DecodeStatus};
use crate::sei::SeiPayloadType;
use crate::store::SeiStore;
use log::debug;

impl SeiStore {
    /// Feeds every valid field 1 caption pair in the store, oldest message
    /// first, into `frame`.
    ///
    /// Returns [`DecodeStatus::Ready`] if any pair completed a caption.
    /// Messages that are not caption user data, or whose payload does not
    /// parse, are skipped.
    pub fn to_caption_frame(&self, frame: &mut CaptionFrame) -> DecodeStatus {
        let mut status = DecodeStatus::Ok;

        for msg in self.iter() {
            if msg.kind() != SeiPayloadType::UserDataRegisteredItuTT35 {
                continue;
            }

            let cea708 = match Cea708::parse(msg.payload()) {
                Ok(cea708) => cea708,
                Err(e) => {
                    debug!("skipping SEI message at pts {}: {}", msg.pts(), e);
                    continue;
                }
            };

            for cc in cea708.iter() {
                if !cc.valid || cc.cc_type != CcType::NtscField1 {
                    continue;
                }
                if frame.decode(cc.data, msg.pts()) == DecodeStatus::Ready {
                    status = DecodeStatus::Ready;
                }
            }
        }

        status
    }
}
