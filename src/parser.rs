use crate::nal::{split_header, SEI_NAL_TYPE};
use crate::rbsp;
use crate::sei::SeiMessage;
use crate::store::SeiStore;
use crate::varint;
use crate::{Error, Result};
use log::debug;

impl SeiStore {
    /// Parses one SEI NAL unit (header byte plus escaped body) into the
    /// store, returning the number of messages added.
    ///
    /// Timestamps are checked before anything is touched. Once parsing of
    /// the body has started, an error leaves the messages already taken from
    /// this unit in the store; each of them is complete on its own.
    pub fn parse_nalu(&mut self, nalu: &[u8], pts: f64, dts: f64) -> Result<usize> {
        let (nal_type, body) = split_header(nalu)?;
        if nal_type != SEI_NAL_TYPE {
            return Err(Error::NotSei(nal_type));
        }

        if pts.is_nan() || dts.is_nan() {
            return Err(Error::NanTimestamp);
        }
        if pts < dts {
            return Err(Error::PtsBeforeDts { pts, dts });
        }
        self.set_dts(dts)?;

        let mut rbsp = vec![0u8; body.len()];
        let rbsp_len = rbsp::unescape_into(body, &mut rbsp)?;
        rbsp.truncate(rbsp_len);

        let mut pos = 0;
        let mut count = 0;

        // the last byte is the stop bit, it is not checked
        while rbsp.len() - pos > 1 {
            let (payload_type, consumed) = varint::decode(&rbsp[pos..])?;
            pos += consumed;
            let (payload_size, consumed) = varint::decode(&rbsp[pos..])?;
            pos += consumed;

            let declared = payload_size as usize;
            let available = rbsp.len() - pos;
            if declared > available {
                debug!(
                    "SEI payload type {} truncated after {} messages",
                    payload_type, count
                );
                return Err(Error::TruncatedPayload {
                    declared,
                    available,
                });
            }

            if declared > 0 {
                let payload = rbsp[pos..pos + declared].to_vec();
                self.insert(SeiMessage::new(payload_type, payload, pts))?;
                count += 1;
            }
            pos += declared;
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_message() {
        let mut store = SeiStore::new();
        let count = store
            .parse_nalu(&[0x06, 0x04, 0x02, 0xAB, 0xCD, 0x80], 1.0, 1.0)
            .unwrap();

        assert_eq!(count, 1);
        let msg = store.peek_oldest().unwrap();
        assert_eq!(msg.payload_type(), 4);
        assert_eq!(msg.size(), 2);
        assert_eq!(msg.payload(), &[0xAB, 0xCD]);
        assert_eq!(store.dts(), Some(1.0));
    }

    #[test]
    fn test_parse_rejects_non_sei() {
        let mut store = SeiStore::new();
        let err = store.parse_nalu(&[0x67, 0x42, 0x00], 0.0, 0.0).unwrap_err();
        assert_eq!(err, Error::NotSei(7));
        assert!(store.is_empty());
        assert_eq!(store.dts(), None);
    }

    #[test]
    fn test_parse_rejects_dts_regression() {
        let mut store = SeiStore::new();
        store.set_dts(2.0).unwrap();
        let err = store
            .parse_nalu(&[0x06, 0x04, 0x01, 0xAB, 0x80], 2.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::DtsRegression { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_parse_rejects_pts_before_dts() {
        let mut store = SeiStore::new();
        let err = store
            .parse_nalu(&[0x06, 0x04, 0x01, 0xAB, 0x80], 1.0, 2.0)
            .unwrap_err();
        assert!(matches!(err, Error::PtsBeforeDts { .. }));
        assert_eq!(store.dts(), None);
    }

    #[test]
    fn test_parse_rejects_nan_timestamps() {
        let mut store = SeiStore::new();
        let nalu = [0x06, 0x04, 0x01, 0xAB, 0x80];
        assert_eq!(
            store.parse_nalu(&nalu, f64::NAN, 0.0).unwrap_err(),
            Error::NanTimestamp
        );
        assert_eq!(
            store.parse_nalu(&nalu, 1.0, f64::NAN).unwrap_err(),
            Error::NanTimestamp
        );
        assert_eq!(store.dts(), None);
    }

    #[test]
    fn test_parse_truncated_keeps_earlier_messages() {
        let mut store = SeiStore::new();
        let nalu = [0x06, 0x05, 0x01, 0x11, 0x04, 0x08, 0xAB];
        let err = store.parse_nalu(&nalu, 0.0, 0.0).unwrap_err();

        assert_eq!(
            err,
            Error::TruncatedPayload {
                declared: 8,
                available: 1
            }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.peek_oldest().unwrap().payload(), &[0x11]);
    }

    #[test]
    fn test_parse_truncated_header() {
        let mut store = SeiStore::new();
        let err = store.parse_nalu(&[0x06, 0xFF, 0xFF], 0.0, 0.0).unwrap_err();
        assert_eq!(err, Error::UnexpectedEof);
    }

    #[test]
    fn test_parse_unescapes_payload() {
        let mut store = SeiStore::new();
        let nalu = [0x06, 0x05, 0x03, 0x00, 0x00, 0x03, 0x01, 0x80];
        store.parse_nalu(&nalu, 0.0, 0.0).unwrap();
        assert_eq!(store.peek_oldest().unwrap().payload(), &[0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_parse_without_stop_bit() {
        let mut store = SeiStore::new();
        let count = store.parse_nalu(&[0x06, 0x04, 0x01, 0xAB], 0.0, 0.0).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_parse_multiple_messages_and_long_type() {
        let mut store = SeiStore::new();
        let nalu = [0x06, 0xFF, 0x05, 0x01, 0x22, 0x05, 0x01, 0x11, 0x80];
        assert_eq!(store.parse_nalu(&nalu, 0.0, 0.0).unwrap(), 2);

        let types: Vec<u32> = store.iter().map(|m| m.payload_type()).collect();
        assert_eq!(types, vec![260, 5]);
    }
}
