use crate::rbsp::max_escaped_len;
use crate::sei::SeiMessage;
use crate::varint;
use crate::{Error, Result};
use log::{debug, warn};

/// SEI messages of one stream, kept in presentation order, together with
/// the most recent decode time seen on that stream.
///
/// A message may only be inserted if its pts is not before the current dts,
/// and the dts itself never moves backward until [`SeiStore::clear`].
#[derive(Debug, Clone, Default)]
pub struct SeiStore {
    messages: Vec<SeiMessage>,
    dts: Option<f64>,
}

impl SeiStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            dts: None,
        }
    }

    pub fn dts(&self) -> Option<f64> {
        self.dts
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SeiMessage> {
        self.messages.iter()
    }

    pub fn set_dts(&mut self, dts: f64) -> Result<()> {
        if dts.is_nan() {
            warn!("rejecting NaN decode time after {:?}", self.dts);
            return Err(Error::NanTimestamp);
        }

        if let Some(last) = self.dts {
            if dts < last {
                warn!("rejecting decode time {} after {}", dts, last);
                return Err(Error::DtsRegression { last, dts });
            }
        }

        self.dts = Some(dts);
        Ok(())
    }

    /// Inserts `msg` after every message with a pts less than or equal to
    /// its own.
    pub fn insert(&mut self, msg: SeiMessage) -> Result<()> {
        if msg.pts().is_nan() {
            warn!("rejecting message with NaN pts");
            return Err(Error::NanTimestamp);
        }

        let dts = self.dts.unwrap_or(f64::NEG_INFINITY);
        if msg.pts() < dts {
            warn!("rejecting message with pts {} before dts {}", msg.pts(), dts);
            return Err(Error::PtsBeforeDts {
                pts: msg.pts(),
                dts,
            });
        }

        let pos = self.messages.partition_point(|m| m.pts() <= msg.pts());
        self.messages.insert(pos, msg);
        Ok(())
    }

    pub fn peek_oldest(&self) -> Option<&SeiMessage> {
        self.messages.first()
    }

    /// Removes and returns the oldest message once it is due.
    ///
    /// A message whose pts is before the current dts is left in place and
    /// `None` is returned.
    pub fn take_oldest(&mut self) -> Option<SeiMessage> {
        let oldest = self.messages.first()?;

        if let Some(dts) = self.dts {
            if oldest.pts() < dts {
                warn!(
                    "oldest SEI message pts {} is before dts {}, holding it back",
                    oldest.pts(),
                    dts
                );
                return None;
            }
        }

        Some(self.messages.remove(0))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.dts = None;
    }

    /// Upper bound on the bytes [`SeiStore::render_into`] writes: the NAL
    /// header, the stop byte, and every message's fields at their worst-case
    /// escaped length.
    pub fn estimate_render_size(&self) -> usize {
        self.messages.iter().fold(2, |size, msg| {
            size + max_escaped_len(varint::encoded_len(msg.payload_type()))
                + max_escaped_len(varint::encoded_len(msg.size() as u32))
                + max_escaped_len(msg.size())
        })
    }

    /// Hex dump of every message to the debug log.
    pub fn dump(&self) {
        debug!("SEI store: {} messages, dts {:?}", self.messages.len(), self.dts);
        for msg in &self.messages {
            debug!("-- {}", msg);
        }
    }

    // Swaps in a freshly encoded chain. The caller has already moved dts to
    // the chain's pts.
    pub(crate) fn replace_messages(&mut self, messages: Vec<SeiMessage>) {
        self.messages = messages;
    }
}
