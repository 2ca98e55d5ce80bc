use crate::nal::{RBSP_STOP, SEI_NAL_TYPE};
use crate::rbsp;
use crate::store::SeiStore;
use crate::varint;
use crate::{Error, Result};

impl SeiStore {
    /// Writes the store as one SEI NAL unit: header byte, then every message
    /// as `payloadType`, `payloadSize` and payload, escaped together, then
    /// the stop byte. Returns the bytes written.
    ///
    /// `dst` should hold at least [`SeiStore::estimate_render_size`] bytes;
    /// a smaller buffer fails with [`Error::BufferTooSmall`] rather than
    /// being overrun.
    pub fn render_into(&self, dst: &mut [u8]) -> Result<usize> {
        let capacity = dst.len();
        if capacity < 2 {
            return Err(Error::BufferTooSmall { capacity });
        }

        let mut body = Vec::new();
        for msg in self.iter() {
            varint::encode(msg.payload_type(), &mut body);
            varint::encode(msg.size() as u32, &mut body);
            body.extend_from_slice(msg.payload());
        }

        dst[0] = SEI_NAL_TYPE;
        let escaped = rbsp::escape_into(&body, &mut dst[1..capacity - 1])
            .map_err(|_| Error::BufferTooSmall { capacity })?;
        dst[1 + escaped] = RBSP_STOP;

        Ok(escaped + 2)
    }

    pub fn render(&self) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.estimate_render_size()];
        let size = self.render_into(&mut data)?;
        data.truncate(size);
        Ok(data)
    }
}
