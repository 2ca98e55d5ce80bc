use afl::*;

use sei_caption::{CaptionFrame, SeiStore};

fn main() {
    fuzz!(|data: &[u8]|{
        let mut store = SeiStore::new();
        let _ = store.parse_nalu(data, 0.0, 0.0);

        // whatever was accepted must render and decode without panicking
        let _ = store.render();
        let mut frame = CaptionFrame::new();
        store.to_caption_frame(&mut frame);
    })
}
