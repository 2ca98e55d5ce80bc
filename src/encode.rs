use crate::cea708::{Cea708, CcType};
use crate::eia608::{self, Control, DEFAULT_CHANNEL, EXTENDED_FALLBACK, SCREEN_COLS, SCREEN_ROWS};
use crate::frame::CaptionFrame;
use crate::sei::{SeiMessage, USER_DATA_REGISTERED_ITU_T_T35};
use crate::store::SeiStore;
use crate::Result;
use log::debug;

// Sent first so a decoder joining at this caption starts from a clean state.
const RESET_SEQUENCE: [Control; 5] = [
    Control::ResumeCaptionLoading,
    Control::ResumeCaptionLoading,
    Control::EraseDisplayMemory,
    Control::EndOfCaption,
    Control::ResumeCaptionLoading,
];

/// Open accumulator plus the messages already filled. Every accumulator
/// after the first opens with resume-caption-loading so each message can be
/// decoded on its own.
struct ChainWriter {
    pts: f64,
    cea708: Cea708,
    messages: Vec<SeiMessage>,
}

impl ChainWriter {
    fn new(pts: f64) -> Self {
        let mut cea708 = Cea708::new();
        for control in RESET_SEQUENCE {
            cea708.add_cc_data(
                true,
                CcType::NtscField1,
                eia608::control_command(control, DEFAULT_CHANNEL),
            );
        }

        Self {
            pts,
            cea708,
            messages: Vec::new(),
        }
    }

    fn push(&mut self, cc_data: u16) {
        if self.cea708.is_full() {
            self.flush();
        }

        if self.cea708.cc_count() == 0 {
            self.cea708.add_cc_data(
                true,
                CcType::NtscField1,
                eia608::control_command(Control::ResumeCaptionLoading, DEFAULT_CHANNEL),
            );
        }

        self.cea708.add_cc_data(true, CcType::NtscField1, cc_data);
    }

    // Renders the open accumulator into a message and starts a new one.
    fn flush(&mut self) {
        let cea708 = std::mem::take(&mut self.cea708);
        self.messages.push(SeiMessage::new(
            USER_DATA_REGISTERED_ITU_T_T35,
            cea708.render(),
            self.pts,
        ));
    }

    /// Character codes go through a one-code lookback so two basic
    /// characters share a pair.
    fn push_char(&mut self, pending: &mut Option<u16>, code: u16) {
        match pending.take() {
            Some(prev) if eia608::is_basicna(code) => self.push(eia608::from_basicna(prev, code)),
            Some(prev) => {
                self.push(prev);
                self.push(code);
            }
            None if eia608::is_basicna(code) => *pending = Some(code),
            None => self.push(code),
        }
    }

    fn finish(mut self) -> Vec<SeiMessage> {
        self.flush();
        self.messages
    }
}

impl SeiStore {
    /// Replaces the store content with the pop-on encoding of the displayed
    /// rows of `frame`, and moves dts to the frame timestamp.
    ///
    /// Fails without touching the store if the frame timestamp is before
    /// the current dts.
    pub fn from_caption_frame(&mut self, frame: &CaptionFrame) -> Result<()> {
        self.set_dts(frame.timestamp())?;

        let mut writer = ChainWriter::new(frame.timestamp());

        for row in 0..SCREEN_ROWS {
            let cells: Vec<Option<char>> =
                (0..SCREEN_COLS).map(|col| frame.read_char(row, col)).collect();

            let Some(first) = cells.iter().position(Option::is_some) else {
                continue;
            };
            let last = cells.iter().rposition(Option::is_some).unwrap_or(first);

            writer.push(eia608::row_column_preamble(row, first, DEFAULT_CHANNEL, false));
            let offset = first % 4;
            if offset != 0 {
                writer.push(eia608::tab(offset as u8, DEFAULT_CHANNEL));
            }

            let mut pending = None;
            for cell in &cells[first..=last] {
                let ch = cell.unwrap_or(' ');
                let Some(code) = eia608::from_char(ch, DEFAULT_CHANNEL) else {
                    debug!("dropping {:?} at row {}, no EIA-608 code", ch, row);
                    continue;
                };

                if eia608::is_westeu(code) {
                    if let Some(fallback) = eia608::from_char(EXTENDED_FALLBACK, DEFAULT_CHANNEL) {
                        writer.push_char(&mut pending, fallback);
                    }
                }
                writer.push_char(&mut pending, code);
            }

            if let Some(code) = pending {
                writer.push(code);
            }
        }

        writer.push(eia608::control_command(Control::EndOfCaption, DEFAULT_CHANNEL));
        self.replace_messages(writer.finish());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eia608::{control_command, from_basicna, from_char, row_column_preamble, tab};

    fn pairs(msg: &SeiMessage) -> Vec<u16> {
        Cea708::parse(msg.payload())
            .unwrap()
            .iter()
            .map(|cc| cc.data)
            .collect()
    }

    fn reset() -> Vec<u16> {
        RESET_SEQUENCE
            .iter()
            .map(|&c| control_command(c, DEFAULT_CHANNEL))
            .collect()
    }

    #[test]
    fn test_blank_frame() {
        let mut store = SeiStore::new();
        store.from_caption_frame(&CaptionFrame::new()).unwrap();

        assert_eq!(store.len(), 1);
        let mut expected = reset();
        expected.push(control_command(Control::EndOfCaption, 0));
        assert_eq!(pairs(store.peek_oldest().unwrap()), expected);
    }

    #[test]
    fn test_row_at_column_zero() {
        let mut frame = CaptionFrame::new();
        frame.set_char(0, 0, Some('H'));
        frame.set_char(0, 1, Some('i'));
        frame.set_char(0, 2, Some('!'));

        let mut store = SeiStore::new();
        store.from_caption_frame(&frame).unwrap();

        let mut expected = reset();
        expected.extend([
            row_column_preamble(0, 0, 0, false),
            from_basicna(from_char('H', 0).unwrap(), from_char('i', 0).unwrap()),
            from_char('!', 0).unwrap(),
            control_command(Control::EndOfCaption, 0),
        ]);
        assert_eq!(pairs(store.peek_oldest().unwrap()), expected);
    }

    #[test]
    fn test_tab_offset() {
        let mut frame = CaptionFrame::new();
        frame.set_char(3, 6, Some('x'));

        let mut store = SeiStore::new();
        store.from_caption_frame(&frame).unwrap();

        let codes = pairs(store.peek_oldest().unwrap());
        assert_eq!(codes[5], row_column_preamble(3, 4, 0, false));
        assert_eq!(codes[6], tab(2, 0));
        assert_eq!(codes[7], from_char('x', 0).unwrap());
    }

    #[test]
    fn test_special_char_breaks_pairing() {
        let mut frame = CaptionFrame::new();
        for (col, ch) in "a♪b".chars().enumerate() {
            frame.set_char(0, col, Some(ch));
        }

        let mut store = SeiStore::new();
        store.from_caption_frame(&frame).unwrap();

        let codes = pairs(store.peek_oldest().unwrap());
        assert_eq!(
            &codes[6..9],
            &[
                from_char('a', 0).unwrap(),
                from_char('♪', 0).unwrap(),
                from_char('b', 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_unmappable_dropped() {
        let mut frame = CaptionFrame::new();
        frame.set_char(0, 0, Some('\u{4e2d}'));
        frame.set_char(0, 1, Some('o'));
        frame.set_char(0, 2, Some('k'));

        let mut store = SeiStore::new();
        store.from_caption_frame(&frame).unwrap();

        let codes = pairs(store.peek_oldest().unwrap());
        assert_eq!(
            codes[6],
            from_basicna(from_char('o', 0).unwrap(), from_char('k', 0).unwrap())
        );
    }

    #[test]
    fn test_chaining() {
        let mut frame = CaptionFrame::new();
        for row in 0..4 {
            for col in 0..SCREEN_COLS {
                frame.set_char(row, col, Some('z'));
            }
        }

        let mut store = SeiStore::new();
        store.from_caption_frame(&frame).unwrap();

        // 5 reset + 4 * (preamble + 16 pairs) + eoc = 74, plus a resume at
        // the start of each later message
        let counts: Vec<usize> = store.iter().map(|m| pairs(m).len()).collect();
        assert_eq!(counts, vec![31, 31, 14]);

        for msg in store.iter().skip(1) {
            assert_eq!(
                pairs(msg)[0],
                control_command(Control::ResumeCaptionLoading, 0)
            );
        }
    }

    #[test]
    fn test_sets_dts_and_pts() {
        let mut store = SeiStore::new();
        let frame = CaptionFrame::from_text("hello", 4.0);
        store.from_caption_frame(&frame).unwrap();
        assert_eq!(store.dts(), Some(4.0));
        assert!(store.iter().all(|m| m.pts() == 4.0 && m.payload_type() == 4));

        let earlier = CaptionFrame::from_text("bye", 3.0);
        assert!(store.from_caption_frame(&earlier).is_err());
        assert_eq!(store.dts(), Some(4.0));
    }
}
