use crate::eia608::{self, Code, Control, DEFAULT_CHANNEL, SCREEN_COLS, SCREEN_ROWS};
use log::trace;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Ok,
    /// A caption was completed and is now on the displayed buffer.
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    PopOn,
    PaintOn,
    RollUp(usize),
}

type Grid = [[Option<char>; SCREEN_COLS]; SCREEN_ROWS];

const BLANK: Grid = [[None; SCREEN_COLS]; SCREEN_ROWS];

/// Caption screen with a displayed and a non-displayed buffer.
///
/// Pop-on captions are loaded into the non-displayed buffer and become
/// visible on end-of-caption. Paint-on and roll-up write straight to the
/// displayed buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFrame {
    front: Grid,
    back: Grid,
    timestamp: f64,
    mode: Mode,
    row: usize,
    // one past the last column means the cursor ran off the row
    col: usize,
    channel: u8,
    selected: bool,
    last_control: Option<u16>,
}

impl Default for CaptionFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptionFrame {
    pub fn new() -> Self {
        Self {
            front: BLANK,
            back: BLANK,
            timestamp: 0.0,
            mode: Mode::PopOn,
            row: SCREEN_ROWS - 1,
            col: 0,
            channel: DEFAULT_CHANNEL,
            selected: true,
            last_control: None,
        }
    }

    /// Lays `text` out left-aligned on the bottom rows, one row per line.
    /// Lines beyond the screen height or width are cut.
    pub fn from_text(text: &str, timestamp: f64) -> Self {
        let mut frame = Self::new();
        frame.timestamp = timestamp;

        let lines: Vec<&str> = text.lines().take(SCREEN_ROWS).collect();
        let first_row = SCREEN_ROWS - lines.len();
        for (i, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().take(SCREEN_COLS).enumerate() {
                frame.front[first_row + i][col] = Some(ch);
            }
        }
        frame
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: f64) {
        self.timestamp = timestamp;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Displayed content at `(row, col)`; `None` for blank or out of range.
    pub fn read_char(&self, row: usize, col: usize) -> Option<char> {
        self.front.get(row)?.get(col).copied().flatten()
    }

    pub fn set_char(&mut self, row: usize, col: usize, ch: Option<char>) {
        if row < SCREEN_ROWS && col < SCREEN_COLS {
            self.front[row][col] = ch;
        }
    }

    pub fn clear(&mut self) {
        self.front = BLANK;
        self.back = BLANK;
    }

    pub fn is_blank(&self) -> bool {
        self.front == BLANK
    }

    /// Text of one displayed row from its first to its last non-blank cell,
    /// blanks in between read as spaces.
    pub fn row_text(&self, row: usize) -> String {
        let Some(cells) = self.front.get(row) else {
            return String::new();
        };
        let first = cells.iter().position(Option::is_some);
        let last = cells.iter().rposition(Option::is_some);
        match (first, last) {
            (Some(first), Some(last)) => cells[first..=last]
                .iter()
                .map(|c| c.unwrap_or(' '))
                .collect(),
            _ => String::new(),
        }
    }

    /// Feeds one EIA-608 code pair received at `timestamp`.
    pub fn decode(&mut self, cc_data: u16, timestamp: f64) -> DecodeStatus {
        if !eia608::parity_ok(cc_data) {
            trace!("dropping {:04X} with bad parity", cc_data);
            return DecodeStatus::Ok;
        }

        let code = eia608::parse(cc_data);

        // control codes are sent twice, act on the first of a pair
        if eia608::is_control(cc_data) {
            if self.last_control == Some(cc_data) {
                self.last_control = None;
                return DecodeStatus::Ok;
            }
            self.last_control = Some(cc_data);
        } else {
            self.last_control = None;
        }

        match code {
            Code::Control(_, channel)
            | Code::Tab(_, channel)
            | Code::MidRow(channel)
            | Code::Special(_, channel)
            | Code::Extended(_, channel) => self.selected = channel == self.channel,
            Code::Preamble(p) => self.selected = p.channel == self.channel,
            Code::Padding | Code::Basic(..) | Code::Unknown => {}
        }

        if !self.selected {
            return DecodeStatus::Ok;
        }

        match code {
            Code::Control(control, _) => return self.control(control, timestamp),
            Code::Preamble(p) => {
                self.row = p.row;
                self.col = p.col;
            }
            Code::Tab(offset, _) => {
                self.col = (self.col + offset as usize).min(SCREEN_COLS - 1);
            }
            Code::MidRow(_) => self.write_char(' '),
            Code::Basic(first, second) => {
                self.write_char(first);
                if let Some(second) = second {
                    self.write_char(second);
                }
            }
            Code::Special(ch, _) => self.write_char(ch),
            Code::Extended(ch, _) => {
                self.col = self.col.saturating_sub(1);
                self.write_char(ch);
            }
            Code::Padding | Code::Unknown => {}
        }

        DecodeStatus::Ok
    }

    fn control(&mut self, control: Control, timestamp: f64) -> DecodeStatus {
        match control {
            Control::ResumeCaptionLoading => self.mode = Mode::PopOn,
            Control::ResumeDirectCaptioning => self.mode = Mode::PaintOn,
            Control::RollUp2 | Control::RollUp3 | Control::RollUp4 => {
                let rows = match control {
                    Control::RollUp2 => 2,
                    Control::RollUp3 => 3,
                    _ => 4,
                };
                if !matches!(self.mode, Mode::RollUp(_)) {
                    self.row = SCREEN_ROWS - 1;
                    self.col = 0;
                }
                self.mode = Mode::RollUp(rows);
            }
            Control::EraseDisplayMemory => self.front = BLANK,
            Control::EraseNonDisplayedMemory => self.back = BLANK,
            Control::EndOfCaption => {
                self.front = self.back;
                self.back = BLANK;
                self.timestamp = timestamp;
                return DecodeStatus::Ready;
            }
            Control::Backspace => {
                self.col = self.col.saturating_sub(1);
                let (row, col) = (self.row, self.col.min(SCREEN_COLS - 1));
                self.target()[row][col] = None;
            }
            Control::DeleteToEndOfRow => {
                let (row, col) = (self.row, self.col.min(SCREEN_COLS));
                for cell in &mut self.target()[row][col..] {
                    *cell = None;
                }
            }
            Control::CarriageReturn => {
                if let Mode::RollUp(rows) = self.mode {
                    self.roll_up(rows);
                    self.timestamp = timestamp;
                    return DecodeStatus::Ready;
                }
            }
            Control::AlarmOff
            | Control::AlarmOn
            | Control::FlashOn
            | Control::TextRestart
            | Control::ResumeTextDisplay => {}
        }

        DecodeStatus::Ok
    }

    fn roll_up(&mut self, rows: usize) {
        let base = self.row;
        let top = (base + 1).saturating_sub(rows);
        for row in top..base {
            self.front[row] = self.front[row + 1];
        }
        for row in 0..top {
            self.front[row] = [None; SCREEN_COLS];
        }
        self.front[base] = [None; SCREEN_COLS];
        self.col = 0;
    }

    fn target(&mut self) -> &mut Grid {
        match self.mode {
            Mode::PopOn => &mut self.back,
            Mode::PaintOn | Mode::RollUp(_) => &mut self.front,
        }
    }

    fn write_char(&mut self, ch: char) {
        let (row, col) = (self.row, self.col.min(SCREEN_COLS - 1));
        self.target()[row][col] = Some(ch);
        self.col = (col + 1).min(SCREEN_COLS);
    }
}

impl fmt::Display for CaptionFrame {
    /// Non-blank displayed rows, top to bottom, one per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for row in 0..SCREEN_ROWS {
            let text = self.row_text(row);
            if text.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            f.write_str(&text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eia608::{control_command, from_basicna, from_char, row_column_preamble, tab};

    fn feed(frame: &mut CaptionFrame, codes: &[u16]) -> DecodeStatus {
        let mut status = DecodeStatus::Ok;
        for &code in codes {
            if frame.decode(code, 1.0) == DecodeStatus::Ready {
                status = DecodeStatus::Ready;
            }
        }
        status
    }

    fn pair(a: char, b: char) -> u16 {
        from_basicna(from_char(a, 0).unwrap(), from_char(b, 0).unwrap())
    }

    #[test]
    fn test_pop_on() {
        let mut frame = CaptionFrame::new();
        let status = feed(
            &mut frame,
            &[
                control_command(Control::ResumeCaptionLoading, 0),
                row_column_preamble(14, 4, 0, false),
                tab(1, 0),
                pair('H', 'i'),
            ],
        );
        assert_eq!(status, DecodeStatus::Ok);
        assert!(frame.is_blank());

        let status = feed(&mut frame, &[control_command(Control::EndOfCaption, 0)]);
        assert_eq!(status, DecodeStatus::Ready);
        assert_eq!(frame.read_char(14, 5), Some('H'));
        assert_eq!(frame.read_char(14, 6), Some('i'));
        assert_eq!(frame.to_string(), "Hi");
        assert_eq!(frame.timestamp(), 1.0);
    }

    #[test]
    fn test_duplicate_control_ignored() {
        let mut frame = CaptionFrame::new();
        let eoc = control_command(Control::EndOfCaption, 0);
        assert_eq!(frame.decode(eoc, 0.0), DecodeStatus::Ready);
        assert_eq!(frame.decode(eoc, 0.0), DecodeStatus::Ok);
        assert_eq!(frame.decode(eoc, 0.0), DecodeStatus::Ready);
    }

    #[test]
    fn test_bad_parity_dropped() {
        let mut frame = CaptionFrame::new();
        feed(&mut frame, &[control_command(Control::ResumeDirectCaptioning, 0)]);
        frame.decode(0x4100, 0.0);
        assert!(frame.is_blank());
    }

    #[test]
    fn test_paint_on_and_extended() {
        let mut frame = CaptionFrame::new();
        feed(
            &mut frame,
            &[
                control_command(Control::ResumeDirectCaptioning, 0),
                row_column_preamble(0, 0, 0, false),
                pair('a', ' '),
                from_char('ö', 0).unwrap(),
            ],
        );
        assert_eq!(frame.row_text(0), "aö");
        assert_eq!(frame.mode(), Mode::PaintOn);
    }

    #[test]
    fn test_backspace_and_delete_to_end() {
        let mut frame = CaptionFrame::new();
        feed(
            &mut frame,
            &[
                control_command(Control::ResumeDirectCaptioning, 0),
                row_column_preamble(2, 0, 0, false),
                pair('a', 'b'),
                pair('c', 'd'),
                control_command(Control::Backspace, 0),
            ],
        );
        assert_eq!(frame.row_text(2), "abc");

        feed(
            &mut frame,
            &[
                row_column_preamble(2, 0, 0, false),
                tab(1, 0),
                control_command(Control::DeleteToEndOfRow, 0),
            ],
        );
        assert_eq!(frame.row_text(2), "a");
    }

    #[test]
    fn test_roll_up() {
        let mut frame = CaptionFrame::new();
        let cr = control_command(Control::CarriageReturn, 0);
        feed(
            &mut frame,
            &[
                control_command(Control::RollUp2, 0),
                pair('o', 'n'),
                from_char('e', 0).unwrap(),
            ],
        );
        assert_eq!(frame.decode(cr, 2.0), DecodeStatus::Ready);
        feed(&mut frame, &[pair('t', 'w'), from_char('o', 0).unwrap()]);

        assert_eq!(frame.row_text(13), "one");
        assert_eq!(frame.row_text(14), "two");
        assert_eq!(frame.to_string(), "one\ntwo");
    }

    #[test]
    fn test_other_channel_ignored() {
        let mut frame = CaptionFrame::new();
        feed(
            &mut frame,
            &[
                control_command(Control::ResumeDirectCaptioning, 1),
                row_column_preamble(0, 0, 1, false),
                pair('n', 'o'),
            ],
        );
        assert!(frame.is_blank());
    }

    #[test]
    fn test_from_text() {
        let frame = CaptionFrame::from_text("first\nsecond", 3.0);
        assert_eq!(frame.row_text(13), "first");
        assert_eq!(frame.row_text(14), "second");
        assert_eq!(frame.read_char(12, 0), None);
        assert_eq!(frame.timestamp(), 3.0);
    }

    #[test]
    fn test_write_past_last_column() {
        let mut frame = CaptionFrame::new();
        feed(
            &mut frame,
            &[
                control_command(Control::ResumeDirectCaptioning, 0),
                row_column_preamble(0, 28, 0, false),
                tab(3, 0),
                pair('x', 'y'),
            ],
        );
        assert_eq!(frame.read_char(0, 31), Some('y'));
        assert_eq!(frame.read_char(0, 32), None);
    }
}
