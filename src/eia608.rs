//! EIA-608 code pairs.
//!
//! A code is a 16-bit value holding two bytes with odd parity in bit 7.
//! Helpers here build codes from characters and control commands, and
//! classify received codes for the caption frame decoder.

pub const DEFAULT_CHANNEL: u8 = 0;

pub const SCREEN_ROWS: usize = 15;
pub const SCREEN_COLS: usize = 32;

// first byte of CC2/CC4 codes carries this bit
const CHANNEL_BIT: u16 = 0x0800;
// first byte of field-2 control commands (CC3/CC4)
const FIELD_BIT: u16 = 0x0100;

fn parity_byte(byte: u8) -> u8 {
    let byte = byte & 0x7F;
    if byte.count_ones() % 2 == 0 {
        byte | 0x80
    } else {
        byte
    }
}

/// Sets bit 7 of both bytes so each has odd parity.
pub fn parity(cc_data: u16) -> u16 {
    let hi = parity_byte((cc_data >> 8) as u8) as u16;
    let lo = parity_byte(cc_data as u8) as u16;
    (hi << 8) | lo
}

pub fn parity_ok(cc_data: u16) -> bool {
    (cc_data >> 8).count_ones() % 2 == 1 && (cc_data & 0xFF).count_ones() % 2 == 1
}

pub fn strip_parity(cc_data: u16) -> u16 {
    cc_data & 0x7F7F
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ResumeCaptionLoading,
    Backspace,
    AlarmOff,
    AlarmOn,
    DeleteToEndOfRow,
    RollUp2,
    RollUp3,
    RollUp4,
    FlashOn,
    ResumeDirectCaptioning,
    TextRestart,
    ResumeTextDisplay,
    EraseDisplayMemory,
    CarriageReturn,
    EraseNonDisplayedMemory,
    EndOfCaption,
}

impl Control {
    fn as_u16(&self) -> u16 {
        match self {
            Self::ResumeCaptionLoading => 0x1420,
            Self::Backspace => 0x1421,
            Self::AlarmOff => 0x1422,
            Self::AlarmOn => 0x1423,
            Self::DeleteToEndOfRow => 0x1424,
            Self::RollUp2 => 0x1425,
            Self::RollUp3 => 0x1426,
            Self::RollUp4 => 0x1427,
            Self::FlashOn => 0x1428,
            Self::ResumeDirectCaptioning => 0x1429,
            Self::TextRestart => 0x142A,
            Self::ResumeTextDisplay => 0x142B,
            Self::EraseDisplayMemory => 0x142C,
            Self::CarriageReturn => 0x142D,
            Self::EraseNonDisplayedMemory => 0x142E,
            Self::EndOfCaption => 0x142F,
        }
    }

    fn from_low_byte(lo: u8) -> Option<Self> {
        let control = match lo {
            0x20 => Self::ResumeCaptionLoading,
            0x21 => Self::Backspace,
            0x22 => Self::AlarmOff,
            0x23 => Self::AlarmOn,
            0x24 => Self::DeleteToEndOfRow,
            0x25 => Self::RollUp2,
            0x26 => Self::RollUp3,
            0x27 => Self::RollUp4,
            0x28 => Self::FlashOn,
            0x29 => Self::ResumeDirectCaptioning,
            0x2A => Self::TextRestart,
            0x2B => Self::ResumeTextDisplay,
            0x2C => Self::EraseDisplayMemory,
            0x2D => Self::CarriageReturn,
            0x2E => Self::EraseNonDisplayedMemory,
            0x2F => Self::EndOfCaption,
            _ => return None,
        };
        Some(control)
    }
}

/// Channels 0..=3 are CC1..CC4.
pub fn control_command(cmd: Control, channel: u8) -> u16 {
    let mut code = cmd.as_u16();
    if channel & 0x01 != 0 {
        code |= CHANNEL_BIT;
    }
    if channel & 0x02 != 0 {
        code |= FIELD_BIT;
    }
    parity(code)
}

/// Tab offset of 1 to 3 columns.
pub fn tab(offset: u8, channel: u8) -> u16 {
    let mut code = 0x1720 | (offset.clamp(1, 3) as u16);
    if channel & 0x01 != 0 {
        code |= CHANNEL_BIT;
    }
    parity(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    White,
    Green,
    Blue,
    Cyan,
    Red,
    Yellow,
    Magenta,
    Italics,
}

impl Style {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::White,
            1 => Self::Green,
            2 => Self::Blue,
            3 => Self::Cyan,
            4 => Self::Red,
            5 => Self::Yellow,
            6 => Self::Magenta,
            _ => Self::Italics,
        }
    }
}

/// Preamble address code: moves the cursor to a row and an indent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub row: usize,
    pub col: usize,
    pub style: Style,
    pub underline: bool,
    pub channel: u8,
}

// (first byte, second byte base) per screen row
const ROW_CODES: [(u8, u8); SCREEN_ROWS] = [
    (0x11, 0x40),
    (0x11, 0x60),
    (0x12, 0x40),
    (0x12, 0x60),
    (0x15, 0x40),
    (0x15, 0x60),
    (0x16, 0x40),
    (0x16, 0x60),
    (0x17, 0x40),
    (0x17, 0x60),
    (0x10, 0x40),
    (0x13, 0x40),
    (0x13, 0x60),
    (0x14, 0x40),
    (0x14, 0x60),
];

fn preamble(row: usize, lo_bits: u8, channel: u8) -> u16 {
    let (hi, lo) = ROW_CODES[row.min(SCREEN_ROWS - 1)];
    let mut code = ((hi as u16) << 8) | (lo | lo_bits) as u16;
    if channel & 0x01 != 0 {
        code |= CHANNEL_BIT;
    }
    parity(code)
}

/// Indent preamble for `col`, rounded down to a multiple of four; follow it
/// with [`tab`] for the remainder.
pub fn row_column_preamble(row: usize, col: usize, channel: u8, underline: bool) -> u16 {
    let indent = (col.min(SCREEN_COLS - 1) / 4) as u8;
    preamble(row, 0x10 | (indent << 1) | underline as u8, channel)
}

pub fn row_style_preamble(row: usize, style: Style, channel: u8, underline: bool) -> u16 {
    preamble(row, ((style as u8) << 1) | underline as u8, channel)
}

const SPECIAL_NA: [char; 16] = [
    '®', '°', '½', '¿', '™', '¢', '£', '♪', 'à', '\u{a0}', 'è', 'â', 'ê', 'î', 'ô', 'û',
];

const EXTENDED_SPANISH_FRENCH: [char; 32] = [
    'Á', 'É', 'Ó', 'Ú', 'Ü', 'ü', '‘', '¡', '*', '’', '—', '©', '℠', '•', '“', '”', 'À', 'Â',
    'Ç', 'È', 'Ê', 'Ë', 'ë', 'Î', 'Ï', 'ï', 'Ô', 'Ù', 'ù', 'Û', '«', '»',
];

const EXTENDED_PORTUGUESE_GERMAN: [char; 32] = [
    'Ã', 'ã', 'Í', 'Ì', 'ì', 'Ò', 'ò', 'Õ', 'õ', '{', '}', '\\', '^', '_', '|', '~', 'Ä', 'ä',
    'Ö', 'ö', 'ß', '¥', '¤', '¦', 'Å', 'å', 'Ø', 'ø', '┌', '┐', '└', '┘',
];

fn basicna_to_char(byte: u8) -> Option<char> {
    let ch = match byte & 0x7F {
        0x2A => 'á',
        0x5C => 'é',
        0x5E => 'í',
        0x5F => 'ó',
        0x60 => 'ú',
        0x7B => 'ç',
        0x7C => '÷',
        0x7D => 'Ñ',
        0x7E => 'ñ',
        0x7F => '█',
        b @ 0x20..=0x7F => b as char,
        _ => return None,
    };
    Some(ch)
}

fn char_to_basicna(ch: char) -> Option<u8> {
    let byte = match ch {
        'á' => 0x2A,
        'é' => 0x5C,
        'í' => 0x5E,
        'ó' => 0x5F,
        'ú' => 0x60,
        'ç' => 0x7B,
        '÷' => 0x7C,
        'Ñ' => 0x7D,
        'ñ' => 0x7E,
        '█' => 0x7F,
        '*' | '\\' | '^' | '_' | '`' | '{' | '|' | '}' | '~' => return None,
        ' '..='~' => ch as u8,
        _ => return None,
    };
    Some(byte)
}

/// Code for a single character, or `None` outside the 608 character sets.
///
/// Extended (western European) characters replace the previous column when
/// decoded, so callers send [`EXTENDED_FALLBACK`] ahead of them.
pub fn from_char(ch: char, channel: u8) -> Option<u16> {
    if let Some(byte) = char_to_basicna(ch) {
        return Some(parity((byte as u16) << 8));
    }

    let chan = if channel & 0x01 != 0 { CHANNEL_BIT } else { 0 };
    let code = if let Some(i) = SPECIAL_NA.iter().position(|&c| c == ch) {
        0x1130 | i as u16
    } else if let Some(i) = EXTENDED_SPANISH_FRENCH.iter().position(|&c| c == ch) {
        0x1220 | i as u16
    } else if let Some(i) = EXTENDED_PORTUGUESE_GERMAN.iter().position(|&c| c == ch) {
        0x1320 | i as u16
    } else {
        return None;
    };

    Some(parity(code | chan))
}

/// Basic character sent ahead of an extended one.
pub const EXTENDED_FALLBACK: char = ' ';

pub fn is_basicna(cc_data: u16) -> bool {
    let hi = (cc_data >> 8) as u8 & 0x7F;
    hi >= 0x20
}

/// Packs the characters of two single-character basic codes into one pair.
pub fn from_basicna(first: u16, second: u16) -> u16 {
    parity((first & 0xFF00) | ((second & 0xFF00) >> 8))
}

pub fn is_westeu(cc_data: u16) -> bool {
    let code = strip_parity(cc_data) & !CHANNEL_BIT;
    (0x1220..=0x123F).contains(&code) || (0x1320..=0x133F).contains(&code)
}

/// A received code pair, parity removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Padding,
    Control(Control, u8),
    Preamble(Preamble),
    Tab(u8, u8),
    MidRow(u8),
    Basic(char, Option<char>),
    Special(char, u8),
    Extended(char, u8),
    Unknown,
}

pub fn parse(cc_data: u16) -> Code {
    let hi = (cc_data >> 8) as u8 & 0x7F;
    let lo = cc_data as u8 & 0x7F;

    if hi == 0 && lo == 0 {
        return Code::Padding;
    }

    if hi >= 0x20 {
        return match basicna_to_char(hi) {
            Some(first) => Code::Basic(first, basicna_to_char(lo)),
            None => Code::Unknown,
        };
    }

    if !(0x10..=0x1F).contains(&hi) {
        return Code::Unknown;
    }

    let channel = (hi & 0x08 != 0) as u8;
    let base = hi & 0x77;

    if lo >= 0x40 {
        return match ROW_CODES
            .iter()
            .position(|&(h, l)| h == base && l == (lo & 0x60))
        {
            Some(row) => {
                let indent = lo & 0x10 != 0;
                Code::Preamble(Preamble {
                    row,
                    col: if indent { ((lo >> 1) & 0x07) as usize * 4 } else { 0 },
                    style: if indent { Style::White } else { Style::from_bits(lo >> 1) },
                    underline: lo & 0x01 != 0,
                    channel,
                })
            }
            None => Code::Unknown,
        };
    }

    match (base, lo) {
        (0x14 | 0x15, 0x20..=0x2F) => match Control::from_low_byte(lo) {
            Some(control) => Code::Control(control, channel | (base & 0x01) << 1),
            None => Code::Unknown,
        },
        (0x17, 0x21..=0x23) => Code::Tab(lo - 0x20, channel),
        (0x11, 0x20..=0x2F) => Code::MidRow(channel),
        (0x11, 0x30..=0x3F) => Code::Special(SPECIAL_NA[(lo - 0x30) as usize], channel),
        (0x12, 0x20..=0x3F) => {
            Code::Extended(EXTENDED_SPANISH_FRENCH[(lo - 0x20) as usize], channel)
        }
        (0x13, 0x20..=0x3F) => {
            Code::Extended(EXTENDED_PORTUGUESE_GERMAN[(lo - 0x20) as usize], channel)
        }
        _ => Code::Unknown,
    }
}

pub fn is_control(cc_data: u16) -> bool {
    matches!(
        parse(cc_data),
        Code::Control(..) | Code::Preamble(_) | Code::Tab(..) | Code::MidRow(_)
    )
}
