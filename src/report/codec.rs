//! Bit-field extraction for touch records and mouse motion prefixes.
//!
//! Touch record layout (8 bytes, trackpads append a ninth):
//!
//! ```text
//! [ x x x x x x x x ]   0: X bits 0..7
//! [ y y y y x x x x ]   1: Y bits 0..3 | X bits 8..11
//! [ y y y y y y y y ]   2: Y bits 4..11
//! [ touch major     ]   3
//! [ touch minor     ]   4
//! [id id s s s s s s]   5: tracking id bits 0..1 | size
//! [o o o o o o id id]   6: orientation | tracking id bits 2..3
//! [s s s s | unknown]   7: state | undeciphered
//! ```
//!
//! Decoding never fails: short input is zero-padded.

pub const TOUCH_STATE_MASK: u8 = 0xf0;
pub const TOUCH_STATE_NONE: u8 = 0x00;
pub const TOUCH_STATE_START: u8 = 0x30;
pub const TOUCH_STATE_DRAG: u8 = 0x40;

/// Length of the common part of a touch record.
pub const RECORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchState {
    None,
    Start,
    Drag,
    /// Any other state nibble. Not down, kept for diagnostics.
    Other(u8),
}

impl TouchState {
    pub fn from_raw(byte: u8) -> Self {
        match byte & TOUCH_STATE_MASK {
            TOUCH_STATE_NONE => TouchState::None,
            TOUCH_STATE_START => TouchState::Start,
            TOUCH_STATE_DRAG => TouchState::Drag,
            other => TouchState::Other(other),
        }
    }

    pub fn is_down(self) -> bool {
        matches!(self, TouchState::Start | TouchState::Drag)
    }
}

/// One decoded contact record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub tracking_id: u8,
    pub x: i32,
    /// Negated so that increasing Y points down, like pointer motion.
    pub y: i32,
    pub size: u8,
    pub orientation: i32,
    pub touch_major: u8,
    pub touch_minor: u8,
    pub state: TouchState,
    /// Byte 7 verbatim.
    pub state_byte: u8,
    /// Byte 8 of a 9-byte record, 0 otherwise.
    pub extra_byte: u8,
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    let shift = 32 - bits;
    (value << shift) >> shift
}

pub fn decode_contact(record: &[u8]) -> Contact {
    let mut b = [0u8; RECORD_LEN + 1];
    let n = record.len().min(b.len());
    b[..n].copy_from_slice(&record[..n]);

    let tracking_id = (((b[6] as u32) << 2 | (b[5] as u32) >> 6) & 0xf) as u8;
    let x = sign_extend(b[0] as i32 | (b[1] as i32 & 0x0f) << 8, 12);
    let y = -sign_extend((b[1] as i32) >> 4 | (b[2] as i32) << 4, 12);

    Contact {
        tracking_id,
        x,
        y,
        size: b[5] & 0x3f,
        orientation: (b[6] >> 2) as i32 - 32,
        touch_major: b[3],
        touch_minor: b[4],
        state: TouchState::from_raw(b[7]),
        state_byte: b[7],
        extra_byte: b[8],
    }
}

/// Pack a contact back into its 8-byte wire form. X and the negated Y are
/// truncated to 12 bits, size to 6, orientation to the -32..=31 range.
pub fn encode_contact(contact: &Contact) -> [u8; RECORD_LEN] {
    let x = contact.x as u32 & 0xfff;
    let y = contact.y.wrapping_neg() as u32 & 0xfff;
    let id = contact.tracking_id as u32 & 0xf;
    let orientation = (contact.orientation + 32) as u32 & 0x3f;

    [
        x as u8,
        ((x >> 8) & 0x0f | (y & 0x0f) << 4) as u8,
        (y >> 4) as u8,
        contact.touch_major,
        contact.touch_minor,
        (contact.size as u32 & 0x3f | (id & 0x3) << 6) as u8,
        (orientation << 2 | id >> 2) as u8,
        contact.state_byte,
    ]
}

/// Magic Mouse motion: two 10-bit signed deltas, low bytes in 1 and 2,
/// high bits packed into byte 3.
pub fn mouse_motion(prefix: &[u8]) -> (i32, i32) {
    let b = |i: usize| prefix.get(i).copied().unwrap_or(0) as i32;
    let x = sign_extend(b(1) | (b(3) & 0x0c) << 6, 10);
    let y = sign_extend(b(2) | (b(3) & 0x30) << 4, 10);
    (x, y)
}

/// Magic Mouse 2 motion: two little-endian i16 deltas at bytes 2..6.
pub fn mouse2_motion(prefix: &[u8]) -> (i32, i32) {
    let b = |i: usize| prefix.get(i).copied().unwrap_or(0);
    let x = i16::from_le_bytes([b(2), b(3)]) as i32;
    let y = i16::from_le_bytes([b(4), b(5)]) as i32;
    (x, y)
}
