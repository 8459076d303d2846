//! Decoded pointer events handed to an event sink.

/// Button bits as reported by the hardware and latched by the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

impl Buttons {
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const MIDDLE: u8 = 1 << 2;

    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & Self::LEFT != 0,
            right: bits & Self::RIGHT != 0,
            middle: bits & Self::MIDDLE != 0,
        }
    }

    pub fn bits(self) -> u8 {
        (self.left as u8) * Self::LEFT | (self.right as u8) * Self::RIGHT | (self.middle as u8) * Self::MIDDLE
    }

    pub fn any(self) -> bool {
        self.bits() != 0
    }
}

/// State of one tracking id after the current report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchSync {
    pub tracking_id: u8,
    pub down: bool,
    pub x: i32,
    pub y: i32,
    pub touch_major: u8,
    pub touch_minor: u8,
    pub orientation: i32,
    pub size: u8,
    /// Undeciphered state bits, only when diagnostics are enabled.
    pub raw_state: Option<u8>,
}

/// Everything one report produces, emitted as one input frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedOutput {
    pub touches: Vec<TouchSync>,
    /// Relative motion, mouse classes only.
    pub motion: Option<(i32, i32)>,
    pub buttons: Buttons,
    /// Low-resolution wheel `(horizontal, vertical)`.
    pub wheel: Option<(i32, i32)>,
    /// High-resolution wheel `(horizontal, vertical)`, 120 per detent.
    pub wheel_hr: Option<(i32, i32)>,
    pub active_touches: usize,
}
