//! Report demultiplexing: classify a raw buffer by its report id, validate
//! its length and decode every contact record into a [`RawFrame`].
//!
//! Decoding here is pure. Touch state, scroll and button emulation are
//! applied afterwards by the decoder.

pub mod codec;

use thiserror::Error;

use codec::Contact;

pub const TRACKPAD_REPORT_ID: u8 = 0x28;
pub const TRACKPAD2_USB_REPORT_ID: u8 = 0x02;
pub const TRACKPAD2_BT_REPORT_ID: u8 = 0x31;
pub const MOUSE_REPORT_ID: u8 = 0x29;
pub const MOUSE2_REPORT_ID: u8 = 0x12;
pub const DOUBLE_REPORT_ID: u8 = 0xf7;

/// Upper bound on contacts in one report.
pub const MAX_CONTACTS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Trackpad,
    Trackpad2Usb,
    Trackpad2Bluetooth,
    Mouse,
    Mouse2,
}

impl ReportFormat {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            TRACKPAD_REPORT_ID => Some(ReportFormat::Trackpad),
            TRACKPAD2_USB_REPORT_ID => Some(ReportFormat::Trackpad2Usb),
            TRACKPAD2_BT_REPORT_ID => Some(ReportFormat::Trackpad2Bluetooth),
            MOUSE_REPORT_ID => Some(ReportFormat::Mouse),
            MOUSE2_REPORT_ID => Some(ReportFormat::Mouse2),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            ReportFormat::Trackpad => TRACKPAD_REPORT_ID,
            ReportFormat::Trackpad2Usb => TRACKPAD2_USB_REPORT_ID,
            ReportFormat::Trackpad2Bluetooth => TRACKPAD2_BT_REPORT_ID,
            ReportFormat::Mouse => MOUSE_REPORT_ID,
            ReportFormat::Mouse2 => MOUSE2_REPORT_ID,
        }
    }

    /// Bytes before the first contact record.
    pub fn prefix_len(self) -> usize {
        match self {
            ReportFormat::Trackpad | ReportFormat::Trackpad2Bluetooth => 4,
            ReportFormat::Trackpad2Usb => 12,
            ReportFormat::Mouse => 6,
            ReportFormat::Mouse2 => 14,
        }
    }

    /// Bytes per contact record.
    pub fn stride(self) -> usize {
        match self {
            ReportFormat::Mouse | ReportFormat::Mouse2 => 8,
            _ => 9,
        }
    }

    fn click_offset(self) -> usize {
        match self {
            ReportFormat::Mouse => 3,
            _ => 1,
        }
    }

    fn motion(self, prefix: &[u8]) -> Option<(i32, i32)> {
        match self {
            ReportFormat::Mouse => Some(codec::mouse_motion(prefix)),
            ReportFormat::Mouse2 => Some(codec::mouse2_motion(prefix)),
            _ => None,
        }
    }
}

/// One validated report, decoded but not yet applied to any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub format: ReportFormat,
    pub contacts: Vec<Contact>,
    /// Relative pointer motion, mouse formats only.
    pub motion: Option<(i32, i32)>,
    /// Raw hardware click byte. Bit 0 is left, bit 1 is right.
    pub clicks: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty report")]
    Empty,

    #[error("unknown report id 0x{0:02x}")]
    UnknownReport(u8),

    #[error("report 0x{id:02x}: length {len} is not {prefix} + n * {stride}")]
    BadLength {
        id: u8,
        len: usize,
        prefix: usize,
        stride: usize,
    },

    #[error("report 0x{id:02x}: {count} contacts exceeds the limit of {MAX_CONTACTS}")]
    TooManyContacts { id: u8, count: usize },

    #[error("compound report: first sub-report length {first} exceeds payload of {available} bytes")]
    BadCompound { first: usize, available: usize },

    #[error("compound report nested inside a compound report")]
    NestedCompound,
}

/// Decode one transport buffer into one frame, or two for a compound report.
///
/// A compound report carries two sub-reports back to back; byte 1 is the
/// length of the first. Each sub-report is validated on its own and a bad
/// one is skipped. The compound fails only if neither decodes.
pub fn decode(buf: &[u8]) -> Result<Vec<RawFrame>, DecodeError> {
    let Some(&id) = buf.first() else {
        return Err(DecodeError::Empty);
    };

    if id != DOUBLE_REPORT_ID {
        return decode_single(buf).map(|frame| vec![frame]);
    }

    let mut frames = Vec::with_capacity(2);
    let mut last_err = DecodeError::Empty;

    for span in compound_spans(buf)? {
        let result = match span.first() {
            Some(&DOUBLE_REPORT_ID) => Err(DecodeError::NestedCompound),
            _ => decode_single(span),
        };
        match result {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                log::debug!("Dropping compound sub-report: {}", e);
                last_err = e;
            }
        }
    }

    if frames.is_empty() {
        return Err(last_err);
    }
    Ok(frames)
}

fn compound_spans(buf: &[u8]) -> Result<[&[u8]; 2], DecodeError> {
    let payload = buf.get(2..).ok_or(DecodeError::BadCompound {
        first: 0,
        available: 0,
    })?;
    let first = buf[1] as usize;
    if first > payload.len() {
        return Err(DecodeError::BadCompound {
            first,
            available: payload.len(),
        });
    }
    let (a, b) = payload.split_at(first);
    Ok([a, b])
}

fn decode_single(buf: &[u8]) -> Result<RawFrame, DecodeError> {
    let Some(&id) = buf.first() else {
        return Err(DecodeError::Empty);
    };
    let format = ReportFormat::from_id(id).ok_or(DecodeError::UnknownReport(id))?;
    let prefix = format.prefix_len();
    let stride = format.stride();

    if buf.len() < prefix || (buf.len() - prefix) % stride != 0 {
        return Err(DecodeError::BadLength {
            id,
            len: buf.len(),
            prefix,
            stride,
        });
    }

    let count = (buf.len() - prefix) / stride;
    if count > MAX_CONTACTS {
        return Err(DecodeError::TooManyContacts { id, count });
    }

    // Motion comes from the prefix and is known before any contact is applied.
    let motion = format.motion(&buf[..prefix]);
    let contacts = buf[prefix..]
        .chunks_exact(stride)
        .map(codec::decode_contact)
        .collect();

    Ok(RawFrame {
        format,
        contacts,
        motion,
        clicks: buf[format.click_offset()],
    })
}
