//! Per-device decoding: raw report in, pointer events out.

use std::time::Instant;

use crate::buttons;
use crate::config::Tunables;
use crate::device::{DeviceClass, Diagnostic};
use crate::event::{Buttons, DecodedOutput, TouchSync};
use crate::report::codec::Contact;
use crate::report::{self, DecodeError, RawFrame};
use crate::scroll::{ScrollState, WheelDelta};
use crate::sink::EventSink;
use crate::state::TouchTable;

/// All cross-report state of one attached device.
///
/// Reports must be fed one at a time, in arrival order.
pub struct Decoder {
    class: DeviceClass,
    tunables: Tunables,
    table: TouchTable,
    scroll: ScrollState,
    last_buttons: Buttons,
    last_motion: (i32, i32),
}

impl Decoder {
    pub fn new(class: DeviceClass, tunables: Tunables) -> Self {
        Self {
            class,
            tunables,
            table: TouchTable::new(),
            scroll: ScrollState::new(),
            last_buttons: Buttons::default(),
            last_motion: (0, 0),
        }
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Swap in new tunables. Touch and scroll state carry over.
    pub fn reconfigure(&mut self, tunables: Tunables) {
        self.tunables = tunables;
    }

    pub fn last_motion(&self) -> (i32, i32) {
        self.last_motion
    }

    pub fn scroll_accel(&self) -> i32 {
        self.scroll.accel()
    }

    pub fn touches(&self) -> &TouchTable {
        &self.table
    }

    /// Decode one report. A rejected report leaves all state untouched.
    /// A compound report yields one output per embedded report.
    pub fn process(&mut self, buf: &[u8], now: Instant) -> Result<Vec<DecodedOutput>, DecodeError> {
        let frames = report::decode(buf)?;
        Ok(frames.iter().map(|frame| self.apply(frame, now)).collect())
    }

    /// Decode one report and hand the result to `sink`. Returns whether the
    /// report was recognised; malformed input is logged and dropped.
    pub fn feed<S: EventSink + ?Sized>(
        &mut self,
        buf: &[u8],
        now: Instant,
        sink: &mut S,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let outputs = match self.process(buf, now) {
            Ok(outputs) => outputs,
            Err(e @ DecodeError::TooManyContacts { .. }) => {
                log::warn!("Invalid report size {}: {}", buf.len(), e);
                return Ok(false);
            }
            Err(e) => {
                log::debug!("Dropping report: {}", e);
                return Ok(false);
            }
        };

        for output in &outputs {
            sink.emit(output)?;
        }
        Ok(true)
    }

    fn apply(&mut self, frame: &RawFrame, now: Instant) -> DecodedOutput {
        self.table.begin_frame();

        let scroll_enabled = self.class.supports_scroll() && self.tunables.emulate_scroll_wheel;
        let mut wheel = WheelDelta::default();
        let mut touches = Vec::with_capacity(frame.contacts.len());

        for (slot, contact) in frame.contacts.iter().enumerate() {
            let blocked = self.table.firm_touches_before(slot, self.tunables.scroll_block_size) > 0;
            let touch = self.table.record(slot, contact);

            if scroll_enabled {
                self.scroll
                    .apply(touch, contact.state, blocked, &self.tunables, now, &mut wheel);
            }

            touches.push(self.touch_sync(contact));
        }

        let (motion, buttons) = if self.class.is_mouse() {
            let motion = frame.motion.unwrap_or((0, 0));
            self.last_motion = motion;
            let buttons = buttons::emulate(frame.clicks, self.last_buttons, &self.table, &self.tunables);
            (Some(motion), buttons)
        } else {
            (None, Buttons::from_bits(frame.clicks & Buttons::LEFT))
        };

        // A button transition breaks scroll continuity.
        if buttons != self.last_buttons {
            self.scroll.reset_acceleration();
        }
        self.last_buttons = buttons;

        DecodedOutput {
            touches,
            motion,
            buttons,
            wheel: wheel.low_res(),
            wheel_hr: wheel.high_res(),
            active_touches: self.table.active_count(),
        }
    }

    fn touch_sync(&self, contact: &Contact) -> TouchSync {
        // Diagnostics follow the finger only while it is down.
        let raw_state = if self.tunables.report_undeciphered && contact.state.is_down() {
            match self.class.profile().diagnostic {
                Diagnostic::StateByte => Some(contact.state_byte),
                Diagnostic::ExtraByte => Some(contact.extra_byte),
                Diagnostic::Unsupported => None,
            }
        } else {
            None
        };

        TouchSync {
            tracking_id: contact.tracking_id,
            down: contact.state.is_down(),
            x: contact.x,
            y: contact.y,
            touch_major: contact.touch_major,
            touch_minor: contact.touch_minor,
            orientation: contact.orientation,
            size: contact.size,
            raw_state,
        }
    }
}
