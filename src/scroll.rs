//! Scroll wheel emulation from single-finger drags on the mouse surface.
//!
//! Two channels run side by side. The low-resolution channel emits whole
//! wheel detents once a drag leaves the dead-zone. The high-resolution
//! channel arms per axis after a minimum travel and then emits sub-detent
//! steps, `SCROLL_HR_STEPS` of them per detent.

use std::time::{Duration, Instant};

use crate::config::Tunables;
use crate::report::codec::TouchState;
use crate::state::TouchRecord;

/// High-resolution events per low-resolution detent.
pub const SCROLL_HR_STEPS: i32 = 10;
pub const SCROLL_HR_MULT: i32 = 120 / SCROLL_HR_STEPS;
/// Travel in device units that arms the high-resolution channel.
pub const SCROLL_HR_THRESHOLD: i32 = 90;
pub const SCROLL_ACCEL_DEFAULT: i32 = 1;
/// A new drag within this window of the last scroll keeps accelerating.
pub const SCROLL_ACCEL_WINDOW: Duration = Duration::from_millis(500);

/// Wheel deltas accumulated over one frame, `(horizontal, vertical)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelDelta {
    pub low: (i32, i32),
    pub high: (i32, i32),
}

impl WheelDelta {
    pub fn low_res(&self) -> Option<(i32, i32)> {
        (self.low != (0, 0)).then_some(self.low)
    }

    pub fn high_res(&self) -> Option<(i32, i32)> {
        (self.high != (0, 0)).then_some(self.high)
    }
}

/// Device-wide scroll state shared by all touches.
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Inverse acceleration; smaller scrolls faster.
    pub(crate) accel: i32,
    last_scroll: Option<Instant>,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            accel: SCROLL_ACCEL_DEFAULT,
            last_scroll: None,
        }
    }
}

/// Per-axis travel split into the two channels.
struct Steps {
    x: i32,
    y: i32,
    x_hr: i32,
    y_hr: i32,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accel(&self) -> i32 {
        self.accel
    }

    pub fn reset_acceleration(&mut self) {
        self.accel = SCROLL_ACCEL_DEFAULT;
    }

    /// Run one contact through the scroll state machine. `blocked` is set
    /// when another firm touch is down in the same frame.
    pub fn apply(
        &mut self,
        touch: &mut TouchRecord,
        state: TouchState,
        blocked: bool,
        tunables: &Tunables,
        now: Instant,
        out: &mut WheelDelta,
    ) {
        match state {
            TouchState::Start => self.start(touch, tunables, now),
            TouchState::Drag => self.drag(touch, blocked, tunables, now, out),
            TouchState::None | TouchState::Other(_) => {}
        }
    }

    fn start(&mut self, touch: &mut TouchRecord, tunables: &Tunables, now: Instant) {
        touch.scroll_x = touch.x as i16;
        touch.scroll_y = touch.y as i16;
        touch.scroll_x_hr = touch.x as i16;
        touch.scroll_y_hr = touch.y as i16;
        touch.scroll_x_active = false;
        touch.scroll_y_active = false;

        let recent = self
            .last_scroll
            .is_some_and(|last| now.saturating_duration_since(last) < SCROLL_ACCEL_WINDOW);
        if tunables.scroll_acceleration && recent {
            self.accel = (self.accel - 1).max(1);
        } else {
            self.accel = SCROLL_ACCEL_DEFAULT;
        }
    }

    fn drag(
        &mut self,
        touch: &mut TouchRecord,
        blocked: bool,
        tunables: &Tunables,
        now: Instant,
        out: &mut WheelDelta,
    ) {
        let speed = tunables.scroll_speed.min(crate::config::MAX_SCROLL_SPEED) as i32;
        let divisor = (64 - speed) * self.accel;
        let step_hr = (128 - speed) * self.accel / SCROLL_HR_STEPS;
        let (x, y) = (touch.x, touch.y);

        let mut steps = Steps {
            x: dead_zone(touch.scroll_x as i32 - x, tunables.scroll_delay_pos_x, divisor),
            y: dead_zone(touch.scroll_y as i32 - y, tunables.scroll_delay_pos_y, divisor),
            x_hr: touch.scroll_x_hr as i32 - x,
            y_hr: touch.scroll_y_hr as i32 - y,
        };

        // Only a lone light touch inside the centre band scrolls.
        let outside_band = x < tunables.middle_button_start || x > tunables.middle_button_stop;
        if blocked || outside_band {
            steps = Steps {
                x: 0,
                y: 0,
                x_hr: 0,
                y_hr: 0,
            };
        }

        if steps.x != 0 {
            touch.scroll_x = (touch.scroll_x as i32 - steps.x * divisor) as i16;
            self.last_scroll = Some(now);
            out.low.0 -= steps.x;
        }
        if steps.y != 0 {
            touch.scroll_y = (touch.scroll_y as i32 - steps.y * divisor) as i16;
            self.last_scroll = Some(now);
            out.low.1 += steps.y;
        }

        let q = high_res_step(&mut touch.scroll_x_hr, &mut touch.scroll_x_active, x, steps.x_hr, step_hr);
        out.high.0 -= q * SCROLL_HR_MULT;
        let q = high_res_step(&mut touch.scroll_y_hr, &mut touch.scroll_y_active, y, steps.y_hr, step_hr);
        out.high.1 += q * SCROLL_HR_MULT;
    }
}

/// Zero inside the dead-zone, otherwise the step in detents.
fn dead_zone(step: i32, delay: u32, divisor: i32) -> i32 {
    if step.unsigned_abs() < delay {
        0
    } else {
        step / divisor
    }
}

/// Advance one high-resolution axis and return the emitted step count.
/// Crossing the threshold arms the axis and consumes that sample.
fn high_res_step(baseline: &mut i16, active: &mut bool, pos: i32, mut delta: i32, step_hr: i32) -> i32 {
    if !*active && delta.abs() > SCROLL_HR_THRESHOLD {
        *active = true;
        *baseline = pos as i16;
        delta = 0;
    }

    let q = delta / step_hr;
    if q == 0 || !*active {
        return 0;
    }
    *baseline = (*baseline as i32 - q * step_hr) as i16;
    q
}
