use serde::Deserialize;

use super::cli::TunableArgs;

/// Largest accepted scroll speed.
pub const MAX_SCROLL_SPEED: u32 = 63;

/// Emulation thresholds. Passed by value to the decoder and swapped
/// whole on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tunables {
    /// Synthesize a middle button from touch position.
    pub emulate_3button: bool,
    /// Middle click is a two-finger click instead of a centre-band click.
    pub middle_click_3finger: bool,
    pub middle_button_start: i32,
    pub middle_button_stop: i32,

    pub emulate_scroll_wheel: bool,
    /// 0 (slow) to 63 (fast).
    pub scroll_speed: u32,
    /// Dead-zone in device units before a drag starts scrolling.
    pub scroll_delay_pos_x: u32,
    pub scroll_delay_pos_y: u32,
    /// Accelerate sequential scroll gestures.
    pub scroll_acceleration: bool,

    /// Pass the undeciphered state bits through with each touch.
    pub report_undeciphered: bool,

    /// Minimum contact size of the touch that decides the clicked button.
    pub firm_touch_size: u8,
    /// Another touch at least this large stops scrolling.
    pub scroll_block_size: u8,
    /// Exclusive bounds on summed contact size that count as a two-finger click.
    pub two_finger_size_min: u32,
    pub two_finger_size_max: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            emulate_3button: true,
            middle_click_3finger: false,
            middle_button_start: -250,
            middle_button_stop: 750,
            emulate_scroll_wheel: true,
            scroll_speed: 0,
            scroll_delay_pos_x: 200,
            scroll_delay_pos_y: 200,
            scroll_acceleration: true,
            report_undeciphered: false,
            firm_touch_size: 8,
            scroll_block_size: 5,
            two_finger_size_min: 5,
            two_finger_size_max: 12,
        }
    }
}

impl Tunables {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.scroll_speed > MAX_SCROLL_SPEED {
            return Err("scroll_speed must be between 0 and 63");
        }
        if self.middle_button_start > self.middle_button_stop {
            return Err("middle_button_start must not exceed middle_button_stop");
        }
        if self.two_finger_size_min >= self.two_finger_size_max {
            return Err("two_finger_size_min must be below two_finger_size_max");
        }
        Ok(())
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, args: &TunableArgs) -> Self {
        if args.no_middle_button {
            self.emulate_3button = false;
        }
        if args.middle_click_3finger {
            self.middle_click_3finger = true;
        }
        if let Some(start) = args.middle_button_start {
            self.middle_button_start = start;
        }
        if let Some(stop) = args.middle_button_stop {
            self.middle_button_stop = stop;
        }
        if args.no_scroll {
            self.emulate_scroll_wheel = false;
        }
        if let Some(speed) = args.scroll_speed {
            self.scroll_speed = speed;
        }
        if let Some(delay) = args.scroll_delay_x {
            self.scroll_delay_pos_x = delay;
        }
        if let Some(delay) = args.scroll_delay_y {
            self.scroll_delay_pos_y = delay;
        }
        if args.no_scroll_acceleration {
            self.scroll_acceleration = false;
        }
        if args.report_undeciphered {
            self.report_undeciphered = true;
        }
        self
    }
}
