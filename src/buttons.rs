//! Three-button emulation for the mouse surface.
//!
//! The hardware only knows left and right. When exactly one firm touch is on
//! the surface its position decides which button a click is; ambiguous
//! geometry leaves the hardware's guess alone.

use crate::config::Tunables;
use crate::event::Buttons;
use crate::state::TouchTable;

/// Tracking id of the only down touch with `size >= firm_size`.
pub fn firm_touch(table: &TouchTable, firm_size: u8) -> Option<u8> {
    let mut firm = table.down_touches().filter(|(_, touch)| touch.size >= firm_size);
    match (firm.next(), firm.next()) {
        (Some((id, _)), None) => Some(id),
        _ => None,
    }
}

/// Summed contact size of all down touches falls in the two-finger band.
fn two_finger_click(table: &TouchTable, tunables: &Tunables) -> bool {
    let total: u32 = table
        .down_touches()
        .map(|(_, touch)| touch.size as u32)
        .sum();
    total > tunables.two_finger_size_min && total < tunables.two_finger_size_max
}

/// Decide the button state for one report.
///
/// `raw` is the hardware click byte, `last` the state emitted for the
/// previous report. A pressed button stays latched until the hardware
/// reports release.
pub fn emulate(raw: u8, last: Buttons, table: &TouchTable, tunables: &Tunables) -> Buttons {
    let raw = raw & (Buttons::LEFT | Buttons::RIGHT);

    if !tunables.emulate_3button || raw == 0 {
        return Buttons::from_bits(raw);
    }
    if last.any() {
        return last;
    }

    let Some(id) = firm_touch(table, tunables.firm_touch_size) else {
        return Buttons::from_bits(raw);
    };
    let x = table.touch(id).x;

    let bits = if tunables.middle_click_3finger {
        if two_finger_click(table, tunables) {
            Buttons::MIDDLE
        } else if x <= 0 {
            Buttons::LEFT
        } else {
            Buttons::RIGHT
        }
    } else if x < tunables.middle_button_start {
        Buttons::LEFT
    } else if x > tunables.middle_button_stop {
        Buttons::RIGHT
    } else {
        Buttons::MIDDLE
    };

    Buttons::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::codec::{Contact, TOUCH_STATE_DRAG, TOUCH_STATE_NONE};
    use crate::report::tests::touch;

    fn table_with(contacts: &[Contact]) -> TouchTable {
        let mut table = TouchTable::new();
        table.begin_frame();
        for (slot, c) in contacts.iter().enumerate() {
            table.record(slot, c);
        }
        table
    }

    const NONE: Buttons = Buttons {
        left: false,
        right: false,
        middle: false,
    };

    #[test]
    fn test_firm_touch() {
        let table = table_with(&[touch(1, 0, 0, 9, TOUCH_STATE_DRAG), touch(2, 0, 0, 3, TOUCH_STATE_DRAG)]);
        assert_eq!(firm_touch(&table, 8), Some(1));

        let table = table_with(&[touch(1, 0, 0, 9, TOUCH_STATE_DRAG), touch(2, 0, 0, 9, TOUCH_STATE_DRAG)]);
        assert_eq!(firm_touch(&table, 8), None);

        // A lifted touch does not count.
        let table = table_with(&[touch(1, 0, 0, 9, TOUCH_STATE_NONE)]);
        assert_eq!(firm_touch(&table, 8), None);
    }

    #[test]
    fn test_two_band_mode() {
        let t = Tunables::default();
        let left = table_with(&[touch(0, -600, 0, 10, TOUCH_STATE_DRAG)]);
        let middle = table_with(&[touch(0, 100, 0, 10, TOUCH_STATE_DRAG)]);
        let right = table_with(&[touch(0, 900, 0, 10, TOUCH_STATE_DRAG)]);

        assert_eq!(emulate(1, NONE, &left, &t), Buttons::from_bits(Buttons::LEFT));
        assert_eq!(emulate(1, NONE, &middle, &t), Buttons::from_bits(Buttons::MIDDLE));
        assert_eq!(emulate(1, NONE, &right, &t), Buttons::from_bits(Buttons::RIGHT));
    }

    #[test]
    fn test_three_finger_mode() {
        let t = Tunables {
            middle_click_3finger: true,
            ..Tunables::default()
        };
        // Sizes 8 + 2 = 10: inside the two-finger band, one firm touch.
        let two = table_with(&[touch(0, 300, 0, 8, TOUCH_STATE_DRAG), touch(1, -300, 0, 2, TOUCH_STATE_DRAG)]);
        assert_eq!(emulate(1, NONE, &two, &t), Buttons::from_bits(Buttons::MIDDLE));

        let one_left = table_with(&[touch(0, -10, 0, 20, TOUCH_STATE_DRAG)]);
        assert_eq!(emulate(2, NONE, &one_left, &t), Buttons::from_bits(Buttons::LEFT));

        let one_right = table_with(&[touch(0, 10, 0, 20, TOUCH_STATE_DRAG)]);
        assert_eq!(emulate(1, NONE, &one_right, &t), Buttons::from_bits(Buttons::RIGHT));
    }

    #[test]
    fn test_ambiguous_passes_hardware_bits() {
        let t = Tunables::default();
        let table = table_with(&[touch(0, 100, 0, 10, TOUCH_STATE_DRAG), touch(1, 200, 0, 12, TOUCH_STATE_DRAG)]);
        assert_eq!(emulate(2, NONE, &table, &t), Buttons::from_bits(Buttons::RIGHT));
        assert_eq!(emulate(1, NONE, &TouchTable::new(), &t), Buttons::from_bits(Buttons::LEFT));
    }

    #[test]
    fn test_latch_until_release() {
        let t = Tunables::default();
        let middle = Buttons::from_bits(Buttons::MIDDLE);
        let elsewhere = table_with(&[touch(0, -900, 0, 10, TOUCH_STATE_DRAG)]);

        assert_eq!(emulate(1, middle, &elsewhere, &t), middle);
        assert_eq!(emulate(1, middle, &TouchTable::new(), &t), middle);
        assert_eq!(emulate(0, middle, &elsewhere, &t), NONE);
    }

    #[test]
    fn test_disabled_emulation() {
        let t = Tunables {
            emulate_3button: false,
            ..Tunables::default()
        };
        let table = table_with(&[touch(0, 100, 0, 10, TOUCH_STATE_DRAG)]);
        assert_eq!(emulate(1, NONE, &table, &t), Buttons::from_bits(Buttons::LEFT));
        assert_eq!(emulate(3, Buttons::from_bits(1), &table, &t), Buttons::from_bits(3));
    }
}
