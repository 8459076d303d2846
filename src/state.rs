//! Per-tracking-id touch memory that persists across reports.

use crate::report::codec::Contact;

/// Tracking ids are 4 bits wide.
pub const MAX_TOUCHES: usize = 16;

/// Most recent data for one tracking id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchRecord {
    pub x: i32,
    pub y: i32,
    pub size: u8,

    // Low-resolution scroll baseline
    pub scroll_x: i16,
    pub scroll_y: i16,
    // High-resolution scroll baseline
    pub scroll_x_hr: i16,
    pub scroll_y_hr: i16,
    pub scroll_x_active: bool,
    pub scroll_y_active: bool,

    /// Present and down in the current frame.
    pub down: bool,
}

/// Fixed table of touch records plus the slot map of the current frame.
///
/// Records are never freed; a new contact with the same tracking id
/// overwrites the old values.
#[derive(Debug, Clone, Default)]
pub struct TouchTable {
    touches: [TouchRecord; MAX_TOUCHES],
    /// Raw slot index within the report -> tracking id.
    slots: [u8; MAX_TOUCHES],
    slot_count: usize,
    active: usize,
}

impl TouchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous frame: empty slot map, no touch down.
    pub fn begin_frame(&mut self) {
        self.slot_count = 0;
        self.active = 0;
        for touch in self.touches.iter_mut() {
            touch.down = false;
        }
    }

    /// Store a decoded contact at its raw slot and return its record.
    pub fn record(&mut self, slot: usize, contact: &Contact) -> &mut TouchRecord {
        let id = contact.tracking_id as usize % MAX_TOUCHES;
        let down = contact.state.is_down();

        if slot < MAX_TOUCHES {
            self.slots[slot] = id as u8;
            self.slot_count = self.slot_count.max(slot + 1);
        }
        if down {
            self.active += 1;
        }

        let touch = &mut self.touches[id];
        touch.x = contact.x;
        touch.y = contact.y;
        touch.size = contact.size;
        touch.down = down;
        touch
    }

    pub fn touch(&self, id: u8) -> &TouchRecord {
        &self.touches[id as usize % MAX_TOUCHES]
    }

    /// Contacts marked down in the current frame.
    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn slot_ids(&self) -> &[u8] {
        &self.slots[..self.slot_count]
    }

    /// Down touches of the current frame, in slot order.
    pub fn down_touches(&self) -> impl Iterator<Item = (u8, &TouchRecord)> + '_ {
        self.slot_ids()
            .iter()
            .map(move |&id| (id, &self.touches[id as usize]))
            .filter(|(_, touch)| touch.down)
    }

    /// Number of down touches in slots before `slot` with at least `min_size`.
    pub fn firm_touches_before(&self, slot: usize, min_size: u8) -> usize {
        self.slot_ids()
            .iter()
            .take(slot)
            .map(|&id| &self.touches[id as usize])
            .filter(|touch| touch.down && touch.size >= min_size)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::codec::{TOUCH_STATE_DRAG, TOUCH_STATE_NONE, TOUCH_STATE_START};
    use crate::report::tests::touch;

    #[test]
    fn test_record_and_count() {
        let mut table = TouchTable::new();
        table.begin_frame();
        table.record(0, &touch(4, 10, 20, 9, TOUCH_STATE_START));
        table.record(1, &touch(7, -10, 5, 3, TOUCH_STATE_NONE));

        assert_eq!(table.active_count(), 1);
        assert_eq!(table.slot_ids(), &[4, 7]);
        assert_eq!(table.touch(4).x, 10);
        assert_eq!(table.touch(7).size, 3);
        assert!(!table.touch(7).down);

        let down: Vec<u8> = table.down_touches().map(|(id, _)| id).collect();
        assert_eq!(down, vec![4]);
    }

    #[test]
    fn test_absent_id_keeps_values() {
        let mut table = TouchTable::new();
        table.begin_frame();
        table.record(0, &touch(2, 100, 200, 9, TOUCH_STATE_DRAG));
        table.begin_frame();
        table.record(0, &touch(3, 1, 1, 1, TOUCH_STATE_DRAG));

        let kept = table.touch(2);
        assert_eq!((kept.x, kept.y, kept.size), (100, 200, 9));
        assert!(!kept.down);
        assert_eq!(table.active_count(), 1);
        assert_eq!(table.slot_ids(), &[3]);
    }

    #[test]
    fn test_firm_touches_before() {
        let mut table = TouchTable::new();
        table.begin_frame();
        table.record(0, &touch(0, 0, 0, 6, TOUCH_STATE_DRAG));
        table.record(1, &touch(1, 0, 0, 2, TOUCH_STATE_DRAG));
        table.record(2, &touch(2, 0, 0, 9, TOUCH_STATE_DRAG));

        assert_eq!(table.firm_touches_before(0, 5), 0);
        assert_eq!(table.firm_touches_before(1, 5), 1);
        assert_eq!(table.firm_touches_before(3, 5), 2);
    }
}
