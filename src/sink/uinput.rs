use evdevil::event::{
    Abs, AbsEvent, InputEvent, Key, KeyEvent, KeyState, Misc, MiscEvent, Rel, RelEvent,
};
use evdevil::uinput::{AbsSetup, UinputDevice};
use evdevil::{AbsInfo, InputId, InputProp, Slot};

use super::EventSink;
use crate::config::Tunables;
use crate::device::{DeviceClass, DeviceProfile, Diagnostic};
use crate::event::{DecodedOutput, TouchSync};
use crate::state::MAX_TOUCHES;

/// Touch major/minor arrive in quarter units.
const TOUCH_AXIS_SHIFT: u32 = 2;
const TRACKPAD2_PRESSURE_MAX: i32 = 283;
/// Trackpad 2 reports no usable pressure; a constant keeps clients that
/// require one happy.
const TRACKPAD2_PRESSURE: i32 = 30;

const TOOL_KEYS: [Key; 5] = [
    Key::BTN_TOOL_FINGER,
    Key::BTN_TOOL_DOUBLETAP,
    Key::BTN_TOOL_TRIPLETAP,
    Key::BTN_TOOL_QUADTAP,
    Key::BTN_TOOL_QUINTTAP,
];

/// Whether `MSC_RAW` is registered and written for this class.
fn raw_passthrough(class: DeviceClass, tunables: &Tunables) -> bool {
    tunables.report_undeciphered && class.profile().diagnostic != Diagnostic::Unsupported
}

/// Maps device tracking ids (used as slot numbers) to evdev tracking ids.
struct SlotTracker {
    /// Session-wide contact sequence per slot; lower is older.
    contacts: [Option<u64>; MAX_TOUCHES],
    next_contact: u64,
}

impl SlotTracker {
    fn new() -> Self {
        Self {
            contacts: [None; MAX_TOUCHES],
            next_contact: 0,
        }
    }

    /// Per-slot events for one frame, in the order they must be written.
    /// Slots absent from the frame are released.
    fn frame(&mut self, output: &DecodedOutput, trackpad2: bool, raw: bool) -> Vec<(u16, Vec<InputEvent>)> {
        let mut slots = Vec::with_capacity(output.touches.len());
        let mut seen = [false; MAX_TOUCHES];

        for touch in &output.touches {
            let slot = touch.tracking_id as usize % MAX_TOUCHES;
            seen[slot] = true;

            if !touch.down {
                if self.contacts[slot].take().is_some() {
                    slots.push((slot as u16, vec![AbsEvent::new(Abs::MT_TRACKING_ID, -1).into()]));
                }
                continue;
            }

            let mut events: Vec<InputEvent> = Vec::with_capacity(10);
            if self.contacts[slot].is_none() {
                self.next_contact += 1;
                self.contacts[slot] = Some(self.next_contact);
                events.push(AbsEvent::new(Abs::MT_TRACKING_ID, evdev_tracking_id(self.next_contact)).into());
            }
            events.push(AbsEvent::new(Abs::MT_TOUCH_MAJOR, (touch.touch_major as i32) << TOUCH_AXIS_SHIFT).into());
            events.push(AbsEvent::new(Abs::MT_TOUCH_MINOR, (touch.touch_minor as i32) << TOUCH_AXIS_SHIFT).into());
            events.push(AbsEvent::new(Abs::MT_ORIENTATION, -touch.orientation).into());
            events.push(AbsEvent::new(Abs::MT_POSITION_X, touch.x).into());
            events.push(AbsEvent::new(Abs::MT_POSITION_Y, touch.y).into());
            if trackpad2 {
                events.push(AbsEvent::new(Abs::TOOL_WIDTH, touch.size as i32).into());
                events.push(AbsEvent::new(Abs::MT_PRESSURE, TRACKPAD2_PRESSURE).into());
            }
            if let Some(state) = touch.raw_state.filter(|_| raw) {
                events.push(MiscEvent::new(Misc::RAW, state as i32).into());
            }

            slots.push((slot as u16, events));
        }

        // Drop contacts that vanished without a lift record.
        for (slot, contact) in self.contacts.iter_mut().enumerate() {
            if !seen[slot] && contact.take().is_some() {
                slots.push((slot as u16, vec![AbsEvent::new(Abs::MT_TRACKING_ID, -1).into()]));
            }
        }

        slots
    }

    /// The down touch that has been on the surface longest.
    fn oldest<'a>(&self, touches: &'a [TouchSync]) -> Option<&'a TouchSync> {
        touches
            .iter()
            .filter(|t| t.down)
            .filter_map(|t| self.contacts[t.tracking_id as usize % MAX_TOUCHES].map(|seq| (seq, t)))
            .min_by_key(|(seq, _)| *seq)
            .map(|(_, t)| t)
    }
}

fn evdev_tracking_id(contact: u64) -> i32 {
    (contact & i32::MAX as u64) as i32
}

/// Writes decoded reports to a virtual evdev device.
pub struct UinputSink {
    device: UinputDevice,
    class: DeviceClass,
    middle_button: bool,
    raw: bool,
    slots: SlotTracker,
}

impl UinputSink {
    /// Create the virtual device. Capabilities follow the tunables at
    /// creation time.
    pub fn create(
        class: DeviceClass,
        tunables: &Tunables,
        input_id: InputId,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let device = create_device(class, tunables, input_id)?;
        if let Ok(name) = device.sysname() {
            log::info!("Pointer device ready: /sys/devices/virtual/input/{}", name.to_string_lossy());
        }

        Ok(Self {
            device,
            class,
            middle_button: tunables.emulate_3button,
            raw: raw_passthrough(class, tunables),
            slots: SlotTracker::new(),
        })
    }
}

fn abs_axis(min: i32, max: i32, resolution: i32) -> AbsInfo {
    AbsInfo::new(min, max).with_resolution(resolution)
}

fn mt_axes(profile: &DeviceProfile) -> Vec<AbsSetup> {
    let touch_max = 255 << TOUCH_AXIS_SHIFT;
    vec![
        AbsSetup::new(Abs::MT_SLOT, AbsInfo::new(0, (MAX_TOUCHES - 1) as i32)),
        AbsSetup::new(Abs::MT_TRACKING_ID, AbsInfo::new(-1, i32::MAX)),
        AbsSetup::new(Abs::MT_TOUCH_MAJOR, AbsInfo::new(0, touch_max)),
        AbsSetup::new(Abs::MT_TOUCH_MINOR, AbsInfo::new(0, touch_max)),
        AbsSetup::new(
            Abs::MT_ORIENTATION,
            AbsInfo::new(profile.orientation_min, profile.orientation_max),
        ),
        AbsSetup::new(
            Abs::MT_POSITION_X,
            abs_axis(profile.x.min, profile.x.max, profile.x.resolution()),
        ),
        AbsSetup::new(
            Abs::MT_POSITION_Y,
            abs_axis(profile.y.min, profile.y.max, profile.y.resolution()),
        ),
    ]
}

fn create_device(
    class: DeviceClass,
    tunables: &Tunables,
    input_id: InputId,
) -> Result<UinputDevice, Box<dyn std::error::Error + Send + Sync>> {
    let profile = class.profile();
    let mut axes = mt_axes(profile);

    let mut builder = UinputDevice::builder()?.with_input_id(input_id)?;
    if raw_passthrough(class, tunables) {
        builder = builder.with_misc([Misc::RAW])?;
    }

    let device = if class.is_mouse() {
        let mut keys = vec![Key::BTN_LEFT, Key::BTN_RIGHT];
        if tunables.emulate_3button {
            keys.push(Key::BTN_MIDDLE);
        }
        let mut rel_axes = vec![Rel::X, Rel::Y];
        if tunables.emulate_scroll_wheel {
            rel_axes.extend([Rel::WHEEL, Rel::HWHEEL, Rel::WHEEL_HI_RES, Rel::HWHEEL_HI_RES]);
        }

        builder
            .with_abs_axes(axes)?
            .with_keys(keys)?
            .with_rel_axes(rel_axes)?
            .build(profile.name)?
    } else {
        // Multi-touch pointer devices also carry single-touch emulation and
        // a tool key per finger count.
        axes.push(AbsSetup::new(Abs::X, abs_axis(profile.x.min, profile.x.max, profile.x.resolution())));
        axes.push(AbsSetup::new(Abs::Y, abs_axis(profile.y.min, profile.y.max, profile.y.resolution())));
        if class == DeviceClass::MagicTrackpad2 {
            axes.push(AbsSetup::new(Abs::MT_PRESSURE, AbsInfo::new(0, TRACKPAD2_PRESSURE_MAX)));
            axes.push(AbsSetup::new(Abs::PRESSURE, AbsInfo::new(0, TRACKPAD2_PRESSURE_MAX)));
            axes.push(AbsSetup::new(Abs::TOOL_WIDTH, AbsInfo::new(0, 255)));
        }

        let mut keys = vec![Key::BTN_LEFT, Key::BTN_TOUCH];
        keys.extend(TOOL_KEYS);

        builder
            .with_props([InputProp::POINTER, InputProp::BUTTONPAD])?
            .with_abs_axes(axes)?
            .with_keys(keys)?
            .build(profile.name)?
    };

    Ok(device)
}

fn key(key: Key, pressed: bool) -> InputEvent {
    KeyEvent::new(key, if pressed { KeyState::PRESSED } else { KeyState::RELEASED }).into()
}

fn rel(axis: Rel, value: i32) -> InputEvent {
    RelEvent::new(axis, value).into()
}

/// BTN_TOUCH plus the tool key matching the finger count.
fn build_tool_key_events(contact_count: usize) -> Vec<InputEvent> {
    let tool_key = match contact_count {
        0 => None,
        n => Some(TOOL_KEYS[(n - 1).min(TOOL_KEYS.len() - 1)]),
    };

    let mut events = vec![key(Key::BTN_TOUCH, contact_count > 0)];
    for k in TOOL_KEYS {
        events.push(key(k, Some(k) == tool_key));
    }
    events
}

fn mouse_events(output: &DecodedOutput, middle_button: bool) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(9);
    events.push(key(Key::BTN_LEFT, output.buttons.left));
    events.push(key(Key::BTN_RIGHT, output.buttons.right));
    if middle_button {
        events.push(key(Key::BTN_MIDDLE, output.buttons.middle));
    }

    if let Some((dx, dy)) = output.motion {
        if dx != 0 {
            events.push(rel(Rel::X, dx));
        }
        if dy != 0 {
            events.push(rel(Rel::Y, dy));
        }
    }
    if let Some((h, v)) = output.wheel {
        events.push(rel(Rel::HWHEEL, h));
        events.push(rel(Rel::WHEEL, v));
    }
    if let Some((h, v)) = output.wheel_hr {
        events.push(rel(Rel::HWHEEL_HI_RES, h));
        events.push(rel(Rel::WHEEL_HI_RES, v));
    }
    events
}

fn trackpad_events(output: &DecodedOutput, pointer: Option<&TouchSync>, trackpad2: bool) -> Vec<InputEvent> {
    let mut events = Vec::with_capacity(10);
    events.push(key(Key::BTN_LEFT, output.buttons.left));

    if let Some(first) = pointer {
        events.push(AbsEvent::new(Abs::X, first.x).into());
        events.push(AbsEvent::new(Abs::Y, first.y).into());
    }
    if trackpad2 {
        let pressure = if pointer.is_some() { TRACKPAD2_PRESSURE } else { 0 };
        events.push(AbsEvent::new(Abs::PRESSURE, pressure).into());
    }
    events.extend(build_tool_key_events(output.active_touches));
    events
}

impl EventSink for UinputSink {
    fn emit(&mut self, output: &DecodedOutput) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let trackpad2 = self.class == DeviceClass::MagicTrackpad2;
        let slots = self.slots.frame(output, trackpad2, self.raw);

        // Single-pointer emulation follows the oldest finger.
        let pointer = if self.class.is_mouse() {
            mouse_events(output, self.middle_button)
        } else {
            trackpad_events(output, self.slots.oldest(&output.touches), trackpad2)
        };

        let mut writer = self.device.writer();
        for (slot, events) in &slots {
            writer = writer
                .slot(Slot::from(*slot))?
                .write_events(events)?
                .finish_slot()?;
        }
        writer = writer.write_events(&pointer)?;
        writer.finish()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Buttons;

    type Raw = (u16, u16, i32);

    fn raw(event: InputEvent) -> Raw {
        (event.event_type().raw(), event.raw_code(), event.raw_value())
    }

    fn raws(events: &[InputEvent]) -> Vec<Raw> {
        events
            .iter()
            .map(|e| (e.event_type().raw(), e.raw_code(), e.raw_value()))
            .collect()
    }

    /// Same event type and code, any value.
    fn same_code(a: Raw, b: Raw) -> bool {
        a.0 == b.0 && a.1 == b.1
    }

    fn touch(tracking_id: u8, x: i32, down: bool) -> TouchSync {
        TouchSync {
            tracking_id,
            down,
            x,
            y: 0,
            touch_major: 10,
            touch_minor: 8,
            orientation: 2,
            size: 9,
            raw_state: None,
        }
    }

    fn frame(touches: Vec<TouchSync>) -> DecodedOutput {
        DecodedOutput {
            active_touches: touches.iter().filter(|t| t.down).count(),
            touches,
            ..DecodedOutput::default()
        }
    }

    #[test]
    fn test_tool_keys() {
        let events = build_tool_key_events(0);
        assert_eq!(events.len(), 1 + TOOL_KEYS.len());
        assert!(events.iter().all(|e| e.raw_value() == 0));

        let pressed: Vec<Raw> = raws(&build_tool_key_events(2))
            .into_iter()
            .filter(|e| e.2 == 1)
            .collect();
        assert_eq!(
            pressed,
            vec![raw(key(Key::BTN_TOUCH, true)), raw(key(Key::BTN_TOOL_DOUBLETAP, true))]
        );

        assert!(raws(&build_tool_key_events(9)).contains(&raw(key(Key::BTN_TOOL_QUINTTAP, true))));
    }

    #[test]
    fn test_slot_lifecycle() {
        let mut slots = SlotTracker::new();
        let release = raw(AbsEvent::new(Abs::MT_TRACKING_ID, -1).into());

        let out = slots.frame(&frame(vec![touch(3, 100, true)]), false, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 3);
        let events = raws(&out[0].1);
        assert_eq!(events[0], raw(AbsEvent::new(Abs::MT_TRACKING_ID, 1).into()));
        assert!(events.contains(&raw(AbsEvent::new(Abs::MT_TOUCH_MAJOR, 40).into())));
        assert!(events.contains(&raw(AbsEvent::new(Abs::MT_ORIENTATION, -2).into())));

        // A continuing contact keeps its tracking id.
        let out = slots.frame(&frame(vec![touch(3, 110, true)]), false, false);
        assert!(!raws(&out[0].1).iter().any(|e| same_code(*e, release)));
        assert!(raws(&out[0].1).contains(&raw(AbsEvent::new(Abs::MT_POSITION_X, 110).into())));

        // Lifted explicitly.
        let out = slots.frame(&frame(vec![touch(3, 110, false)]), false, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 3);
        assert_eq!(raws(&out[0].1), vec![release]);

        // A new contact on the same slot gets a fresh tracking id.
        let out = slots.frame(&frame(vec![touch(3, 0, true)]), false, false);
        assert_eq!(raws(&out[0].1)[0], raw(AbsEvent::new(Abs::MT_TRACKING_ID, 2).into()));

        // Vanished without a lift record.
        slots.frame(&frame(vec![touch(5, 0, true)]), false, false);
        let out = slots.frame(&frame(vec![]), false, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 5);
        assert_eq!(raws(&out[0].1), vec![release]);
    }

    #[test]
    fn test_raw_and_trackpad2_axes() {
        let mut slots = SlotTracker::new();
        let mut t = touch(1, 0, true);
        t.raw_state = Some(0x45);

        let out = slots.frame(&frame(vec![t]), true, true);
        let events = raws(&out[0].1);
        assert!(events.contains(&raw(MiscEvent::new(Misc::RAW, 0x45).into())));
        assert!(events.contains(&raw(AbsEvent::new(Abs::TOOL_WIDTH, 9).into())));
        assert!(events.contains(&raw(AbsEvent::new(Abs::MT_PRESSURE, TRACKPAD2_PRESSURE).into())));

        // Not registered: never written.
        let mut slots = SlotTracker::new();
        let out = slots.frame(&frame(vec![t]), false, false);
        assert!(!raws(&out[0].1).contains(&raw(MiscEvent::new(Misc::RAW, 0x45).into())));
    }

    #[test]
    fn test_raw_passthrough_registration() {
        let on = Tunables {
            report_undeciphered: true,
            ..Tunables::default()
        };
        assert!(raw_passthrough(DeviceClass::MagicMouse, &on));
        assert!(raw_passthrough(DeviceClass::MagicTrackpad, &on));
        assert!(!raw_passthrough(DeviceClass::MagicTrackpad2, &on));
        assert!(!raw_passthrough(DeviceClass::MagicMouse2, &Tunables::default()));
    }

    #[test]
    fn test_pointer_follows_oldest_contact() {
        let mut slots = SlotTracker::new();
        slots.frame(&frame(vec![touch(7, 700, true)]), false, false);
        // Slot 2 comes first in the report but landed later.
        let output = frame(vec![touch(2, 200, true), touch(7, 710, true)]);
        slots.frame(&output, false, false);

        assert_eq!(slots.oldest(&output.touches).map(|t| t.x), Some(710));

        let events = raws(&trackpad_events(&output, slots.oldest(&output.touches), true));
        assert!(events.contains(&raw(AbsEvent::new(Abs::X, 710).into())));
        assert!(events.contains(&raw(AbsEvent::new(Abs::PRESSURE, TRACKPAD2_PRESSURE).into())));
        assert!(events.contains(&raw(key(Key::BTN_TOOL_DOUBLETAP, true))));
    }

    #[test]
    fn test_mouse_events() {
        let output = DecodedOutput {
            motion: Some((3, 0)),
            buttons: Buttons::from_bits(Buttons::MIDDLE),
            wheel_hr: Some((0, -12)),
            ..DecodedOutput::default()
        };
        let events = raws(&mouse_events(&output, true));
        assert!(events.contains(&raw(key(Key::BTN_MIDDLE, true))));
        assert!(events.contains(&raw(rel(Rel::X, 3))));
        assert!(!events.iter().any(|e| same_code(*e, raw(rel(Rel::Y, 0)))));
        assert!(events.contains(&raw(rel(Rel::WHEEL_HI_RES, -12))));
        assert!(!events.iter().any(|e| same_code(*e, raw(rel(Rel::WHEEL, 0)))));

        let events = raws(&mouse_events(&output, false));
        assert!(!events.iter().any(|e| same_code(*e, raw(key(Key::BTN_MIDDLE, false)))));
    }
}
