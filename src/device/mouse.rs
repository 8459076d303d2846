use super::{Axis, DeviceProfile, Diagnostic};

/// Shared by both mouse generations (90.56 x 51.52 mm surface).
const MOUSE_X: Axis = Axis {
    min: -1100,
    max: 1258,
    dimension: 9056.0,
};
const MOUSE_Y: Axis = Axis {
    min: -1589,
    max: 2047,
    dimension: 5152.0,
};

pub const MAGIC_MOUSE: DeviceProfile = DeviceProfile {
    name: "Apple Magic Mouse",

    x: MOUSE_X,
    y: MOUSE_Y,
    orientation_min: -31,
    orientation_max: 32,

    diagnostic: Diagnostic::StateByte,

    multitouch_usb: &[0xd7, 0x01],
    multitouch_bt: &[0xd7, 0x01],
    retry_multitouch: false,
};

pub const MAGIC_MOUSE_2: DeviceProfile = DeviceProfile {
    name: "Apple Magic Mouse 2",

    x: MOUSE_X,
    y: MOUSE_Y,
    orientation_min: -31,
    orientation_max: 32,

    diagnostic: Diagnostic::StateByte,

    multitouch_usb: &[0xf1, 0x02, 0x01],
    multitouch_bt: &[0xf1, 0x02, 0x01],
    retry_multitouch: true,
};
