use super::{Axis, DeviceProfile, Diagnostic};

pub const MAGIC_TRACKPAD: DeviceProfile = DeviceProfile {
    name: "Apple Magic Trackpad",

    // 130 x 110 mm
    x: Axis {
        min: -2909,
        max: 3167,
        dimension: 13000.0,
    },
    y: Axis {
        min: -2456,
        max: 2565,
        dimension: 11000.0,
    },
    orientation_min: -31,
    orientation_max: 32,

    diagnostic: Diagnostic::ExtraByte,

    multitouch_usb: &[0xd7, 0x01],
    multitouch_bt: &[0xd7, 0x01],
    retry_multitouch: false,
};
