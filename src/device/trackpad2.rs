use super::{Axis, DeviceProfile, Diagnostic};

/// Magic Trackpad 2. The same name is used over USB and Bluetooth so that
/// desktop settings apply to both.
pub const MAGIC_TRACKPAD_2: DeviceProfile = DeviceProfile {
    name: "Apple Inc. Magic Trackpad 2",

    // 160 x 114.9 mm
    x: Axis {
        min: -3678,
        max: 3934,
        dimension: 16000.0,
    },
    y: Axis {
        min: -2478,
        max: 2587,
        dimension: 11490.0,
    },
    orientation_min: -3,
    orientation_max: 4,

    diagnostic: Diagnostic::Unsupported,

    multitouch_usb: &[0x02, 0x01],
    multitouch_bt: &[0xf1, 0x02, 0x01],
    retry_multitouch: false,
};
