mod mouse;
mod trackpad;
mod trackpad2;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub use mouse::{MAGIC_MOUSE, MAGIC_MOUSE_2};
pub use trackpad::MAGIC_TRACKPAD;
pub use trackpad2::MAGIC_TRACKPAD_2;

pub const USB_VENDOR_ID_APPLE: u16 = 0x05ac;
pub const BT_VENDOR_ID_APPLE: u16 = 0x004c;

pub const PRODUCT_ID_MAGIC_MOUSE: u16 = 0x030d;
pub const PRODUCT_ID_MAGIC_MOUSE_2: u16 = 0x0269;
pub const PRODUCT_ID_MAGIC_TRACKPAD: u16 = 0x030e;
pub const PRODUCT_ID_MAGIC_TRACKPAD_2: u16 = 0x0265;

/// Device family; selects geometry and the emission branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    #[serde(alias = "mouse")]
    MagicMouse,
    #[serde(rename = "magic-mouse-2", alias = "mouse2", alias = "mouse-2")]
    MagicMouse2,
    #[serde(alias = "trackpad")]
    MagicTrackpad,
    #[serde(rename = "magic-trackpad-2", alias = "trackpad2", alias = "trackpad-2")]
    MagicTrackpad2,
}

impl DeviceClass {
    pub fn profile(self) -> &'static DeviceProfile {
        match self {
            DeviceClass::MagicMouse => &MAGIC_MOUSE,
            DeviceClass::MagicMouse2 => &MAGIC_MOUSE_2,
            DeviceClass::MagicTrackpad => &MAGIC_TRACKPAD,
            DeviceClass::MagicTrackpad2 => &MAGIC_TRACKPAD_2,
        }
    }

    /// Mice report relative motion and run button/scroll emulation.
    pub fn is_mouse(self) -> bool {
        matches!(self, DeviceClass::MagicMouse | DeviceClass::MagicMouse2)
    }

    pub fn supports_scroll(self) -> bool {
        self.is_mouse()
    }

    /// Map a HID vendor/product pair to a device class.
    pub fn from_ids(vendor: u16, product: u16) -> Option<Self> {
        if vendor != USB_VENDOR_ID_APPLE && vendor != BT_VENDOR_ID_APPLE {
            return None;
        }
        match product {
            PRODUCT_ID_MAGIC_MOUSE => Some(DeviceClass::MagicMouse),
            PRODUCT_ID_MAGIC_MOUSE_2 => Some(DeviceClass::MagicMouse2),
            PRODUCT_ID_MAGIC_TRACKPAD => Some(DeviceClass::MagicTrackpad),
            PRODUCT_ID_MAGIC_TRACKPAD_2 => Some(DeviceClass::MagicTrackpad2),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::MagicMouse => write!(f, "magic-mouse"),
            DeviceClass::MagicMouse2 => write!(f, "magic-mouse-2"),
            DeviceClass::MagicTrackpad => write!(f, "magic-trackpad"),
            DeviceClass::MagicTrackpad2 => write!(f, "magic-trackpad-2"),
        }
    }
}

impl FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "magic-mouse" | "mouse" => Ok(DeviceClass::MagicMouse),
            "magic-mouse-2" | "mouse2" | "mouse-2" => Ok(DeviceClass::MagicMouse2),
            "magic-trackpad" | "trackpad" => Ok(DeviceClass::MagicTrackpad),
            "magic-trackpad-2" | "trackpad2" | "trackpad-2" => Ok(DeviceClass::MagicTrackpad2),
            _ => Err(format!(
                "Invalid device class '{}'. Valid values: magic-mouse, magic-mouse-2, magic-trackpad, magic-trackpad-2",
                s
            )),
        }
    }
}

/// Physical link the device is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Link {
    Usb,
    #[default]
    #[serde(alias = "bt")]
    Bluetooth,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Usb => write!(f, "usb"),
            Link::Bluetooth => write!(f, "bluetooth"),
        }
    }
}

impl FromStr for Link {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "usb" => Ok(Link::Usb),
            "bluetooth" | "bt" => Ok(Link::Bluetooth),
            _ => Err(format!("Invalid link '{}'. Valid values: usb, bluetooth", s)),
        }
    }
}

/// One touch-surface axis. Dimension is in hundredths of a mm, min and max
/// are in device units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub min: i32,
    pub max: i32,
    pub dimension: f32,
}

impl Axis {
    /// Units per mm, truncated.
    pub fn resolution(&self) -> i32 {
        ((self.max - self.min) as f32 / (self.dimension / 100.0)) as i32
    }
}

/// Which record byte carries the undeciphered state bits, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// Byte 7, shared with the touch state nibble.
    StateByte,
    /// Byte 8 of a 9-byte record.
    ExtraByte,
    Unsupported,
}

/// Device-specific parameters for report handling.
#[derive(Debug, Clone, Copy)]
pub struct DeviceProfile {
    pub name: &'static str,

    // Touch surface geometry
    pub x: Axis,
    pub y: Axis,
    pub orientation_min: i32,
    pub orientation_max: i32,

    pub diagnostic: Diagnostic,

    // Feature reports that switch the device into multi-touch mode
    pub multitouch_usb: &'static [u8],
    pub multitouch_bt: &'static [u8],
    /// Some firmware answers the first request with EIO and needs a second one.
    pub retry_multitouch: bool,
}

impl DeviceProfile {
    pub fn multitouch_feature(&self, link: Link) -> &'static [u8] {
        match link {
            Link::Usb => self.multitouch_usb,
            Link::Bluetooth => self.multitouch_bt,
        }
    }
}
