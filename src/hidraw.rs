//! Blocking access to a `/dev/hidrawN` node.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::path::Path;

use crate::device::Link;

// _IOC(dir, type, nr, size) = (dir << 30) | (size << 16) | (type << 8) | nr
const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const BUS_BLUETOOTH: u32 = 0x05;

/// Largest report any supported device sends, compound reports included.
pub const MAX_REPORT_SIZE: usize = 1024;

const fn ioc(dir: u32, ty: u32, nr: u32, size: u32) -> libc::c_ulong {
    ((dir << 30) | (size << 16) | (ty << 8) | nr) as libc::c_ulong
}

const HIDIOCGRAWINFO: libc::c_ulong = ioc(IOC_READ, b'H' as u32, 0x03, size_of::<RawDevInfo>() as u32);

fn hidiocsfeature(len: u32) -> libc::c_ulong {
    ioc(IOC_WRITE | IOC_READ, b'H' as u32, 0x06, len)
}

#[repr(C)]
#[derive(Default)]
struct RawDevInfo {
    bustype: u32,
    vendor: i16,
    product: i16,
}

/// Bus and ids of the device behind a hidraw node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub bus: u32,
    pub vendor: u16,
    pub product: u16,
}

impl DeviceInfo {
    pub fn link(&self) -> Link {
        if self.bus == BUS_BLUETOOTH {
            Link::Bluetooth
        } else {
            Link::Usb
        }
    }
}

pub struct HidrawDevice {
    file: File,
}

impl HidrawDevice {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Block until the next input report arrives. Returns its length.
    pub fn read_report(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.file).read(buf)
    }

    pub fn info(&self) -> io::Result<DeviceInfo> {
        let mut raw = RawDevInfo::default();
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), HIDIOCGRAWINFO, &mut raw as *mut RawDevInfo) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(DeviceInfo {
            bus: raw.bustype,
            vendor: raw.vendor as u16,
            product: raw.product as u16,
        })
    }
}

/// A device that accepts HID feature reports.
pub trait FeatureDevice: Send + Sync + 'static {
    /// Send a feature report; the first byte is the report id.
    fn set_feature(&self, buf: &[u8]) -> io::Result<()>;
}

impl FeatureDevice for HidrawDevice {
    fn set_feature(&self, buf: &[u8]) -> io::Result<()> {
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), hidiocsfeature(buf.len() as u32), buf.as_ptr()) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}
