//! Switching a device into multi-touch reporting mode.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::device::{DeviceClass, Link};
use crate::hidraw::FeatureDevice;

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// A delayed second attempt at the feature report. Dropping it cancels
/// the attempt if it has not fired yet.
pub struct PendingRetry {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for PendingRetry {
    fn drop(&mut self) {
        // Closing the channel wakes the timer thread early.
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn schedule_retry<D: FeatureDevice>(device: Arc<D>, feature: &'static [u8]) -> io::Result<PendingRetry> {
    let (cancel, cancelled) = mpsc::channel::<()>();
    let handle = std::thread::Builder::new()
        .name("multitouch-retry".into())
        .spawn(move || {
            if cancelled.recv_timeout(RETRY_DELAY) != Err(RecvTimeoutError::Timeout) {
                return;
            }
            match device.set_feature(feature) {
                Ok(()) => log::info!("Multi-touch enabled on retry"),
                Err(e) => log::error!("Multi-touch retry failed: {}", e),
            }
        })?;

    Ok(PendingRetry {
        cancel: Some(cancel),
        handle: Some(handle),
    })
}

/// Send the multi-touch feature report for `class`.
///
/// Failures are logged, never fatal. EIO is expected from some firmware
/// while it is still switching modes; devices that need it get one more
/// attempt after a short delay, owned by the returned guard. An error is
/// returned only if the retry cannot be scheduled.
pub fn enable_multitouch<D: FeatureDevice>(
    device: &Arc<D>,
    class: DeviceClass,
    link: Link,
) -> io::Result<Option<PendingRetry>> {
    let profile = class.profile();
    let feature = profile.multitouch_feature(link);

    match device.set_feature(feature) {
        Ok(()) => {
            log::info!("Multi-touch enabled ({} over {})", class, link);
            Ok(None)
        }
        Err(e) if e.raw_os_error() == Some(libc::EIO) => {
            if profile.retry_multitouch {
                log::warn!("Multi-touch request returned EIO, retrying in {}ms", RETRY_DELAY.as_millis());
                schedule_retry(Arc::clone(device), feature).map(Some)
            } else {
                log::warn!("Multi-touch request returned EIO, ignoring");
                Ok(None)
            }
        }
        Err(e) => {
            // The device keeps sending its default reports; decoding goes on.
            log::error!("Unable to request touch data ({} over {}): {}", class, link, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every feature report; fails with the queued errnos first.
    #[derive(Default)]
    struct FakeDevice {
        sent: Mutex<Vec<Vec<u8>>>,
        failures: Mutex<Vec<i32>>,
    }

    impl FakeDevice {
        fn failing(errnos: &[i32]) -> Arc<Self> {
            Arc::new(Self {
                failures: Mutex::new(errnos.to_vec()),
                ..Self::default()
            })
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl FeatureDevice for FakeDevice {
        fn set_feature(&self, buf: &[u8]) -> io::Result<()> {
            self.sent.lock().unwrap().push(buf.to_vec());
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                Ok(())
            } else {
                Err(io::Error::from_raw_os_error(failures.remove(0)))
            }
        }
    }

    #[test]
    fn test_success_sends_class_feature() {
        let device = FakeDevice::failing(&[]);
        let retry = enable_multitouch(&device, DeviceClass::MagicTrackpad2, Link::Usb).unwrap();
        assert!(retry.is_none());
        assert_eq!(device.sent(), vec![vec![0x02, 0x01]]);
    }

    #[test]
    fn test_eio_retries_once_after_delay() {
        let device = FakeDevice::failing(&[libc::EIO]);
        let retry = enable_multitouch(&device, DeviceClass::MagicMouse2, Link::Bluetooth).unwrap();
        assert!(retry.is_some());
        assert_eq!(device.sent().len(), 1);

        std::thread::sleep(RETRY_DELAY + Duration::from_millis(300));
        drop(retry);
        assert_eq!(device.sent(), vec![vec![0xf1, 0x02, 0x01]; 2]);
    }

    #[test]
    fn test_eio_without_retry() {
        let device = FakeDevice::failing(&[libc::EIO]);
        let retry = enable_multitouch(&device, DeviceClass::MagicMouse, Link::Bluetooth).unwrap();
        assert!(retry.is_none());
        assert_eq!(device.sent(), vec![vec![0xd7, 0x01]]);
    }

    #[test]
    fn test_dropped_retry_never_fires() {
        let device = FakeDevice::failing(&[libc::EIO]);
        let retry = enable_multitouch(&device, DeviceClass::MagicMouse2, Link::Bluetooth).unwrap();
        drop(retry);

        std::thread::sleep(RETRY_DELAY + Duration::from_millis(100));
        assert_eq!(device.sent().len(), 1);
    }

    #[test]
    fn test_other_errors_do_not_stop_decoding() {
        let device = FakeDevice::failing(&[libc::EPIPE]);
        let retry = enable_multitouch(&device, DeviceClass::MagicMouse2, Link::Bluetooth).unwrap();
        assert!(retry.is_none());
        assert_eq!(device.sent().len(), 1);
    }
}
