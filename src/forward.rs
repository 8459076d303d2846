//! Read reports from a hidraw node and forward them to a uinput device.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use evdevil::{Bus, InputId};

use crate::config::{Config, Tunables};
use crate::decoder::Decoder;
use crate::device::DeviceClass;
use crate::handshake::{self, PendingRetry};
use crate::hidraw::{DeviceInfo, HidrawDevice, MAX_REPORT_SIZE};
use crate::sink::UinputSink;

const RELOAD_INTERVAL: Duration = Duration::from_secs(1);

/// An opened device in multi-touch mode. Dropping it cancels any pending
/// handshake retry.
pub struct Session {
    pub device: Arc<HidrawDevice>,
    pub info: DeviceInfo,
    pub class: DeviceClass,
    _retry: Option<PendingRetry>,
}

impl Session {
    pub fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let device = Arc::new(HidrawDevice::open(&config.device)?);
        let info = device.info()?;

        let class = match config.class.or_else(|| DeviceClass::from_ids(info.vendor, info.product)) {
            Some(class) => class,
            None => {
                return Err(format!(
                    "{} is not a supported device ({:04x}:{:04x})",
                    config.device.display(),
                    info.vendor,
                    info.product
                )
                .into())
            }
        };
        let link = config.link.unwrap_or_else(|| info.link());
        log::info!("Found {} over {} at {}", class, link, config.device.display());

        let retry = handshake::enable_multitouch(&device, class, link)?;

        Ok(Self {
            device,
            info,
            class,
            _retry: retry,
        })
    }

    fn input_id(&self) -> InputId {
        InputId::new(Bus::from_raw(self.info.bus as u16), self.info.vendor, self.info.product, 0)
    }
}

/// Watches the config file and yields new tunables when it changes.
struct ConfigWatch<'a> {
    config: &'a Config,
    modified: Option<SystemTime>,
    last_check: Instant,
}

impl<'a> ConfigWatch<'a> {
    fn new(config: &'a Config) -> Self {
        Self {
            config,
            modified: config.source.as_deref().and_then(modified_time),
            last_check: Instant::now(),
        }
    }

    fn poll(&mut self, now: Instant) -> Option<Tunables> {
        if now.duration_since(self.last_check) < RELOAD_INTERVAL {
            return None;
        }
        self.last_check = now;

        let modified = modified_time(self.config.source.as_deref()?)?;
        if self.modified == Some(modified) {
            return None;
        }
        self.modified = Some(modified);

        let tunables = self.config.reload_tunables()?;
        match tunables.validate() {
            Ok(()) => Some(tunables),
            Err(e) => {
                log::warn!("Ignoring config change: {}", e);
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Emulation changes that add or remove uinput capabilities.
fn needs_new_device(old: &Tunables, new: &Tunables) -> bool {
    old.emulate_3button != new.emulate_3button
        || old.emulate_scroll_wheel != new.emulate_scroll_wheel
        || old.report_undeciphered != new.report_undeciphered
}

fn log_frame_progress(frame_count: &mut u64, decoder: &Decoder) {
    if *frame_count == 0 {
        log::info!("Touch events flowing");
    }
    *frame_count += 1;

    if (*frame_count).is_multiple_of(500) {
        log::debug!(
            "Reports: {}, contacts: {}, scroll accel: {}",
            frame_count,
            decoder.touches().active_count(),
            decoder.scroll_accel()
        );
    }
}

/// Run one forwarding session. Returns on read errors, device removal or a
/// config change that needs a new virtual device.
pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let session = Session::open(config)?;

    log::info!("Creating {} uinput device", session.class);
    let mut sink = UinputSink::create(session.class, &config.tunables, session.input_id())?;
    let mut decoder = Decoder::new(session.class, config.tunables);
    let mut watch = ConfigWatch::new(config);

    log::info!("Forwarding started");

    let mut buf = [0u8; MAX_REPORT_SIZE];
    let mut frame_count: u64 = 0;

    loop {
        let len = session.device.read_report(&mut buf)?;
        if len == 0 {
            return Err("device closed".into());
        }

        let now = Instant::now();
        if decoder.feed(&buf[..len], now, &mut sink)? {
            log_frame_progress(&mut frame_count, &decoder);
        }

        if let Some(tunables) = watch.poll(now) {
            if needs_new_device(decoder.tunables(), &tunables) {
                return Err("device capabilities changed, recreating device".into());
            }
            log::info!("Reloaded emulation settings");
            decoder.reconfigure(tunables);
        }
    }
}
