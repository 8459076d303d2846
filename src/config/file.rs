use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::Tunables;
use crate::device::{DeviceClass, Link};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub device: Option<PathBuf>,
    pub class: Option<DeviceClass>,
    pub link: Option<Link>,
    #[serde(default)]
    pub emulation: Tunables,
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

/// First parseable config from the default locations, with its path.
pub fn load_from_default_paths() -> Option<(PathBuf, FileConfig)> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some((path, config));
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("magic-pad.toml"));

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("magic-pad.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let config: FileConfig = toml::from_str(
            r#"
            device = "/dev/hidraw3"
            class = "magic-mouse-2"
            link = "bluetooth"

            [emulation]
            middle_click_3finger = true
            scroll_speed = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.device, Some(PathBuf::from("/dev/hidraw3")));
        assert_eq!(config.class, Some(DeviceClass::MagicMouse2));
        assert_eq!(config.link, Some(Link::Bluetooth));
        assert!(config.emulation.middle_click_3finger);
        assert_eq!(config.emulation.scroll_speed, 32);
    }

    #[test]
    fn test_parse_empty() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.device.is_none());
        assert_eq!(config.emulation, Tunables::default());
    }

    #[test]
    fn test_class_names_match_display() {
        for class in [
            DeviceClass::MagicMouse,
            DeviceClass::MagicMouse2,
            DeviceClass::MagicTrackpad,
            DeviceClass::MagicTrackpad2,
        ] {
            let config: FileConfig = toml::from_str(&format!("class = \"{}\"", class)).unwrap();
            assert_eq!(config.class, Some(class));
        }
        for link in [Link::Usb, Link::Bluetooth] {
            let config: FileConfig = toml::from_str(&format!("link = \"{}\"", link)).unwrap();
            assert_eq!(config.link, Some(link));
        }

        let config: FileConfig = toml::from_str("class = \"trackpad2\"\nlink = \"bt\"").unwrap();
        assert_eq!(config.class, Some(DeviceClass::MagicTrackpad2));
        assert_eq!(config.link, Some(Link::Bluetooth));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(toml::from_str::<FileConfig>("host = \"x\"").is_err());
    }
}
