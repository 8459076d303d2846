mod cli;
mod file;
mod tunables;

pub use cli::{Cli, Command, TunableArgs};
pub use tunables::{Tunables, MAX_SCROLL_SPEED};

use std::path::PathBuf;

use crate::device::{DeviceClass, Link};

const DEFAULT_DEVICE: &str = "/dev/hidraw0";

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub device: PathBuf,
    /// Overrides detection from the hidraw device info.
    pub class: Option<DeviceClass>,
    pub link: Option<Link>,
    pub tunables: Tunables,
    /// File the config was read from, if any. Watched for tunable changes.
    pub source: Option<PathBuf>,
    overrides: TunableArgs,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let (source, file_config) = match cli.config.as_ref() {
            Some(path) => (
                Some(path.clone()),
                file::load_from_path(path).unwrap_or_default(),
            ),
            None => match file::load_from_default_paths() {
                Some((path, config)) => (Some(path), config),
                None => (None, file::FileConfig::default()),
            },
        };

        Self {
            device: cli
                .device
                .clone()
                .or(file_config.device)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE)),
            class: cli.class.or(file_config.class),
            link: cli.link.or(file_config.link),
            tunables: file_config.emulation.with_overrides(&cli.tunables),
            source,
            overrides: cli.tunables.clone(),
        }
    }

    /// Re-read tunables from the config file, keeping CLI overrides on top.
    /// Returns None if there is no file or it does not parse.
    pub fn reload_tunables(&self) -> Option<Tunables> {
        let path = self.source.as_ref()?;
        let file_config = file::load_from_path(path)?;
        Some(file_config.emulation.with_overrides(&self.overrides))
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        self.tunables.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_load_file_with_cli_overrides() {
        let path = std::env::temp_dir().join(format!("magic-pad-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "class = \"magic-mouse-2\"\ndevice = \"/dev/hidraw7\"\n\n[emulation]\nscroll_speed = 40\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "magic-pad",
            "--config",
            path.to_str().unwrap(),
            "--no-scroll-acceleration",
        ])
        .unwrap();
        let config = Config::load(&cli);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.class, Some(DeviceClass::MagicMouse2));
        assert_eq!(config.device, PathBuf::from("/dev/hidraw7"));
        assert_eq!(config.tunables.scroll_speed, 40);
        assert!(!config.tunables.scroll_acceleration);
        assert_eq!(config.source, Some(path));
    }
}
