use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::device::{DeviceClass, Link};

#[derive(Parser)]
#[command(name = "magic-pad")]
#[command(about = "Decode Apple Magic Mouse and Magic Trackpad touch reports into pointer events")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// hidraw device node of the mouse or trackpad
    #[arg(long, env = "MAGICPAD_DEVICE")]
    pub device: Option<PathBuf>,

    /// Device class (magic-mouse, magic-mouse-2, magic-trackpad, magic-trackpad-2); detected when omitted
    #[arg(long, value_parser = clap::value_parser!(DeviceClass))]
    pub class: Option<DeviceClass>,

    /// Link the device is attached through (usb, bluetooth); detected when omitted
    #[arg(long, value_parser = clap::value_parser!(Link))]
    pub link: Option<Link>,

    /// Path to config file
    #[arg(long, env = "MAGICPAD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub tunables: TunableArgs,
}

/// Command-line overrides for the emulation tunables.
#[derive(Args, Debug, Clone, Default)]
pub struct TunableArgs {
    /// Do not emulate a middle button
    #[arg(long)]
    pub no_middle_button: bool,

    /// Use a two-finger click for the middle button
    #[arg(long)]
    pub middle_click_3finger: bool,

    /// Left edge of the middle-button band (device units)
    #[arg(long, allow_hyphen_values = true)]
    pub middle_button_start: Option<i32>,

    /// Right edge of the middle-button band (device units)
    #[arg(long, allow_hyphen_values = true)]
    pub middle_button_stop: Option<i32>,

    /// Do not emulate a scroll wheel
    #[arg(long)]
    pub no_scroll: bool,

    /// Scroll speed, 0 (slow) to 63 (fast)
    #[arg(long)]
    pub scroll_speed: Option<u32>,

    /// Horizontal distance before scrolling starts
    #[arg(long)]
    pub scroll_delay_x: Option<u32>,

    /// Vertical distance before scrolling starts
    #[arg(long)]
    pub scroll_delay_y: Option<u32>,

    /// Do not accelerate sequential scroll gestures
    #[arg(long)]
    pub no_scroll_acceleration: bool,

    /// Report undeciphered touch state bits
    #[arg(long)]
    pub report_undeciphered: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print decoded reports for debugging
    Dump,
}
