//! Decoder for Apple Magic Mouse and Magic Trackpad multi-touch reports.

pub mod buttons;
pub mod config;
pub mod decoder;
pub mod device;
pub mod dump;
pub mod event;
pub mod forward;
pub mod handshake;
pub mod hidraw;
pub mod report;
pub mod scroll;
pub mod sink;
pub mod state;

pub use decoder::Decoder;
pub use report::DecodeError;
