//! Hardware layer for the power interlock.
//!
//! Everything the controller touches in the physical world goes through the
//! traits in [`traits`]:
//!
//! - [`BadgeReader`](traits::BadgeReader): raw bytes from the RFID reader,
//!   turned into badges by [`BadgeDecoder`] and [`BadgeFrameCodec`]
//! - [`CurrentSensor`](traits::CurrentSensor): whether the tool is running,
//!   usually a [`PeakCurrentSensor`] over an [`AnalogInput`](traits::AnalogInput)
//! - [`StopSignal`](traits::StopSignal): the manual stop, usually a
//!   [`DebouncedStopButton`] over a [`DigitalInput`](traits::DigitalInput)
//! - [`RelayOutput`](traits::RelayOutput): the relay feeding the tool
//!
//! # Drivers
//!
//! | driver | feature | device |
//! |--------|---------|--------|
//! | [`serial::SerialBadgeReader`] | `hardware-serial` | 125 kHz reader on a serial port |
//! | [`gpio::GpioRelay`], [`gpio::GpioInput`] | `hardware-gpio` | GPIO character device lines |
//! | [`iio::IioAnalogInput`] | always | Linux IIO ADC channel |
//!
//! The [`mock`] module provides `(device, handle)` pairs for every trait so
//! the controller can be exercised without hardware.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`] with a [`HardwareError`]. Nothing in
//! this crate decides what a failure means; the controller maps each one to
//! its fail-closed outcome.

pub mod button;
pub mod codec;
pub mod decoder;
pub mod devices;
pub mod error;
#[cfg(feature = "hardware-gpio")]
pub mod gpio;
pub mod iio;
pub mod mock;
pub mod sensor;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use button::DebouncedStopButton;
pub use codec::{BadgeFrameCodec, decode_frame};
pub use decoder::BadgeDecoder;
pub use devices::AnyStopSignal;
pub use error::{HardwareError, Result};
pub use sensor::PeakCurrentSensor;
pub use types::ActiveLevel;
