//! Hardware device trait definitions.
//!
//! These traits are the only way the controller reaches the physical
//! world: the badge reader, the analog current input, digital inputs, and
//! the relay output. Two higher-level adapters sit on top of the raw
//! inputs, [`CurrentSensor`] and [`StopSignal`], so the controller deals in
//! booleans rather than samples and line levels.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT). Every method returns without waiting on the outside world
//! beyond a bounded, short operation; nothing here blocks a tick
//! indefinitely.
//!
//! # Object Safety
//!
//! **NOTE**: These traits are NOT object-safe because `async fn` methods
//! return `impl Future`. Use generic type parameters, or the enum wrappers
//! in [`devices`](crate::devices) where a runtime choice is needed.

#![allow(async_fn_in_trait)]

use std::time::Instant;

use bytes::BytesMut;

use crate::error::Result;

/// Byte source from an RFID reader.
///
/// # Examples
///
/// ```no_run
/// use bytes::BytesMut;
/// use interlock_hardware::traits::BadgeReader;
/// use interlock_hardware::Result;
///
/// async fn drain<R: BadgeReader>(reader: &mut R) -> Result<BytesMut> {
///     let mut buf = BytesMut::new();
///     reader.set_enabled(true).await?;
///     reader.read_available(&mut buf).await?;
///     Ok(buf)
/// }
/// ```
pub trait BadgeReader: Send {
    /// Append every byte currently available to `buf` without waiting.
    ///
    /// Returns the number of bytes appended (zero when nothing is pending).
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or the read fails.
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize>;

    /// Enable or disable the reader's RF field.
    ///
    /// A disabled reader does not produce frames; this is how the
    /// quiescent period after a successful read is enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if the enable line cannot be driven.
    async fn set_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Drop any bytes buffered by the device or driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot be cleared.
    async fn discard_pending(&mut self) -> Result<()>;
}

/// Raw analog input, one sample per call.
pub trait AnalogInput: Send {
    /// Take one raw sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample cannot be read or parsed.
    async fn read_sample(&mut self) -> Result<u16>;
}

/// Raw digital input.
pub trait DigitalInput: Send {
    /// Whether the line is at its active level.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be read.
    async fn is_active(&mut self) -> Result<bool>;
}

/// Single on/off output driving the tool's relay.
pub trait RelayOutput: Send {
    /// Drive the relay. Writing the current state again is allowed and
    /// simply repeats the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the output line cannot be driven.
    async fn set_energized(&mut self, energized: bool) -> Result<()>;
}

/// Reports whether the tool is drawing power.
pub trait CurrentSensor: Send {
    /// Sample the current and decide whether the tool is running.
    ///
    /// # Errors
    ///
    /// Returns an error if sampling fails. Callers treat an error as
    /// "not drawing".
    async fn is_drawing_power(&mut self) -> Result<bool>;
}

/// Manual stop request.
pub trait StopSignal: Send {
    /// Whether a stop is being requested at `now`.
    ///
    /// Implementations poll their input on every call so debounce state
    /// stays current even while no session is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read. Callers treat an error
    /// as a stop request.
    async fn is_asserted(&mut self, now: Instant) -> Result<bool>;
}
