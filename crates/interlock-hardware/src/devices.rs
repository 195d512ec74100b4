//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the binary cannot hold
//! a `Box<dyn StopSignal>`. These enums give it one concrete type per role
//! regardless of whether the device is real, mocked, or absent.

use std::time::Instant;

use crate::Result;
use crate::button::DebouncedStopButton;
use crate::mock::MockDigitalInput;
use crate::traits::StopSignal;

#[cfg(feature = "hardware-gpio")]
use crate::gpio::GpioInput;

/// Stop signal chosen at startup.
///
/// # Examples
///
/// ```
/// use std::time::Instant;
/// use interlock_hardware::devices::AnyStopSignal;
/// use interlock_hardware::traits::StopSignal;
///
/// #[tokio::main]
/// async fn main() -> interlock_hardware::Result<()> {
///     let mut stop = AnyStopSignal::Disabled;
///     assert!(!stop.is_asserted(Instant::now()).await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyStopSignal {
    /// Debounced button on a GPIO line.
    #[cfg(feature = "hardware-gpio")]
    Gpio(DebouncedStopButton<GpioInput>),

    /// Debounced mock input for development and testing.
    Mock(DebouncedStopButton<MockDigitalInput>),

    /// No stop button fitted; never asserts.
    Disabled,
}

impl StopSignal for AnyStopSignal {
    async fn is_asserted(&mut self, now: Instant) -> Result<bool> {
        match self {
            #[cfg(feature = "hardware-gpio")]
            Self::Gpio(button) => button.is_asserted(now).await,
            Self::Mock(button) => button.is_asserted(now).await,
            Self::Disabled => Ok(false),
        }
    }
}
