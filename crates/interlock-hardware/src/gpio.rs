//! GPIO character-device drivers for the relay and the stop button.

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use tracing::{debug, info};

use crate::traits::{DigitalInput, RelayOutput};
use crate::types::ActiveLevel;
use crate::{HardwareError, Result};

const CONSUMER: &str = "interlockd";

fn request_line(chip_path: &str, line: u32, flags: LineRequestFlags, initial: u8) -> Result<LineHandle> {
    let mut chip = Chip::new(chip_path).map_err(|e| {
        HardwareError::open(format!("GPIO chip {} open failed: {}", chip_path, e))
    })?;

    let line_ref = chip.get_line(line).map_err(|e| {
        HardwareError::open(format!("GPIO line {} failed: {}", line, e))
    })?;

    line_ref
        .request(flags, initial, CONSUMER)
        .map_err(|e| HardwareError::open(format!("GPIO request failed: {}", e)))
}

/// Relay driven by one GPIO output line.
#[derive(Debug)]
pub struct GpioRelay {
    handle: LineHandle,
    level: ActiveLevel,
}

impl GpioRelay {
    /// Claim the output line. The relay starts de-energized.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip or line cannot be opened.
    pub fn open(chip: &str, line: u32, level: ActiveLevel) -> Result<Self> {
        info!("Initializing relay on {} line {}", chip, line);
        let handle = request_line(chip, line, LineRequestFlags::OUTPUT, level.raw(false))?;
        Ok(Self { handle, level })
    }
}

impl RelayOutput for GpioRelay {
    async fn set_energized(&mut self, energized: bool) -> Result<()> {
        self.handle
            .set_value(self.level.raw(energized))
            .map_err(|e| HardwareError::bus(format!("relay write failed: {}", e)))?;
        debug!(energized, "Relay driven");
        Ok(())
    }
}

/// Digital input on one GPIO line.
#[derive(Debug)]
pub struct GpioInput {
    handle: LineHandle,
    level: ActiveLevel,
}

impl GpioInput {
    /// Claim the input line.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip or line cannot be opened.
    pub fn open(chip: &str, line: u32, level: ActiveLevel) -> Result<Self> {
        info!("Initializing input on {} line {}", chip, line);
        let handle = request_line(chip, line, LineRequestFlags::INPUT, 0)?;
        Ok(Self { handle, level })
    }
}

impl DigitalInput for GpioInput {
    async fn is_active(&mut self) -> Result<bool> {
        let raw = self
            .handle
            .get_value()
            .map_err(|e| HardwareError::bus(format!("GPIO read failed: {}", e)))?;
        Ok(self.level.is_active(raw))
    }
}
