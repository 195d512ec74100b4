//! Serial RFID reader driver.
//!
//! The reader streams frames at 2400 baud and has an active-low enable
//! input, wired to the adapter's DTR line. Reads never wait: only the bytes
//! the driver already holds are taken.

use std::io::Read;
use std::time::Duration;

use bytes::BytesMut;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use crate::traits::BadgeReader;
use crate::types::ActiveLevel;
use crate::{HardwareError, Result};

/// RFID reader on a serial port.
pub struct SerialBadgeReader {
    port: Box<dyn SerialPort>,
    device: String,
    enable_level: ActiveLevel,
}

impl std::fmt::Debug for SerialBadgeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialBadgeReader")
            .field("device", &self.device)
            .field("enable_level", &self.enable_level)
            .finish()
    }
}

impl SerialBadgeReader {
    /// Open the port with the reader disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened or configured.
    pub fn open(device: &str, baud_rate: u32, enable_level: ActiveLevel) -> Result<Self> {
        info!("Opening badge reader on {} @ {} baud", device, baud_rate);

        let port = serialport::new(device, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| {
                HardwareError::open(format!(
                    "serial port {} open failed: {}",
                    device, e
                ))
            })?;

        let mut reader = Self {
            port,
            device: device.to_string(),
            enable_level,
        };
        reader.drive_enable(false)?;
        Ok(reader)
    }

    fn drive_enable(&mut self, enabled: bool) -> Result<()> {
        // DTR asserted pulls the enable pin low.
        let dtr = self.enable_level.raw(enabled) == 0;
        self.port
            .write_data_terminal_ready(dtr)
            .map_err(|e| HardwareError::bus(format!("DTR write failed: {}", e)))
    }

    fn map_serial_error(&self, e: serialport::Error) -> HardwareError {
        match e.kind() {
            serialport::ErrorKind::NoDevice => HardwareError::disconnected(self.device.clone()),
            _ => HardwareError::bus(e.to_string()),
        }
    }
}

impl BadgeReader for SerialBadgeReader {
    async fn read_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|e| self.map_serial_error(e))? as usize;
        if pending == 0 {
            return Ok(0);
        }

        let mut chunk = vec![0u8; pending];
        let n = self.port.read(&mut chunk)?;
        buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    async fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.drive_enable(enabled)?;
        debug!(enabled, "Badge reader enable driven");
        Ok(())
    }

    async fn discard_pending(&mut self) -> Result<()> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| self.map_serial_error(e))
    }
}
