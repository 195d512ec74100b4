//! Device driver errors.
//!
//! The controller never treats these as fatal: a failed read is handled as
//! the fail-closed reading (not drawing, stop asserted, no badge).

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device node went away (USB reader unplugged, chip removed).
    #[error("{device} disconnected")]
    Disconnected { device: String },

    /// A read or write on an open device failed.
    #[error("device bus error: {0}")]
    Bus(String),

    /// The device answered with something that is not a reading.
    #[error("invalid reading: {0}")]
    InvalidReading(String),

    /// The device could not be opened or configured at startup.
    #[error("failed to open device: {0}")]
    Open(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus(message.into())
    }

    pub fn invalid_reading(message: impl Into<String>) -> Self {
        Self::InvalidReading(message.into())
    }

    pub fn open(message: impl Into<String>) -> Self {
        Self::Open(message.into())
    }

    /// True when retrying on the same handle cannot succeed.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_names_device() {
        let error = HardwareError::disconnected("/dev/ttyUSB0");
        assert!(error.is_disconnected());
        assert_eq!(error.to_string(), "/dev/ttyUSB0 disconnected");
    }

    #[test]
    fn test_bus_error_is_not_disconnect() {
        let error = HardwareError::bus("relay write failed");
        assert!(!error.is_disconnected());
        assert_eq!(error.to_string(), "device bus error: relay write failed");
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: HardwareError = io.into();
        assert!(matches!(error, HardwareError::Io(_)));
        assert_eq!(error.to_string(), "missing");
    }
}
