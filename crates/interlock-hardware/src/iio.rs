//! Linux IIO analog input.
//!
//! ADCs exposed through the industrial I/O subsystem publish one raw
//! conversion per read of `in_voltageN_raw`.

use std::path::{Path, PathBuf};

use crate::traits::AnalogInput;
use crate::{HardwareError, Result};

/// Analog input backed by an IIO sysfs attribute.
#[derive(Debug, Clone)]
pub struct IioAnalogInput {
    path: PathBuf,
}

impl IioAnalogInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnalogInput for IioAnalogInput {
    async fn read_sample(&mut self) -> Result<u16> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        text.trim().parse::<u16>().map_err(|e| {
            HardwareError::invalid_reading(format!(
                "bad sample {:?} from {}: {}",
                text.trim(),
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Write `contents` to a sysfs-style sample file in a fresh directory.
    async fn sample_file(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in_voltage0_raw");
        tokio::fs::write(&path, contents).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_reads_raw_value() {
        let (_dir, path) = sample_file("517\n").await;

        let mut input = IioAnalogInput::new(&path);
        assert_eq!(input.read_sample().await.unwrap(), 517);
    }

    #[tokio::test]
    async fn test_rejects_garbage() {
        let (_dir, path) = sample_file("n/a\n").await;

        let mut input = IioAnalogInput::new(&path);
        let result = input.read_sample().await;
        assert!(matches!(result, Err(HardwareError::InvalidReading(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let mut input = IioAnalogInput::new(dir.path().join("in_voltage0_raw"));
        assert!(matches!(input.read_sample().await, Err(HardwareError::Io(_))));
    }
}
