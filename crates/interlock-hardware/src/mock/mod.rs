//! Mock device implementations for testing and development.
//!
//! Each mock comes as a `(device, handle)` pair. The device is handed to
//! the code under test; the handle stays with the test and drives or
//! inspects the simulated hardware.

pub mod analog;
pub mod digital;
pub mod reader;
pub mod relay;
pub mod sensor;

// Re-export commonly used types
pub use analog::{MockAnalogInput, MockAnalogInputHandle};
pub use digital::{MockDigitalInput, MockDigitalInputHandle};
pub use reader::{MockBadgeReader, MockBadgeReaderHandle};
pub use relay::{MockRelay, MockRelayHandle};
pub use sensor::{MockCurrentSensor, MockCurrentSensorHandle};
