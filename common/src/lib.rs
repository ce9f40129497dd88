pub mod config;
pub mod display;
pub mod error;
pub mod heat_index;
pub mod hysteresis;
pub mod ports;
pub mod sampling;
pub mod types;

pub use config::ClimateConfig;
pub use display::DisplayOp;
pub use error::{ConfigError, DisplayError, RelayError, SensorError};
pub use hysteresis::{HysteresisController, Thresholds, Transition};
pub use ports::{CharacterDisplay, ClimateSensor, Relay};
pub use sampling::{PollOutcome, Ports, SamplingLoop};
pub use types::{Actuator, ActivityCounter, ActuatorTransition, CycleReport, Reading};
