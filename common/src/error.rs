use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("sensor returned no reading")]
    NoReading,
    #[error("sensor returned non-finite values (temperature {temperature}, humidity {humidity})")]
    NonFinite { temperature: f64, humidity: f64 },
    #[error("sensor driver error: {0}")]
    Driver(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("glyph slot {0} is outside the controller's 8 custom characters")]
    GlyphSlot(u8),
    #[error("cursor ({col}, {row}) is off screen")]
    Cursor { col: u8, row: u8 },
    #[error("display bus error: {0}")]
    Bus(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relay `{relay}` write failed: {reason}")]
pub struct RelayError {
    pub relay: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("on threshold {on} must be strictly below off threshold {off}")]
    InvertedThresholds { on: f64, off: f64 },
}
