use crate::{
    display::DisplayOp,
    error::{DisplayError, RelayError, SensorError},
    types::Reading,
};

pub trait ClimateSensor {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

pub trait CharacterDisplay {
    fn clear(&mut self) -> Result<(), DisplayError>;
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DisplayError>;
    fn write_text(&mut self, text: &str) -> Result<(), DisplayError>;
    fn write_glyph(&mut self, id: u8) -> Result<(), DisplayError>;
    fn register_glyph(&mut self, id: u8, bitmap: &[u8; 8]) -> Result<(), DisplayError>;
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError>;

    fn apply(&mut self, ops: &[DisplayOp]) -> Result<(), DisplayError> {
        for op in ops {
            match op {
                DisplayOp::Clear => self.clear()?,
                DisplayOp::SetCursor { col, row } => self.set_cursor(*col, *row)?,
                DisplayOp::Text(text) => self.write_text(text)?,
                DisplayOp::Glyph(id) => self.write_glyph(*id)?,
            }
        }
        Ok(())
    }
}

pub trait Relay {
    fn set_state(&mut self, on: bool) -> Result<(), RelayError>;
}
