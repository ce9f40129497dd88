use anyhow::Context;
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyOutputPin, Output, PinDriver},
};
use esp_idf_svc::sys::EspError;

use climate_common::{CharacterDisplay, DisplayError};

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_CGRAM: u8 = 0x40;
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];
const COLUMNS: u8 = 16;
const GLYPH_SLOTS: u8 = 8;

// Degree sign in the A00 character ROM.
const ROM_DEGREE: u8 = 0xDF;

type Out = PinDriver<'static, AnyOutputPin, Output>;

pub struct LcdPins {
    pub rs: AnyOutputPin,
    pub enable: AnyOutputPin,
    pub d4: AnyOutputPin,
    pub d5: AnyOutputPin,
    pub d6: AnyOutputPin,
    pub d7: AnyOutputPin,
    pub backlight: AnyOutputPin,
}

pub struct Hd44780 {
    rs: Out,
    enable: Out,
    data: [Out; 4],
    backlight: Out,
}

impl Hd44780 {
    pub fn new(pins: LcdPins) -> anyhow::Result<Self> {
        let mut lcd = Self {
            rs: PinDriver::output(pins.rs)?,
            enable: PinDriver::output(pins.enable)?,
            data: [
                PinDriver::output(pins.d4)?,
                PinDriver::output(pins.d5)?,
                PinDriver::output(pins.d6)?,
                PinDriver::output(pins.d7)?,
            ],
            backlight: PinDriver::output(pins.backlight)?,
        };
        lcd.initialize().context("LCD initialization sequence failed")?;
        Ok(lcd)
    }

    fn initialize(&mut self) -> Result<(), EspError> {
        self.rs.set_low()?;
        self.enable.set_low()?;
        self.backlight.set_low()?;
        Ets::delay_ms(50);

        // Power-on reset by instruction: three 8-bit function sets, then 4-bit.
        self.write_nibble(0x03)?;
        Ets::delay_us(4_500);
        self.write_nibble(0x03)?;
        Ets::delay_us(4_500);
        self.write_nibble(0x03)?;
        Ets::delay_us(150);
        self.write_nibble(0x02)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        Ets::delay_us(2_000);
        self.command(CMD_ENTRY_MODE_INCREMENT)
    }

    fn command(&mut self, value: u8) -> Result<(), EspError> {
        self.rs.set_low()?;
        self.write_byte(value)
    }

    fn data(&mut self, value: u8) -> Result<(), EspError> {
        self.rs.set_high()?;
        self.write_byte(value)
    }

    fn write_byte(&mut self, value: u8) -> Result<(), EspError> {
        self.write_nibble(value >> 4)?;
        self.write_nibble(value & 0x0F)?;
        Ets::delay_us(50);
        Ok(())
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), EspError> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high()?;
            } else {
                pin.set_low()?;
            }
        }
        self.enable.set_high()?;
        Ets::delay_us(1);
        self.enable.set_low()?;
        Ets::delay_us(1);
        Ok(())
    }
}

fn bus(err: EspError) -> DisplayError {
    DisplayError::Bus(err.to_string())
}

fn rom_code(ch: char) -> u8 {
    match ch {
        '°' => ROM_DEGREE,
        ' '..='}' => ch as u8,
        _ => b'?',
    }
}

impl CharacterDisplay for Hd44780 {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(CMD_CLEAR).map_err(bus)?;
        Ets::delay_us(2_000);
        Ok(())
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DisplayError> {
        let Some(offset) = ROW_OFFSETS.get(usize::from(row)) else {
            return Err(DisplayError::Cursor { col, row });
        };
        if col >= COLUMNS {
            return Err(DisplayError::Cursor { col, row });
        }
        self.command(CMD_SET_DDRAM | (offset + col)).map_err(bus)
    }

    fn write_text(&mut self, text: &str) -> Result<(), DisplayError> {
        for ch in text.chars() {
            self.data(rom_code(ch)).map_err(bus)?;
        }
        Ok(())
    }

    fn write_glyph(&mut self, id: u8) -> Result<(), DisplayError> {
        if id >= GLYPH_SLOTS {
            return Err(DisplayError::GlyphSlot(id));
        }
        self.data(id).map_err(bus)
    }

    fn register_glyph(&mut self, id: u8, bitmap: &[u8; 8]) -> Result<(), DisplayError> {
        if id >= GLYPH_SLOTS {
            return Err(DisplayError::GlyphSlot(id));
        }
        self.command(CMD_SET_CGRAM | (id << 3)).map_err(bus)?;
        for row in bitmap {
            self.data(row & 0x1F).map_err(bus)?;
        }
        // Leave the address counter back in display RAM.
        self.command(CMD_SET_DDRAM).map_err(bus)
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        if on {
            self.backlight.set_high().map_err(bus)
        } else {
            self.backlight.set_low().map_err(bus)
        }
    }
}
