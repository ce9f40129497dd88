use crate::{
    config::{DISPLAY_COLUMNS, DISPLAY_ROWS},
    types::{ActivityCounter, Reading},
};

pub const TEMPERATURE_GLYPH: u8 = 0;
pub const HEAT_INDEX_GLYPH: u8 = 1;

// Small degree ring, top three rows.
pub const TEMPERATURE_GLYPH_BITMAP: [u8; 8] = [
    0b01110, 0b01010, 0b01110, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000,
];

// "H" over "I", stacked.
pub const HEAT_INDEX_GLYPH_BITMAP: [u8; 8] = [
    0b10100, 0b11100, 0b10100, 0b00000, 0b00111, 0b00010, 0b00111, 0b00000,
];

pub const GLYPHS: [(u8, [u8; 8]); 2] = [
    (TEMPERATURE_GLYPH, TEMPERATURE_GLYPH_BITMAP),
    (HEAT_INDEX_GLYPH, HEAT_INDEX_GLYPH_BITMAP),
];

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

const HEATER_COLUMN: u8 = 0;
const HUMIDIFIER_COLUMN: u8 = 5;
const COUNTER_COLUMN: u8 = 11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Clear,
    SetCursor { col: u8, row: u8 },
    Text(String),
    Glyph(u8),
}

pub fn byte_to_hex(value: u8) -> (char, char) {
    (
        HEX_DIGITS[usize::from(value >> 4)] as char,
        HEX_DIGITS[usize::from(value & 0x0F)] as char,
    )
}

pub fn render(
    reading: Option<Reading>,
    heater_active: bool,
    humidifier_active: bool,
    counter: ActivityCounter,
) -> Vec<DisplayOp> {
    let (temperature, humidity) = match reading {
        Some(reading) => (
            format_value(reading.temperature_c()),
            format_value(reading.humidity_pct()),
        ),
        None => ("nan".to_string(), "nan".to_string()),
    };
    let (high, low) = byte_to_hex(counter.low_byte());

    vec![
        DisplayOp::Clear,
        DisplayOp::SetCursor { col: 0, row: 0 },
        DisplayOp::Text(format!("T{temperature}")),
        DisplayOp::Glyph(TEMPERATURE_GLYPH),
        DisplayOp::Text(format!("C|H{humidity}%")),
        DisplayOp::SetCursor {
            col: HEATER_COLUMN,
            row: 1,
        },
        DisplayOp::Text(format!("T {}", on_off(heater_active))),
        DisplayOp::SetCursor {
            col: HUMIDIFIER_COLUMN,
            row: 1,
        },
        DisplayOp::Text(format!("|H {}", on_off(humidifier_active))),
        DisplayOp::SetCursor {
            col: COUNTER_COLUMN,
            row: 1,
        },
        DisplayOp::Text(format!("|0x{high}{low}")),
    ]
}

// Glyphs other than the temperature ring show as `*`; text past the right
// edge is dropped.
pub fn preview(ops: &[DisplayOp]) -> [String; 2] {
    let mut grid = blank_grid();
    let (mut col, mut row) = (0_usize, 0_usize);

    for op in ops {
        match op {
            DisplayOp::Clear => {
                grid = blank_grid();
                col = 0;
                row = 0;
            }
            DisplayOp::SetCursor { col: c, row: r } => {
                col = usize::from(*c);
                row = usize::from(*r);
            }
            DisplayOp::Text(text) => {
                for ch in text.chars() {
                    put_char(&mut grid, &mut col, row, ch);
                }
            }
            DisplayOp::Glyph(id) => {
                let ch = if *id == TEMPERATURE_GLYPH { '°' } else { '*' };
                put_char(&mut grid, &mut col, row, ch);
            }
        }
    }

    grid.map(|line| line.iter().collect())
}

type Grid = [[char; DISPLAY_COLUMNS as usize]; DISPLAY_ROWS as usize];

fn blank_grid() -> Grid {
    [[' '; DISPLAY_COLUMNS as usize]; DISPLAY_ROWS as usize]
}

fn put_char(grid: &mut Grid, col: &mut usize, row: usize, ch: char) {
    if let Some(cell) = grid.get_mut(row).and_then(|line| line.get_mut(*col)) {
        *cell = ch;
    }
    *col += 1;
}

pub(crate) fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "nan".to_string()
    }
}

fn on_off(active: bool) -> &'static str {
    if active {
        "On"
    } else {
        "Off"
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rows(ops: &[DisplayOp]) -> [String; 2] {
        preview(ops).map(|row| row.trim_end().to_string())
    }

    #[test]
    fn hex_digits_cover_full_nibble_range() {
        assert_eq!(byte_to_hex(0x00), ('0', '0'));
        assert_eq!(byte_to_hex(0x0E), ('0', 'E'));
        assert_eq!(byte_to_hex(0xE0), ('E', '0'));
        assert_eq!(byte_to_hex(0xAF), ('A', 'F'));
        assert_eq!(byte_to_hex(0xFF), ('F', 'F'));
    }

    #[test]
    fn renders_full_layout() {
        let reading = Reading::new(21.5, 42.0).unwrap();
        let ops = render(Some(reading), true, false, ActivityCounter::new(0x1F));

        assert_eq!(
            rows(&ops),
            [
                "T21.50°C|H42.00%".to_string(),
                "T On |H Off|0x1F".to_string()
            ]
        );
    }

    #[test]
    fn both_actuators_off() {
        let reading = Reading::new(23.0, 50.0).unwrap();
        let ops = render(Some(reading), false, false, ActivityCounter::default());

        assert_eq!(rows(&ops)[1], "T Off|H Off|0x00");
    }

    #[test]
    fn counter_shows_low_byte_only() {
        let reading = Reading::new(23.0, 50.0).unwrap();

        let at_255 = render(Some(reading), false, true, ActivityCounter::new(255));
        assert_eq!(rows(&at_255)[1], "T Off|H On |0xFF");

        let at_256 = render(Some(reading), false, true, ActivityCounter::new(256));
        assert_eq!(rows(&at_256)[1], "T Off|H On |0x00");
    }

    #[test]
    fn invalid_reading_renders_placeholder() {
        let ops = render(None, false, false, ActivityCounter::default());
        assert_eq!(rows(&ops)[0], "Tnan°C|Hnan%");
    }

    #[test]
    fn starts_with_clear_and_uses_temperature_glyph() {
        let ops = render(None, false, false, ActivityCounter::default());

        assert_eq!(ops.first(), Some(&DisplayOp::Clear));
        assert!(ops.contains(&DisplayOp::Glyph(TEMPERATURE_GLYPH)));
    }

    #[test]
    fn long_values_are_clipped_at_screen_edge() {
        let reading = Reading::new(-10.25, 100.0).unwrap();
        let ops = render(Some(reading), false, false, ActivityCounter::default());

        let row = &preview(&ops)[0];
        assert_eq!(row.chars().count(), 16);
        assert_eq!(row, "T-10.25°C|H100.0");
    }
}
