//! Indicator colors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color shown on the tri-color indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel intensities scaled to [0, 1], the form PWM duty cycles take
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }

    pub fn is_off(self) -> bool {
        self == Color::BLACK
    }

    fn from_name(name: &str) -> Option<Self> {
        // CSS names
        let color = match name {
            "black" | "off" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::RED,
            "green" => Color::GREEN,
            "lime" => Color::rgb(0, 255, 0),
            "blue" => Color::BLUE,
            "yellow" => Color::YELLOW,
            "cyan" | "aqua" => Color::CYAN,
            "magenta" | "fuchsia" => Color::MAGENTA,
            "orange" => Color::ORANGE,
            "purple" => Color::PURPLE,
            _ => return None,
        };
        Some(color)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!("Invalid hex color: {}", s));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|e| format!("Invalid hex color {}: {}", s, e))
            };
            return Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
        }

        Color::from_name(&trimmed.to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown color: {}", s))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_colors() {
        assert_eq!("red".parse::<Color>().unwrap(), Color::RED);
        assert_eq!("Green".parse::<Color>().unwrap(), Color::GREEN);
        assert_eq!(" blue ".parse::<Color>().unwrap(), Color::BLUE);
        assert_eq!("off".parse::<Color>().unwrap(), Color::BLACK);
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!("#ff0000".parse::<Color>().unwrap(), Color::RED);
        assert_eq!("#00FF7f".parse::<Color>().unwrap(), Color::rgb(0, 255, 127));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("#ff00".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
        assert!("chartreuse-ish".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Color::ORANGE.to_string(), "#ffa500");
        let back: Color = Color::ORANGE.to_string().parse().unwrap();
        assert_eq!(back, Color::ORANGE);
    }

    #[test]
    fn test_unit_scaling() {
        let (r, g, b) = Color::rgb(255, 0, 51).to_unit();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_serde_uses_strings() {
        #[derive(Deserialize, Serialize)]
        struct Holder {
            color: Color,
        }

        let holder: Holder = serde_json_like("{\"color\":\"yellow\"}");
        assert_eq!(holder.color, Color::YELLOW);
    }

    fn serde_json_like<T: serde::de::DeserializeOwned>(input: &str) -> T {
        // config's JSON source is the same deserializer path the loader uses
        config::Config::builder()
            .add_source(config::File::from_str(input, config::FileFormat::Json))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("deserialize")
    }
}
