//! Edge colours for drawn layers.

use plotters::style::RGBColor;
use std::fmt;
use std::str::FromStr;

/// An opaque RGB colour. Transparency is applied per layer at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl StrokeColor {
    pub const BLUE: StrokeColor = StrokeColor::rgb(0, 0, 255);
    pub const RED: StrokeColor = StrokeColor::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb(self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }
}

impl fmt::Display for StrokeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for StrokeColor {
    type Err = String;

    /// Single-letter plotting codes (`b g r c m y k w`), a few names, or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let named = match s.to_lowercase().as_str() {
            "b" | "blue" => Some(StrokeColor::BLUE),
            "g" | "green" => Some(StrokeColor::rgb(0, 128, 0)),
            "r" | "red" => Some(StrokeColor::RED),
            "c" | "cyan" => Some(StrokeColor::rgb(0, 191, 191)),
            "m" | "magenta" => Some(StrokeColor::rgb(191, 0, 191)),
            "y" | "yellow" => Some(StrokeColor::rgb(191, 191, 0)),
            "k" | "black" => Some(StrokeColor::rgb(0, 0, 0)),
            "w" | "white" => Some(StrokeColor::rgb(255, 255, 255)),
            "orange" => Some(StrokeColor::rgb(255, 165, 0)),
            "purple" => Some(StrokeColor::rgb(128, 0, 128)),
            "gray" | "grey" => Some(StrokeColor::rgb(128, 128, 128)),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }

        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| format!("unrecognised colour '{s}'"))?;
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(StrokeColor::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_codes() {
        assert_eq!("b".parse::<StrokeColor>().unwrap(), StrokeColor::BLUE);
        assert_eq!("R".parse::<StrokeColor>().unwrap(), StrokeColor::RED);
        assert_eq!("k".parse::<StrokeColor>().unwrap(), StrokeColor::rgb(0, 0, 0));
    }

    #[test]
    fn test_hex() {
        let c: StrokeColor = "#1a2B3c".parse().unwrap();
        assert_eq!(c, StrokeColor::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_string(), "#1a2b3c");
        assert!("#12345".parse::<StrokeColor>().is_err());
        assert!("#gggggg".parse::<StrokeColor>().is_err());
        assert!("chartreuse".parse::<StrokeColor>().is_err());
    }
}
