//! Color model for the scramble effects.
//!
//! Colors travel through the engine as `#rrggbb` strings, exactly as they
//! appear in the configured palette. Parsing happens at the point of use so
//! a malformed palette entry only affects the cells that touch it.

use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;

/// Hex notation of pure white
pub const WHITE: &str = "#ffffff";

/// Guards palette indexing against `0.49999..` style float noise
const INDEX_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("Color must have 6 hex digits: {0:?}")]
    Length(String),

    #[error("Invalid hex digit in color: {0:?}")]
    Digit(String),
}

/// RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn parse_hex(color: &str) -> Result<Self, ColorError> {
        let digits = color.strip_prefix('#').unwrap_or(color);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError::Length(color.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError::Digit(color.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Map a `[0, 1]` brightness onto a palette index (0 = first entry)
fn palette_index(level: f64, len: usize) -> usize {
    let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    let index = (level * (len - 1) as f64 + INDEX_EPSILON).floor() as usize;
    index.min(len - 1)
}

/// Pulse color for a unit at `position` in `[0, 1]`.
///
/// The position is shaped by a half sine wave so the palette is swept slowly
/// at both ends and quickly through the middle: `0` selects the first entry,
/// `0.5` the middle one and `1` the last one.
pub fn pulse_color(position: f64, palette: &[String]) -> Option<&str> {
    if palette.is_empty() {
        return None;
    }
    let wave = (((position * PI) - PI / 2.0).sin() + 1.0) / 2.0;
    Some(palette[palette_index(wave, palette.len())].as_str())
}

/// Linear brightness gradient along a scan tail. The head (offset 0) takes
/// the last, brightest palette entry; the far end of the tail the dimmest.
pub fn tail_color(offset_from_head: usize, tail_length: usize, palette: &[String]) -> Option<&str> {
    if palette.is_empty() {
        return None;
    }
    let tail_length = tail_length.max(1);
    let brightness = 1.0 - offset_from_head.min(tail_length) as f64 / tail_length as f64;
    Some(palette[palette_index(brightness, palette.len())].as_str())
}

/// Palette entry for a cell at Manhattan distance `distance` from a spread
/// center. The center gets the brightest entry.
pub fn distance_color(distance: usize, max_distance: usize, palette: &[String]) -> Option<&str> {
    if palette.is_empty() {
        return None;
    }
    let max_distance = max_distance.max(1);
    let level = max_distance.saturating_sub(distance) as f64 / max_distance as f64;
    Some(palette[palette_index(level, palette.len())].as_str())
}

/// Fade `color` toward white, `step` out of `total_steps`.
///
/// Step 0 hands the input back untouched, the final step is always pure
/// white. Malformed colors are reported, never panicked on.
pub fn fade_toward_white(color: &str, step: u32, total_steps: u32) -> Result<String, ColorError> {
    let rgb = Rgb::parse_hex(color)?;
    if step == 0 {
        return Ok(color.to_string());
    }
    if step >= total_steps {
        return Ok(WHITE.to_string());
    }

    let blend = |channel: u8| {
        let step_size = (255.0 - channel as f64) / total_steps as f64;
        (channel as f64 + step as f64 * step_size).floor().min(255.0) as u8
    };

    Ok(Rgb::new(blend(rgb.r), blend(rgb.g), blend(rgb.b)).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn palette(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::parse_hex("#ff8000"), Ok(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::parse_hex("00FF7f"), Ok(Rgb::new(0, 255, 127)));
        assert!(matches!(Rgb::parse_hex("#fff"), Err(ColorError::Length(_))));
        assert!(matches!(Rgb::parse_hex("#gg0000"), Err(ColorError::Digit(_))));
        assert!(Rgb::parse_hex("#ff00é").is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn test_pulse_color_endpoints() {
        let colors = palette(&["#000000", "#333333", "#666666", "#999999", "#cccccc"]);
        assert_eq!(pulse_color(0.0, &colors), Some("#000000"));
        assert_eq!(pulse_color(0.5, &colors), Some("#666666"));
        assert_eq!(pulse_color(1.0, &colors), Some("#cccccc"));
        assert_eq!(pulse_color(0.5, &colors[..2]), Some("#000000"));
        assert_eq!(pulse_color(0.3, &[]), None);
    }

    #[test]
    fn test_tail_and_distance_gradients() {
        let colors = palette(&["#111111", "#222222", "#333333"]);
        assert_eq!(tail_color(0, 4, &colors), Some("#333333"));
        assert_eq!(tail_color(2, 4, &colors), Some("#222222"));
        assert_eq!(tail_color(3, 4, &colors), Some("#111111"));

        assert_eq!(distance_color(0, 3, &colors), Some("#333333"));
        assert_eq!(distance_color(3, 3, &colors), Some("#111111"));
        assert_eq!(distance_color(0, 0, &colors), Some("#333333"));
    }

    #[test]
    fn test_fade_midpoint() {
        assert_eq!(fade_toward_white("#000000", 1, 2).unwrap(), "#7f7f7f");
        assert_eq!(fade_toward_white("#FF0000", 0, 3).unwrap(), "#FF0000");
        assert_eq!(fade_toward_white("#123456", 9, 3).unwrap(), WHITE);
    }

    #[test]
    fn test_fade_malformed_is_soft() {
        assert!(fade_toward_white("not-a-color", 1, 4).is_err());
        assert!(fade_toward_white("#12345", 0, 4).is_err());
    }

    proptest! {
        #[test]
        fn prop_fade_endpoints(r: u8, g: u8, b: u8, total in 1u32..64) {
            let color = Rgb::new(r, g, b).to_string();
            prop_assert_eq!(fade_toward_white(&color, 0, total).unwrap(), color.clone());
            prop_assert_eq!(fade_toward_white(&color, total, total).unwrap(), WHITE);
        }

        #[test]
        fn prop_fade_is_monotonic(r: u8, g: u8, b: u8, total in 1u32..32) {
            let color = Rgb::new(r, g, b).to_string();
            let mut last = Rgb::new(r, g, b);
            for step in 0..=total {
                let next = Rgb::parse_hex(&fade_toward_white(&color, step, total).unwrap()).unwrap();
                prop_assert!(next.r >= last.r && next.g >= last.g && next.b >= last.b);
                last = next;
            }
        }

        #[test]
        fn prop_pulse_stays_in_palette(position in 0.0f64..=1.0, len in 1usize..12) {
            let colors: Vec<String> = (0..len).map(|i| Rgb::new(i as u8, 0, 0).to_string()).collect();
            let picked = pulse_color(position, &colors).unwrap();
            prop_assert!(colors.iter().any(|c| c == picked));
        }
    }
}
