//! Color tokens used by the taxonomy and the renderers
//!
//! Tokens are written as hex strings. Both 6-digit (`RRGGBB`) and 8-digit
//! (`AARRGGBB`) forms are accepted, with or without a leading `#`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorToken {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorToken {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn from_rgb24(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parse a hex color string, returning None for anything malformed
    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        match digits.len() {
            6 => Some(Self::from_rgb24(value)),
            8 => Some(Self {
                a: (value >> 24) as u8,
                r: (value >> 16) as u8,
                g: (value >> 8) as u8,
                b: value as u8,
            }),
            _ => None,
        }
    }

    /// Relative luminance in [0, 1], used to pick a readable label color
    pub fn luminance(&self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }

    pub fn is_light(&self) -> bool {
        self.luminance() > 0.6
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xFF {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}

impl Serialize for ColorToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ColorToken::parse(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color '{hex}'")))
    }
}
