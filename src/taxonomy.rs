//! Condition taxonomy
//!
//! The single table mapping clinical conditions to their display color and
//! label. Every layout resolves colors through [`style`]; none keeps a copy.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

use crate::color::ColorToken;

/// Clinical condition of a whole tooth or of a single surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Healthy,
    Cavity,
    Filled,
    Crown,
    Extracted,
    RootCanal,
    Watchful,
}

/// Display attributes of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionStyle {
    pub color: ColorToken,
    pub label: &'static str,
}

const HEALTHY: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0xFFFFFF), label: "Healthy" };
const CAVITY: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0xEF4444), label: "Cavity" };
const FILLED: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0x3B82F6), label: "Filled" };
const CROWN: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0xEAB308), label: "Crown" };
const EXTRACTED: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0x9CA3AF), label: "Extracted" };
const ROOT_CANAL: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0xA855F7), label: "Root Canal" };
const WATCHFUL: ConditionStyle = ConditionStyle { color: ColorToken::from_rgb24(0xF97316), label: "Watch" };

/// Resolve the canonical color and label for a condition
pub fn style(condition: Condition) -> ConditionStyle {
    match condition {
        Condition::Healthy => HEALTHY,
        Condition::Cavity => CAVITY,
        Condition::Filled => FILLED,
        Condition::Crown => CROWN,
        Condition::Extracted => EXTRACTED,
        Condition::RootCanal => ROOT_CANAL,
        Condition::Watchful => WATCHFUL,
    }
}

impl Condition {
    pub const ALL: [Condition; 7] = [
        Condition::Healthy,
        Condition::Cavity,
        Condition::Filled,
        Condition::Crown,
        Condition::Extracted,
        Condition::RootCanal,
        Condition::Watchful,
    ];

    /// Storage identifier (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Healthy => "healthy",
            Condition::Cavity => "cavity",
            Condition::Filled => "filled",
            Condition::Crown => "crown",
            Condition::Extracted => "extracted",
            Condition::RootCanal => "root_canal",
            Condition::Watchful => "watchful",
        }
    }

    /// Strict parse; accepts the storage identifier or the display label
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Condition::ALL.into_iter().find(|c| c.as_str() == normalized)
    }

    /// Parse, degrading anything unrecognized to `Healthy`
    pub fn from_str_lossy(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            warn!(condition = %value, "Unknown condition, rendering as healthy");
            Condition::Healthy
        })
    }

    pub fn style(&self) -> ConditionStyle {
        style(*self)
    }

    /// Whether the tooth still needs clinical attention
    pub fn needs_attention(&self) -> bool {
        matches!(self, Condition::Cavity | Condition::Watchful)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(style(*self).label)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Condition::from_str_lossy(&value))
    }
}
