//! Universal tooth numbering

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::dentition::{ARCH_SIZE, QUADRANT_SIZE, TOOTH_COUNT};

/// A tooth number in [1, 32]
///
/// 1 is the upper right third molar, numbering runs across the upper jaw to
/// 16 (upper left third molar), drops to 17 (lower left third molar) and runs
/// back to 32 (lower right third molar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ToothNumber(u8);

/// Anatomical quadrant, named from the patient's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

/// Jaw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    Maxilla,
    Mandible,
}

impl ToothNumber {
    pub fn new(number: u8) -> Option<Self> {
        (1..=TOOTH_COUNT).contains(&number).then_some(Self(number))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All 32 teeth in numbering order
    pub fn all() -> impl Iterator<Item = ToothNumber> {
        (1..=TOOTH_COUNT).map(ToothNumber)
    }

    pub fn quadrant(self) -> Quadrant {
        match (self.0 - 1) / QUADRANT_SIZE {
            0 => Quadrant::UpperRight,
            1 => Quadrant::UpperLeft,
            2 => Quadrant::LowerLeft,
            _ => Quadrant::LowerRight,
        }
    }

    pub fn arch(self) -> Arch {
        if self.0 <= ARCH_SIZE { Arch::Maxilla } else { Arch::Mandible }
    }

    /// Position inside the quadrant in numbering order (0..=7)
    pub fn index_in_quadrant(self) -> u8 {
        (self.0 - 1) % QUADRANT_SIZE
    }

    /// Position counted from the midline (0 = central incisor, 7 = third molar)
    pub fn distance_from_midline(self) -> u8 {
        let index = self.index_in_quadrant();
        match self.quadrant() {
            Quadrant::UpperRight | Quadrant::LowerLeft => QUADRANT_SIZE - 1 - index,
            Quadrant::UpperLeft | Quadrant::LowerRight => index,
        }
    }

    /// Canines and incisors
    pub fn is_anterior(self) -> bool {
        self.distance_from_midline() <= 2
    }

    pub fn kind(self) -> &'static str {
        match self.distance_from_midline() {
            0 => "Central Incisor",
            1 => "Lateral Incisor",
            2 => "Canine",
            3 => "First Premolar",
            4 => "Second Premolar",
            5 => "First Molar",
            6 => "Second Molar",
            _ => "Third Molar",
        }
    }

    /// Human readable name, e.g. "Upper Right First Molar"
    pub fn name(self) -> String {
        format!("{} {}", self.quadrant().label(), self.kind())
    }
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpperRight,
        Quadrant::UpperLeft,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quadrant::UpperRight => "Upper Right",
            Quadrant::UpperLeft => "Upper Left",
            Quadrant::LowerLeft => "Lower Left",
            Quadrant::LowerRight => "Lower Right",
        }
    }

    /// First tooth number of the quadrant
    pub fn first(self) -> ToothNumber {
        let start = match self {
            Quadrant::UpperRight => 1,
            Quadrant::UpperLeft => 9,
            Quadrant::LowerLeft => 17,
            Quadrant::LowerRight => 25,
        };
        ToothNumber(start)
    }

    /// The quadrant's eight teeth in numbering order
    pub fn teeth(self) -> impl Iterator<Item = ToothNumber> {
        let start = self.first().0;
        (start..start + QUADRANT_SIZE).map(ToothNumber)
    }

    pub fn arch(self) -> Arch {
        self.first().arch()
    }
}

impl TryFrom<u8> for ToothNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ToothNumber::new(value)
            .ok_or_else(|| format!("tooth number {value} outside universal range 1-{TOOTH_COUNT}"))
    }
}

impl From<ToothNumber> for u8 {
    fn from(value: ToothNumber) -> Self {
        value.0
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_range_is_checked() {
        assert!(ToothNumber::new(0).is_none());
        assert!(ToothNumber::new(33).is_none());
        assert_eq!(ToothNumber::all().count(), 32);
        assert!(ToothNumber::try_from(40).is_err());
    }

    #[test]
    fn test_quadrants() {
        assert_eq!(tooth(1).quadrant(), Quadrant::UpperRight);
        assert_eq!(tooth(8).quadrant(), Quadrant::UpperRight);
        assert_eq!(tooth(9).quadrant(), Quadrant::UpperLeft);
        assert_eq!(tooth(17).quadrant(), Quadrant::LowerLeft);
        assert_eq!(tooth(32).quadrant(), Quadrant::LowerRight);
        for quadrant in Quadrant::ALL {
            assert!(quadrant.teeth().all(|t| t.quadrant() == quadrant));
        }
    }

    #[test]
    fn test_names_follow_universal_numbering() {
        assert_eq!(tooth(1).name(), "Upper Right Third Molar");
        assert_eq!(tooth(8).name(), "Upper Right Central Incisor");
        assert_eq!(tooth(9).name(), "Upper Left Central Incisor");
        assert_eq!(tooth(14).name(), "Upper Left First Molar");
        assert_eq!(tooth(24).name(), "Lower Left Central Incisor");
        assert_eq!(tooth(30).name(), "Lower Right First Molar");
    }

    #[test]
    fn test_anterior_teeth() {
        let anterior: Vec<u8> = ToothNumber::all().filter(|t| t.is_anterior()).map(u8::from).collect();
        assert_eq!(anterior, vec![6, 7, 8, 9, 10, 11, 22, 23, 24, 25, 26, 27]);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert_eq!(serde_json::from_str::<ToothNumber>("14").unwrap(), tooth(14));
        assert!(serde_json::from_str::<ToothNumber>("33").is_err());
    }
}
