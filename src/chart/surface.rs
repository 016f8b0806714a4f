//! Tooth surfaces

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One face of a tooth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SurfaceCode {
    /// Mesial
    M,
    /// Occlusal (posterior) or incisal edge
    O,
    /// Distal
    D,
    /// Buccal / labial
    B,
    /// Lingual
    L,
    /// Incisal, anterior-teeth variant of O
    I,
}

impl SurfaceCode {
    pub const ALL: [SurfaceCode; 6] = [
        SurfaceCode::M,
        SurfaceCode::O,
        SurfaceCode::D,
        SurfaceCode::B,
        SurfaceCode::L,
        SurfaceCode::I,
    ];

    /// The five surfaces drawn in subdivided glyphs (I folds into O)
    pub const GLYPH: [SurfaceCode; 5] = [
        SurfaceCode::M,
        SurfaceCode::O,
        SurfaceCode::D,
        SurfaceCode::B,
        SurfaceCode::L,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" => Some(SurfaceCode::M),
            "O" => Some(SurfaceCode::O),
            "D" => Some(SurfaceCode::D),
            "B" => Some(SurfaceCode::B),
            "L" => Some(SurfaceCode::L),
            "I" => Some(SurfaceCode::I),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            SurfaceCode::M => 'M',
            SurfaceCode::O => 'O',
            SurfaceCode::D => 'D',
            SurfaceCode::B => 'B',
            SurfaceCode::L => 'L',
            SurfaceCode::I => 'I',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SurfaceCode::M => "Mesial",
            SurfaceCode::O => "Occlusal",
            SurfaceCode::D => "Distal",
            SurfaceCode::B => "Buccal",
            SurfaceCode::L => "Lingual",
            SurfaceCode::I => "Incisal",
        }
    }

    /// Surface used when drawing a five-wedge glyph
    pub fn glyph_surface(self) -> SurfaceCode {
        match self {
            SurfaceCode::I => SurfaceCode::O,
            other => other,
        }
    }
}

impl fmt::Display for SurfaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Insertion-ordered set of surfaces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SurfaceSet(Vec<SurfaceCode>);

impl SurfaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface; returns false if it was already present
    pub fn insert(&mut self, surface: SurfaceCode) -> bool {
        if self.0.contains(&surface) {
            return false;
        }
        self.0.push(surface);
        true
    }

    pub fn remove(&mut self, surface: SurfaceCode) -> bool {
        let before = self.0.len();
        self.0.retain(|s| *s != surface);
        self.0.len() != before
    }

    pub fn contains(&self, surface: SurfaceCode) -> bool {
        self.0.contains(&surface)
    }

    pub fn iter(&self) -> impl Iterator<Item = SurfaceCode> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[SurfaceCode] {
        &self.0
    }

    /// Short tag of at most two letters, e.g. "MO"
    pub fn tag(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.iter().take(2).map(|s| s.letter()).collect())
    }

    /// Whether the set covers the given glyph wedge
    pub fn covers_glyph(&self, wedge: SurfaceCode) -> bool {
        self.0.iter().any(|s| s.glyph_surface() == wedge)
    }
}

impl FromIterator<SurfaceCode> for SurfaceSet {
    fn from_iter<T: IntoIterator<Item = SurfaceCode>>(iter: T) -> Self {
        let mut set = SurfaceSet::new();
        for surface in iter {
            set.insert(surface);
        }
        set
    }
}

impl<'de> Deserialize<'de> for SurfaceSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Duplicates in incoming data collapse to their first occurrence
        let surfaces = Vec::<SurfaceCode>::deserialize(deserializer)?;
        Ok(surfaces.into_iter().collect())
    }
}

impl fmt::Display for SurfaceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        f.write_str(&letters.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order_without_duplicates() {
        let mut set = SurfaceSet::new();
        assert!(set.insert(SurfaceCode::O));
        assert!(set.insert(SurfaceCode::M));
        assert!(!set.insert(SurfaceCode::O));
        assert_eq!(set.as_slice(), &[SurfaceCode::O, SurfaceCode::M]);
        assert_eq!(set.to_string(), "O, M");
    }

    #[test]
    fn test_deserialize_collapses_duplicates() {
        let set: SurfaceSet = serde_json::from_str(r#"["M", "O", "M", "D"]"#).unwrap();
        assert_eq!(set.as_slice(), &[SurfaceCode::M, SurfaceCode::O, SurfaceCode::D]);
    }

    #[test]
    fn test_tag_uses_first_two_letters() {
        let set: SurfaceSet = [SurfaceCode::M, SurfaceCode::O, SurfaceCode::D].into_iter().collect();
        assert_eq!(set.tag().as_deref(), Some("MO"));
        let single: SurfaceSet = [SurfaceCode::B].into_iter().collect();
        assert_eq!(single.tag().as_deref(), Some("B"));
        assert_eq!(SurfaceSet::new().tag(), None);
    }

    #[test]
    fn test_incisal_folds_into_occlusal_wedge() {
        let set: SurfaceSet = [SurfaceCode::I].into_iter().collect();
        assert!(set.covers_glyph(SurfaceCode::O));
        assert!(!set.covers_glyph(SurfaceCode::M));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(SurfaceCode::parse("l"), Some(SurfaceCode::L));
        assert_eq!(SurfaceCode::parse("X"), None);
    }
}
