//! Per-tooth clinical records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::surface::{SurfaceCode, SurfaceSet};
use super::tooth::ToothNumber;
use crate::taxonomy::Condition;

/// Highest tooth mobility grade
pub const MAX_MOBILITY: u8 = 3;

/// Clinical record of a single tooth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToothRecord {
    pub number: ToothNumber,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "SurfaceSet::is_empty")]
    pub surfaces: SurfaceSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub treatments: Vec<TreatmentEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodontal: Option<PeriodontalMetrics>,
    /// Per-surface tracking, only filled in by the clinical layout's data entry
    #[serde(default, alias = "surfaceDetails", skip_serializing_if = "BTreeMap::is_empty")]
    pub surface_details: BTreeMap<SurfaceCode, SurfaceDetail>,
}

/// One treatment in a tooth's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentEntry {
    pub code: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceCode>,
    pub date: NaiveDate,
    #[serde(alias = "performedBy")]
    pub performed_by: String,
    pub status: TreatmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    Planned,
    InProgress,
    Completed,
}

/// Periodontal probing site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProbingSite {
    MB,
    B,
    DB,
    ML,
    L,
    DL,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodontalMetrics {
    /// Probing depth in millimeters per site
    #[serde(default, alias = "probingDepths")]
    pub probing_depths: BTreeMap<ProbingSite, f32>,
    #[serde(default)]
    pub bleeding: bool,
    #[serde(default)]
    pub plaque: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_mobility")]
    pub mobility: Option<u8>,
}

/// Condition of a single surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceDetail {
    #[serde(default)]
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
}

/// Custom deserializer that clamps mobility grades to 0-3
fn deserialize_mobility<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let grade = Option::<u8>::deserialize(deserializer)?;
    Ok(grade.map(|g| {
        if g > MAX_MOBILITY {
            warn!(mobility = g, "Mobility grade above {MAX_MOBILITY}, clamping");
        }
        g.min(MAX_MOBILITY)
    }))
}

impl TreatmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            TreatmentStatus::Planned => "Planned",
            TreatmentStatus::InProgress => "In Progress",
            TreatmentStatus::Completed => "Completed",
        }
    }

    /// Planned and in-progress work still needs a visit
    pub fn is_outstanding(self) -> bool {
        !matches!(self, TreatmentStatus::Completed)
    }
}

impl ProbingSite {
    pub const ALL: [ProbingSite; 6] = [
        ProbingSite::MB,
        ProbingSite::B,
        ProbingSite::DB,
        ProbingSite::ML,
        ProbingSite::L,
        ProbingSite::DL,
    ];
}

impl PeriodontalMetrics {
    pub fn deepest_pocket(&self) -> Option<f32> {
        self.probing_depths.values().copied().reduce(f32::max)
    }

    pub fn set_mobility(&mut self, grade: u8) {
        self.mobility = Some(grade.min(MAX_MOBILITY));
    }
}

impl SurfaceDetail {
    pub fn healthy() -> Self {
        Self { condition: Condition::Healthy, treatment: None }
    }
}

impl ToothRecord {
    /// A record with no findings
    pub fn healthy(number: ToothNumber) -> Self {
        Self {
            number,
            condition: Condition::Healthy,
            surfaces: SurfaceSet::new(),
            treatments: Vec::new(),
            notes: Vec::new(),
            periodontal: None,
            surface_details: BTreeMap::new(),
        }
    }

    pub fn new(number: ToothNumber, condition: Condition) -> Self {
        Self { condition, ..Self::healthy(number) }
    }

    pub fn with_surfaces(mut self, surfaces: impl IntoIterator<Item = SurfaceCode>) -> Self {
        self.surfaces = surfaces.into_iter().collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_treatment(mut self, entry: TreatmentEntry) -> Self {
        self.upsert_treatment(entry);
        self
    }

    pub fn with_periodontal(mut self, metrics: PeriodontalMetrics) -> Self {
        self.periodontal = Some(metrics);
        self
    }

    /// Attach per-surface details without touching whole-tooth fields
    pub fn with_surface_details(mut self, details: BTreeMap<SurfaceCode, SurfaceDetail>) -> Self {
        self.surface_details = details;
        self
    }

    /// Record a treatment. An entry with the same code and surface is updated
    /// in place, anything else is appended to the history.
    pub fn upsert_treatment(&mut self, entry: TreatmentEntry) {
        match self
            .treatments
            .iter_mut()
            .find(|t| t.code == entry.code && t.surface == entry.surface)
        {
            Some(existing) => *existing = entry,
            None => self.treatments.push(entry),
        }
    }

    /// Change the status of an existing treatment. Returns false if no entry
    /// matches the code and surface.
    pub fn update_treatment_status(
        &mut self,
        code: &str,
        surface: Option<SurfaceCode>,
        status: TreatmentStatus,
    ) -> bool {
        match self.treatments.iter_mut().find(|t| t.code == code && t.surface == surface) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    pub fn outstanding_treatments(&self) -> usize {
        self.treatments.iter().filter(|t| t.status.is_outstanding()).count()
    }

    /// Whether the record carries any clinical finding at all
    pub fn is_unremarkable(&self) -> bool {
        self.condition == Condition::Healthy
            && self.surfaces.is_empty()
            && self.treatments.is_empty()
            && self.notes.is_empty()
            && self.periodontal.is_none()
            && self.surface_details.values().all(|d| *d == SurfaceDetail::healthy())
    }

    /// Five-surface view of the record
    ///
    /// Explicit per-surface details win. Otherwise a surface listed in
    /// `surfaces` carries the whole-tooth condition and the rest are healthy.
    pub fn surface_details(&self) -> [(SurfaceCode, SurfaceDetail); 5] {
        SurfaceCode::GLYPH.map(|surface| {
            let detail = self.surface_details.get(&surface).cloned().unwrap_or_else(|| {
                if self.surfaces.covers_glyph(surface) {
                    SurfaceDetail { condition: self.condition, treatment: None }
                } else {
                    SurfaceDetail::healthy()
                }
            });
            (surface, detail)
        })
    }

    /// Condition of a single glyph wedge
    pub fn surface_condition(&self, surface: SurfaceCode) -> Condition {
        let wedge = surface.glyph_surface();
        self.surface_details()
            .into_iter()
            .find(|(s, _)| *s == wedge)
            .map(|(_, d)| d.condition)
            .unwrap_or_default()
    }
}

impl TreatmentEntry {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
        performed_by: impl Into<String>,
        status: TreatmentStatus,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            surface: None,
            date,
            performed_by: performed_by.into(),
            status,
        }
    }

    pub fn on_surface(mut self, surface: SurfaceCode) -> Self {
        self.surface = Some(surface);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_update_is_in_place() {
        let mut record = ToothRecord::new(tooth(3), Condition::Cavity).with_treatment(TreatmentEntry::new(
            "D2391",
            "Resin composite, one surface",
            date(2024, 3, 1),
            "Dr. Ortiz",
            TreatmentStatus::Planned,
        ));

        assert!(record.update_treatment_status("D2391", None, TreatmentStatus::Completed));
        assert_eq!(record.treatments.len(), 1);
        assert_eq!(record.treatments[0].status, TreatmentStatus::Completed);
        assert!(!record.update_treatment_status("D9999", None, TreatmentStatus::Completed));
    }

    #[test]
    fn test_upsert_distinguishes_surfaces() {
        let entry = TreatmentEntry::new("D2391", "Resin", date(2024, 1, 1), "Dr. Ortiz", TreatmentStatus::Planned);
        let mut record = ToothRecord::new(tooth(19), Condition::Cavity);
        record.upsert_treatment(entry.clone().on_surface(SurfaceCode::M));
        record.upsert_treatment(entry.clone().on_surface(SurfaceCode::D));
        record.upsert_treatment(TreatmentEntry { status: TreatmentStatus::InProgress, ..entry.on_surface(SurfaceCode::M) });

        assert_eq!(record.treatments.len(), 2);
        assert_eq!(record.treatments[0].status, TreatmentStatus::InProgress);
        assert_eq!(record.outstanding_treatments(), 2);
    }

    #[test]
    fn test_surface_details_derived_from_whole_tooth() {
        let record = ToothRecord::new(tooth(14), Condition::Cavity).with_surfaces([SurfaceCode::M, SurfaceCode::O]);
        let details = record.surface_details();
        assert_eq!(details[0], (SurfaceCode::M, SurfaceDetail { condition: Condition::Cavity, treatment: None }));
        assert_eq!(details[1].1.condition, Condition::Cavity);
        assert_eq!(details[2].1.condition, Condition::Healthy);
        assert_eq!(record.surface_condition(SurfaceCode::I), Condition::Cavity);
    }

    #[test]
    fn test_explicit_surface_details_win_and_round_trip() {
        let original = ToothRecord::new(tooth(30), Condition::Filled)
            .with_surfaces([SurfaceCode::D])
            .with_note("Watch distal margin");
        let details = BTreeMap::from([(
            SurfaceCode::B,
            SurfaceDetail { condition: Condition::Watchful, treatment: Some("D1354".into()) },
        )]);
        let enriched = original.clone().with_surface_details(details);

        assert_eq!(enriched.surface_condition(SurfaceCode::B), Condition::Watchful);
        assert_eq!(enriched.surface_condition(SurfaceCode::D), Condition::Filled);
        assert_eq!(enriched.condition, original.condition);
        assert_eq!(enriched.surfaces, original.surfaces);
        assert_eq!(enriched.notes, original.notes);

        let restored = ToothRecord { surface_details: BTreeMap::new(), ..enriched };
        assert_eq!(restored, original);
    }

    #[test]
    fn test_mobility_is_clamped() {
        let metrics: PeriodontalMetrics = serde_json::from_str(r#"{"probing_depths": {"MB": 3.0, "DB": 5.5}, "bleeding": true, "mobility": 7}"#).unwrap();
        assert_eq!(metrics.mobility, Some(3));
        assert_eq!(metrics.deepest_pocket(), Some(5.5));
        assert!(!metrics.plaque);
    }

    #[test]
    fn test_snapshot_fields_are_snake_case() {
        let record = ToothRecord::new(tooth(3), Condition::Filled)
            .with_treatment(TreatmentEntry::new("D2150", "Amalgam", date(2023, 5, 2), "Dr. Ortiz", TreatmentStatus::InProgress))
            .with_periodontal(PeriodontalMetrics {
                probing_depths: BTreeMap::from([(ProbingSite::MB, 4.0)]),
                ..PeriodontalMetrics::default()
            })
            .with_surface_details(BTreeMap::from([(SurfaceCode::O, SurfaceDetail::healthy())]));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["treatments"][0]["performed_by"], "Dr. Ortiz");
        assert_eq!(json["treatments"][0]["status"], "in_progress");
        assert_eq!(json["periodontal"]["probing_depths"]["MB"], 4.0);
        assert!(json.get("surface_details").is_some());

        let restored: ToothRecord = serde_json::from_value(json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_camel_case_field_names_are_accepted() {
        let record: ToothRecord = serde_json::from_str(
            r#"{"number": 3, "treatments": [{"code": "D2150", "description": "Amalgam", "date": "2023-05-02",
                "performedBy": "Dr. Ortiz", "status": "completed"}], "periodontal": {"probingDepths": {"L": 2.5}}}"#,
        )
        .unwrap();
        assert_eq!(record.treatments[0].performed_by, "Dr. Ortiz");
        assert_eq!(record.periodontal.unwrap().probing_depths[&ProbingSite::L], 2.5);
    }

    #[test]
    fn test_record_json_defaults() {
        let record: ToothRecord = serde_json::from_str(r#"{"number": 14, "condition": "cavity", "surfaces": ["M", "O"]}"#).unwrap();
        assert_eq!(record.number, tooth(14));
        assert_eq!(record.surfaces.as_slice(), &[SurfaceCode::M, SurfaceCode::O]);
        assert!(record.treatments.is_empty());
        assert!(ToothRecord::healthy(tooth(1)).is_unremarkable());
    }
}
