//! Clinical detail layout
//!
//! Maxilla and mandible sections, eight teeth per row. Every cell draws a
//! five-surface glyph plus a badge counting planned and in-progress work.
//! The side panel only ever describes the selected tooth; hovering does not
//! change it.

use serde::{Deserialize, Serialize};

use crate::chart::{Arch, PeriodontalMetrics, SurfaceCode, SurfaceDetail, ToothNumber, ToothRecordStore, TreatmentEntry};
use crate::constants::dentition::ARCH_SIZE;
use crate::constants::grid::{CELL_GAP, CLINICAL_COLUMNS, ROW_GAP};
use crate::interaction::{DetailsPanel, InteractionState};
use crate::preference::DesignPreference;

use super::{checked_cell_size, GlyphGroup, LayoutStrategy, Placement, Point, Rect, Size, VisualTree, render_teeth, surface_wedges};

/// Side panel tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalTab {
    #[default]
    Surfaces,
    Treatments,
    Notes,
    Periodontal,
}

/// Entry of the treatment code reference list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreatmentCode {
    pub code: &'static str,
    pub description: &'static str,
}

/// Reference list shown independently of any tooth
pub const TREATMENT_CODES: &[TreatmentCode] = &[
    TreatmentCode { code: "D0120", description: "Periodic oral evaluation" },
    TreatmentCode { code: "D0150", description: "Comprehensive oral evaluation" },
    TreatmentCode { code: "D0220", description: "Intraoral periapical, first radiograph" },
    TreatmentCode { code: "D1110", description: "Prophylaxis, adult" },
    TreatmentCode { code: "D1351", description: "Sealant, per tooth" },
    TreatmentCode { code: "D2140", description: "Amalgam, one surface" },
    TreatmentCode { code: "D2150", description: "Amalgam, two surfaces" },
    TreatmentCode { code: "D2330", description: "Resin composite, one surface, anterior" },
    TreatmentCode { code: "D2391", description: "Resin composite, one surface, posterior" },
    TreatmentCode { code: "D2740", description: "Crown, porcelain/ceramic" },
    TreatmentCode { code: "D2750", description: "Crown, porcelain fused to high noble metal" },
    TreatmentCode { code: "D3310", description: "Endodontic therapy, anterior" },
    TreatmentCode { code: "D3330", description: "Endodontic therapy, molar" },
    TreatmentCode { code: "D4341", description: "Scaling and root planing, four or more teeth per quadrant" },
    TreatmentCode { code: "D7140", description: "Extraction, erupted tooth" },
    TreatmentCode { code: "D7210", description: "Surgical extraction, erupted tooth" },
];

/// Tabbed side panel content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalPanel {
    pub tab: ClinicalTab,
    pub tooth: Option<ClinicalToothPanel>,
    pub codes: &'static [TreatmentCode],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalToothPanel {
    pub details: DetailsPanel,
    pub surfaces: Vec<(SurfaceCode, SurfaceDetail)>,
    pub treatments: Vec<TreatmentEntry>,
    pub notes: Vec<String>,
    pub periodontal: Option<PeriodontalMetrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalGrid {
    cell: f32,
    margin: f32,
    tab: ClinicalTab,
}

impl ClinicalTab {
    pub const ALL: [ClinicalTab; 4] = [
        ClinicalTab::Surfaces,
        ClinicalTab::Treatments,
        ClinicalTab::Notes,
        ClinicalTab::Periodontal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ClinicalTab::Surfaces => "Surfaces",
            ClinicalTab::Treatments => "Treatments",
            ClinicalTab::Notes => "Notes",
            ClinicalTab::Periodontal => "Periodontal",
        }
    }
}

impl TreatmentCode {
    pub fn lookup(code: &str) -> Option<&'static TreatmentCode> {
        TREATMENT_CODES.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }
}

impl ClinicalGrid {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = checked_cell_size(cell_size);
        Self { cell: cell_size, margin: cell_size / 2.0, tab: ClinicalTab::default() }
    }

    pub fn tab(&self) -> ClinicalTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: ClinicalTab) {
        self.tab = tab;
    }

    /// Cells are taller than wide to leave room for the badge
    fn cell_height(&self) -> f32 {
        self.cell * 1.25
    }

    fn section_height(&self) -> f32 {
        2.0 * self.cell_height() + CELL_GAP
    }

    fn section_top(&self, arch: Arch) -> f32 {
        match arch {
            Arch::Maxilla => self.margin,
            Arch::Mandible => self.margin + self.section_height() + ROW_GAP,
        }
    }

    fn section_bounds(&self, arch: Arch) -> Rect {
        let width = CLINICAL_COLUMNS as f32 * self.cell + (CLINICAL_COLUMNS - 1) as f32 * CELL_GAP;
        Rect::new(self.margin, self.section_top(arch), width, self.section_height()).expand(CELL_GAP / 2.0)
    }

    /// (row within section, column) of a tooth
    pub fn cell_of(tooth: ToothNumber) -> (u8, u8) {
        let n = tooth.get();
        // Lower teeth run 32 -> 17 so both jaws read patient-right first
        let position = match tooth.arch() {
            Arch::Maxilla => n - 1,
            Arch::Mandible => 2 * ARCH_SIZE - n,
        };
        (position / CLINICAL_COLUMNS, position % CLINICAL_COLUMNS)
    }

    fn panel(&self, store: &ToothRecordStore, interaction: &InteractionState) -> ClinicalPanel {
        let tooth = interaction.selected.map(|number| {
            let record = store.get(number);
            ClinicalToothPanel {
                details: DetailsPanel::for_tooth(store, number),
                surfaces: record.surface_details().to_vec(),
                treatments: record.treatments.clone(),
                notes: record.notes.clone(),
                periodontal: record.periodontal.clone(),
            }
        });
        ClinicalPanel { tab: self.tab, tooth, codes: TREATMENT_CODES }
    }
}

impl LayoutStrategy for ClinicalGrid {
    fn design(&self) -> DesignPreference {
        DesignPreference::Clinical
    }

    fn canvas_size(&self) -> Size {
        Size {
            width: 2.0 * self.margin + CLINICAL_COLUMNS as f32 * self.cell + (CLINICAL_COLUMNS - 1) as f32 * CELL_GAP,
            height: 2.0 * self.margin + 2.0 * self.section_height() + ROW_GAP,
        }
    }

    fn place(&self, tooth: ToothNumber) -> Placement {
        let (row, column) = Self::cell_of(tooth);
        let x = self.margin + column as f32 * (self.cell + CELL_GAP) + self.cell / 2.0;
        let y = self.section_top(tooth.arch()) + row as f32 * (self.cell_height() + CELL_GAP) + self.cell_height() / 2.0;
        Placement::upright(Point::new(x, y), self.cell, self.cell_height())
    }

    fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree {
        let teeth = render_teeth(self, store, interaction, |record, glyph| {
            glyph.wedges = surface_wedges(record);
            glyph.badge = Some(record.outstanding_treatments()).filter(|count| *count > 0);
        });

        VisualTree {
            design: self.design(),
            size: self.canvas_size(),
            teeth,
            groups: vec![
                GlyphGroup { label: "Maxilla".to_string(), bounds: self.section_bounds(Arch::Maxilla), highlighted: false },
                GlyphGroup { label: "Mandible".to_string(), bounds: self.section_bounds(Arch::Mandible), highlighted: false },
            ],
            guides: Vec::new(),
            // The clinical panel follows selection only
            panel: interaction.selected.map(|n| DetailsPanel::for_tooth(store, n)),
            clinical: Some(self.panel(store, interaction)),
        }
    }
}
