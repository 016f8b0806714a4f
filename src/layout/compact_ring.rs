//! Compact ring layout
//!
//! Two rows bowed into arches by a quadratic offset, no trigonometry. The
//! density toggle switches between whole-tooth fills and five-wedge glyphs
//! where every surface carries its own condition color.

use serde::{Deserialize, Serialize};

use crate::chart::{Arch, ToothNumber, ToothRecordStore};
use crate::constants::dentition::ARCH_SIZE;
use crate::constants::grid::{CELL_GAP, RING_BOW, ROW_GAP};
use crate::interaction::{DetailsPanel, InteractionState};
use crate::preference::DesignPreference;

use super::linear_grid::LinearGrid;
use super::{checked_cell_size, LayoutStrategy, Placement, Point, Size, VisualTree, render_teeth, surface_wedges};

/// How much clinical detail each glyph shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    #[default]
    Overview,
    Detailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompactRing {
    cell: f32,
    margin: f32,
    density: Density,
}

impl Density {
    pub fn toggled(self) -> Self {
        match self {
            Density::Overview => Density::Detailed,
            Density::Detailed => Density::Overview,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Density::Overview => "Overview",
            Density::Detailed => "Detailed",
        }
    }
}

impl CompactRing {
    pub fn new(cell_size: f32, density: Density) -> Self {
        let cell_size = checked_cell_size(cell_size);
        // Glyphs are slightly smaller than grid cells so the bowed rows breathe
        Self { cell: cell_size * 0.8, margin: cell_size / 2.0, density }
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn set_density(&mut self, density: Density) {
        self.density = density;
    }

    pub fn toggle_density(&mut self) -> Density {
        self.density = self.density.toggled();
        self.density
    }

    /// Vertical offset of a column: 0 at the midline, full bow at the molars
    fn bow(column: u8) -> f32 {
        let half = (ARCH_SIZE - 1) as f32 / 2.0;
        let t = (column as f32 - half) / half;
        RING_BOW * t * t
    }

    fn upper_base(&self) -> f32 {
        self.margin + self.cell / 2.0
    }

    fn lower_base(&self) -> f32 {
        self.upper_base() + RING_BOW + self.cell + ROW_GAP
    }
}

impl LayoutStrategy for CompactRing {
    fn design(&self) -> DesignPreference {
        DesignPreference::Interactive
    }

    fn canvas_size(&self) -> Size {
        Size {
            width: 2.0 * self.margin + ARCH_SIZE as f32 * self.cell + (ARCH_SIZE - 1) as f32 * CELL_GAP,
            height: self.lower_base() + RING_BOW + self.cell / 2.0 + self.margin,
        }
    }

    fn place(&self, tooth: ToothNumber) -> Placement {
        let (_, column) = LinearGrid::cell_of(tooth);
        let x = self.margin + column as f32 * (self.cell + CELL_GAP) + self.cell / 2.0;
        let y = match tooth.arch() {
            // Upper arch: incisors highest, molars drop
            Arch::Maxilla => self.upper_base() + Self::bow(column),
            // Lower arch mirrors it
            Arch::Mandible => self.lower_base() + RING_BOW - Self::bow(column),
        };
        Placement::upright(Point::new(x, y), self.cell, self.cell)
    }

    fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree {
        let detailed = self.density == Density::Detailed;
        let teeth = render_teeth(self, store, interaction, |record, glyph| {
            if detailed {
                glyph.wedges = surface_wedges(record);
            } else {
                glyph.surface_tag = record.surfaces.tag();
            }
        });

        VisualTree {
            design: self.design(),
            size: self.canvas_size(),
            teeth,
            groups: Vec::new(),
            guides: Vec::new(),
            panel: DetailsPanel::for_focus(store, interaction),
            clinical: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{SurfaceCode, SurfaceDetail, ToothRecord};
    use crate::taxonomy::{Condition, style};
    use std::collections::BTreeMap;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_rows_bow_toward_the_molars() {
        let ring = CompactRing::new(48.0, Density::Overview);
        let molar = ring.place(tooth(1)).center.y;
        let incisor = ring.place(tooth(8)).center.y;
        assert!(molar > incisor);
        let lower_molar = ring.place(tooth(32)).center.y;
        let lower_incisor = ring.place(tooth(25)).center.y;
        assert!(lower_molar < lower_incisor);
        assert!(lower_molar > molar);
    }

    #[test]
    fn test_overview_has_no_wedges() {
        let store = ToothRecordStore::new();
        let tree = CompactRing::new(48.0, Density::Overview).render(&store, &InteractionState::new());
        assert!(tree.teeth.iter().all(|g| g.wedges.is_empty()));
    }

    #[test]
    fn test_detailed_colors_each_surface() {
        let mut store = ToothRecordStore::new();
        let record = ToothRecord::new(tooth(3), Condition::Cavity)
            .with_surfaces([SurfaceCode::O])
            .with_surface_details(BTreeMap::from([(
                SurfaceCode::L,
                SurfaceDetail { condition: Condition::Filled, treatment: None },
            )]));
        store.set(3, record);

        let mut ring = CompactRing::new(48.0, Density::Overview);
        assert_eq!(ring.toggle_density(), Density::Detailed);
        let tree = ring.render(&store, &InteractionState::new());
        let wedges = &tree.glyph(tooth(3)).unwrap().wedges;

        assert_eq!(wedges.len(), 5);
        let fill_of = |s: SurfaceCode| wedges.iter().find(|w| w.surface == s).unwrap().fill;
        assert_eq!(fill_of(SurfaceCode::O), style(Condition::Cavity).color);
        assert_eq!(fill_of(SurfaceCode::L), style(Condition::Filled).color);
        assert_eq!(fill_of(SurfaceCode::M), style(Condition::Healthy).color);
        // Whole-tooth fill is unchanged by the density
        assert_eq!(tree.glyph(tooth(3)).unwrap().fill, style(Condition::Cavity).color);
    }
}
