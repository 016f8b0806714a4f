//! Traditional two-row chart
//!
//! Upper row shows teeth 1-16 left to right. The lower row runs 32 down to 17
//! so each lower tooth sits under its upper counterpart on the same side of
//! the patient's mouth.

use crate::chart::{Arch, ToothNumber, ToothRecordStore};
use crate::constants::dentition::ARCH_SIZE;
use crate::constants::grid::{CELL_GAP, ROW_GAP};
use crate::interaction::{DetailsPanel, InteractionState};
use crate::preference::DesignPreference;

use super::{checked_cell_size, GlyphGroup, LayoutStrategy, Placement, Point, Rect, Size, VisualTree, render_teeth};

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGrid {
    cell: f32,
    margin: f32,
}

impl LinearGrid {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = checked_cell_size(cell_size);
        Self { cell: cell_size, margin: cell_size / 2.0 }
    }

    /// (row, column) of a tooth
    pub fn cell_of(tooth: ToothNumber) -> (u8, u8) {
        let n = tooth.get();
        match tooth.arch() {
            Arch::Maxilla => (0, n - 1),
            Arch::Mandible => (1, 2 * ARCH_SIZE - n),
        }
    }

    fn row_top(&self, row: u8) -> f32 {
        self.margin + row as f32 * (self.cell + ROW_GAP)
    }

    fn row_bounds(&self, row: u8) -> Rect {
        let width = ARCH_SIZE as f32 * self.cell + (ARCH_SIZE - 1) as f32 * CELL_GAP;
        Rect::new(self.margin, self.row_top(row), width, self.cell).expand(CELL_GAP / 2.0)
    }
}

impl LayoutStrategy for LinearGrid {
    fn design(&self) -> DesignPreference {
        DesignPreference::Traditional
    }

    fn canvas_size(&self) -> Size {
        Size {
            width: 2.0 * self.margin + ARCH_SIZE as f32 * self.cell + (ARCH_SIZE - 1) as f32 * CELL_GAP,
            height: 2.0 * self.margin + 2.0 * self.cell + ROW_GAP,
        }
    }

    fn place(&self, tooth: ToothNumber) -> Placement {
        let (row, column) = Self::cell_of(tooth);
        let x = self.margin + column as f32 * (self.cell + CELL_GAP) + self.cell / 2.0;
        let y = self.row_top(row) + self.cell / 2.0;
        Placement::upright(Point::new(x, y), self.cell, self.cell)
    }

    fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree {
        let teeth = render_teeth(self, store, interaction, |record, glyph| {
            glyph.surface_tag = record.surfaces.tag();
        });

        let size = self.canvas_size();
        let midline_x = size.width / 2.0;
        VisualTree {
            design: self.design(),
            size,
            teeth,
            groups: vec![
                GlyphGroup { label: "Maxillary".to_string(), bounds: self.row_bounds(0), highlighted: false },
                GlyphGroup { label: "Mandibular".to_string(), bounds: self.row_bounds(1), highlighted: false },
            ],
            guides: vec![(Point::new(midline_x, 0.0), Point::new(midline_x, size.height))],
            panel: DetailsPanel::for_focus(store, interaction),
            clinical: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{SurfaceCode, ToothRecord};
    use crate::taxonomy::Condition;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_rows_preserve_sides() {
        assert_eq!(LinearGrid::cell_of(tooth(1)), (0, 0));
        assert_eq!(LinearGrid::cell_of(tooth(16)), (0, 15));
        assert_eq!(LinearGrid::cell_of(tooth(32)), (1, 0));
        assert_eq!(LinearGrid::cell_of(tooth(17)), (1, 15));

        let grid = LinearGrid::new(40.0);
        // 1 and 32 are both on the patient's right, so they share a column
        assert_eq!(grid.place(tooth(1)).center.x, grid.place(tooth(32)).center.x);
        assert!(grid.place(tooth(1)).center.y < grid.place(tooth(32)).center.y);
    }

    #[test]
    fn test_surface_tag_shows_first_two_surfaces() {
        let mut store = ToothRecordStore::new();
        store.set(
            30,
            ToothRecord::new(tooth(30), Condition::Filled).with_surfaces([SurfaceCode::D, SurfaceCode::O, SurfaceCode::B]),
        );
        let tree = LinearGrid::new(40.0).render(&store, &InteractionState::new());
        assert_eq!(tree.glyph(tooth(30)).unwrap().surface_tag.as_deref(), Some("DO"));
        assert_eq!(tree.glyph(tooth(29)).unwrap().surface_tag, None);
    }

    #[test]
    fn test_cells_do_not_overlap() {
        let grid = LinearGrid::new(48.0);
        let cells: Vec<Rect> = ToothNumber::all().map(|t| grid.place(t).bounds()).collect();
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }
}
