//! Minimalist quadrant layout
//!
//! Four 2x4 blocks arranged around a crosshair. The patient's right side is
//! on the viewer's left. Inside each block, teeth closest to the midline sit
//! next to the crosshair. Selecting a tooth highlights its whole block.

use crate::chart::{Quadrant, ToothNumber, ToothRecordStore};
use crate::constants::grid::{CELL_GAP, CROSSHAIR_GAP};
use crate::interaction::{DetailsPanel, InteractionState};
use crate::preference::DesignPreference;

use super::{checked_cell_size, GlyphGroup, LayoutStrategy, Placement, Point, Rect, Size, VisualTree, render_teeth};

const BLOCK_COLUMNS: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct QuadrantBlock {
    cell: f32,
    margin: f32,
}

impl QuadrantBlock {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = checked_cell_size(cell_size);
        Self { cell: cell_size, margin: cell_size / 2.0 }
    }

    fn block_width(&self) -> f32 {
        BLOCK_COLUMNS as f32 * self.cell + (BLOCK_COLUMNS - 1) as f32 * CELL_GAP
    }

    fn block_height(&self) -> f32 {
        2.0 * self.cell + CELL_GAP
    }

    pub fn crosshair(&self) -> Point {
        Point::new(
            self.margin + self.block_width() + CROSSHAIR_GAP / 2.0,
            self.margin + self.block_height() + CROSSHAIR_GAP / 2.0,
        )
    }

    pub fn block_bounds(&self, quadrant: Quadrant) -> Rect {
        let center = self.crosshair();
        let half_gap = CROSSHAIR_GAP / 2.0;
        let (w, h) = (self.block_width(), self.block_height());
        let x = match quadrant {
            Quadrant::UpperRight | Quadrant::LowerRight => center.x - half_gap - w,
            Quadrant::UpperLeft | Quadrant::LowerLeft => center.x + half_gap,
        };
        let y = match quadrant {
            Quadrant::UpperRight | Quadrant::UpperLeft => center.y - half_gap - h,
            Quadrant::LowerRight | Quadrant::LowerLeft => center.y + half_gap,
        };
        Rect::new(x, y, w, h)
    }

    /// (row, column) of a tooth inside its block
    pub fn slot(tooth: ToothNumber) -> (u8, u8) {
        let d = tooth.distance_from_midline();
        let lane = d / BLOCK_COLUMNS;
        let step = d % BLOCK_COLUMNS;
        let row = match tooth.quadrant() {
            Quadrant::UpperRight | Quadrant::UpperLeft => 1 - lane,
            Quadrant::LowerRight | Quadrant::LowerLeft => lane,
        };
        let column = match tooth.quadrant() {
            Quadrant::UpperRight | Quadrant::LowerRight => BLOCK_COLUMNS - 1 - step,
            Quadrant::UpperLeft | Quadrant::LowerLeft => step,
        };
        (row, column)
    }
}

impl LayoutStrategy for QuadrantBlock {
    fn design(&self) -> DesignPreference {
        DesignPreference::Minimalist
    }

    fn canvas_size(&self) -> Size {
        Size {
            width: 2.0 * (self.margin + self.block_width()) + CROSSHAIR_GAP,
            height: 2.0 * (self.margin + self.block_height()) + CROSSHAIR_GAP,
        }
    }

    fn place(&self, tooth: ToothNumber) -> Placement {
        let block = self.block_bounds(tooth.quadrant());
        let (row, column) = Self::slot(tooth);
        let x = block.x + column as f32 * (self.cell + CELL_GAP) + self.cell / 2.0;
        let y = block.y + row as f32 * (self.cell + CELL_GAP) + self.cell / 2.0;
        Placement::upright(Point::new(x, y), self.cell, self.cell)
    }

    fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree {
        let teeth = render_teeth(self, store, interaction, |record, glyph| {
            glyph.surface_tag = record.surfaces.tag();
        });

        let selected_quadrant = interaction.selected.map(ToothNumber::quadrant);
        let groups = Quadrant::ALL
            .into_iter()
            .map(|quadrant| GlyphGroup {
                label: quadrant.label().to_string(),
                bounds: self.block_bounds(quadrant).expand(CELL_GAP),
                highlighted: selected_quadrant == Some(quadrant),
            })
            .collect();

        let size = self.canvas_size();
        let center = self.crosshair();
        VisualTree {
            design: self.design(),
            size,
            teeth,
            groups,
            guides: vec![
                (Point::new(0.0, center.y), Point::new(size.width, center.y)),
                (Point::new(center.x, 0.0), Point::new(center.x, size.height)),
            ],
            panel: DetailsPanel::for_focus(store, interaction),
            clinical: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).unwrap()
    }

    #[test]
    fn test_incisors_sit_next_to_crosshair() {
        assert_eq!(QuadrantBlock::slot(tooth(8)), (1, 3));
        assert_eq!(QuadrantBlock::slot(tooth(9)), (1, 0));
        assert_eq!(QuadrantBlock::slot(tooth(24)), (0, 0));
        assert_eq!(QuadrantBlock::slot(tooth(25)), (0, 3));
        assert_eq!(QuadrantBlock::slot(tooth(1)), (0, 0));
        assert_eq!(QuadrantBlock::slot(tooth(16)), (0, 3));
    }

    #[test]
    fn test_every_quadrant_fills_its_eight_slots() {
        for quadrant in Quadrant::ALL {
            let mut slots: Vec<(u8, u8)> = quadrant.teeth().map(QuadrantBlock::slot).collect();
            slots.sort();
            slots.dedup();
            assert_eq!(slots.len(), 8);
        }
    }

    #[test]
    fn test_blocks_surround_crosshair() {
        let layout = QuadrantBlock::new(40.0);
        let center = layout.crosshair();
        for quadrant in Quadrant::ALL {
            let block = layout.block_bounds(quadrant);
            assert!(!block.contains(center));
            for tooth in quadrant.teeth() {
                assert!(block.contains(layout.place(tooth).center));
            }
        }
        assert!(layout.block_bounds(Quadrant::UpperRight).right() < center.x);
        assert!(layout.block_bounds(Quadrant::LowerLeft).top() > center.y);
    }

    #[test]
    fn test_selection_highlights_quadrant() {
        let store = ToothRecordStore::new();
        let mut interaction = InteractionState::new();
        interaction.select(tooth(20));
        let tree = QuadrantBlock::new(40.0).render(&store, &interaction);

        let highlighted: Vec<&str> = tree.groups.iter().filter(|g| g.highlighted).map(|g| g.label.as_str()).collect();
        assert_eq!(highlighted, vec!["Lower Left"]);
        assert!(tree.glyph(tooth(20)).unwrap().selected);
        assert!(!tree.glyph(tooth(21)).unwrap().selected);
    }
}
