//! Anatomical arc layout
//!
//! Each quadrant's eight teeth are placed on a circle around their jaw's arc
//! center. For quadrant-local index `i` (numbering order):
//!
//! ```text
//! angle = i * 22.5 + offset      offset: UR -90, UL +90, LR 0, LL 180
//! x     = cos(angle) * R
//! y     = sin(angle) * R
//! ```
//!
//! Both quadrants of a jaw share one center, so the 16 positions of a jaw form
//! a closed ring with uniform 22.5 degree spacing. Glyphs are turned by
//! `angle + 90` to face along the ring and numerals are counter-rotated to
//! stay upright.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chart::{Arch, Quadrant, ToothNumber, ToothRecordStore};
use crate::constants::arc::{
    DEFAULT_JAW_GAP, DEFAULT_RADIUS, DEFAULT_TOOTH_HEIGHT, DEFAULT_TOOTH_WIDTH, OFFSET_LOWER_LEFT,
    OFFSET_LOWER_RIGHT, OFFSET_UPPER_LEFT, OFFSET_UPPER_RIGHT, STEP_DEGREES,
};
use crate::interaction::{DetailsPanel, InteractionState};
use crate::preference::DesignPreference;

use super::{GlyphGroup, LayoutStrategy, Placement, Point, Rect, Size, VisualTree, render_teeth};

/// Size parameters of the arc layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcGeometry {
    pub radius: f32,
    pub tooth_width: f32,
    pub tooth_height: f32,
    pub jaw_gap: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnatomicalArc {
    geometry: ArcGeometry,
}

impl Default for ArcGeometry {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            tooth_width: DEFAULT_TOOTH_WIDTH,
            tooth_height: DEFAULT_TOOTH_HEIGHT,
            jaw_gap: DEFAULT_JAW_GAP,
        }
    }
}

impl ArcGeometry {
    /// Half diagonal of a glyph, the furthest a glyph reaches from its center
    fn reach(&self) -> f32 {
        (self.tooth_width.powi(2) + self.tooth_height.powi(2)).sqrt() / 2.0
    }

    /// Neighbouring glyphs must not touch, even at the inner edge of the ring
    pub fn is_valid(&self) -> bool {
        let inner_radius = self.radius - self.tooth_height / 2.0;
        let inner_chord = 2.0 * inner_radius * (STEP_DEGREES / 2.0).to_radians().sin();
        self.radius > 0.0
            && self.tooth_width > 0.0
            && self.tooth_height > 0.0
            && self.jaw_gap >= 0.0
            && inner_radius > 0.0
            && self.tooth_width < inner_chord
    }
}

impl AnatomicalArc {
    /// Invalid geometry falls back to the defaults
    pub fn new(geometry: ArcGeometry) -> Self {
        if geometry.is_valid() {
            return Self { geometry };
        }
        warn!(geometry = ?geometry, "Arc geometry would overlap teeth, using defaults");
        Self { geometry: ArcGeometry::default() }
    }

    pub fn geometry(&self) -> &ArcGeometry {
        &self.geometry
    }

    pub fn quadrant_offset(quadrant: Quadrant) -> f32 {
        match quadrant {
            Quadrant::UpperRight => OFFSET_UPPER_RIGHT,
            Quadrant::UpperLeft => OFFSET_UPPER_LEFT,
            Quadrant::LowerRight => OFFSET_LOWER_RIGHT,
            Quadrant::LowerLeft => OFFSET_LOWER_LEFT,
        }
    }

    /// Arc angle of a tooth in degrees
    pub fn angle(tooth: ToothNumber) -> f32 {
        tooth.index_in_quadrant() as f32 * STEP_DEGREES + Self::quadrant_offset(tooth.quadrant())
    }

    fn margin(&self) -> f32 {
        self.geometry.reach() + self.geometry.tooth_width / 4.0
    }

    /// Center of a jaw's ring
    pub fn arc_center(&self, arch: Arch) -> Point {
        let g = &self.geometry;
        let m = self.margin();
        let x = m + g.radius;
        let upper_y = m + g.radius;
        match arch {
            Arch::Maxilla => Point::new(x, upper_y),
            Arch::Mandible => Point::new(x, upper_y + 2.0 * (g.radius + m) + g.jaw_gap),
        }
    }

    fn ring_bounds(&self, arch: Arch) -> Rect {
        let extent = self.geometry.radius + self.geometry.reach();
        Rect::from_center(self.arc_center(arch), 2.0 * extent, 2.0 * extent)
    }
}

impl LayoutStrategy for AnatomicalArc {
    fn design(&self) -> DesignPreference {
        DesignPreference::Anatomical
    }

    fn canvas_size(&self) -> Size {
        let g = &self.geometry;
        let m = self.margin();
        Size {
            width: 2.0 * (g.radius + m),
            height: 4.0 * (g.radius + m) + g.jaw_gap,
        }
    }

    fn place(&self, tooth: ToothNumber) -> Placement {
        let angle = Self::angle(tooth);
        let (sin, cos) = angle.to_radians().sin_cos();
        let center = self.arc_center(tooth.arch());
        let rotation = angle + 90.0;
        Placement {
            center: Point::new(center.x + cos * self.geometry.radius, center.y + sin * self.geometry.radius),
            width: self.geometry.tooth_width,
            height: self.geometry.tooth_height,
            rotation,
            label_rotation: -rotation,
        }
    }

    fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree {
        let teeth = render_teeth(self, store, interaction, |_, _| {});
        let focus_arch = interaction.focus().map(ToothNumber::arch);
        VisualTree {
            design: self.design(),
            size: self.canvas_size(),
            teeth,
            groups: vec![
                GlyphGroup {
                    label: "Maxilla".to_string(),
                    bounds: self.ring_bounds(Arch::Maxilla),
                    highlighted: focus_arch == Some(Arch::Maxilla),
                },
                GlyphGroup {
                    label: "Mandible".to_string(),
                    bounds: self.ring_bounds(Arch::Mandible),
                    highlighted: focus_arch == Some(Arch::Mandible),
                },
            ],
            guides: Vec::new(),
            panel: DetailsPanel::for_focus(store, interaction),
            clinical: None,
        }
    }
}
