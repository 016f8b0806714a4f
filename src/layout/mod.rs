//! Layout strategies
//!
//! Five interchangeable ways of placing the 32 teeth:
//! - **linear_grid**: two straight rows (traditional)
//! - **anatomical_arc**: trigonometric placement on two jaw rings
//! - **compact_ring**: two bowed rows with an overview/detailed toggle
//! - **quadrant_block**: four 2x4 blocks around a crosshair (minimalist)
//! - **clinical_grid**: 8-wide sections with surface glyphs and badges
//!
//! Every strategy produces a renderer-agnostic [`VisualTree`]. Colors always
//! come from [`crate::taxonomy::style`], and every strategy places all 32 teeth.

pub mod anatomical_arc;
pub mod clinical_grid;
pub mod compact_ring;
pub mod linear_grid;
pub mod quadrant_block;

pub use anatomical_arc::{AnatomicalArc, ArcGeometry};
pub use clinical_grid::{ClinicalGrid, ClinicalPanel, ClinicalTab, TreatmentCode, TREATMENT_CODES};
pub use compact_ring::{CompactRing, Density};
pub use linear_grid::LinearGrid;
pub use quadrant_block::QuadrantBlock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chart::{SurfaceCode, ToothNumber, ToothRecord, ToothRecordStore};
use crate::color::ColorToken;
use crate::constants::grid::{DEFAULT_CELL_SIZE, MAX_CELL_SIZE, MIN_CELL_SIZE};
use crate::interaction::{DetailsPanel, IntentSink, InteractionState, PointerEvent};
use crate::preference::DesignPreference;
use crate::taxonomy::{style, Condition};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned rectangle in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where and how a tooth glyph sits on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    /// Glyph rotation in degrees, clockwise in screen coordinates
    pub rotation: f32,
    /// Rotation applied to the numeral on top of the glyph rotation
    pub label_rotation: f32,
}

/// One wedge of a five-surface glyph
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceWedge {
    pub surface: SurfaceCode,
    pub condition: Condition,
    pub fill: ColorToken,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToothGlyph {
    pub number: ToothNumber,
    pub placement: Placement,
    pub condition: Condition,
    pub fill: ColorToken,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_tag: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wedges: Vec<SurfaceWedge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<usize>,
    pub hovered: bool,
    pub selected: bool,
}

/// A labelled region drawn behind a set of teeth (row, quadrant block)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphGroup {
    pub label: String,
    pub bounds: Rect,
    pub highlighted: bool,
}

/// Renderer-agnostic output of a layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualTree {
    pub design: DesignPreference,
    pub size: Size,
    pub teeth: Vec<ToothGlyph>,
    pub groups: Vec<GlyphGroup>,
    /// Straight guide lines (midlines, crosshair)
    pub guides: Vec<(Point, Point)>,
    pub panel: Option<DetailsPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical: Option<ClinicalPanel>,
}

/// The contract every layout strategy implements
pub trait LayoutStrategy {
    fn design(&self) -> DesignPreference;

    fn canvas_size(&self) -> Size;

    /// Geometry of a single tooth
    fn place(&self, tooth: ToothNumber) -> Placement;

    /// Produce the visual tree for the current chart and interaction state
    fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree;

    /// Feed pointer input through the shared interaction contract
    fn emit(&self, interaction: &mut InteractionState, event: PointerEvent, sink: &mut dyn IntentSink) {
        interaction.handle(event, sink);
    }
}

/// Closed set of layout strategies
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Traditional(LinearGrid),
    Anatomical(AnatomicalArc),
    Interactive(CompactRing),
    Minimalist(QuadrantBlock),
    Clinical(ClinicalGrid),
}

/// Sizing shared by the layout constructors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub cell_size: f32,
    pub arc: ArcGeometry,
    pub ring_density: Density,
}

impl Layout {
    pub fn strategy(&self) -> &dyn LayoutStrategy {
        match self {
            Layout::Traditional(l) => l,
            Layout::Anatomical(l) => l,
            Layout::Interactive(l) => l,
            Layout::Minimalist(l) => l,
            Layout::Clinical(l) => l,
        }
    }

    pub fn design(&self) -> DesignPreference {
        self.strategy().design()
    }

    pub fn render(&self, store: &ToothRecordStore, interaction: &InteractionState) -> VisualTree {
        self.strategy().render(store, interaction)
    }

    pub fn emit(&self, interaction: &mut InteractionState, event: PointerEvent, sink: &mut dyn IntentSink) {
        self.strategy().emit(interaction, event, sink);
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            arc: ArcGeometry::default(),
            ring_density: Density::Overview,
        }
    }
}

impl LayoutSettings {
    /// Validate and clamp values read from the config file
    pub fn validate_and_clamp(&mut self) {
        self.cell_size = checked_cell_size(self.cell_size);
        if !self.arc.is_valid() {
            warn!(arc = ?self.arc, "Arc geometry would overlap teeth, using defaults");
            self.arc = ArcGeometry::default();
        }
    }
}

/// Cell size usable by the grid layouts; non-finite or too small values
/// fall back to the default
pub(crate) fn checked_cell_size(cell_size: f32) -> f32 {
    if !cell_size.is_finite() || cell_size < MIN_CELL_SIZE {
        warn!(cell_size, min = MIN_CELL_SIZE, using = DEFAULT_CELL_SIZE, "cell_size below minimum, using default");
        DEFAULT_CELL_SIZE
    } else if cell_size > MAX_CELL_SIZE {
        warn!(cell_size, max = MAX_CELL_SIZE, "cell_size exceeds maximum, clamping");
        MAX_CELL_SIZE
    } else {
        cell_size
    }
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Overlap with a positive area (touching edges do not count)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }

    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(self.x - margin, self.y - margin, self.width + 2.0 * margin, self.height + 2.0 * margin)
    }
}

impl Placement {
    /// Unrotated glyph at a center point
    pub fn upright(center: Point, width: f32, height: f32) -> Self {
        Self { center, width, height, rotation: 0.0, label_rotation: 0.0 }
    }

    /// Net rotation of the numeral on screen
    pub fn label_angle(&self) -> f32 {
        self.rotation + self.label_rotation
    }

    /// Corners of the (possibly rotated) glyph rectangle, clockwise from top-left
    pub fn corners(&self) -> [Point; 4] {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
            Point::new(self.center.x + dx * cos - dy * sin, self.center.y + dx * sin + dy * cos)
        })
    }

    /// Axis-aligned bounding box
    pub fn bounds(&self) -> Rect {
        let corners = self.corners();
        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Point-in-glyph test honouring rotation
    pub fn contains(&self, p: Point) -> bool {
        let (sin, cos) = (-self.rotation).to_radians().sin_cos();
        let (dx, dy) = (p.x - self.center.x, p.y - self.center.y);
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        local_x.abs() <= self.width / 2.0 && local_y.abs() <= self.height / 2.0
    }
}

impl VisualTree {
    /// Tooth under a canvas point; later glyphs are on top
    pub fn hit_test(&self, p: Point) -> Option<ToothNumber> {
        self.teeth.iter().rev().find(|g| g.placement.contains(p)).map(|g| g.number)
    }

    pub fn glyph(&self, number: ToothNumber) -> Option<&ToothGlyph> {
        self.teeth.iter().find(|g| g.number == number)
    }
}

/// Glyph with whole-tooth fill, shared by all strategies
pub(crate) fn base_glyph(
    record: &ToothRecord,
    interaction: &InteractionState,
    placement: Placement,
) -> ToothGlyph {
    ToothGlyph {
        number: record.number,
        placement,
        condition: record.condition,
        fill: style(record.condition).color,
        label: record.number.to_string(),
        surface_tag: None,
        wedges: Vec::new(),
        badge: None,
        hovered: interaction.is_hovered(record.number),
        selected: interaction.is_selected(record.number),
    }
}

/// Five wedges colored by each surface's own condition
pub(crate) fn surface_wedges(record: &ToothRecord) -> Vec<SurfaceWedge> {
    record
        .surface_details()
        .into_iter()
        .map(|(surface, detail)| SurfaceWedge {
            surface,
            condition: detail.condition,
            fill: style(detail.condition).color,
        })
        .collect()
}

/// Render every tooth through `place`, letting the caller decorate each glyph
pub(crate) fn render_teeth(
    strategy: &dyn LayoutStrategy,
    store: &ToothRecordStore,
    interaction: &InteractionState,
    mut decorate: impl FnMut(&ToothRecord, &mut ToothGlyph),
) -> Vec<ToothGlyph> {
    ToothNumber::all()
        .map(|number| {
            let record = store.get(number);
            let mut glyph = base_glyph(&record, interaction, strategy.place(number));
            decorate(&record, &mut glyph);
            glyph
        })
        .collect()
}
