//! Draws a [`VisualTree`] with the egui painter

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, StrokeKind, Vec2};

use dental_chart::chart::{Quadrant, SurfaceCode};
use dental_chart::color::ColorToken;
use dental_chart::layout::{Placement, Point, ToothGlyph, VisualTree};

use super::constants::*;

/// Fraction of the glyph taken by the occlusal square
const INNER_RATIO: f32 = 0.4;

/// Pointer state over the canvas, in canvas coordinates
pub struct CanvasInput {
    pub pointer: Option<Point>,
    pub clicked: bool,
}

/// Maps canvas units to screen pixels
#[derive(Clone, Copy)]
struct CanvasTransform {
    origin: Pos2,
    scale: f32,
}

impl CanvasTransform {
    fn to_screen(self, p: Point) -> Pos2 {
        Pos2::new(self.origin.x + p.x * self.scale, self.origin.y + p.y * self.scale)
    }

    fn to_canvas(self, p: Pos2) -> Point {
        Point::new((p.x - self.origin.x) / self.scale, (p.y - self.origin.y) / self.scale)
    }
}

pub fn color32(token: ColorToken) -> Color32 {
    Color32::from_rgba_unmultiplied(token.r, token.g, token.b, token.a)
}

/// Paint the chart into the available space and report pointer input
pub fn paint_chart(ui: &mut egui::Ui, tree: &VisualTree) -> CanvasInput {
    let available = ui.available_size();
    let scale = (available.x / tree.size.width)
        .min(available.y / tree.size.height)
        .clamp(0.1, MAX_CANVAS_SCALE);
    let desired = Vec2::new(tree.size.width * scale, tree.size.height * scale);
    let (response, painter) = ui.allocate_painter(desired, Sense::click());
    let transform = CanvasTransform { origin: response.rect.min, scale };

    for group in &tree.groups {
        let rect = egui::Rect::from_min_max(
            transform.to_screen(Point::new(group.bounds.left(), group.bounds.top())),
            transform.to_screen(Point::new(group.bounds.right(), group.bounds.bottom())),
        );
        let fill = if group.highlighted { GROUP_HIGHLIGHT_FILL } else { GROUP_FILL };
        painter.rect_filled(rect, 6.0, fill);
        painter.text(
            rect.left_top() + Vec2::new(4.0, 2.0),
            Align2::LEFT_TOP,
            &group.label,
            FontId::proportional(TAG_SIZE),
            GUIDE,
        );
    }

    for (from, to) in &tree.guides {
        painter.line_segment(
            [transform.to_screen(*from), transform.to_screen(*to)],
            Stroke::new(1.0, GUIDE),
        );
    }

    for glyph in &tree.teeth {
        paint_glyph(&painter, transform, glyph);
    }

    CanvasInput {
        pointer: response.hover_pos().map(|pos| transform.to_canvas(pos)),
        clicked: response.clicked(),
    }
}

fn outline(glyph: &ToothGlyph) -> Stroke {
    if glyph.selected {
        Stroke::new(HIGHLIGHT_WIDTH, SELECTED_OUTLINE)
    } else if glyph.hovered {
        Stroke::new(HIGHLIGHT_WIDTH, HOVER_OUTLINE)
    } else {
        Stroke::new(OUTLINE_WIDTH, OUTLINE)
    }
}

/// Glyph-local point turned with the glyph and moved to the screen
fn local_to_screen(placement: &Placement, transform: CanvasTransform, dx: f32, dy: f32) -> Pos2 {
    let (sin, cos) = placement.rotation.to_radians().sin_cos();
    transform.to_screen(Point::new(
        placement.center.x + dx * cos - dy * sin,
        placement.center.y + dx * sin + dy * cos,
    ))
}

fn paint_glyph(painter: &egui::Painter, transform: CanvasTransform, glyph: &ToothGlyph) {
    let placement = &glyph.placement;
    let corners: Vec<Pos2> = placement.corners().into_iter().map(|p| transform.to_screen(p)).collect();

    if glyph.wedges.is_empty() {
        painter.add(Shape::convex_polygon(corners.clone(), color32(glyph.fill), Stroke::NONE));
    } else {
        for wedge in &glyph.wedges {
            let points = wedge_outline(glyph, wedge.surface)
                .into_iter()
                .map(|(dx, dy)| local_to_screen(placement, transform, dx, dy))
                .collect();
            painter.add(Shape::convex_polygon(points, color32(wedge.fill), Stroke::new(0.5, OUTLINE)));
        }
    }
    painter.add(Shape::closed_line(corners, outline(glyph)));

    let text_color = if glyph.fill.is_light() { LABEL_DARK } else { LABEL_LIGHT };
    let center = transform.to_screen(placement.center);
    painter.text(center, Align2::CENTER_CENTER, &glyph.label, FontId::proportional(LABEL_SIZE), text_color);

    if let Some(tag) = &glyph.surface_tag {
        let below = center + Vec2::new(0.0, LABEL_SIZE);
        painter.text(below, Align2::CENTER_CENTER, tag, FontId::monospace(TAG_SIZE), text_color);
    }

    if let Some(count) = glyph.badge {
        let corner = transform.to_screen(Point::new(
            placement.center.x + placement.width / 2.0,
            placement.center.y - placement.height / 2.0,
        ));
        painter.circle_filled(corner, BADGE_RADIUS, BADGE_FILL);
        painter.text(corner, Align2::CENTER_CENTER, count.to_string(), FontId::proportional(TAG_SIZE), LABEL_LIGHT);
    }

    if glyph.selected {
        let bounds = placement.bounds().expand(2.0);
        let rect = egui::Rect::from_min_max(
            transform.to_screen(Point::new(bounds.left(), bounds.top())),
            transform.to_screen(Point::new(bounds.right(), bounds.bottom())),
        );
        painter.rect_stroke(rect, 4.0, Stroke::new(1.0, SELECTED_OUTLINE), StrokeKind::Outside);
    }
}

/// Clockwise wedge polygon in glyph-local coordinates. Buccal faces away from
/// the other jaw and mesial faces the midline.
fn wedge_outline(glyph: &ToothGlyph, surface: SurfaceCode) -> Vec<(f32, f32)> {
    let (hw, hh) = (glyph.placement.width / 2.0, glyph.placement.height / 2.0);
    let (iw, ih) = (hw * INNER_RATIO, hh * INNER_RATIO);

    let top = vec![(-hw, -hh), (hw, -hh), (iw, -ih), (-iw, -ih)];
    let bottom = vec![(-iw, ih), (iw, ih), (hw, hh), (-hw, hh)];
    let left = vec![(-hw, -hh), (-iw, -ih), (-iw, ih), (-hw, hh)];
    let right = vec![(iw, -ih), (hw, -hh), (hw, hh), (iw, ih)];

    let quadrant = glyph.number.quadrant();
    let upper = matches!(quadrant, Quadrant::UpperRight | Quadrant::UpperLeft);
    // Patient's right is drawn on the viewer's left, so its midline is to the right
    let mesial_right = matches!(quadrant, Quadrant::UpperRight | Quadrant::LowerRight);

    match surface.glyph_surface() {
        SurfaceCode::B => if upper { top } else { bottom },
        SurfaceCode::L => if upper { bottom } else { top },
        SurfaceCode::M => if mesial_right { right } else { left },
        SurfaceCode::D => if mesial_right { left } else { right },
        _ => vec![(-iw, -ih), (iw, -ih), (iw, ih), (-iw, ih)],
    }
}
