use eframe::epaint::{Color32, Rounding, Stroke};
use egui::{Rect, Vec2, pos2, vec2};
use nalgebra::Point2;

use crate::{config::DisplayConfig, trial::Frame, util::TargetRing};

/// Paints one task frame, scaling the logical display to fit the space left in `ui`.
pub fn scene(ui: &mut egui::Ui, display: &DisplayConfig, ring: &TargetRing, frame: Option<&Frame>) -> egui::Response {
    let available = ui.available_rect_before_wrap();
    let response = ui.allocate_rect(available, egui::Sense::hover());

    let scale = (available.width() / display.width).min(available.height() / display.height);
    let canvas = Rect::from_center_size(available.center(), vec2(display.width, display.height) * scale);
    let to_screen = |p: Point2<f32>| pos2(canvas.min.x + p.x * scale, canvas.min.y + p.y * scale);
    let painter = ui.painter_at(canvas);

    painter.rect_filled(canvas, Rounding::ZERO, Color32::BLACK);
    painter.circle_filled(to_screen(ring.center), display.start_radius * scale, Color32::BLUE);

    let Some(frame) = frame else {
        return response;
    };

    for (i, position) in ring.positions().iter().enumerate() {
        let center = to_screen(*position);
        if i == frame.target {
            painter.circle_filled(center, display.target_radius * scale, Color32::RED);
            painter.circle_filled(center, display.bullseye_radius * scale, Color32::WHITE);
        } else if frame.neighbours.contains(&i) {
            painter.circle_stroke(center, display.target_radius * scale, Stroke::new(1.0, Color32::WHITE));
        }
    }

    painter.circle_filled(to_screen(frame.cursor), display.cursor_radius * scale, Color32::GREEN);

    if let Some(reversal) = frame.reversal {
        let marker = Rect::from_center_size(to_screen(reversal), Vec2::splat(10.0 * scale));
        painter.rect_filled(marker, Rounding::ZERO, Color32::WHITE);
    }

    response
}
