use eframe::epaint::{Color32, Rounding, Stroke};
use egui::{Align2, FontId, pos2, vec2};

use crate::{config::BlockKind, session::Report};

fn color(kind: BlockKind) -> Color32 {
    match kind {
        BlockKind::Baseline => Color32::LIGHT_BLUE,
        BlockKind::Rotated => Color32::RED,
        BlockKind::Aftereffect => Color32::GREEN,
    }
}

/// Smallest multiple of 45° that fits every error, never below 90°.
fn error_ceiling(report: &Report) -> f32 {
    let max = report.trials.iter().filter_map(|t| t.error).fold(0.0f32, f32::max);
    ((max / 45.0).ceil() * 45.0).max(90.0)
}

/// Directional error against trial number, one line per block kind.
pub fn graph(report: &Report, ui: &mut egui::Ui) -> egui::Response {
    let height = ui.spacing().interact_size.y * 16.0;

    let (rect, response) =
        ui.allocate_exact_size(vec2(ui.available_rect_before_wrap().width(), height), egui::Sense::hover());

    let rect = rect.shrink(ui.visuals().noninteractive().bg_stroke.width);
    let series = report.series();
    let trials = series.iter().flat_map(|(_, points)| points.iter().map(|(n, _)| *n)).max().unwrap_or(1).max(2);
    let ceiling = error_ceiling(report);
    let adv = rect.width() / (trials - 1) as f32;
    let x = |n: usize| rect.min.x + adv * (n - 1) as f32;
    let y = |error: f32| rect.max.y - error / ceiling * rect.height();
    let font = FontId::proportional(ui.spacing().interact_size.y * 0.7);

    ui.painter().rect_filled(response.rect, Rounding::ZERO, Color32::BLACK);

    let mut degrees = 0.0;
    while degrees <= ceiling {
        let line_y = y(degrees);
        ui.painter().line_segment([pos2(rect.min.x, line_y), pos2(rect.max.x, line_y)], Stroke::new(1.0, Color32::DARK_GRAY));
        ui.painter().text(pos2(rect.min.x + 4.0, line_y), Align2::LEFT_BOTTOM, format!("{degrees}°"), font.clone(), Color32::GRAY);
        degrees += 45.0;
    }

    for (kind, points) in &series {
        let stroke = Stroke::new(2.0, color(*kind));
        for pair in points.windows(2) {
            // a missed trial or a restart of the trial count breaks the line
            if let [(n0, Some(e0)), (n1, Some(e1))] = pair {
                if *n1 == *n0 + 1 {
                    ui.painter().line_segment([pos2(x(*n0), y(*e0)), pos2(x(*n1), y(*e1))], stroke);
                }
            }
        }
        for (n, error) in points {
            if let Some(error) = error {
                ui.painter().circle_filled(pos2(x(*n), y(*error)), 2.5, color(*kind));
            }
        }
    }

    let mut legend = pos2(rect.max.x - 8.0, rect.min.y + 8.0);
    for (kind, _) in &series {
        ui.painter().text(legend, Align2::RIGHT_TOP, format!("{kind}"), font.clone(), color(*kind));
        legend.y += font.size * 1.4;
    }
    ui.painter().text(
        pos2(rect.center().x, rect.max.y - 4.0),
        Align2::CENTER_BOTTOM,
        format!("Trial Number (1-{trials})"),
        font.clone(),
        Color32::GRAY,
    );

    ui.painter().rect(response.rect, Rounding::ZERO, Color32::TRANSPARENT, ui.visuals().noninteractive().bg_stroke);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::TrialResult;
    use nalgebra::Point2;

    fn report(errors: &[Option<f32>]) -> Report {
        Report {
            trials: errors
                .iter()
                .enumerate()
                .map(|(i, error)| TrialResult {
                    block: BlockKind::Baseline,
                    number: i + 1,
                    target: 0,
                    reversal: Point2::new(0.0, 0.0),
                    error: *error,
                })
                .collect(),
        }
    }

    #[test]
    fn ceiling_rounds_up_to_45() {
        assert_eq!(error_ceiling(&report(&[])), 90.0);
        assert_eq!(error_ceiling(&report(&[Some(12.0), None])), 90.0);
        assert_eq!(error_ceiling(&report(&[Some(91.0)])), 135.0);
        assert_eq!(error_ceiling(&report(&[Some(180.0), Some(3.0)])), 180.0);
        assert_eq!(error_ceiling(&report(&[Some(290.0)])), 315.0);
    }
}
