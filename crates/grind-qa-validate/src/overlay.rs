//! Diagnostic overlay: the analysed image with match outcomes drawn on top.

use grind_qa_core::{draw_text_mut, text_width, GLYPH_HEIGHT};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::metrics::ValidationReport;

/// Height of the legend band painted over the bottom rows.
pub const LEGEND_HEIGHT: u32 = 36;

pub const MATCHED_COLOR: Rgb<u8> = Rgb([40, 200, 60]);
pub const FALSE_POSITIVE_COLOR: Rgb<u8> = Rgb([230, 40, 40]);
pub const FALSE_NEGATIVE_COLOR: Rgb<u8> = Rgb([40, 110, 255]);
pub const LEGEND_BACKGROUND: Rgb<u8> = Rgb([24, 24, 24]);
pub const LEGEND_TEXT: Rgb<u8> = Rgb([235, 235, 235]);

const SWATCH: u32 = GLYPH_HEIGHT;

/// Render `report` on top of `original`.
///
/// The result has the same dimensions as `original`. Matched detections are
/// green circles, false positives red circles and false negatives blue
/// circles crossed by an X. Detected circles use the equivalent radius
/// `sqrt(area / π)`, expected circles the ground-truth radius.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(original, report),
        fields(width = original.width(), height = original.height())
    )
)]
pub fn render_overlay(original: &GrayImage, report: &ValidationReport) -> RgbImage {
    let (w, h) = original.dimensions();
    let mut canvas = RgbImage::from_fn(w, h, |x, y| {
        let v = original.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });
    if w == 0 || h == 0 {
        return canvas;
    }

    for pair in &report.matched {
        circle(
            &mut canvas,
            pair.detected.position,
            pair.detected.equivalent_radius(),
            MATCHED_COLOR,
        );
    }
    for det in &report.unmatched_detected {
        circle(&mut canvas, det.position, det.equivalent_radius(), FALSE_POSITIVE_COLOR);
    }
    for exp in &report.unmatched_expected {
        circle(&mut canvas, exp.center, exp.radius, FALSE_NEGATIVE_COLOR);
        cross(&mut canvas, exp.center, exp.radius, FALSE_NEGATIVE_COLOR);
    }

    draw_legend(&mut canvas, report);
    canvas
}

/// Clamp `radius` to the canvas scale and return it if the shape's bounding
/// box overlaps the canvas. Keeps integer drawing coordinates small.
fn visible_radius(canvas: &RgbImage, center: Point2<f32>, radius: f32) -> Option<f32> {
    if !(center.x.is_finite() && center.y.is_finite() && radius.is_finite()) {
        return None;
    }
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let r = radius.abs().min(w + h);
    let misses = center.x + r < 0.0 || center.y + r < 0.0 || center.x - r > w || center.y - r > h;
    (!misses).then_some(r)
}

fn circle(canvas: &mut RgbImage, center: Point2<f32>, radius: f32, color: Rgb<u8>) {
    let Some(radius) = visible_radius(canvas, center, radius) else {
        return;
    };
    let r = (radius.round() as i32).max(1);
    draw_hollow_circle_mut(
        canvas,
        (center.x.round() as i32, center.y.round() as i32),
        r,
        color,
    );
}

fn cross(canvas: &mut RgbImage, center: Point2<f32>, radius: f32, color: Rgb<u8>) {
    let Some(radius) = visible_radius(canvas, center, radius) else {
        return;
    };
    let (x0, y0) = (center.x - radius, center.y - radius);
    let (x1, y1) = (center.x + radius, center.y + radius);
    draw_line_segment_mut(canvas, (x0, y0), (x1, y1), color);
    draw_line_segment_mut(canvas, (x0, y1), (x1, y0), color);
}

fn draw_legend(canvas: &mut RgbImage, report: &ValidationReport) {
    let (w, h) = canvas.dimensions();
    let band = LEGEND_HEIGHT.min(h);
    let top = (h - band) as i32;
    draw_filled_rect_mut(canvas, Rect::at(0, top).of_size(w, band), LEGEND_BACKGROUND);

    let row1 = top + 6;
    let mut x = 6i32;
    for (color, label) in [
        (MATCHED_COLOR, format!("TP {}", report.correctly_detected)),
        (FALSE_POSITIVE_COLOR, format!("FP {}", report.false_positives)),
        (FALSE_NEGATIVE_COLOR, format!("FN {}", report.false_negatives)),
    ] {
        draw_filled_rect_mut(canvas, Rect::at(x, row1).of_size(SWATCH, SWATCH), color);
        x += SWATCH as i32 + 4;
        draw_text_mut(canvas, LEGEND_TEXT, x, row1, 1, &label);
        x += text_width(&label, 1) as i32 + 12;
    }

    let metrics = format!(
        "P {:.3}  R {:.3}  F1 {:.3}",
        report.precision, report.recall, report.f1_score
    );
    draw_text_mut(canvas, LEGEND_TEXT, 6, top + 22, 1, &metrics);
}
