use grind_qa_core::{draw_text_mut, text_width, GLYPH_HEIGHT};
use image::{GrayImage, Luma};
use nalgebra::Point2;

/// Fill every pixel whose center lies within `radius` of `center`.
///
/// Pixel `(x, y)` covers `[x, x+1) × [y, y+1)`, so its center is
/// `(x + 0.5, y + 0.5)`. Returns the number of pixels written.
pub fn fill_disk(img: &mut GrayImage, center: Point2<f32>, radius: f32, value: u8) -> usize {
    if !(radius > 0.0) {
        return 0;
    }
    let (w, h) = img.dimensions();
    let r2 = radius * radius;
    let x0 = (center.x - radius).floor().max(0.0) as u32;
    let y0 = (center.y - radius).floor().max(0.0) as u32;
    let x1 = ((center.x + radius).ceil().max(0.0) as u32).min(w);
    let y1 = ((center.y + radius).ceil().max(0.0) as u32).min(h);

    let mut written = 0;
    for y in y0..y1 {
        let dy = y as f32 + 0.5 - center.y;
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - center.x;
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(x, y, Luma([value]));
                written += 1;
            }
        }
    }
    written
}

/// Draw the particle index centered on the disk.
///
/// The label is skipped unless it fits the square inscribed in the disk, so
/// it never paints outside the particle.
pub(crate) fn draw_label(img: &mut GrayImage, center: Point2<f32>, radius: f32, id: usize, value: u8) {
    let text = id.to_string();
    let tw = text_width(&text, 1) as f32;
    let th = GLYPH_HEIGHT as f32;
    // Inscribed square side minus a pixel of slack for rounding.
    let side = radius * std::f32::consts::SQRT_2 - 2.0;
    if tw > side || th > side {
        return;
    }
    let x = (center.x - 0.5 * tw).round() as i32;
    let y = (center.y - 0.5 * th).round() as i32;
    draw_text_mut(img, Luma([value]), x, y, 1, &text);
}
