//! Global threshold selection.

use image::GrayImage;

/// Otsu threshold of the image histogram.
///
/// Pixels `<= threshold` belong to the dark class. Flat images return their
/// single level; two-level images return the midpoint between the levels.
pub fn otsu_threshold(img: &GrayImage) -> u8 {
    let samples = img.as_raw();
    if samples.is_empty() {
        return 127;
    }

    let mut hist = [0u64; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    otsu_from_histogram(&hist)
}

fn otsu_from_histogram(hist: &[u64; 256]) -> u8 {
    let occupied: Vec<usize> = (0..256).filter(|&i| hist[i] > 0).collect();
    let (Some(&lo), Some(&hi)) = (occupied.first(), occupied.last()) else {
        return 127;
    };
    if occupied.len() <= 2 {
        return ((lo + hi) / 2) as u8;
    }

    let total: f64 = hist.iter().sum::<u64>() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn flat_image_returns_its_level() {
        let img = GrayImage::from_pixel(8, 8, Luma([200]));
        assert_eq!(otsu_threshold(&img), 200);
    }

    #[test]
    fn two_levels_split_at_midpoint() {
        let mut img = GrayImage::from_pixel(8, 8, Luma([240]));
        img.put_pixel(1, 1, Luma([30]));
        assert_eq!(otsu_threshold(&img), 135);
    }

    #[test]
    fn separates_noisy_bimodal_levels() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            let jitter = ((x * 7 + y * 13) % 9) as u8;
            if x < 20 {
                Luma([26 + jitter])
            } else {
                Luma([226 + jitter])
            }
        });
        let t = otsu_threshold(&img);
        assert!(t >= 34 && t < 226, "threshold {t}");
    }
}
