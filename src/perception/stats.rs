use image::RgbImage;

const CODE_LAYOUT_THRESHOLD: f64 = 0.12;
const CODE_LAYOUT_ROW_CEILING: f64 = 0.7;

/// Whole-image statistics used as weak global signals by the content
/// classifier. All values are normalised to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    /// Mean Rec.601 luma.
    pub brightness: f64,
    /// Standard deviation over every channel sample.
    pub color_variance: f64,
    pub code_layout: CodeLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CodeLayout {
    pub detected: bool,
    pub confidence: f64,
}

impl PixelStats {
    pub fn new(brightness: f64, color_variance: f64) -> Self {
        Self {
            brightness,
            color_variance,
            code_layout: CodeLayout::default(),
        }
    }

    /// Neutral stats for images that could not be measured.
    pub fn neutral() -> Self {
        Self::new(0.5, 0.3)
    }

    pub fn from_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Self::neutral();
        }

        let pixel_count = (width as f64) * (height as f64);
        let mut luma_sum = 0.0;
        let mut channel_sum = 0.0;
        let mut channel_sq_sum = 0.0;
        let mut row_means = vec![0.0; height as usize];
        let mut col_sums = vec![0.0; width as usize];

        for (x, y, pixel) in image.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let (r, g, b) = (r as f64, g as f64, b as f64);
            let luma = (0.299 * r + 0.587 * g + 0.114 * b) / 255.0;

            luma_sum += luma;
            row_means[y as usize] += luma;
            col_sums[x as usize] += luma;

            channel_sum += r + g + b;
            channel_sq_sum += r * r + g * g + b * b;
        }

        for row in row_means.iter_mut() {
            *row /= width as f64;
        }
        let col_means: Vec<f64> = col_sums.iter().map(|sum| sum / height as f64).collect();

        let samples = pixel_count * 3.0;
        let channel_mean = channel_sum / samples;
        let channel_var = (channel_sq_sum / samples - channel_mean * channel_mean).max(0.0);

        Self {
            brightness: luma_sum / pixel_count,
            color_variance: channel_var.sqrt() / 255.0,
            code_layout: detect_code_layout(&row_means, &col_means),
        }
    }
}

/// Code editors show regular line spacing (moderate spread across row means)
/// and indentation (spread across column means).
fn detect_code_layout(row_means: &[f64], col_means: &[f64]) -> CodeLayout {
    let row_spread = std_dev(row_means);
    let col_spread = std_dev(col_means);

    let detected = row_spread > CODE_LAYOUT_THRESHOLD
        && row_spread < CODE_LAYOUT_ROW_CEILING
        && col_spread > CODE_LAYOUT_THRESHOLD;
    let confidence = row_spread.clamp(0.1, 0.5) * 0.5 + col_spread.clamp(0.1, 0.7) * 0.5;

    CodeLayout {
        detected,
        confidence,
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn flat_gray_image() {
        let image = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
        let stats = PixelStats::from_image(&image);

        assert!((stats.brightness - 128.0 / 255.0).abs() < 1e-6);
        assert!(stats.color_variance < 1e-9);
        assert!(!stats.code_layout.detected);
    }

    #[test]
    fn black_and_white_halves_have_max_spread() {
        let image = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let stats = PixelStats::from_image(&image);

        assert!((stats.brightness - 0.5).abs() < 1e-6);
        assert!((stats.color_variance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn striped_text_like_image_looks_like_code() {
        // Alternating dark text rows over a light background with a ragged
        // left margin.
        let image = RgbImage::from_fn(40, 40, |x, y| {
            let indent = (y / 2 % 4) * 3;
            if y % 2 == 0 && x >= indent && x < 30 {
                Rgb([20, 20, 20])
            } else {
                Rgb([235, 235, 235])
            }
        });
        let stats = PixelStats::from_image(&image);
        assert!(stats.code_layout.detected, "{:?}", stats.code_layout);
    }

    #[test]
    fn empty_image_is_neutral() {
        let stats = PixelStats::from_image(&RgbImage::new(0, 0));
        assert_eq!(stats, PixelStats::neutral());
    }
}
