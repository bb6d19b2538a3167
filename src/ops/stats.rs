//! Pixel statistics.

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

/// Statistics of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub min: u8,
    pub max: u8,
    pub sum: f64,
    pub squares_sum: f64,
    pub mean: f64,
    pub stdev: f64,
    /// Position of the first minimum pixel.
    pub min_x: u32,
    pub min_y: u32,
    /// Position of the first maximum pixel.
    pub max_x: u32,
    pub max_y: u32,
}

impl ChannelStats {
    fn new() -> Self {
        Self {
            min: u8::MAX,
            max: u8::MIN,
            sum: 0.0,
            squares_sum: 0.0,
            mean: 0.0,
            stdev: 0.0,
            min_x: 0,
            min_y: 0,
            max_x: 0,
            max_y: 0,
        }
    }

    fn push(&mut self, value: u8, x: u32, y: u32) {
        if value < self.min {
            self.min = value;
            self.min_x = x;
            self.min_y = y;
        }
        if value > self.max {
            self.max = value;
            self.max_x = x;
            self.max_y = y;
        }
        let v = f64::from(value);
        self.sum += v;
        self.squares_sum += v * v;
    }

    fn finish(&mut self, count: u64) {
        if count == 0 {
            self.min = 0;
            return;
        }
        let n = count as f64;
        self.mean = self.sum / n;
        if count > 1 {
            let variance = (self.squares_sum - self.sum * self.sum / n) / (n - 1.0);
            self.stdev = variance.max(0.0).sqrt();
        }
    }
}

/// Most frequent color, quantised to 16 levels per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DominantColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Whole-image statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    /// One entry per channel, in channel order.
    pub channels: Vec<ChannelStats>,
    /// Whether every pixel is fully opaque.
    pub is_opaque: bool,
    /// Shannon entropy of the grayscale histogram, in bits.
    pub entropy: f64,
    pub dominant: DominantColor,
}

impl ImageStats {
    /// Compute statistics over the 8-bit form of `image`.
    pub fn compute(image: &DynamicImage) -> Self {
        let color = image.color();
        let bands = usize::from(color.channel_count());
        let rgba = image.to_rgba8();
        let (w, h) = image.dimensions();

        let mut channels = vec![ChannelStats::new(); bands];
        let mut luma_hist = [0u64; 256];
        let mut color_bins = vec![0u64; 16 * 16 * 16];
        let mut is_opaque = true;

        for (x, y, pixel) in rgba.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            let values: [u8; 4] = match (color.has_color(), color.has_alpha()) {
                (true, _) => [r, g, b, a],
                // Gray layouts report luma then alpha.
                (false, _) => [r, a, 0, 0],
            };
            for (stats, value) in channels.iter_mut().zip(values) {
                stats.push(value, x, y);
            }

            if a != u8::MAX {
                is_opaque = false;
            }
            let luma = (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b))
                .round() as usize;
            luma_hist[luma.min(255)] += 1;
            let bin = (usize::from(r) >> 4) << 8 | (usize::from(g) >> 4) << 4 | usize::from(b) >> 4;
            color_bins[bin] += 1;
        }

        let count = u64::from(w) * u64::from(h);
        for stats in &mut channels {
            stats.finish(count);
        }

        let entropy = if count == 0 {
            0.0
        } else {
            let n = count as f64;
            luma_hist
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    -p * p.log2()
                })
                .sum()
        };

        let (bin, _) = color_bins
            .iter()
            .enumerate()
            .max_by_key(|&(i, c)| (*c, std::cmp::Reverse(i)))
            .unwrap_or((0, &0));
        let level = |shift: usize| (((bin >> shift) & 0xF) * 16 + 8) as u8;
        let dominant = DominantColor {
            r: level(8),
            g: level(4),
            b: level(0),
        };

        Self {
            channels,
            is_opaque,
            entropy,
            dominant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    #[test]
    fn test_channel_stats() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, Rgba([50, 20, 30, 255]));
        let stats = ImageStats::compute(&DynamicImage::ImageRgba8(img));

        assert_eq!(stats.channels.len(), 4);
        let red = &stats.channels[0];
        assert_eq!((red.min, red.max), (10, 50));
        assert_eq!((red.max_x, red.max_y), (1, 0));
        assert_eq!(red.sum, 80.0);
        assert_eq!(red.mean, 20.0);
        assert!((red.stdev - 20.0).abs() < 1e-9);
        assert_eq!(stats.channels[1].stdev, 0.0);
        assert!(stats.is_opaque);
    }

    #[test]
    fn test_entropy_and_dominant() {
        let mut img = GrayImage::from_pixel(2, 1, Luma([0]));
        img.put_pixel(1, 0, Luma([255]));
        let stats = ImageStats::compute(&DynamicImage::ImageLuma8(img));

        assert_eq!(stats.channels.len(), 1);
        assert!((stats.entropy - 1.0).abs() < 1e-9);

        let flat = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([200, 100, 0, 128])));
        let stats = ImageStats::compute(&flat);
        assert_eq!(stats.entropy, 0.0);
        assert!(!stats.is_opaque);
        assert_eq!(stats.dominant, DominantColor { r: 200, g: 104, b: 8 });
    }

    #[test]
    fn test_serialized_field_names() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(1, 1));
        let value = serde_json::to_value(ImageStats::compute(&img)).unwrap();
        assert!(value["channels"][0].get("squaresSum").is_some());
        assert!(value.get("isOpaque").is_some());
    }
}
