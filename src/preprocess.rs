use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use ndarray::Array4;

use crate::error::DetectError;

/// Geometry and scaling of the blob fed to the detector.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    /// Multiplier applied to every byte sample.
    pub scale: f32,
    /// Swap the red and blue planes while filling the blob. Decoded frames
    /// are RGB, which is already the order the detector consumes, so this
    /// is off by default; enable it for BGR frame sources.
    pub swap_rb: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: 416,
            height: 416,
            channels: 3,
            scale: 1.0 / 255.0,
            swap_rb: false,
        }
    }
}

#[derive(Debug)]
pub struct Processor {
    pub config: PreprocessConfig,
}

impl Processor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Turns an arbitrary-size image into the fixed-shape normalized NCHW
    /// tensor the detector expects: a direct bilinear stretch to
    /// `width`x`height` (no cropping, no aspect preservation), samples
    /// scaled by `scale`. The blob is built fresh per call.
    pub fn blob_from_image(&self, image: &DynamicImage) -> Result<Array4<f32>, DetectError> {
        let (w, h) = (self.config.width, self.config.height);
        let src = DynamicImage::ImageRgb8(image.to_rgb8());

        let mut dst_image = Image::new(w as u32, h as u32, fast_image_resize::PixelType::U8x3);
        let mut resizer = Resizer::new();
        let resize_options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        resizer.resize(&src, &mut dst_image, Some(&resize_options))?;

        let mut blob = Array4::<f32>::zeros((1, self.config.channels, h, w));
        for (i, rgb) in dst_image.buffer().chunks_exact(3).enumerate() {
            let y = i / w;
            let x = i % w;
            let (first, last) = if self.config.swap_rb {
                (rgb[2], rgb[0])
            } else {
                (rgb[0], rgb[2])
            };
            blob[[0, 0, y, x]] = first as f32 * self.config.scale;
            blob[[0, 1, y, x]] = rgb[1] as f32 * self.config.scale;
            blob[[0, 2, y, x]] = last as f32 * self.config.scale;
        }

        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn blob_has_fixed_shape_regardless_of_input_size() {
        let processor = Processor::new(PreprocessConfig::default());
        for (w, h) in [(64, 48), (1000, 10), (416, 416)] {
            let blob = processor.blob_from_image(&solid(w, h, [0, 0, 0])).unwrap();
            assert_eq!(blob.shape(), &[1, 3, 416, 416]);
        }
    }

    #[test]
    fn samples_are_scaled_into_unit_range() {
        let processor = Processor::new(PreprocessConfig::default());
        let blob = processor
            .blob_from_image(&solid(20, 20, [255, 128, 0]))
            .unwrap();

        assert!((blob[[0, 0, 200, 200]] - 1.0).abs() < 1e-6);
        assert!((blob[[0, 1, 200, 200]] - 128.0 / 255.0).abs() < 1e-6);
        assert!(blob[[0, 2, 200, 200]].abs() < 1e-6);
    }

    #[test]
    fn swap_rb_exchanges_the_outer_planes() {
        let config = PreprocessConfig {
            swap_rb: true,
            ..PreprocessConfig::default()
        };
        let processor = Processor::new(config);
        let blob = processor
            .blob_from_image(&solid(20, 20, [255, 0, 51]))
            .unwrap();

        assert!((blob[[0, 0, 0, 0]] - 51.0 / 255.0).abs() < 1e-6);
        assert!((blob[[0, 2, 0, 0]] - 1.0).abs() < 1e-6);
    }
}
