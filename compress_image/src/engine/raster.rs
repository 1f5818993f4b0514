use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageEncoder, Rgb, RgbImage};
use tracing::debug;

use super::{Bound, Engine, OutputFormat};

/// 用 image crate 实现的引擎
pub struct Raster(DynamicImage);

impl Raster {
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        Ok(Self(img))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

impl Engine for Raster {
    fn fit(&mut self, bound: Bound) {
        let (width, height) = self.0.dimensions();
        // 已经在边界内就不重采样，保持缩略图语义
        if width <= bound.max_width && height <= bound.max_height {
            return;
        }
        debug!(
            "resampling {}x{} into {}x{}",
            width, height, bound.max_width, bound.max_height
        );
        self.0 = self
            .0
            .resize(bound.max_width, bound.max_height, FilterType::Lanczos3);
    }

    fn generate(self, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let (width, height) = self.0.dimensions();
        match format {
            OutputFormat::Png => {
                let encoder =
                    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
                encoder.write_image(self.0.as_bytes(), width, height, self.0.color())?;
            }
            OutputFormat::Jpeg { quality } => {
                let rgb = flatten_onto_white(&self.0);
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
                encoder.encode_image(&rgb)?;
            }
        }
        Ok(buf)
    }
}

/// JPEG 不带 alpha 通道，透明像素按 alpha 混合到白底上
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> Raster {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        Raster(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn fit_shrinks_within_bound_keeping_aspect() {
        let mut img = gradient(400, 200);
        img.fit(Bound {
            max_width: 100,
            max_height: 100,
        });
        assert_eq!(img.dimensions(), (100, 50));
    }

    #[test]
    fn fit_bounds_each_dimension_independently() {
        let mut img = gradient(2400, 800);
        img.fit(Bound {
            max_width: 1200,
            max_height: 800,
        });
        assert_eq!(img.dimensions(), (1200, 400));
    }

    #[test]
    fn fit_never_enlarges() {
        let mut img = gradient(50, 30);
        img.fit(Bound {
            max_width: 100,
            max_height: 100,
        });
        assert_eq!(img.dimensions(), (50, 30));
    }

    #[test]
    fn png_output_is_lossless() {
        let img = gradient(64, 48);
        let reference = img.0.to_rgb8();
        let data = img.generate(OutputFormat::Png).unwrap();

        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
        assert_eq!(decoded.to_rgb8(), reference);
    }

    #[test]
    fn jpeg_output_flattens_alpha_to_white() {
        // 全透明的红色图，混合后应该接近纯白
        let img = Raster(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            16,
            16,
            Rgba([255, 0, 0, 0]),
        )));
        let data = img.generate(OutputFormat::Jpeg { quality: 85 }).unwrap();

        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&data).unwrap().to_rgb8();
        let px = decoded.get_pixel(8, 8);
        assert!(px[0] >= 250 && px[1] >= 250 && px[2] >= 250);
    }

    #[test]
    fn jpeg_quality_drives_output_size() {
        let low = gradient(64, 64)
            .generate(OutputFormat::Jpeg { quality: 10 })
            .unwrap();
        let high = gradient(64, 64)
            .generate(OutputFormat::Jpeg { quality: 95 })
            .unwrap();
        assert!(high.len() > low.len());
    }
}
