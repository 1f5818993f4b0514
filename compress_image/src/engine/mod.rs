use std::path::Path;

use anyhow::Result;

mod raster;
pub use raster::Raster;

/// 图片处理引擎trait
pub trait Engine {
    /// 把图片限制在边界盒内，保持宽高比，只缩不放
    fn fit(&mut self, bound: Bound);
    /// 从engine生成目标格式的字节流
    fn generate(self, format: OutputFormat) -> Result<Vec<u8>>;
}

/// 缩放边界盒，宽高各自独立限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub max_width: u32,
    pub max_height: u32,
}

/// 输出编码格式，由输出文件扩展名决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
}

/// 根据输出路径选择格式：.png 走无损 PNG，其余扩展名一律 JPEG
impl OutputFormat {
    pub fn for_path(path: &Path, jpeg_quality: u8) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => OutputFormat::Png,
            _ => OutputFormat::Jpeg {
                quality: jpeg_quality,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_extension_selects_png() {
        assert_eq!(
            OutputFormat::for_path(Path::new("out.png"), 85),
            OutputFormat::Png
        );
    }

    #[test]
    fn extension_match_ignores_case() {
        assert_eq!(
            OutputFormat::for_path(Path::new("OUT.PNG"), 85),
            OutputFormat::Png
        );
    }

    #[test]
    fn everything_else_selects_jpeg() {
        for name in ["out.jpg", "out.jpeg", "out.webp", "out.bmp", "out"] {
            assert_eq!(
                OutputFormat::for_path(Path::new(name), 70),
                OutputFormat::Jpeg { quality: 70 }
            );
        }
    }
}
