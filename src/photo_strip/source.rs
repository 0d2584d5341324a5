//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“流水线产物”解耦：
//! - `RawImage` 表示已拍摄但未解码的编码字节（PNG/JPEG 等），拍摄后不可变
//! - `StripLayout` 表示照片条的固定几何
//! - `PhotoStrip` 表示最终成品：像素缓冲 + 标题 + PNG 字节流
//!
//! 中间像素缓冲统一使用 `image::RgbaImage`（行主序、每像素 4 字节）。

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::{ImageFormat, RgbaImage};

use super::StripError;

/// 已拍摄照片的不可变句柄。
///
/// 克隆只增加引用计数，不复制底层字节。
#[derive(Debug, Clone)]
pub struct RawImage {
    bytes: Bytes,
    source_hint: &'static str,
}

impl RawImage {
    /// 从编码后的图片字节创建句柄，不做任何校验。
    ///
    /// 需要体积与签名校验时使用 `PhotoLoader`。
    pub fn from_encoded(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            source_hint: "bytes",
        }
    }

    pub(crate) fn with_hint(bytes: impl Into<Bytes>, source_hint: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            source_hint,
        }
    }

    /// 编码字节。
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// 来源提示（用于日志与诊断）。
    pub fn source_hint(&self) -> &'static str {
        self.source_hint
    }

    /// 仅读取图片头中的宽高，不做完整解码。
    pub fn dimensions(&self) -> Result<(u32, u32), StripError> {
        image::ImageReader::new(Cursor::new(self.bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| StripError::Decode(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| StripError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    pub fn width(&self) -> Result<u32, StripError> {
        self.dimensions().map(|(width, _)| width)
    }

    pub fn height(&self) -> Result<u32, StripError> {
        self.dimensions().map(|(_, height)| height)
    }

    /// 同步解码为 RGBA 像素。
    pub fn decode(&self) -> Result<RgbaImage, StripError> {
        image::load_from_memory(&self.bytes)
            .map(|decoded| decoded.to_rgba8())
            .map_err(|e| StripError::Decode(format!("图片解码失败（{}）：{}", self.source_hint, e)))
    }

    /// 带内存上限的同步解码：解码器申请的缓冲超过 `max_alloc` 字节时直接失败。
    pub fn decode_with_limit(&self, max_alloc: u64) -> Result<RgbaImage, StripError> {
        let mut reader = image::ImageReader::new(Cursor::new(self.bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| StripError::Decode(format!("无法识别图片格式：{}", e)))?;

        let mut limits = image::Limits::default();
        limits.max_alloc = Some(max_alloc);
        reader.limits(limits);

        match reader.decode() {
            Ok(decoded) => Ok(decoded.to_rgba8()),
            Err(image::ImageError::Limits(e)) => Err(StripError::ResourceLimit(format!(
                "照片解码超出内存上限（{} 字节）：{}",
                max_alloc, e
            ))),
            Err(e) => Err(StripError::Decode(format!(
                "图片解码失败（{}）：{}",
                self.source_hint, e
            ))),
        }
    }
}

/// 照片条固定几何，单位为输出像素。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripLayout {
    pub width: u32,
    pub height: u32,
    pub slot_height: u32,
    /// 分隔带总高度，跨越相邻两个槽位各一半。
    pub separator_thickness: u32,
    pub border_thickness: u32,
    /// 外边框中心线到画布边缘的距离。
    pub border_inset: u32,
    /// 标题基线到底边的距离。
    pub caption_baseline_offset: u32,
}

impl StripLayout {
    pub const SLOT_COUNT: usize = 3;

    pub const STANDARD: StripLayout = StripLayout {
        width: 600,
        height: 1800,
        slot_height: 600,
        separator_thickness: 16,
        border_thickness: 8,
        border_inset: 4,
        caption_baseline_offset: 20,
    };

    /// 校验几何不变量：三个槽位恰好铺满整条。
    pub fn validate(&self) -> Result<(), StripError> {
        if self.width == 0 || self.slot_height == 0 {
            return Err(StripError::Uninitialized("照片条尺寸为 0".to_string()));
        }
        if self.slot_height * Self::SLOT_COUNT as u32 != self.height {
            return Err(StripError::Uninitialized(format!(
                "槽位高度 {} × {} 与照片条高度 {} 不一致",
                self.slot_height,
                Self::SLOT_COUNT,
                self.height
            )));
        }
        if self.separator_thickness / 2 >= self.slot_height {
            return Err(StripError::Uninitialized("分隔带厚度超过槽位高度".to_string()));
        }
        Ok(())
    }

    /// 第 `index` 个槽位的起始行。
    pub fn slot_top(&self, index: usize) -> u32 {
        index as u32 * self.slot_height
    }

    /// 第 `boundary` 条分隔带覆盖的行区间 `[start, end)`（仅内部边界）。
    pub fn separator_rows(&self, boundary: usize) -> std::ops::Range<u32> {
        let center = self.slot_top(boundary + 1);
        let half = self.separator_thickness / 2;
        (center - half)..(center + half)
    }
}

impl Default for StripLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// 最终照片条成品，创建后不可变。
#[derive(Debug, Clone)]
pub struct PhotoStrip {
    pixels: RgbaImage,
    caption: String,
    png: Bytes,
}

impl PhotoStrip {
    pub(crate) fn new(pixels: RgbaImage, caption: String) -> Result<Self, StripError> {
        let png = encode_png(&pixels)?;
        Ok(Self {
            pixels,
            caption,
            png: Bytes::from(png),
        })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// PNG 编码字节流。
    pub fn png_bytes(&self) -> &Bytes {
        &self.png
    }

    /// `data:image/png;base64,...` 形式，便于直接交给网页下载链接。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&self.png)
        )
    }
}

pub(crate) fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, StripError> {
    let mut cursor = Cursor::new(Vec::new());
    pixels
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| StripError::Encode(format!("PNG 编码失败：{}", e)))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn standard_layout_satisfies_slot_invariant() {
        StripLayout::STANDARD
            .validate()
            .expect("standard layout should be valid");
        assert_eq!(StripLayout::STANDARD.separator_rows(0), 592..608);
        assert_eq!(StripLayout::STANDARD.separator_rows(1), 1192..1208);
    }

    #[test]
    fn layout_rejects_mismatched_slot_height() {
        let layout = StripLayout {
            height: 1700,
            ..StripLayout::STANDARD
        };
        assert!(matches!(layout.validate(), Err(StripError::Uninitialized(_))));
    }

    #[test]
    fn raw_image_reports_header_dimensions() {
        let png = encode_png(&RgbaImage::from_pixel(12, 5, Rgba([1, 2, 3, 255])))
            .expect("encode test png");
        let raw = RawImage::from_encoded(png);

        assert_eq!(raw.dimensions().expect("read dimensions"), (12, 5));
        assert_eq!(raw.decode().expect("decode").dimensions(), (12, 5));
    }

    #[test]
    fn raw_image_decode_failure_is_decode_error() {
        let raw = RawImage::from_encoded(vec![0u8, 1, 2, 3]);
        assert!(matches!(raw.decode(), Err(StripError::Decode(_))));
    }

    #[test]
    fn decode_with_limit_rejects_oversized_allocation() {
        let png = encode_png(&RgbaImage::from_pixel(64, 64, Rgba([5, 6, 7, 255])))
            .expect("encode test png");
        let raw = RawImage::from_encoded(png);

        assert!(matches!(
            raw.decode_with_limit(1024),
            Err(StripError::ResourceLimit(_))
        ));
        assert_eq!(
            raw.decode_with_limit(1024 * 1024).expect("decode").dimensions(),
            (64, 64)
        );
    }

    #[test]
    fn photo_strip_data_url_has_png_prefix() {
        let strip = PhotoStrip::new(
            RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])),
            "caption".to_string(),
        )
        .expect("build strip");

        assert!(strip.to_data_url().starts_with("data:image/png;base64,"));
        assert_eq!(&strip.png_bytes()[..4], &[0x89, b'P', b'N', b'G']);
    }
}
