//! # 槽位合成模块
//!
//! ## 设计思路
//!
//! 把一张原始照片“覆盖式”放进固定尺寸的槽位：等比缩放到恰好铺满，
//! 居中裁掉溢出部分，永不留黑边（letterbox）。
//!
//! ## 实现思路
//!
//! 1. `cover_fit` 纯函数计算缩放比例、居中偏移（偏移恒 ≤ 0），
//!    以及最终可见的源图矩形
//! 2. 只把可见矩形直接缩放到槽位尺寸，中间缓冲大小只取决于槽位，
//!    与源图长宽比无关
//! 3. 槽位先填充不透明黑色，再叠加缩放结果（半透明照片按黑底合成）
//! 4. 若选择了像素滤镜，则对整个槽位跑一遍滤镜引擎并替换槽位内容；
//!    装饰层与 `None` 不改变槽位像素
//!
//! 缩放优先使用 `fast_image_resize`（带裁剪窗口），失败时回退
//! `image::imageops::crop_imm` + `image::imageops::resize`。

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgba, RgbaImage};

use super::{BoothConfig, FilterKind, RawImage, StripError, apply_filter};

const SNAP_EPSILON: f64 = 1e-9;

/// 覆盖式缩放的几何结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
    /// 水平居中偏移，`<= 0` 表示左右各裁掉 `-offset_x`。
    pub offset_x: f64,
    /// 垂直居中偏移，`<= 0` 表示上下各裁掉 `-offset_y`。
    pub offset_y: f64,
    /// 源图中可见矩形（源图像素坐标）。
    pub crop_left: f64,
    pub crop_top: f64,
    pub crop_width: f64,
    pub crop_height: f64,
}

impl CoverFit {
    /// 可见矩形是否就是整张源图。
    pub fn covers_whole_source(&self, source_width: u32, source_height: u32) -> bool {
        self.crop_left == 0.0
            && self.crop_top == 0.0
            && self.crop_width == source_width as f64
            && self.crop_height == source_height as f64
    }
}

/// 计算把 `source` 覆盖式放入 `slot` 所需的缩放与偏移。
///
/// 决定缩放比例的那条边会精确对齐槽位，因此该方向的偏移恒为 0，
/// 可见矩形在该方向上覆盖整条源图边。
///
/// # 示例
/// ```rust
/// use kalakini_booth::photo_strip::cover_fit;
///
/// let fit = cover_fit(1280, 720, 600, 600)?;
/// assert_eq!(fit.offset_y, 0.0);
/// assert!(fit.offset_x < 0.0);
/// assert_eq!(fit.crop_height, 720.0);
/// # Ok::<(), kalakini_booth::photo_strip::StripError>(())
/// ```
pub fn cover_fit(
    source_width: u32,
    source_height: u32,
    slot_width: u32,
    slot_height: u32,
) -> Result<CoverFit, StripError> {
    if source_width == 0 || source_height == 0 {
        return Err(StripError::Decode(format!(
            "照片尺寸无效：{}x{}",
            source_width, source_height
        )));
    }
    if slot_width == 0 || slot_height == 0 {
        return Err(StripError::Uninitialized(format!(
            "槽位尺寸无效：{}x{}",
            slot_width, slot_height
        )));
    }

    let (src_w, src_h) = (source_width as f64, source_height as f64);
    let (slot_w, slot_h) = (slot_width as f64, slot_height as f64);

    let scale_x = slot_w / src_w;
    let scale_y = slot_h / src_h;

    let (scale, mut scaled_width, mut scaled_height, mut crop_width, mut crop_height) =
        if scale_x >= scale_y {
            (scale_x, slot_w, src_h * scale_x, src_w, slot_h / scale_x)
        } else {
            (scale_y, src_w * scale_y, slot_h, slot_w / scale_y, src_h)
        };

    if (scaled_width - slot_w).abs() < SNAP_EPSILON {
        scaled_width = slot_w;
        crop_width = src_w;
    }
    if (scaled_height - slot_h).abs() < SNAP_EPSILON {
        scaled_height = slot_h;
        crop_height = src_h;
    }
    crop_width = crop_width.min(src_w);
    crop_height = crop_height.min(src_h);

    Ok(CoverFit {
        scale,
        scaled_width,
        scaled_height,
        offset_x: (slot_w - scaled_width) / 2.0,
        offset_y: (slot_h - scaled_height) / 2.0,
        crop_left: (src_w - crop_width) / 2.0,
        crop_top: (src_h - crop_height) / 2.0,
        crop_width,
        crop_height,
    })
}

/// 槽位合成器。
#[derive(Debug, Clone, Copy)]
pub struct ImageCompositor {
    resize_filter: FilterType,
}

impl ImageCompositor {
    pub fn new(resize_filter: FilterType) -> Self {
        Self { resize_filter }
    }

    pub fn from_config(config: &BoothConfig) -> Self {
        Self::new(config.resize_filter)
    }

    /// 解码 `source` 并合成到 `slot_width × slot_height` 的槽位。
    ///
    /// 解码失败返回 `StripError::Decode`，不会产生任何部分结果。
    pub fn composite_slot(
        &self,
        source: &RawImage,
        slot_width: u32,
        slot_height: u32,
        filter: FilterKind,
    ) -> Result<RgbaImage, StripError> {
        let decoded = source.decode()?;
        self.composite_decoded(&decoded, slot_width, slot_height, filter)
    }

    /// 对已解码的照片执行覆盖式合成与像素滤镜。
    pub fn composite_decoded(
        &self,
        source: &RgbaImage,
        slot_width: u32,
        slot_height: u32,
        filter: FilterKind,
    ) -> Result<RgbaImage, StripError> {
        let (source_width, source_height) = source.dimensions();
        let fit = cover_fit(source_width, source_height, slot_width, slot_height)?;

        let visible = if fit.covers_whole_source(source_width, source_height)
            && (source_width, source_height) == (slot_width, slot_height)
        {
            source.clone()
        } else {
            self.resize_visible(source, &fit, slot_width, slot_height)
        };

        let mut slot = RgbaImage::from_pixel(slot_width, slot_height, Rgba([0, 0, 0, 255]));
        image::imageops::overlay(&mut slot, &visible, 0, 0);

        log::debug!(
            "🧩 槽位合成：{}x{} 可见区域 ({:.1}, {:.1}) {:.1}x{:.1} -> {}x{}（scale={:.4}, filter={}）",
            source_width,
            source_height,
            fit.crop_left,
            fit.crop_top,
            fit.crop_width,
            fit.crop_height,
            slot_width,
            slot_height,
            fit.scale,
            filter
        );

        if filter.is_pixel_filter() {
            slot = apply_filter(&slot, filter);
        }

        Ok(slot)
    }

    fn resize_visible(
        &self,
        source: &RgbaImage,
        fit: &CoverFit,
        slot_width: u32,
        slot_height: u32,
    ) -> RgbaImage {
        match resize_crop_with_fast_image_resize(source, fit, slot_width, slot_height, self.resize_filter)
        {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!(
                    "⚠️ fast_image_resize 缩放失败，回退 image::imageops：{}",
                    err
                );
                let (x, y, width, height) = pixel_crop_rect(source, fit);
                let cropped = image::imageops::crop_imm(source, x, y, width, height).to_image();
                image::imageops::resize(&cropped, slot_width, slot_height, self.resize_filter)
            }
        }
    }
}

impl Default for ImageCompositor {
    fn default() -> Self {
        Self::from_config(&BoothConfig::default())
    }
}

/// 把浮点可见矩形取整为像素矩形（至少 1×1，且不越界）。
fn pixel_crop_rect(source: &RgbaImage, fit: &CoverFit) -> (u32, u32, u32, u32) {
    let (source_width, source_height) = source.dimensions();
    let width = (fit.crop_width.round() as u32).clamp(1, source_width);
    let height = (fit.crop_height.round() as u32).clamp(1, source_height);
    let x = (fit.crop_left.round() as u32).min(source_width - width);
    let y = (fit.crop_top.round() as u32).min(source_height - height);
    (x, y, width, height)
}

fn resize_crop_with_fast_image_resize(
    source: &RgbaImage,
    fit: &CoverFit,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, StripError> {
    let (src_width, src_height) = source.dimensions();

    let src_image = fr::images::ImageRef::new(
        src_width,
        src_height,
        source.as_raw(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| StripError::Decode(format!("构建源图像视图失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)))
        .crop(fit.crop_left, fit.crop_top, fit.crop_width, fit.crop_height);

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| StripError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| StripError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

/// `image` 与 `fast_image_resize` 的重采样滤镜对应关系。
fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
