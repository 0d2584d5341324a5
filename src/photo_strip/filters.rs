//! # 像素滤镜引擎
//!
//! ## 设计思路
//!
//! 所有滤镜都是纯函数：输入缓冲只读，输出为同尺寸的新缓冲，互不共享状态，
//! 因此即使宿主环境后续并行调用也无需任何同步。
//!
//! ## 数值约定
//!
//! - 中间运算使用 `f32`。
//! - 每个“落盘”阶段（例如 sepia 之后、对比度之前）都会四舍五入并钳制到 `[0, 255]`，
//!   与浏览器 `Uint8ClampedArray` 的写入语义一致。
//! - Alpha 通道始终原样保留。

use image::RgbaImage;

use super::FilterKind;

const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];
const VINTAGE_CONTRAST: f32 = 1.1;

const BRIGHT_GAIN: f32 = 1.2;
const BRIGHT_SATURATION: f32 = 1.3;
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

const SMOOTH_SIGMA: f32 = 0.5;
const SMOOTH_GAIN: f32 = 1.05;

/// 对缓冲应用滤镜，返回新缓冲。
///
/// `None` 与所有装饰层标识都返回未修改的副本。
///
/// # 示例
/// ```rust
/// use image::{Rgba, RgbaImage};
/// use kalakini_booth::photo_strip::{apply_filter, FilterKind};
///
/// let input = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
/// let output = apply_filter(&input, FilterKind::Vintage);
/// assert_eq!(output.get_pixel(0, 0).0, [15, 11, 6, 255]);
/// ```
pub fn apply_filter(buffer: &RgbaImage, filter: FilterKind) -> RgbaImage {
    match filter {
        FilterKind::Vintage => apply_vintage(buffer),
        FilterKind::Bright => apply_bright(buffer),
        FilterKind::Smooth => apply_smooth(buffer),
        FilterKind::None
        | FilterKind::Hearts
        | FilterKind::Stars
        | FilterKind::Sparkles
        | FilterKind::Emoji => buffer.clone(),
    }
}

/// 四舍五入并钳制到合法通道值。
#[inline]
fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn contrast(value: u8, factor: f32) -> u8 {
    to_channel((value as f32 - 128.0) * factor + 128.0)
}

/// Sepia 色调 + 轻微对比度增强。
fn apply_vintage(buffer: &RgbaImage) -> RgbaImage {
    let mut output = buffer.clone();

    for pixel in output.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let (r, g, b) = (r as f32, g as f32, b as f32);

        for (channel, row) in SEPIA_MATRIX.iter().enumerate() {
            let sepia = to_channel((row[0] * r + row[1] * g + row[2] * b).min(255.0));
            pixel.0[channel] = contrast(sepia, VINTAGE_CONTRAST);
        }
    }

    output
}

/// 先提亮，再以提亮后的亮度为中心扩张饱和度。
fn apply_bright(buffer: &RgbaImage) -> RgbaImage {
    let mut output = buffer.clone();

    for pixel in output.pixels_mut() {
        let mut rgb = [0f32; 3];
        for (channel, value) in rgb.iter_mut().enumerate() {
            *value = to_channel((pixel.0[channel] as f32 * BRIGHT_GAIN).min(255.0)) as f32;
        }

        let luma: f32 = rgb
            .iter()
            .zip(LUMA_WEIGHTS.iter())
            .map(|(value, weight)| value * weight)
            .sum();

        for (channel, value) in rgb.iter().enumerate() {
            pixel.0[channel] = to_channel(luma + (value - luma) * BRIGHT_SATURATION);
        }
    }

    output
}

/// 0.5px 高斯模糊 + 5% 提亮。
fn apply_smooth(buffer: &RgbaImage) -> RgbaImage {
    let (width, height) = buffer.dimensions();
    let blurred = gaussian_blur_rgb(buffer, SMOOTH_SIGMA);
    let mut output = buffer.clone();

    for (index, pixel) in output.pixels_mut().enumerate() {
        let base = index * 3;
        for channel in 0..3 {
            pixel.0[channel] = to_channel((blurred[base + channel] * SMOOTH_GAIN).min(255.0));
        }
    }

    debug_assert_eq!(blurred.len(), width as usize * height as usize * 3);
    output
}

/// 3 抽头高斯核（半径 1），`sigma` 越小中心权重越高。
fn gaussian_kernel(sigma: f32) -> [f32; 3] {
    let side = (-1.0 / (2.0 * sigma * sigma)).exp();
    let sum = 1.0 + 2.0 * side;
    [side / sum, 1.0 / sum, side / sum]
}

/// 可分离高斯模糊，只处理 RGB 三个通道，边缘按最近像素延伸。
///
/// 返回 `width * height * 3` 的 `f32` 结果，保留精度直到最后一次写回。
fn gaussian_blur_rgb(buffer: &RgbaImage, sigma: f32) -> Vec<f32> {
    let (width, height) = buffer.dimensions();
    let (width, height) = (width as usize, height as usize);
    let kernel = gaussian_kernel(sigma);
    let raw = buffer.as_raw();

    let mut horizontal = vec![0f32; width * height * 3];
    for y in 0..height {
        for x in 0..width {
            let taps = [x.saturating_sub(1), x, (x + 1).min(width - 1)];
            for channel in 0..3 {
                horizontal[(y * width + x) * 3 + channel] = taps
                    .iter()
                    .zip(kernel.iter())
                    .map(|(&tx, weight)| raw[(y * width + tx) * 4 + channel] as f32 * weight)
                    .sum();
            }
        }
    }

    let mut vertical = vec![0f32; width * height * 3];
    for y in 0..height {
        let taps = [y.saturating_sub(1), y, (y + 1).min(height - 1)];
        for x in 0..width {
            for channel in 0..3 {
                vertical[(y * width + x) * 3 + channel] = taps
                    .iter()
                    .zip(kernel.iter())
                    .map(|(&ty, weight)| horizontal[(ty * width + x) * 3 + channel] * weight)
                    .sum();
            }
        }
    }

    vertical
}
