//! # 标题渲染模块
//!
//! ## 设计思路
//!
//! 照片条底部的品牌标题是固定文案，核心流水线不依赖系统字体，
//! 因此内置一套 5×7 点阵字形，按整数倍放大后直接写入像素。
//!
//! - 小写字母按大写字形绘制
//! - `✨` 使用单独的星芒字形
//! - 未收录的字符按空格处理

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// 字间距（放大前，单位：点）。
const GLYPH_SPACING: u32 = 1;

#[rustfmt::skip]
const GLYPH_TABLE: &[(char, [u8; 7])] = &[
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
    ('✨', [0x04, 0x04, 0x0E, 0x1F, 0x0E, 0x04, 0x04]),
];

static GLYPHS: Lazy<HashMap<char, [u8; 7]>> =
    Lazy::new(|| GLYPH_TABLE.iter().copied().collect());

fn glyph_for(ch: char) -> [u8; 7] {
    GLYPHS
        .get(&ch.to_ascii_uppercase())
        .copied()
        .unwrap_or([0; 7])
}

/// 文案放大 `scale` 倍后的像素宽度（不含末尾字间距）。
pub fn caption_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    (count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * scale
}

/// 文案放大后的像素高度。
pub fn caption_height(scale: u32) -> u32 {
    GLYPH_HEIGHT * scale
}

/// 以 `center_x` 水平居中、`baseline_y` 为基线绘制文案。
///
/// 超出画布的点直接丢弃。
pub fn draw_caption(
    canvas: &mut RgbaImage,
    text: &str,
    center_x: u32,
    baseline_y: u32,
    color: Rgba<u8>,
    scale: u32,
) {
    let scale = scale.max(1);
    let left = center_x as i64 - caption_width(text, scale) as i64 / 2;
    let top = baseline_y as i64 - caption_height(scale) as i64;
    let (width, height) = canvas.dimensions();

    for (index, ch) in text.chars().enumerate() {
        let glyph = glyph_for(ch);
        let glyph_left = left + (index as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * scale) as i64;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }

                let x0 = glyph_left + (col * scale) as i64;
                let y0 = top + (row as u32 * scale) as i64;
                for dy in 0..scale as i64 {
                    for dx in 0..scale as i64 {
                        let (x, y) = (x0 + dx, y0 + dy);
                        if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                            canvas.put_pixel(x as u32, y as u32, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgba<u8> = Rgba([255, 107, 107, 255]);
    const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn caption_width_accounts_for_spacing() {
        assert_eq!(caption_width("", 3), 0);
        assert_eq!(caption_width("A", 3), 15);
        assert_eq!(caption_width("AB", 2), 22);
    }

    #[test]
    fn caption_stays_above_baseline_and_centred() {
        let mut canvas = RgbaImage::from_pixel(100, 40, PAPER);
        draw_caption(&mut canvas, "HH", 50, 30, INK, 2);

        let inked: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, pixel)| **pixel == INK)
            .map(|(x, y, _)| (x, y))
            .collect();

        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(_, y)| (16..30).contains(&y)));

        let min_x = inked.iter().map(|&(x, _)| x).min().unwrap_or_default();
        let max_x = inked.iter().map(|&(x, _)| x).max().unwrap_or_default();
        assert_eq!(min_x, 50 - caption_width("HH", 2) / 2);
        assert_eq!(max_x, min_x + caption_width("HH", 2) - 1);
    }

    #[test]
    fn lowercase_uses_uppercase_glyphs() {
        let mut lower = RgbaImage::from_pixel(40, 20, PAPER);
        let mut upper = RgbaImage::from_pixel(40, 20, PAPER);
        draw_caption(&mut lower, "booth", 20, 15, INK, 1);
        draw_caption(&mut upper, "BOOTH", 20, 15, INK, 1);
        assert_eq!(lower, upper);
    }

    #[test]
    fn out_of_bounds_glyphs_are_clipped() {
        let mut canvas = RgbaImage::from_pixel(10, 10, PAPER);
        draw_caption(&mut canvas, "KALAKINI BOOTH", 5, 9, INK, 3);
        assert_eq!(canvas.dimensions(), (10, 10));
    }
}
