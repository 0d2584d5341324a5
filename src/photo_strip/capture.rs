//! # 静帧序列化
//!
//! 相机采集本身是外部协作方；这里只负责“拿到当前帧像素之后”的一步：
//! 预览画面是镜像的，则先水平翻转，再编码为 PNG 字节作为 `RawImage`。

use image::RgbaImage;

use super::source::encode_png;
use super::{RawImage, StripError};

/// 将一帧像素序列化为照片句柄。
pub fn capture_still(frame: &RgbaImage, mirror: bool) -> Result<RawImage, StripError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(StripError::InvalidInput("采集到的画面尺寸为 0".to_string()));
    }

    let png = if mirror {
        encode_png(&image::imageops::flip_horizontal(frame))?
    } else {
        encode_png(frame)?
    };

    log::debug!(
        "📸 静帧已序列化 - 尺寸: {}x{} 镜像: {} 体积: {}KB",
        frame.width(),
        frame.height(),
        mirror,
        png.len() / 1024
    );

    Ok(RawImage::with_hint(png, "capture"))
}
