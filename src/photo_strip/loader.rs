//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（Data URL / 纯 Base64 / 本地文件 / 原始字节）的照片加载，
//! 并在“尽可能早”的阶段执行输入校验：体积 → 文件签名 → 图片头尺寸。
//! 目标是尽快失败，避免三张照片中某一张在合成中途才暴露问题。
//!
//! ## 实现思路
//!
//! - Base64：格式解析 + 解码前体积估算 + 解码后体积限制。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 签名：`infer` 识别 magic bytes，拒绝非图片内容。
//! - 尺寸：只读图片头，按像素数与 RGBA 内存估算拒绝超大输入。

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};

use super::{BoothConfig, RawImage, StripError};

/// 照片加载器，持有一份配置快照。
pub struct PhotoLoader<'a> {
    config: &'a BoothConfig,
}

impl<'a> PhotoLoader<'a> {
    pub fn new(config: &'a BoothConfig) -> Self {
        Self { config }
    }

    /// 从 Data URL（`data:image/png;base64,...`）或纯 Base64 字符串加载。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use kalakini_booth::photo_strip::{BoothConfig, PhotoLoader};
    ///
    /// let config = BoothConfig::default();
    /// let photo = PhotoLoader::new(&config).load_from_base64(&data_url)?;
    /// # Ok::<(), kalakini_booth::photo_strip::StripError>(())
    /// ```
    pub fn load_from_base64(&self, data: &str) -> Result<RawImage, StripError> {
        log::debug!("📝 开始处理 base64 照片");

        let bytes = parse_base64_with_limit(data, self.config.max_file_size)?;
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(StripError::ResourceLimit(format!(
                "Base64 解码后体积过大：{:.2} MB（限制：{:.2} MB）",
                bytes.len() as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        self.finish(RawImage::with_hint(bytes, "base64"))
    }

    /// 从本地路径加载。
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<RawImage, StripError> {
        let file_path = path.as_ref();
        log::debug!("📁 开始读取本地照片 - 路径: {}", file_path.display());

        if !file_path.exists() {
            return Err(StripError::FileSystem(format!(
                "文件不存在：{}",
                file_path.display()
            )));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| StripError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > self.config.max_file_size {
            return Err(StripError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(file_path)
            .map_err(|e| StripError::FileSystem(format!("无法读取照片文件：{}", e)))?;

        self.finish(RawImage::with_hint(bytes, "file"))
    }

    /// 从已在内存中的编码字节加载。
    pub fn load_from_bytes(&self, bytes: Vec<u8>) -> Result<RawImage, StripError> {
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(StripError::ResourceLimit(format!(
                "照片体积过大：{} 字节（限制：{} 字节）",
                bytes.len(),
                self.config.max_file_size
            )));
        }

        self.finish(RawImage::with_hint(bytes, "bytes"))
    }

    fn finish(&self, raw: RawImage) -> Result<RawImage, StripError> {
        ensure_photo_signature(raw.bytes())?;

        let (width, height) = raw
            .dimensions()
            .map_err(|e| StripError::InvalidFormat(e.to_string()))?;
        validate_pixel_limits(self.config, width, height)?;

        log::debug!(
            "✅ 照片加载完成 - 来源: {} 尺寸: {}x{} 体积: {}KB",
            raw.source_hint(),
            width,
            height,
            raw.bytes().len() / 1024
        );

        Ok(raw)
    }
}

/// 按像素数与 RGBA 内存估算校验尺寸上限。
pub(crate) fn validate_pixel_limits(
    config: &BoothConfig,
    width: u32,
    height: u32,
) -> Result<(), StripError> {
    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| StripError::ResourceLimit("照片像素数溢出".to_string()))?;

    if pixels > config.max_decoded_pixels {
        return Err(StripError::ResourceLimit(format!(
            "照片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    let estimated = pixels
        .checked_mul(4)
        .ok_or_else(|| StripError::ResourceLimit("照片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(StripError::ResourceLimit(format!(
            "照片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// 每 4 个 Base64 字符最多还原 3 个字节，不足一组按一组计。
fn base64_decoded_len_upper_bound(payload: &str) -> Result<u64, StripError> {
    (payload.len() as u64)
        .div_ceil(4)
        .checked_mul(3)
        .ok_or_else(|| StripError::ResourceLimit("照片数据过长，无法估算解码体积".to_string()))
}

fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, StripError> {
    let normalized = data.trim();

    let payload = if normalized.starts_with("data:image/") {
        let base64_start = normalized
            .find(";base64,")
            .ok_or_else(|| StripError::InvalidFormat("缺少 base64 标记".to_string()))?;
        &normalized[base64_start + 8..]
    } else if normalized.starts_with("data:") {
        return Err(StripError::InvalidFormat(
            "Data URL 的 MIME 类型不是图片".to_string(),
        ));
    } else {
        normalized
    };

    let estimated_len = base64_decoded_len_upper_bound(payload)?;
    if estimated_len > max_file_size {
        return Err(StripError::ResourceLimit(format!(
            "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
            estimated_len as f64 / 1024.0 / 1024.0,
            max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| StripError::InvalidFormat(format!("Base64 解码失败：{}", e)))
}

/// 照片内容必须以已知图片格式的签名开头，否则不进入解码。
fn ensure_photo_signature(bytes: &[u8]) -> Result<(), StripError> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
        Some(kind) => Err(StripError::InvalidFormat(format!(
            "照片签名不是图片：{}",
            kind.mime_type()
        ))),
        None if bytes.is_empty() => Err(StripError::InvalidFormat("照片内容为空".to_string())),
        None => Err(StripError::InvalidFormat("无法识别照片格式".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo_strip::source::encode_png;
    use image::{Rgba, RgbaImage};
    use std::io::Write;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(width, height, Rgba([9, 8, 7, 255])))
            .expect("encode test png")
    }

    #[test]
    fn load_from_base64_accepts_data_url() {
        let config = BoothConfig::default();
        let data_url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png_bytes(16, 9))
        );

        let raw = PhotoLoader::new(&config)
            .load_from_base64(&data_url)
            .expect("data url should load");

        assert_eq!(raw.source_hint(), "base64");
        assert_eq!(raw.dimensions().expect("dimensions"), (16, 9));
    }

    #[test]
    fn load_from_base64_rejects_non_image_payload() {
        let config = BoothConfig::default();
        let result = PhotoLoader::new(&config).load_from_base64("SGVsbG8=");
        assert!(matches!(result, Err(StripError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_base64_rejects_non_image_data_url() {
        let config = BoothConfig::default();
        let result = PhotoLoader::new(&config).load_from_base64("data:text/plain;base64,SGVsbG8=");
        assert!(matches!(result, Err(StripError::InvalidFormat(_))));
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = parse_base64_with_limit(&huge, 32);
        assert!(matches!(result, Err(StripError::ResourceLimit(_))));
    }

    #[test]
    fn decoded_len_bound_rounds_up_partial_groups() {
        assert_eq!(base64_decoded_len_upper_bound("").expect("empty"), 0);
        assert_eq!(base64_decoded_len_upper_bound("SGVsbG8=").expect("padded"), 6);
        assert_eq!(base64_decoded_len_upper_bound("SGVsbG8").expect("unpadded"), 6);
    }

    #[test]
    fn photo_signature_rejects_documents_and_empty_input() {
        assert!(ensure_photo_signature(&png_bytes(2, 2)).is_ok());

        let pdf = ensure_photo_signature(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        match pdf {
            Err(StripError::InvalidFormat(msg)) => assert!(msg.contains("application/pdf"), "{msg}"),
            other => panic!("expected InvalidFormat, got {other:?}"),
        }

        assert!(matches!(ensure_photo_signature(&[]), Err(StripError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_file_reports_missing_file() {
        let config = BoothConfig::default();
        let result = PhotoLoader::new(&config).load_from_file("/definitely/not/here.png");
        assert!(matches!(result, Err(StripError::FileSystem(_))));
    }

    #[test]
    fn load_from_file_reads_png() {
        let config = BoothConfig::default();
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(&png_bytes(4, 4)).expect("write temp png");

        let raw = PhotoLoader::new(&config)
            .load_from_file(file.path())
            .expect("file should load");

        assert_eq!(raw.source_hint(), "file");
    }

    #[test]
    fn pixel_limits_reject_oversized_header() {
        let mut config = BoothConfig::default();
        config.max_decoded_pixels = 100;

        let result = PhotoLoader::new(&config).load_from_bytes(png_bytes(20, 20));
        assert!(matches!(result, Err(StripError::ResourceLimit(_))));
    }
}
