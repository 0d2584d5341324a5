//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `BoothConfig`：输入体积/像素上限、缩放滤镜、解码超时、
//! 导出文件名前缀。照片条几何尺寸（600×1800、8px 边框、16px 分隔带）是固定设计，
//! 不在配置中暴露，见 `StripLayout`。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `QualityProfile` 负责档位字符串解析与反向输出。
//! - `apply_quality_profile` 将档位转换为具体缩放滤镜。
//! - `infer_quality_profile` 用于从当前配置反推档位。
//! - 通过 `serde` 支持从 JSON 设置文件覆盖部分字段（缺省字段沿用默认值）。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::StripError;

/// 照片条处理配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// 单张照片原始字节允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 覆盖式缩放使用的重采样滤镜。
    #[serde(with = "filter_type_serde")]
    pub resize_filter: FilterType,
    /// 单张照片解码的超时时间（毫秒），超时按解码失败处理。
    pub decode_timeout_ms: u64,
    /// 导出文件名前缀，默认文件名为 `<prefix>-YYYYMMDD-HHMMSS.png`。
    pub file_prefix: String,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            max_file_size: 25 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: FilterType::Triangle,
            decode_timeout_ms: 10_000,
            file_prefix: "kalakini-booth".to_string(),
        }
    }
}

/// 画质档位（面向产品/用户语义）。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与性能平衡
/// - `Speed`：优先出图速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityProfile {
    Quality,
    Balanced,
    Speed,
}

impl QualityProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use kalakini_booth::photo_strip::QualityProfile;
    ///
    /// let p = QualityProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), kalakini_booth::photo_strip::StripError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, StripError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(StripError::InvalidFormat(format!(
                "未知画质档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl BoothConfig {
    /// 基于当前缩放滤镜反推画质档位。
    pub fn infer_quality_profile(&self) -> QualityProfile {
        match self.resize_filter {
            FilterType::CatmullRom | FilterType::Lanczos3 | FilterType::Gaussian => {
                QualityProfile::Quality
            }
            FilterType::Nearest => QualityProfile::Speed,
            FilterType::Triangle => QualityProfile::Balanced,
        }
    }

    /// 应用指定画质档位到实际参数。
    pub fn apply_quality_profile(&mut self, profile: QualityProfile) {
        self.resize_filter = match profile {
            QualityProfile::Quality => FilterType::Lanczos3,
            QualityProfile::Balanced => FilterType::Triangle,
            QualityProfile::Speed => FilterType::Nearest,
        };
    }

    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), StripError> {
        if self.max_file_size == 0 {
            return Err(StripError::InvalidFormat("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(StripError::InvalidFormat(
                "max_decoded_bytes 不能小于 8MB".to_string(),
            ));
        }
        if !(100..=120_000).contains(&self.decode_timeout_ms) {
            return Err(StripError::InvalidFormat(
                "decode_timeout_ms 必须在 100~120000 毫秒之间".to_string(),
            ));
        }
        let prefix = self.file_prefix.trim();
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(StripError::InvalidFormat(format!(
                "file_prefix 无效：{:?}",
                self.file_prefix
            )));
        }
        Ok(())
    }
}

/// `FilterType` 没有实现 serde，按档位名的小写字符串读写。
mod filter_type_serde {
    use image::imageops::FilterType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(filter: &FilterType, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let name = match filter {
            FilterType::Nearest => "nearest",
            FilterType::Triangle => "triangle",
            FilterType::CatmullRom => "catmull-rom",
            FilterType::Gaussian => "gaussian",
            FilterType::Lanczos3 => "lanczos3",
        };
        serializer.serialize_str(name)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<FilterType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        match name.trim().to_lowercase().as_str() {
            "nearest" => Ok(FilterType::Nearest),
            "triangle" => Ok(FilterType::Triangle),
            "catmull-rom" | "catmullrom" => Ok(FilterType::CatmullRom),
            "gaussian" => Ok(FilterType::Gaussian),
            "lanczos3" => Ok(FilterType::Lanczos3),
            other => Err(serde::de::Error::custom(format!(
                "unknown resize filter: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_balanced() {
        let config = BoothConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.infer_quality_profile(), QualityProfile::Balanced);
    }

    #[test]
    fn profile_round_trips_through_config() {
        let mut config = BoothConfig::default();
        for profile in [
            QualityProfile::Quality,
            QualityProfile::Balanced,
            QualityProfile::Speed,
        ] {
            config.apply_quality_profile(profile);
            assert_eq!(config.infer_quality_profile(), profile);
        }
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(matches!(
            QualityProfile::from_str("ultra"),
            Err(StripError::InvalidFormat(_))
        ));
    }

    #[test]
    fn validate_rejects_path_like_prefix() {
        let mut config = BoothConfig::default();
        config.file_prefix = "../escape".to_string();
        assert!(matches!(config.validate(), Err(StripError::InvalidFormat(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: BoothConfig =
            serde_json::from_str(r#"{ "resize_filter": "lanczos3", "file_prefix": "party" }"#)
                .expect("partial config should parse");

        assert_eq!(config.resize_filter, FilterType::Lanczos3);
        assert_eq!(config.file_prefix, "party");
        assert_eq!(config.decode_timeout_ms, BoothConfig::default().decode_timeout_ms);
    }
}
