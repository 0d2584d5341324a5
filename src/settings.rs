//! 配置文件加载
//!
//! `BoothConfig` 以 JSON 形式保存，缺省字段回落到默认值（`#[serde(default)]`）。
//! 文件不存在时视为“未配置”，而不是错误。

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::photo_strip::{BoothConfig, QualityProfile};

/// 读取配置文件；文件不存在时返回 `Ok(None)`。
pub fn read_settings(path: &Path) -> Result<Option<BoothConfig>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let parsed = serde_json::from_str::<BoothConfig>(&content)
        .map_err(|e| AppError::Config(format!("解析配置文件 '{}' 失败: {}", path.display(), e)))?;

    Ok(Some(parsed))
}

/// 组装最终生效的配置：配置文件（可选）→ 画质档位覆盖（可选）→ 校验。
pub fn resolve_config(path: Option<&Path>, profile: Option<&str>) -> Result<BoothConfig, AppError> {
    let mut config = match path {
        Some(path) => match read_settings(path)? {
            Some(config) => {
                log::info!("⚙️ 已加载配置文件: {}", path.display());
                config
            }
            None => {
                log::warn!("⚠️ 配置文件不存在，使用默认配置: {}", path.display());
                BoothConfig::default()
            }
        },
        None => BoothConfig::default(),
    };

    if let Some(profile) = profile {
        config.apply_quality_profile(QualityProfile::from_str(profile)?);
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = read_settings(&dir.path().join("absent.json")).expect("read");
        assert!(result.is_none());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"file_prefix": "party"}}"#).expect("write json");

        let config = read_settings(file.path())
            .expect("read")
            .expect("config present");
        assert_eq!(config.file_prefix, "party");
        assert_eq!(config.decode_timeout_ms, BoothConfig::default().decode_timeout_ms);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write");

        assert!(matches!(read_settings(file.path()), Err(AppError::Config(_))));
    }

    #[test]
    fn profile_override_applies_after_file() {
        let config = resolve_config(None, Some("speed")).expect("resolve");
        assert_eq!(config.infer_quality_profile(), QualityProfile::Speed);

        assert!(matches!(
            resolve_config(None, Some("ultra")),
            Err(AppError::Strip(_))
        ));
    }
}
