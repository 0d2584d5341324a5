//! # 导出模块
//!
//! ## 设计思路
//!
//! “下载”在核心里只意味着：给定 PNG 字节，落盘为一个命名文件。
//! 默认文件名带本地时间戳 `<prefix>-YYYYMMDD-HHMMSS.png`，
//! 调用方传入的文件名优先于默认值。

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

use super::{PhotoStrip, StripError};

/// 按时间生成默认文件名。
///
/// # 示例
/// ```rust
/// use chrono::{Local, TimeZone};
/// use kalakini_booth::photo_strip::default_file_name;
///
/// let at = Local.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap();
/// assert_eq!(default_file_name("kalakini-booth", &at), "kalakini-booth-20240115-143022.png");
/// ```
pub fn default_file_name<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}-{}.png", prefix, at.format("%Y%m%d-%H%M%S"))
}

/// 把照片条写入 `dir`，返回最终路径。
///
/// `file_name` 为空时使用默认时间戳文件名；非空时原样使用，但不允许包含路径分隔符。
pub fn save_strip(
    strip: &PhotoStrip,
    dir: &Path,
    file_name: Option<&str>,
    prefix: &str,
) -> Result<PathBuf, StripError> {
    let file_name = match file_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => {
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(StripError::InvalidInput(format!("文件名无效：{}", name)));
            }
            name.to_string()
        }
        None => default_file_name(prefix, &Local::now()),
    };

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            StripError::FileSystem(format!("创建导出目录 '{}' 失败：{}", dir.display(), e))
        })?;
    }

    let path = dir.join(&file_name);
    fs::write(&path, strip.png_bytes())
        .map_err(|e| StripError::FileSystem(format!("保存照片条失败：{}", e)))?;

    log::info!(
        "💾 照片条已保存 - 路径: {} 体积: {}KB",
        path.display(),
        strip.png_bytes().len() / 1024
    );

    Ok(path)
}
