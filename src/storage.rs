//! 照片条导出目录管理模块
//!
//! # 设计思路
//!
//! 统一管理照片条的导出路径，支持用户自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用用户指定的目录。
//! - 未指定时回退到当前工作目录下的 `strips` 子目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 默认导出子目录名
pub const DEFAULT_OUTPUT_DIR: &str = "strips";

/// 获取照片条导出目录
///
/// # 参数
/// * `custom_dir` - 用户自定义目录（可选，空串视为未指定）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的导出目录
/// - `Err(AppError::Storage)`：无法获取或创建目录
pub fn get_output_dir(custom_dir: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = custom_dir.filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::Storage(format!("创建自定义目录 '{}' 失败: {}", dir.display(), e))
            })?;
        }
        return Ok(dir.to_path_buf());
    }

    let cwd = std::env::current_dir()
        .map_err(|e| AppError::Storage(format!("获取当前工作目录失败: {}", e)))?;
    let output_dir = cwd.join(DEFAULT_OUTPUT_DIR);
    if !output_dir.exists() {
        fs::create_dir_all(&output_dir)
            .map_err(|e| AppError::Storage(format!("创建导出目录失败: {}", e)))?;
    }
    Ok(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_dir_is_created() {
        let root = tempfile::tempdir().expect("temp dir");
        let target = root.path().join("out").join("strips");

        let dir = get_output_dir(Some(&target)).expect("output dir");
        assert_eq!(dir, target);
        assert!(target.is_dir());
    }

}
