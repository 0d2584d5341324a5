//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 照片条流水线内部使用 `StripError`（带阶段与错误码）；
//! 应用外层（配置文件、导出目录、CLI）再包一层 `AppError`，
//! 替代各处分散的 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `StripError`、`std::io::Error` 提供 `From` 转换，`?` 即可向上传递。
//! - `code()` / `stage()` 供命令行输出可定位的错误摘要。

use crate::photo_strip::StripError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 照片条流水线错误（加载 / 解码 / 合成 / 编码 / 导出）
    #[error("{0}")]
    Strip(#[from] StripError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件读取或解析失败
    #[error("配置错误: {0}")]
    Config(String),

    /// 导出目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),
}

impl AppError {
    /// 稳定错误码，宿主可据此区分处理。
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Strip(err) => err.code(),
            AppError::Io(_) => "io",
            AppError::Config(_) => "config",
            AppError::Storage(_) => "storage",
        }
    }

    /// 出错阶段：流水线错误沿用 `StripError::stage`，其余归为应用层。
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Strip(err) => err.stage(),
            AppError::Config(_) => "config",
            AppError::Io(_) | AppError::Storage(_) => "export",
        }
    }
}
