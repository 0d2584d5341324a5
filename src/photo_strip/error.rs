//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载照片条流水线中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配，
//! 例如“第 2 张照片解码失败 → 提示用户重拍该张”。

/// 照片条流水线统一错误类型。
///
/// 任何一个变体都会中止整次 `generate_strip` 调用，流水线内部不做重试。
#[derive(Debug, thiserror::Error)]
pub enum StripError {
    #[error("输入错误：{0}")]
    InvalidInput(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("画布未初始化：{0}")]
    Uninitialized(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("已取消：{0}")]
    Cancelled(String),

    #[error("内部错误：{0}")]
    Internal(String),
}

impl StripError {
    /// 稳定的错误码，供外层界面做本地化文案映射。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Decode(_) => "decode",
            Self::Uninitialized(_) => "uninitialized",
            Self::InvalidFormat(_) => "invalid_format",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Encode(_) => "encode",
            Self::FileSystem(_) => "file_system",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }

    /// 出错所在的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "load",
            Self::Decode(_) => "decode",
            Self::Cancelled(_) | Self::Internal(_) => "compose",
            Self::Encode(_) => "encode",
            Self::Uninitialized(_) | Self::FileSystem(_) => "export",
        }
    }
}
