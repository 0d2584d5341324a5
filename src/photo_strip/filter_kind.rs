//! # 滤镜标识与装饰层分类
//!
//! ## 设计思路
//!
//! 滤镜集合是封闭的：三种像素滤镜 + 四种装饰动画层 + `None`。
//! 用枚举代替字符串比较，像素滤镜引擎与装饰层分类都按枚举分派。
//!
//! 装饰层（hearts / stars / sparkles / emoji）只作用于实时预览画面，
//! 由外部渲染器通过 `overlay_class` 取得样式类名，永远不会写入照片条像素。
//!
//! ## 未知标识
//!
//! 未知字符串按 `None` 处理，不报错，只打一条 `warn` 日志便于排查。

use serde::{Deserialize, Serialize};

/// 滤镜标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None,
    Vintage,
    Bright,
    Smooth,
    Hearts,
    Stars,
    Sparkles,
    Emoji,
}

impl FilterKind {
    pub const ALL: [FilterKind; 8] = [
        Self::None,
        Self::Vintage,
        Self::Bright,
        Self::Smooth,
        Self::Hearts,
        Self::Stars,
        Self::Sparkles,
        Self::Emoji,
    ];

    /// 从外部字符串解析滤镜，未知值回退为 `None`（不报错）。
    ///
    /// # 示例
    /// ```rust
    /// use kalakini_booth::photo_strip::FilterKind;
    ///
    /// assert_eq!(FilterKind::parse("Vintage"), FilterKind::Vintage);
    /// assert_eq!(FilterKind::parse("polaroid"), FilterKind::None);
    /// ```
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "none" | "" => Self::None,
            "vintage" => Self::Vintage,
            "bright" => Self::Bright,
            "smooth" => Self::Smooth,
            "hearts" => Self::Hearts,
            "stars" => Self::Stars,
            "sparkles" => Self::Sparkles,
            "emoji" => Self::Emoji,
            other => {
                log::warn!("⚠️ 未知滤镜标识：{}，按 none 处理", other);
                Self::None
            }
        }
    }

    /// 稳定字符串，供前端展示与配置持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Vintage => "vintage",
            Self::Bright => "bright",
            Self::Smooth => "smooth",
            Self::Hearts => "hearts",
            Self::Stars => "stars",
            Self::Sparkles => "sparkles",
            Self::Emoji => "emoji",
        }
    }

    /// 是否为装饰动画层（只作用于预览，不参与像素处理）。
    pub fn is_overlay(self) -> bool {
        matches!(
            self,
            Self::Hearts | Self::Stars | Self::Sparkles | Self::Emoji
        )
    }

    /// 是否为需要烘焙进照片条的像素滤镜。
    pub fn is_pixel_filter(self) -> bool {
        matches!(self, Self::Vintage | Self::Bright | Self::Smooth)
    }

    /// 装饰层对应的预览样式类名；非装饰层返回空串。
    pub fn overlay_class(self) -> &'static str {
        match self {
            Self::Hearts => "filter-hearts",
            Self::Stars => "filter-stars",
            Self::Sparkles => "filter-sparkles",
            Self::Emoji => "filter-emoji",
            Self::None | Self::Vintage | Self::Bright | Self::Smooth => "",
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FilterKind {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}
