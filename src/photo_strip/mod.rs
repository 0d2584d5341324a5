//! # 照片条模块（photo_strip）
//!
//! ## 设计思路
//!
//! 该模块把“三张照片 → 一张 600×1800 照片条”拆成若干职责单一的子模块：
//!
//! - `filter_kind`：滤镜标识解析，区分像素滤镜与装饰层滤镜
//! - `filters`：像素滤镜（复古 / 明亮 / 柔肤），纯函数
//! - `compositor`：cover 适配 + 居中裁剪 + 滤镜，产出单个槽位
//! - `assembler`：按固定版式拼装照片条（分隔线 / 边框 / 标题）
//! - `caption`：内置点阵字形的标题渲染
//! - `loader` / `capture`：照片来源（Base64、文件、相机静帧）
//! - `service`：拍照会话 `PhotoBooth`
//! - `export`：照片条落盘
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 像素缓冲统一使用 `image::RgbaImage`。滤镜与合成都不修改入参，
//! 而是返回新的缓冲，便于测试与复用。
//!
//! ```text
//! PhotoBooth（会话状态）
//!    ↓
//! StripAssembler（解码 + 超时 + 进度/取消）
//!    ├─ ImageCompositor（cover 适配 + 滤镜）
//!    │    └─ filters::apply_filter
//!    ├─ 分隔线 / 边框
//!    └─ caption::draw_caption
//!    ↓
//! PhotoStrip（像素 + PNG 字节）→ export::save_strip
//! ```

mod assembler;
mod caption;
mod capture;
mod compositor;
mod config;
mod error;
mod export;
mod filter_kind;
mod filters;
mod loader;
mod service;
mod source;

pub use assembler::{ImageDecoder, PhotoDecoder, STRIP_CAPTION, StripAssembler};
pub use caption::{caption_height, caption_width, draw_caption};
pub use capture::capture_still;
pub use compositor::{CoverFit, ImageCompositor, cover_fit};
pub use config::{BoothConfig, QualityProfile};
pub use error::StripError;
pub use export::{default_file_name, save_strip};
pub use filter_kind::FilterKind;
pub use filters::apply_filter;
pub use loader::PhotoLoader;
pub use service::PhotoBooth;
pub use source::{PhotoStrip, RawImage, StripLayout};
