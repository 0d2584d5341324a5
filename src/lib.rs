//! # KalaKini Booth 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 宿主 (CLI / 前端 / 服务)                  │
//! │                                                          │
//! │   相机预览 ── 滤镜选择 ── 拍 3 张 ── 生成 ── 下载          │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ photo_strip ─ PhotoBooth 会话                         │
//! │  │   ├─ filters        复古 / 明亮 / 柔肤 像素滤镜          │
//! │  │   ├─ compositor     cover 适配 + 居中裁剪               │
//! │  │   ├─ assembler      600×1800 照片条拼装                 │
//! │  │   └─ export         PNG 落盘                           │
//! │  │                                                       │
//! │  ├─ settings           BoothConfig JSON 读写              │
//! │  └─ storage            导出目录 (返回 Result)             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`photo_strip`] | 滤镜、合成、照片条拼装、拍照会话与导出 |
//! | [`settings`] | 配置文件加载、画质档位覆盖 |
//! | [`storage`] | 导出目录的获取与自动创建 |

pub mod error;
pub mod photo_strip;
pub mod settings;
pub mod storage;
