//! # 服务层（拍照会话）
//!
//! ## 设计思路
//!
//! `PhotoBooth` 承载一次拍照会话的可变状态：已拍照片、当前选中的滤镜、
//! 最近一次生成的照片条与取消标志。宿主（CLI、Web 服务等）持有一个实例即可，
//! 替代全局单例。
//!
//! ## 实现思路
//!
//! - 配置放在 `RwLock` 中，单次生成使用“同一配置快照”，避免处理中途配置漂移。
//! - 照片列表在进入异步流水线前整体克隆（`RawImage` 克隆只增加引用计数），
//!   `.await` 期间不持有任何锁。
//! - 导出前必须先生成照片条，否则返回 `StripError::Uninitialized`。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use image::RgbaImage;

use super::{
    BoothConfig, FilterKind, PhotoLoader, PhotoStrip, QualityProfile, RawImage, StripAssembler,
    StripError, StripLayout, capture_still, save_strip,
};

/// 拍照会话状态。
pub struct PhotoBooth {
    config: RwLock<BoothConfig>,
    photos: Mutex<Vec<RawImage>>,
    filter: Mutex<FilterKind>,
    last_strip: Mutex<Option<PhotoStrip>>,
    cancel_flag: AtomicBool,
}

fn poisoned(what: &str) -> StripError {
    StripError::Internal(format!("{}锁已中毒", what))
}

impl PhotoBooth {
    /// 使用默认配置创建会话。
    ///
    /// # 示例
    /// ```rust
    /// use kalakini_booth::photo_strip::PhotoBooth;
    ///
    /// let booth = PhotoBooth::new()?;
    /// assert_eq!(booth.photo_count()?, 0);
    /// # Ok::<(), kalakini_booth::photo_strip::StripError>(())
    /// ```
    pub fn new() -> Result<Self, StripError> {
        Self::with_config(BoothConfig::default())
    }

    /// 使用自定义配置创建会话。
    pub fn with_config(config: BoothConfig) -> Result<Self, StripError> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
            photos: Mutex::new(Vec::with_capacity(StripLayout::SLOT_COUNT)),
            filter: Mutex::new(FilterKind::None),
            last_strip: Mutex::new(None),
            cancel_flag: AtomicBool::new(false),
        })
    }

    pub fn config_snapshot(&self) -> Result<BoothConfig, StripError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| poisoned("配置读取"))
    }

    pub fn set_quality_profile(&self, profile: QualityProfile) -> Result<(), StripError> {
        let mut config = self.config.write().map_err(|_| poisoned("配置写入"))?;
        config.apply_quality_profile(profile);
        log::info!(
            "⚙️ 已切换画质档位：{:?}（resize_filter={:?}）",
            profile,
            config.resize_filter
        );
        Ok(())
    }

    pub fn quality_profile(&self) -> Result<QualityProfile, StripError> {
        Ok(self.config_snapshot()?.infer_quality_profile())
    }

    /// 追加一张照片，返回当前张数。已满 3 张时拒绝。
    pub fn add_photo(&self, photo: RawImage) -> Result<usize, StripError> {
        let mut photos = self.photos.lock().map_err(|_| poisoned("照片列表"))?;
        if photos.len() >= StripLayout::SLOT_COUNT {
            return Err(StripError::InvalidInput(format!(
                "已经拍满 {} 张照片",
                StripLayout::SLOT_COUNT
            )));
        }
        photos.push(photo);
        log::info!("📷 已添加照片 {}/{}", photos.len(), StripLayout::SLOT_COUNT);
        Ok(photos.len())
    }

    /// 从 Data URL / Base64 追加照片。
    pub fn add_photo_from_base64(&self, data: &str) -> Result<usize, StripError> {
        let config = self.config_snapshot()?;
        let photo = PhotoLoader::new(&config).load_from_base64(data)?;
        self.add_photo(photo)
    }

    /// 从本地文件追加照片。
    pub fn add_photo_from_file(&self, path: impl AsRef<Path>) -> Result<usize, StripError> {
        let config = self.config_snapshot()?;
        let photo = PhotoLoader::new(&config).load_from_file(path)?;
        self.add_photo(photo)
    }

    /// 将采集到的一帧序列化后追加（预览为镜像时传 `mirror = true`）。
    pub fn capture_frame(&self, frame: &RgbaImage, mirror: bool) -> Result<usize, StripError> {
        self.add_photo(capture_still(frame, mirror)?)
    }

    pub fn photo_count(&self) -> Result<usize, StripError> {
        Ok(self.photos.lock().map_err(|_| poisoned("照片列表"))?.len())
    }

    /// 清空已拍照片与上一次的照片条，开始新一轮拍摄。
    pub fn clear_photos(&self) -> Result<(), StripError> {
        self.photos.lock().map_err(|_| poisoned("照片列表"))?.clear();
        *self.last_strip.lock().map_err(|_| poisoned("照片条"))? = None;
        self.cancel_flag.store(false, Ordering::SeqCst);
        log::info!("🧹 已清空照片");
        Ok(())
    }

    pub fn set_filter(&self, filter: FilterKind) -> Result<(), StripError> {
        *self.filter.lock().map_err(|_| poisoned("滤镜"))? = filter;
        Ok(())
    }

    pub fn filter(&self) -> Result<FilterKind, StripError> {
        Ok(*self.filter.lock().map_err(|_| poisoned("滤镜"))?)
    }

    /// 当前滤镜在实时预览上的装饰层类名（非装饰层为空串）。
    pub fn preview_overlay_class(&self) -> Result<&'static str, StripError> {
        Ok(self.filter()?.overlay_class())
    }

    /// 请求取消生成，在下一个槽位开始前生效。
    ///
    /// 在生成开始前发出的取消同样有效；标志在一次生成结束或 `clear_photos` 时复位。
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// 用当前照片与滤镜生成照片条，并记为最近一次结果。
    pub async fn generate_strip(&self) -> Result<PhotoStrip, StripError> {
        let config = self.config_snapshot()?;
        let photos = self
            .photos
            .lock()
            .map_err(|_| poisoned("照片列表"))?
            .clone();
        let filter = self.filter()?;

        let assembler = StripAssembler::new(&config);
        let result = assembler
            .generate_strip_with_hooks(
                &photos,
                filter,
                |done, total| log::debug!("⏳ 照片条进度 {}/{}", done, total),
                || self.cancel_flag.load(Ordering::SeqCst),
            )
            .await;
        self.cancel_flag.store(false, Ordering::SeqCst);
        let strip = result?;

        *self.last_strip.lock().map_err(|_| poisoned("照片条"))? = Some(strip.clone());
        Ok(strip)
    }

    /// 最近一次生成的照片条。
    pub fn last_strip(&self) -> Result<Option<PhotoStrip>, StripError> {
        Ok(self.last_strip.lock().map_err(|_| poisoned("照片条"))?.clone())
    }

    /// 将最近一次生成的照片条写入 `dir`。
    ///
    /// 尚未生成时返回 `StripError::Uninitialized`。
    pub fn download_strip(
        &self,
        dir: &Path,
        file_name: Option<&str>,
    ) -> Result<PathBuf, StripError> {
        let strip = self
            .last_strip()?
            .ok_or_else(|| StripError::Uninitialized("照片条尚未生成".to_string()))?;
        let config = self.config_snapshot()?;
        save_strip(&strip, dir, file_name, &config.file_prefix)
    }
}
