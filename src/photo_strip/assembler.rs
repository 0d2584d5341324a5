//! # 照片条编排模块
//!
//! ## 设计思路
//!
//! `StripAssembler` 只负责流程编排：三张照片按槽位顺序依次“解码 → 合成 → 写入”，
//! 并拥有跨照片的顺序与失败语义。
//!
//! 处理链路固定为：
//! 1. 校验照片数量（必须恰好 3 张，否则在解码任何照片前失败）
//! 2. 分配 600×1800 白底画布
//! 3. 逐槽位：等待解码（挂起点）→ 覆盖式合成 + 滤镜 → 写入画布
//! 4. 槽位 0、1 之后绘制分隔带
//! 5. 外边框 + 底部标题
//! 6. PNG 编码，返回 `PhotoStrip`
//!
//! ## 实现思路
//!
//! - 每个槽位只有一个 `.await`（解码），槽位之间严格串行：第 i 张解码挂起时，
//!   第 i+1 张不会开始，画布始终只有一个写入者，无需加锁。
//! - 解码通过 `PhotoDecoder` 注入；默认实现把 `image` 解码放到 `spawn_blocking`，
//!   并以 `max_decoded_bytes` 限制解码器的内存申请。
//! - 每次解码受 `decode_timeout_ms` 约束，超时按解码失败处理。
//! - 取消谓词只在槽位之间检查，不会打断单个槽位内的像素运算。
//! - 任意一步失败立即返回错误，永远不会产出半成品照片条。

use std::future::Future;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};

use super::caption::draw_caption;
use super::loader::validate_pixel_limits;
use super::{BoothConfig, FilterKind, ImageCompositor, PhotoStrip, RawImage, StripError, StripLayout};

pub const STRIP_CAPTION: &str = "✨ KalaKini Booth ✨";

const BACKGROUND_COLOR: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const SEPARATOR_COLOR: Rgba<u8> = Rgba([0xFF, 0xD9, 0x3D, 0xFF]);
const ACCENT_COLOR: Rgba<u8> = Rgba([0xFF, 0x6B, 0x6B, 0xFF]);
const CAPTION_SCALE: u32 = 3;

/// 照片解码器：把编码字节变成 RGBA 像素，可在解码期间挂起。
pub trait PhotoDecoder: Send + Sync {
    fn decode(
        &self,
        photo: &RawImage,
    ) -> impl Future<Output = Result<RgbaImage, StripError>> + Send;
}

/// 默认解码器：先按图片头校验像素上限，再在阻塞线程池中完整解码。
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    config: BoothConfig,
}

impl ImageDecoder {
    pub fn new(config: &BoothConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl PhotoDecoder for ImageDecoder {
    async fn decode(&self, photo: &RawImage) -> Result<RgbaImage, StripError> {
        let (width, height) = photo.dimensions()?;
        validate_pixel_limits(&self.config, width, height)?;

        let photo = photo.clone();
        let max_alloc = self.config.max_decoded_bytes;
        tokio::task::spawn_blocking(move || photo.decode_with_limit(max_alloc))
            .await
            .map_err(|e| StripError::Decode(format!("解码任务异常退出：{}", e)))?
    }
}

/// 照片条编排器。
pub struct StripAssembler<D = ImageDecoder> {
    decoder: D,
    compositor: ImageCompositor,
    layout: StripLayout,
    decode_timeout: Duration,
}

impl StripAssembler<ImageDecoder> {
    /// 使用默认解码器创建编排器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use kalakini_booth::photo_strip::{BoothConfig, FilterKind, RawImage, StripAssembler};
    ///
    /// # async fn demo(photos: Vec<RawImage>) -> Result<(), kalakini_booth::photo_strip::StripError> {
    /// let assembler = StripAssembler::new(&BoothConfig::default());
    /// let strip = assembler.generate_strip(&photos, FilterKind::Vintage).await?;
    /// assert_eq!((strip.width(), strip.height()), (600, 1800));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: &BoothConfig) -> Self {
        Self::with_decoder(ImageDecoder::new(config), config)
    }
}

impl<D: PhotoDecoder> StripAssembler<D> {
    /// 注入自定义解码器（测试或宿主环境提供的异步解码）。
    pub fn with_decoder(decoder: D, config: &BoothConfig) -> Self {
        Self {
            decoder,
            compositor: ImageCompositor::from_config(config),
            layout: StripLayout::STANDARD,
            decode_timeout: Duration::from_millis(config.decode_timeout_ms),
        }
    }

    pub fn layout(&self) -> StripLayout {
        self.layout
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// 生成照片条。
    pub async fn generate_strip(
        &self,
        photos: &[RawImage],
        filter: FilterKind,
    ) -> Result<PhotoStrip, StripError> {
        self.generate_strip_with_hooks(photos, filter, |_, _| {}, || false)
            .await
    }

    /// 生成照片条，并在槽位之间回调进度、检查取消。
    ///
    /// `on_progress(done, total)` 在每个槽位写入画布后调用；
    /// `is_cancelled` 仅在槽位开始前检查。
    pub async fn generate_strip_with_hooks<P, C>(
        &self,
        photos: &[RawImage],
        filter: FilterKind,
        on_progress: P,
        is_cancelled: C,
    ) -> Result<PhotoStrip, StripError>
    where
        P: Fn(usize, usize) + Send + Sync,
        C: Fn() -> bool + Send + Sync,
    {
        if photos.len() != StripLayout::SLOT_COUNT {
            return Err(StripError::InvalidInput(format!(
                "必须恰好 {} 张照片才能生成照片条（当前 {} 张）",
                StripLayout::SLOT_COUNT,
                photos.len()
            )));
        }
        self.layout.validate()?;

        let total_start = Instant::now();
        let layout = self.layout;
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, BACKGROUND_COLOR);

        for (index, photo) in photos.iter().enumerate() {
            if is_cancelled() {
                log::info!("🛑 照片条生成已取消 - 已完成 {} 个槽位", index);
                return Err(StripError::Cancelled(format!(
                    "在第 {} 张照片前取消",
                    index + 1
                )));
            }

            let decode_start = Instant::now();
            let decoded = self.decode_with_timeout(index, photo).await?;
            let decode_elapsed = decode_start.elapsed();

            let compose_start = Instant::now();
            let slot = self
                .compositor
                .composite_decoded(&decoded, layout.width, layout.slot_height, filter)?;
            drop(decoded);

            // 上一条分隔带已经占据本槽位顶部的若干行，保留它们。
            let skip_rows = if index == 0 {
                0
            } else {
                layout.separator_thickness / 2
            };
            paste_slot(&mut canvas, &slot, layout.slot_top(index), skip_rows);

            if index + 1 < StripLayout::SLOT_COUNT {
                draw_separator(&mut canvas, &layout, index);
            }

            log::debug!(
                "🖼️ 槽位 {} 完成 - 来源: {} decode={}ms compose={}ms",
                index,
                photo.source_hint(),
                decode_elapsed.as_millis(),
                compose_start.elapsed().as_millis()
            );
            on_progress(index + 1, StripLayout::SLOT_COUNT);
        }

        draw_border(&mut canvas, &layout);
        draw_caption(
            &mut canvas,
            STRIP_CAPTION,
            layout.width / 2,
            layout.height - layout.caption_baseline_offset,
            ACCENT_COLOR,
            CAPTION_SCALE,
        );

        let encode_start = Instant::now();
        let strip = PhotoStrip::new(canvas, STRIP_CAPTION.to_string())?;

        log::info!(
            "✅ 照片条生成完成 - filter={} encode={}ms total={}ms 输出={}KB",
            filter,
            encode_start.elapsed().as_millis(),
            total_start.elapsed().as_millis(),
            strip.png_bytes().len() / 1024
        );

        Ok(strip)
    }

    async fn decode_with_timeout(
        &self,
        index: usize,
        photo: &RawImage,
    ) -> Result<RgbaImage, StripError> {
        match tokio::time::timeout(self.decode_timeout, self.decoder.decode(photo)).await {
            Ok(Ok(decoded)) => Ok(decoded),
            Ok(Err(StripError::Decode(message))) => Err(StripError::Decode(format!(
                "第 {} 张照片：{}",
                index + 1,
                message
            ))),
            Ok(Err(other)) => Err(other),
            Err(_) => {
                // spawn_blocking 任务无法被中止，只能等它在内存上限内自行结束。
                log::warn!(
                    "⏱️ 第 {} 张照片解码超时（{}ms），后台解码将在内存上限内自行结束",
                    index + 1,
                    self.decode_timeout.as_millis()
                );
                Err(StripError::Decode(format!(
                    "第 {} 张照片解码超时（{}ms）",
                    index + 1,
                    self.decode_timeout.as_millis()
                )))
            }
        }
    }
}

/// 将槽位逐行复制到画布 `top` 处，跳过槽位顶部 `skip_rows` 行。
fn paste_slot(canvas: &mut RgbaImage, slot: &RgbaImage, top: u32, skip_rows: u32) {
    debug_assert_eq!(canvas.width(), slot.width());

    let row_len = slot.width() as usize * 4;
    let source = slot.as_raw();
    let target: &mut [u8] = canvas;

    for row in skip_rows..slot.height() {
        let src_start = row as usize * row_len;
        let dst_start = (top + row) as usize * row_len;
        target[dst_start..dst_start + row_len]
            .copy_from_slice(&source[src_start..src_start + row_len]);
    }
}

fn fill_rect(canvas: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    let x1 = x1.min(canvas.width());
    let y1 = y1.min(canvas.height());
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// 第 `boundary` 个内部边界上的分隔带，上下各占相邻槽位一半厚度。
fn draw_separator(canvas: &mut RgbaImage, layout: &StripLayout, boundary: usize) {
    let rows = layout.separator_rows(boundary);
    fill_rect(canvas, 0, rows.start, layout.width, rows.end, SEPARATOR_COLOR);
}

/// 以 `border_inset` 为中心线、`border_thickness` 为线宽描边。
fn draw_border(canvas: &mut RgbaImage, layout: &StripLayout) {
    let half = layout.border_thickness / 2;
    let outer = layout.border_inset.saturating_sub(half);
    let inner = layout.border_inset + half;
    let (width, height) = (layout.width, layout.height);

    fill_rect(canvas, outer, outer, width - outer, inner, ACCENT_COLOR);
    fill_rect(canvas, outer, height - inner, width - outer, height - outer, ACCENT_COLOR);
    fill_rect(canvas, outer, outer, inner, height - outer, ACCENT_COLOR);
    fill_rect(canvas, width - inner, outer, width - outer, height - outer, ACCENT_COLOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo_strip::source::encode_png;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn solid_photo(width: u32, height: u32, rgba: [u8; 4]) -> RawImage {
        let png = encode_png(&RgbaImage::from_pixel(width, height, Rgba(rgba)))
            .expect("encode test png");
        RawImage::from_encoded(png)
    }

    fn rgb_photos() -> Vec<RawImage> {
        vec![
            solid_photo(64, 36, [255, 0, 0, 255]),
            solid_photo(64, 36, [0, 255, 0, 255]),
            solid_photo(64, 36, [0, 0, 255, 255]),
        ]
    }

    /// 记录解码调用顺序的解码器，可指定在第 N 次调用时失败。
    struct RecordingDecoder {
        calls: Mutex<Vec<usize>>,
        counter: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl RecordingDecoder {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                counter: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    impl PhotoDecoder for RecordingDecoder {
        async fn decode(&self, photo: &RawImage) -> Result<RgbaImage, StripError> {
            let call = self.counter.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().expect("calls lock").push(call);
            tokio::task::yield_now().await;

            if self.fail_on == Some(call) {
                return Err(StripError::Decode("模拟解码失败".to_string()));
            }
            photo.decode()
        }
    }

    struct StuckDecoder;

    impl PhotoDecoder for StuckDecoder {
        async fn decode(&self, _photo: &RawImage) -> Result<RgbaImage, StripError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(StripError::Decode("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn wrong_photo_count_fails_before_decoding() {
        let config = BoothConfig::default();
        let assembler = StripAssembler::with_decoder(RecordingDecoder::new(None), &config);

        for count in [0usize, 2, 4] {
            let photos: Vec<RawImage> = rgb_photos().into_iter().cycle().take(count).collect();
            let result = assembler.generate_strip(&photos, FilterKind::None).await;
            assert!(matches!(result, Err(StripError::InvalidInput(_))));
        }

        assert_eq!(assembler.decoder().counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_second_decode_stops_before_third() {
        let config = BoothConfig::default();
        let assembler = StripAssembler::with_decoder(RecordingDecoder::new(Some(1)), &config);

        let result = assembler.generate_strip(&rgb_photos(), FilterKind::None).await;

        assert!(matches!(result, Err(StripError::Decode(ref msg)) if msg.contains("第 2 张")));
        assert_eq!(
            *assembler.decoder().calls.lock().expect("calls lock"),
            vec![0, 1]
        );
    }

    #[tokio::test]
    async fn progress_is_reported_per_slot_in_order() {
        let config = BoothConfig::default();
        let assembler = StripAssembler::with_decoder(RecordingDecoder::new(None), &config);
        let seen = Mutex::new(Vec::new());

        assembler
            .generate_strip_with_hooks(
                &rgb_photos(),
                FilterKind::None,
                |done, total| seen.lock().expect("progress lock").push((done, total)),
                || false,
            )
            .await
            .expect("strip should build");

        assert_eq!(
            *seen.lock().expect("progress lock"),
            vec![(1, 3), (2, 3), (3, 3)]
        );
    }

    #[tokio::test]
    async fn cancellation_is_honoured_between_slots() {
        let config = BoothConfig::default();
        let assembler = StripAssembler::with_decoder(RecordingDecoder::new(None), &config);
        let cancel = AtomicBool::new(false);

        let result = assembler
            .generate_strip_with_hooks(
                &rgb_photos(),
                FilterKind::None,
                |done, _| {
                    if done == 1 {
                        cancel.store(true, Ordering::SeqCst);
                    }
                },
                || cancel.load(Ordering::SeqCst),
            )
            .await;

        assert!(matches!(result, Err(StripError::Cancelled(_))));
        assert_eq!(assembler.decoder().counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stuck_decode_times_out_as_decode_error() {
        let mut config = BoothConfig::default();
        config.decode_timeout_ms = 100;
        let assembler = StripAssembler::with_decoder(StuckDecoder, &config);

        let result = assembler.generate_strip(&rgb_photos(), FilterKind::None).await;

        assert!(matches!(result, Err(StripError::Decode(ref msg)) if msg.contains("超时")));
    }

    #[tokio::test]
    async fn default_decoder_enforces_pixel_limits() {
        let mut config = BoothConfig::default();
        config.max_decoded_pixels = 1_000;
        let assembler = StripAssembler::new(&config);

        let result = assembler.generate_strip(&rgb_photos(), FilterKind::None).await;

        assert!(matches!(result, Err(StripError::ResourceLimit(_))));
    }

    #[test]
    fn border_covers_outer_eight_pixels_only() {
        let layout = StripLayout::STANDARD;
        let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, BACKGROUND_COLOR);
        draw_border(&mut canvas, &layout);

        assert_eq!(*canvas.get_pixel(0, 0), ACCENT_COLOR);
        assert_eq!(*canvas.get_pixel(7, 900), ACCENT_COLOR);
        assert_eq!(*canvas.get_pixel(8, 900), BACKGROUND_COLOR);
        assert_eq!(*canvas.get_pixel(592, 900), ACCENT_COLOR);
        assert_eq!(*canvas.get_pixel(591, 900), BACKGROUND_COLOR);
        assert_eq!(*canvas.get_pixel(300, 1792), ACCENT_COLOR);
        assert_eq!(*canvas.get_pixel(300, 1791), BACKGROUND_COLOR);
    }

    #[test]
    fn paste_slot_preserves_skipped_rows() {
        let mut canvas = RgbaImage::from_pixel(4, 8, BACKGROUND_COLOR);
        let slot = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));

        paste_slot(&mut canvas, &slot, 4, 1);

        assert_eq!(*canvas.get_pixel(0, 4), BACKGROUND_COLOR);
        assert_eq!(canvas.get_pixel(0, 5).0, [1, 2, 3, 255]);
        assert_eq!(canvas.get_pixel(3, 7).0, [1, 2, 3, 255]);
        assert_eq!(*canvas.get_pixel(0, 3), BACKGROUND_COLOR);
    }
}
