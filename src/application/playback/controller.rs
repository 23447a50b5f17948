//! Playback Controller - 单资源播放控制
//!
//! 包装一个音频资源的传输状态机：
//! Unloaded -> Loading -> Ready -> {Playing <-> Paused} -> Ended
//!
//! - 位置由单调时钟推算（base_position + 经过时间 × 倍速），
//!   暂停/定位/调速时折算回 base_position
//! - 片段播放采用截止时刻等待而非 timeupdate 轮询，
//!   超调上限为一个定时器粒度
//! - 进度事件由每次 play 派生的 ticker 任务发出，
//!   暂停或换代后自行退出

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

use super::error::PlaybackError;
use super::events::{ErrorKind, EventKind, ListenerHandle, ListenerRegistry, PlayerEvent};
use crate::application::ports::{AudioCachePort, CacheError};
use crate::config::PlaybackConfig;
use crate::domain::audio::{snap_rate, AudioBuffer, AudioResourceDescriptor};

/// 进度事件粒度
const PROGRESS_TICK: Duration = Duration::from_millis(250);

/// repeat_segment 两次重复之间的停顿
const REPEAT_GAP: Duration = Duration::from_millis(500);

/// 位置比较容差（秒）
const POSITION_EPSILON: f64 = 1e-6;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unloaded,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    /// 本次加载失败；下一次 play 会重试
    LoadFailed,
}

/// 锁内会话状态
struct SessionInner {
    state: SessionState,
    buffer: Option<Arc<AudioBuffer>>,
    duration_hint: Option<f64>,
    /// 暂停时的绝对位置；播放中为起算点
    base_position: f64,
    /// 播放中时的起算时刻，暂停时为 None
    started_at: Option<Instant>,
    volume: f32,
    rate: f64,
    auto_loop: bool,
    destroyed: bool,
    /// 每次 play 递增；旧 ticker 发现换代后退出
    epoch: u64,
}

impl SessionInner {
    /// 当前有效时长：真实时长 > hint > 0
    fn duration(&self) -> f64 {
        self.buffer
            .as_ref()
            .map(|b| b.duration_seconds())
            .or(self.duration_hint)
            .unwrap_or(0.0)
    }

    /// 当前位置，始终落在 [0, duration] 内
    fn position(&self) -> f64 {
        let raw = match self.started_at {
            Some(started_at) => self.base_position + started_at.elapsed().as_secs_f64() * self.rate,
            None => self.base_position,
        };
        let duration = self.duration();
        if duration > 0.0 {
            raw.clamp(0.0, duration)
        } else {
            raw.max(0.0)
        }
    }

    /// 把推算位置折算进 base_position；播放中则重置起算点
    fn fold_position(&mut self) {
        self.base_position = self.position();
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}

/// 播放控制器
///
/// 实例之间互相独立，仅共享注入的缓存；
/// destroy 后除销毁本身外的操作均为拒绝或 no-op
pub struct PlaybackController {
    id: Uuid,
    resource: AudioResourceDescriptor,
    cache: Arc<dyn AudioCachePort>,
    listeners: ListenerRegistry,
    inner: Mutex<SessionInner>,
    /// 播放/暂停变化的广播，片段等待与 ticker 依赖它
    playing_tx: watch::Sender<bool>,
    weak_self: Weak<PlaybackController>,
}

impl PlaybackController {
    /// 创建控制器（不加载、不阻塞）
    pub fn new(
        resource: AudioResourceDescriptor,
        config: PlaybackConfig,
        cache: Arc<dyn AudioCachePort>,
    ) -> Arc<Self> {
        let (playing_tx, _) = watch::channel(false);
        let duration_hint = resource.duration_hint;
        Arc::new_cyclic(|weak| Self {
            id: Uuid::new_v4(),
            resource,
            cache,
            listeners: ListenerRegistry::new(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Unloaded,
                buffer: None,
                duration_hint,
                base_position: 0.0,
                started_at: None,
                volume: config.volume.clamp(0.0, 1.0),
                rate: snap_rate(config.rate),
                auto_loop: config.auto_loop,
                destroyed: false,
                epoch: 0,
            }),
            playing_tx,
            weak_self: weak.clone(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource(&self) -> &AudioResourceDescriptor {
        &self.resource
    }

    pub fn transcript(&self) -> Option<&str> {
        self.resource.transcript.as_deref()
    }

    pub fn accent(&self) -> Option<&str> {
        self.resource.accent.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    pub fn position_seconds(&self) -> f64 {
        self.inner.lock().unwrap().position()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.inner.lock().unwrap().duration()
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().unwrap().volume
    }

    pub fn rate(&self) -> f64 {
        self.inner.lock().unwrap().rate
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().state == SessionState::Playing
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lock().unwrap().buffer.is_some()
    }

    /// 订阅事件，返回稳定句柄
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerHandle
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.listeners.on(kind, Arc::new(callback))
    }

    /// 按句柄注销；返回后该回调不会再被调用
    pub fn off(&self, handle: &ListenerHandle) {
        self.listeners.off(handle);
    }

    /// 开始播放
    ///
    /// 首次调用触发缓存加载；Ended 状态下从头重新播放；
    /// 已在播放中则为 no-op
    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.ensure_loaded().await?;

        let epoch = {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed {
                return Err(PlaybackError::Destroyed);
            }
            if inner.state == SessionState::Playing {
                return Ok(());
            }
            let duration = inner.duration();
            if inner.state == SessionState::Ended
                || (duration > 0.0 && inner.base_position >= duration)
            {
                inner.base_position = 0.0;
            }
            inner.state = SessionState::Playing;
            inner.started_at = Some(Instant::now());
            inner.epoch += 1;
            inner.epoch
        };

        self.playing_tx.send_replace(true);
        self.listeners.emit(&PlayerEvent::Play);
        self.spawn_ticker(epoch);
        Ok(())
    }

    /// 暂停播放；已暂停时为 no-op
    pub fn pause(&self) {
        let emit = {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed || inner.state != SessionState::Playing {
                false
            } else {
                inner.fold_position();
                inner.started_at = None;
                inner.state = SessionState::Paused;
                true
            }
        };

        if emit {
            self.playing_tx.send_replace(false);
            self.listeners.emit(&PlayerEvent::Pause);
        }
    }

    /// 暂停并把位置归零
    pub fn stop(&self) {
        self.pause();
        let mut inner = self.inner.lock().unwrap();
        if inner.destroyed {
            return;
        }
        inner.base_position = 0.0;
        if inner.state == SessionState::Ended {
            inner.state = SessionState::Paused;
        }
    }

    /// 定位到指定秒数，越界值收敛到 [0, duration]
    pub fn seek(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let (event, playing) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed {
                return;
            }
            let duration = inner.duration();
            let clamped = if duration > 0.0 {
                seconds.clamp(0.0, duration)
            } else {
                seconds.max(0.0)
            };
            inner.base_position = clamped;
            if inner.started_at.is_some() {
                inner.started_at = Some(Instant::now());
            }
            if inner.state == SessionState::Ended && clamped < duration {
                inner.state = SessionState::Paused;
            }
            (
                PlayerEvent::TimeUpdate {
                    position_seconds: clamped,
                    duration_seconds: duration,
                },
                inner.state == SessionState::Playing,
            )
        };
        // 唤醒基于截止时刻等待的片段任务，让其按新位置重算
        self.playing_tx.send_replace(playing);
        self.listeners.emit(&event);
    }

    /// 设置音量，收敛到 [0, 1]
    pub fn set_volume(&self, volume: f32) {
        let mut inner = self.inner.lock().unwrap();
        if inner.destroyed {
            return;
        }
        inner.volume = volume.clamp(0.0, 1.0);
    }

    /// 设置倍速，吸附到固定集合；播放中立即生效
    pub fn set_rate(&self, rate: f64) {
        let snapped = snap_rate(rate);
        let playing = {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed {
                return;
            }
            // 先按旧倍速折算位置，再切换
            inner.fold_position();
            inner.rate = snapped;
            inner.state == SessionState::Playing
        };
        // 唤醒基于截止时刻等待的片段任务，让其按新倍速重算
        self.playing_tx.send_replace(playing);
    }

    /// 播放 [start, end) 片段，到达 end 时自动暂停
    ///
    /// 等待基于截止时刻而非进度轮询；并发的 seek/set_rate
    /// 会唤醒等待并重算截止时刻，并发的 pause/stop/destroy
    /// 让等待立即以 Ok 结束，不会悬挂
    pub async fn play_segment(&self, start: f64, end: f64) -> Result<(), PlaybackError> {
        self.ensure_loaded().await?;

        let duration = self.duration_seconds();
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end > duration || start >= end
        {
            return Err(PlaybackError::InvalidSegment {
                start,
                end,
                duration,
            });
        }

        self.seek(start);
        self.play().await?;

        let mut playing_rx = self.playing_tx.subscribe();
        loop {
            let (position, rate, playing) = {
                let inner = self.inner.lock().unwrap();
                (
                    inner.position(),
                    inner.rate,
                    !inner.destroyed && inner.state == SessionState::Playing,
                )
            };
            if !playing || position >= end - POSITION_EPSILON {
                break;
            }

            // 倍速变化后下一次醒来会重新计算截止时刻
            let remaining = ((end - position) / rate).max(0.0);
            let deadline = Instant::now() + Duration::from_secs_f64(remaining);
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                changed = playing_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if self.is_playing() && self.position_seconds() >= end - POSITION_EPSILON {
            self.pause();
        }
        Ok(())
    }

    /// 重复播放片段 times 次，重复之间停顿 500ms
    pub async fn repeat_segment(
        &self,
        start: f64,
        end: f64,
        times: u32,
    ) -> Result<(), PlaybackError> {
        for i in 0..times {
            self.play_segment(start, end).await?;
            if i + 1 < times {
                tokio::time::sleep(REPEAT_GAP).await;
            }
        }
        Ok(())
    }

    /// 销毁控制器：停止进度任务、清空订阅（幂等）
    pub fn destroy(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            if inner.state == SessionState::Playing {
                inner.fold_position();
                inner.state = SessionState::Paused;
            }
            inner.started_at = None;
            inner.buffer = None;
            inner.epoch += 1;
        }
        self.playing_tx.send_replace(false);
        self.listeners.clear();
        tracing::debug!(
            controller_id = %self.id,
            url = %self.resource.url,
            "Playback controller destroyed"
        );
    }

    /// 确保缓冲已从缓存加载
    ///
    /// 首次成功时发出 loadedmetadata；失败时发出 error 事件
    /// 并拒绝本次调用，下一次 play 会重试
    async fn ensure_loaded(&self) -> Result<(), PlaybackError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed {
                return Err(PlaybackError::Destroyed);
            }
            if inner.buffer.is_some() {
                return Ok(());
            }
            inner.state = SessionState::Loading;
        }

        match self.cache.get(&self.resource.url).await {
            Ok(buffer) => {
                let event = {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.destroyed {
                        return Err(PlaybackError::Destroyed);
                    }
                    if inner.buffer.is_none() {
                        let duration = buffer.duration_seconds();
                        inner.buffer = Some(buffer);
                        if inner.state == SessionState::Loading {
                            inner.state = SessionState::Ready;
                        }
                        Some(PlayerEvent::LoadedMetadata {
                            duration_seconds: duration,
                        })
                    } else {
                        None
                    }
                };
                if let Some(event) = event {
                    self.listeners.emit(&event);
                }
                Ok(())
            }
            Err(e) => {
                {
                    let mut inner = self.inner.lock().unwrap();
                    if inner.state == SessionState::Loading {
                        inner.state = SessionState::LoadFailed;
                    }
                }
                let kind = match &e {
                    CacheError::Fetch(_) => ErrorKind::Fetch,
                    CacheError::Decode(_) => ErrorKind::Decode,
                };
                tracing::warn!(url = %self.resource.url, error = %e, "Audio load failed");
                self.listeners.emit(&PlayerEvent::Error {
                    kind,
                    url: self.resource.url.clone(),
                    operation: "load".to_string(),
                    message: e.to_string(),
                });
                Err(PlaybackError::Load(e))
            }
        }
    }

    /// 派生进度任务；持弱引用，控制器释放后自行结束
    fn spawn_ticker(&self, epoch: u64) {
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(PROGRESS_TICK).await;
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                if !controller.tick(epoch) {
                    break;
                }
            }
        });
    }

    /// 单次进度推进；返回 false 表示 ticker 应当退出
    fn tick(&self, epoch: u64) -> bool {
        let mut events: Vec<PlayerEvent> = Vec::new();
        let mut keep_running = true;
        let mut announce_stop = false;

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.destroyed || inner.epoch != epoch || inner.state != SessionState::Playing {
                return false;
            }

            let duration = inner.duration();
            let position = inner.position();

            if duration > 0.0 && position >= duration - POSITION_EPSILON {
                if inner.auto_loop {
                    inner.base_position = 0.0;
                    inner.started_at = Some(Instant::now());
                    events.push(PlayerEvent::TimeUpdate {
                        position_seconds: 0.0,
                        duration_seconds: duration,
                    });
                } else {
                    inner.base_position = duration;
                    inner.started_at = None;
                    inner.state = SessionState::Ended;
                    keep_running = false;
                    announce_stop = true;
                    events.push(PlayerEvent::TimeUpdate {
                        position_seconds: duration,
                        duration_seconds: duration,
                    });
                    events.push(PlayerEvent::Ended);
                }
            } else {
                events.push(PlayerEvent::TimeUpdate {
                    position_seconds: position,
                    duration_seconds: duration,
                });
            }
        }

        if announce_stop {
            self.playing_tx.send_replace(false);
        }
        for event in &events {
            self.listeners.emit(event);
        }
        keep_running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::playback::create_playback_controller;
    use crate::config::CacheConfig;
    use crate::infrastructure::adapters::{FakeAudioFetcher, FakePcmDecoder};
    use crate::infrastructure::memory::InMemoryAudioCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "/audio/lesson-dialogue.wav";

    /// 构造 payload 为 seconds × 1000 字节的资源（FakePcmDecoder 1kHz）
    fn controller_for(
        seconds: f64,
        config: PlaybackConfig,
    ) -> (Arc<PlaybackController>, Arc<FakeAudioFetcher>) {
        let fetcher = Arc::new(FakeAudioFetcher::new());
        fetcher.insert(URL, vec![0u8; (seconds * 1000.0) as usize]);
        let cache = InMemoryAudioCache::new(
            CacheConfig::default(),
            fetcher.clone(),
            Arc::new(FakePcmDecoder::new(1000)),
        )
        .arc();
        let controller = create_playback_controller(
            AudioResourceDescriptor::new(URL),
            config,
            cache,
        );
        (controller, fetcher)
    }

    fn event_counter(
        controller: &PlaybackController,
        kind: EventKind,
    ) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            controller.on(kind, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_clamps_to_bounds() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        controller.play().await.unwrap();
        controller.pause();

        controller.seek(-5.0);
        assert_eq!(controller.position_seconds(), 0.0);

        controller.seek(1000.0);
        assert_eq!(controller.position_seconds(), 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_snaps_to_fixed_set() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        controller.set_rate(1.1);
        assert_eq!(controller.rate(), 1.0);
        controller.set_rate(1.4);
        assert_eq!(controller.rate(), 1.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_clamped() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        controller.set_volume(1.7);
        assert_eq!(controller.volume(), 1.0);
        controller.set_volume(-0.3);
        assert_eq!(controller.volume(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_advances_and_emits_timeupdate() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        let plays = event_counter(&controller, EventKind::Play);
        let ticks = event_counter(&controller, EventKind::TimeUpdate);
        let metadata = event_counter(&controller, EventKind::LoadedMetadata);

        controller.play().await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(controller.is_playing());
        assert!(controller.position_seconds() > 0.5);
        assert_eq!(plays.load(Ordering::SeqCst), 1);
        assert_eq!(metadata.load(Ordering::SeqCst), 1);
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_noop_when_already_paused() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        let pauses = event_counter(&controller, EventKind::Pause);

        controller.pause(); // 未播放
        controller.play().await.unwrap();
        controller.pause();
        controller.pause();

        assert_eq!(pauses.load(Ordering::SeqCst), 1);
        assert!(!controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_resets_position() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        controller.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.stop();

        assert!(!controller.is_playing());
        assert_eq!(controller.position_seconds(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_segment_playback_terminates_at_end() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        controller.play_segment(10.0, 15.0).await.unwrap();

        assert!(!controller.is_playing());
        assert!(controller.position_seconds() >= 15.0 - 1e-3);
        assert!(controller.position_seconds() < 15.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_segment_resolves_early_on_pause() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.play_segment(10.0, 15.0).await })
        };
        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.pause();

        pending.await.unwrap().unwrap();
        assert!(controller.position_seconds() < 14.9);
        assert!(controller.position_seconds() >= 11.9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_segment_resolves_after_destroy() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.play_segment(10.0, 15.0).await })
        };
        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.destroy();

        // 等待必须随销毁结束，不得一直挂起
        let result = tokio::time::timeout(Duration::from_secs(60), pending)
            .await
            .expect("segment wait should settle after destroy")
            .unwrap();
        assert!(result.is_ok());
        assert!(!controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_forward_mid_segment_reschedules_end() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());

        let started = Instant::now();
        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.play_segment(10.0, 15.0).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.seek(14.5);

        pending.await.unwrap().unwrap();
        let elapsed = started.elapsed().as_secs_f64();

        // 前跳后只剩 0.5s，不得等到原截止时刻才暂停
        assert!(elapsed < 2.0, "elapsed = {}", elapsed);
        assert!((controller.position_seconds() - 15.0).abs() < 0.01);
        assert!(!controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_change_mid_segment_reschedules_end() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());

        let started = Instant::now();
        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.play_segment(0.0, 8.0).await })
        };
        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.set_rate(2.0);

        pending.await.unwrap().unwrap();
        let elapsed = started.elapsed().as_secs_f64();

        // 2s @ 1.0 + 剩余 6s @ 2.0 = 5s
        assert!((elapsed - 5.0).abs() < 0.1, "elapsed = {}", elapsed);
        assert!((controller.position_seconds() - 8.0).abs() < 0.01);
        assert!(!controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_segment_rejects_invalid_bounds() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());

        let result = controller.play_segment(15.0, 10.0).await;
        assert!(matches!(result, Err(PlaybackError::InvalidSegment { .. })));

        let result = controller.play_segment(-1.0, 5.0).await;
        assert!(matches!(result, Err(PlaybackError::InvalidSegment { .. })));

        let result = controller.play_segment(5.0, 31.0).await;
        assert!(matches!(result, Err(PlaybackError::InvalidSegment { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_segment_plays_three_times_with_gaps() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        let plays = event_counter(&controller, EventKind::Play);

        let started = Instant::now();
        controller.repeat_segment(0.0, 2.0, 3).await.unwrap();
        let elapsed = started.elapsed().as_secs_f64();

        assert_eq!(plays.load(Ordering::SeqCst), 3);
        // 3 × 2s 播放 + 2 × 0.5s 停顿
        assert!((elapsed - 7.0).abs() < 0.5, "elapsed = {}", elapsed);
        assert!(!controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_then_replay_restarts_from_zero() {
        let (controller, _) = controller_for(1.0, PlaybackConfig::default());
        let ended = event_counter(&controller, EventKind::Ended);

        controller.play().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(controller.state(), SessionState::Ended);
        assert_eq!(controller.position_seconds(), 1.0);
        assert_eq!(ended.load(Ordering::SeqCst), 1);

        controller.play().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.is_playing());
        assert!(controller.position_seconds() < 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_loop_wraps_without_ending() {
        let config = PlaybackConfig {
            auto_loop: true,
            ..Default::default()
        };
        let (controller, _) = controller_for(1.0, config);
        let ended = event_counter(&controller, EventKind::Ended);

        controller.play().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2600)).await;

        assert!(controller.is_playing());
        assert_eq!(ended.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_scales_progress() {
        let config = PlaybackConfig {
            rate: 2.0,
            ..Default::default()
        };
        let (controller, _) = controller_for(30.0, config);
        controller.play().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        controller.pause();

        let position = controller.position_seconds();
        assert!((position - 4.0).abs() < 0.1, "position = {}", position);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_is_idempotent_and_rejects_play() {
        let (controller, _) = controller_for(30.0, PlaybackConfig::default());
        controller.play().await.unwrap();

        controller.destroy();
        controller.destroy();

        assert!(matches!(
            controller.play().await,
            Err(PlaybackError::Destroyed)
        ));
        assert!(matches!(
            controller.play_segment(0.0, 1.0).await,
            Err(PlaybackError::Destroyed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_emits_error_then_retry_succeeds() {
        let (controller, fetcher) = controller_for(30.0, PlaybackConfig::default());
        let errors = event_counter(&controller, EventKind::Error);
        fetcher.fail_with(
            URL,
            crate::application::ports::FetchError::Status {
                url: URL.to_string(),
                status: 500,
            },
        );

        let result = controller.play().await;
        assert!(matches!(result, Err(PlaybackError::Load(_))));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SessionState::LoadFailed);

        // 资源恢复后重试成功
        fetcher.clear_failure(URL);
        controller.play().await.unwrap();
        assert!(controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_hint_used_before_load() {
        let fetcher = Arc::new(FakeAudioFetcher::new());
        fetcher.insert(URL, vec![0u8; 30_000]);
        let cache = InMemoryAudioCache::new(
            CacheConfig::default(),
            fetcher.clone(),
            Arc::new(FakePcmDecoder::new(1000)),
        )
        .arc();
        let controller = create_playback_controller(
            AudioResourceDescriptor::new(URL).with_duration_hint(42.0),
            PlaybackConfig::default(),
            cache,
        );

        assert_eq!(controller.duration_seconds(), 42.0);
        controller.play().await.unwrap();
        // 真实时长取代 hint
        assert_eq!(controller.duration_seconds(), 30.0);
    }
}
