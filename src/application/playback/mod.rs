//! 播放控制器
//!
//! 单个音频资源的传输控制（播放/暂停/定位/音量/倍速）、
//! 片段播放与事件订阅。缓存实例显式注入，
//! 控制器之间除共享缓存外互不影响

mod controller;
mod error;
mod events;

pub use controller::{PlaybackController, SessionState};
pub use error::PlaybackError;
pub use events::{ErrorKind, EventKind, ListenerHandle, PlayerEvent};

use std::sync::Arc;

use crate::application::ports::AudioCachePort;
use crate::config::PlaybackConfig;
use crate::domain::audio::AudioResourceDescriptor;

/// 为资源创建播放控制器
///
/// 构造不阻塞、不加载；元数据在首次 play/play_segment
/// 时通过 loadedmetadata 事件到达
pub fn create_playback_controller(
    resource: AudioResourceDescriptor,
    config: PlaybackConfig,
    cache: Arc<dyn AudioCachePort>,
) -> Arc<PlaybackController> {
    PlaybackController::new(resource, config, cache)
}
