//! Lauscher - 听力练习音频核心
//!
//! 为语言学习前端提供听力题所需的音频基础设施：
//! 有界内存的解码音频缓存（LRU 淘汰 + 并发请求去重），以及
//! 面向单个音频资源的播放控制器（片段播放、倍速、事件订阅）。
//!
//! 架构设计: Hexagonal Architecture (Ports & Adapters)
//!
//! 领域层 (domain/):
//! - AudioBuffer: 解码后的交错 PCM 音频数据
//! - AudioResourceDescriptor: 音频资源描述（URL + 展示元数据）
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AudioCache, AudioFetcher, AudioDecoder）
//! - Playback: 播放控制器（状态机 + 事件系统 + 片段播放）
//!
//! 基础设施层 (infrastructure/):
//! - Memory: InMemoryAudioCache（字节预算 LRU + in-flight 去重）
//! - Adapters: HTTP 下载器、Symphonia 解码器、测试用 Fake 实现

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::playback::{
    create_playback_controller, ErrorKind, EventKind, ListenerHandle, PlaybackController,
    PlaybackError, PlayerEvent, SessionState,
};
pub use application::ports::{
    AudioCachePort, AudioDecoderPort, AudioFetcherPort, CacheError, CacheStats, DecodeError,
    FetchError,
};
pub use config::{CacheConfig, PlaybackConfig};
pub use domain::audio::{snap_rate, AudioBuffer, AudioResourceDescriptor, PLAYBACK_RATES};
pub use infrastructure::adapters::{
    FakeAudioFetcher, FakePcmDecoder, HttpAudioFetcher, SymphoniaDecoder,
};
pub use infrastructure::memory::InMemoryAudioCache;
