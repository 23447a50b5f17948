//! Audio Decoder Port - 音频解码
//!
//! 将编码音频字节解码为交错 f32 PCM，具体实现使用 Symphonia

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioBuffer;

/// 解码错误
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// 无法识别的容器/编码格式
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// 容器中没有可解码的音频轨道
    #[error("No decodable audio track found")]
    NoAudioTrack,

    /// 解码过程中出现不可恢复的错误
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// 解码结果为空（没有任何有效样本）
    #[error("Decoded stream contained no samples")]
    Empty,
}

/// Audio Decoder Port
///
/// 一次性解码整段音频；听力练习的音频都是短素材，
/// 不做流式解码
#[async_trait]
pub trait AudioDecoderPort: Send + Sync {
    /// 将编码字节解码为 PCM 缓冲
    async fn decode(&self, bytes: Vec<u8>) -> Result<AudioBuffer, DecodeError>;
}
