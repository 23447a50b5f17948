//! Fake PCM Decoder - 用于测试的解码器
//!
//! 将输入字节当作无符号 8-bit 单声道 PCM：一个字节对应
//! 一个 f32 样本。条目字节占用因此可以在测试里精确控制
//! （n 字节输入 → n × 4 字节缓冲）

use async_trait::async_trait;

use crate::application::ports::{AudioDecoderPort, DecodeError};
use crate::domain::audio::AudioBuffer;

/// Fake PCM 解码器
pub struct FakePcmDecoder {
    sample_rate: u32,
}

impl FakePcmDecoder {
    /// 指定输出采样率创建；时长 = 字节数 / sample_rate 秒
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[async_trait]
impl AudioDecoderPort for FakePcmDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> Result<AudioBuffer, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let samples = bytes
            .iter()
            .map(|b| (*b as f32 - 128.0) / 128.0)
            .collect();
        Ok(AudioBuffer::new(samples, 1, self.sample_rate))
    }
}
