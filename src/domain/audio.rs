//! 音频领域对象
//!
//! AudioBuffer: 解码后的交错 f32 PCM 数据，入缓存后不可变
//! AudioResourceDescriptor: 调用方提供的音频资源描述

/// 固定播放倍速集合
///
/// setRate 永远吸附到此集合中最近的值，不接受任意浮点数
pub const PLAYBACK_RATES: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// 将任意倍速吸附到固定集合中最近的值
///
/// 距离相等时取较小的候选值
pub fn snap_rate(rate: f64) -> f64 {
    let mut best = PLAYBACK_RATES[0];
    for &candidate in &PLAYBACK_RATES[1..] {
        if (candidate - rate).abs() < (best - rate).abs() {
            best = candidate;
        }
    }
    best
}

/// 解码后的 PCM 音频数据
///
/// 样本为交错排列的 32 位浮点（[L, R, L, R, ...]），
/// 字节占用按 样本数 × 4 计算
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioBuffer {
    /// 由解码器产出创建
    ///
    /// channels 与 sample_rate 必须非零，samples 长度必须是 channels 的整数倍
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        debug_assert!(channels > 0 && sample_rate > 0);
        debug_assert_eq!(samples.len() % channels.max(1) as usize, 0);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// 交错 PCM 样本
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// 声道数
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// 采样率 (Hz)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 帧数（每帧包含所有声道各一个样本）
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// 内存占用（字节）= 样本数 × 4（32 位浮点样本）
    pub fn size_bytes(&self) -> u64 {
        self.samples.len() as u64 * 4
    }

    /// 音频时长（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// 音频资源描述
///
/// 由调用方（练习 UI）提供，对缓存与播放器而言
/// transcript / accent 只是透传的展示元数据
#[derive(Debug, Clone)]
pub struct AudioResourceDescriptor {
    /// 可下载的音频地址，同时作为缓存 key
    pub url: String,
    /// 已知时长（秒），在真实时长可用前作为回退值
    pub duration_hint: Option<f64>,
    /// 语音内容的完整文本
    pub transcript: Option<String>,
    /// 口音分类标签（如 "standard" / "regional-variant"）
    pub accent: Option<String>,
}

impl AudioResourceDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            duration_hint: None,
            transcript: None,
            accent: None,
        }
    }

    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn with_accent(mut self, accent: impl Into<String>) -> Self {
        self.accent = Some(accent.into());
        self
    }
}
