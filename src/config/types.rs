//! Configuration Types
//!
//! 定义缓存与播放的配置结构体

use serde::Deserialize;

/// 音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存总字节预算上限
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

impl CacheConfig {
    /// 指定字节预算创建配置
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

fn default_max_bytes() -> u64 {
    50 * 1024 * 1024 // 50 MiB
}

/// 播放控制器初始配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 初始音量 [0.0, 1.0]
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// 初始播放倍速（会被吸附到固定倍速集合）
    #[serde(default = "default_rate")]
    pub rate: f64,

    /// 播放到结尾时是否自动从头循环
    #[serde(default)]
    pub auto_loop: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            rate: default_rate(),
            auto_loop: false,
        }
    }
}

fn default_volume() -> f32 {
    0.8
}

fn default_rate() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default_budget() {
        let config = CacheConfig::default();
        assert_eq!(config.max_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_playback_config_defaults() {
        let config = PlaybackConfig::default();
        assert_eq!(config.volume, 0.8);
        assert_eq!(config.rate, 1.0);
        assert!(!config.auto_loop);
    }

    #[test]
    fn test_playback_config_deserialize_partial() {
        let config: PlaybackConfig = serde_json::from_str(r#"{"rate": 1.5}"#).unwrap();
        assert_eq!(config.rate, 1.5);
        assert_eq!(config.volume, 0.8);
    }
}
