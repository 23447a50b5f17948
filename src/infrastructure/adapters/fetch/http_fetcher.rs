//! HTTP Audio Fetcher - 通过 HTTP 下载音频资源
//!
//! 实现 AudioFetcherPort trait，使用 reqwest 拉取编码音频字节

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{AudioFetcherPort, FetchError};

/// HTTP 下载器配置
#[derive(Debug, Clone)]
pub struct HttpAudioFetcherConfig {
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpAudioFetcherConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpAudioFetcherConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 音频下载器
pub struct HttpAudioFetcher {
    client: Client,
}

impl HttpAudioFetcher {
    /// 创建新的 HTTP 下载器
    pub fn new(config: HttpAudioFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    /// 使用默认配置创建
    pub fn with_default_config() -> Result<Self, FetchError> {
        Self::new(HttpAudioFetcherConfig::default())
    }
}

#[async_trait]
impl AudioFetcherPort for HttpAudioFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Fetching audio resource");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        tracing::debug!(url = %url, size_bytes = bytes.len(), "Audio resource fetched");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_network_error() {
        let fetcher = HttpAudioFetcher::with_default_config().unwrap();
        // 端口 1 上没有服务，连接立即被拒绝
        let result = fetcher.fetch("http://127.0.0.1:1/clip.mp3").await;
        assert!(matches!(
            result,
            Err(FetchError::Network(_)) | Err(FetchError::Timeout)
        ));
    }
}
