//! Fake Audio Fetcher - 用于测试的下载器
//!
//! 从内存表返回预先注册的字节，不产生任何网络请求；
//! 记录下载次数以便断言去重行为

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{AudioFetcherPort, FetchError};

/// Fake 下载器
///
/// 未注册的 URL 返回 404 Status 错误
pub struct FakeAudioFetcher {
    payloads: DashMap<String, Vec<u8>>,
    failures: DashMap<String, FetchError>,
    latency: Duration,
    fetch_count: AtomicUsize,
}

impl FakeAudioFetcher {
    pub fn new() -> Self {
        Self {
            payloads: DashMap::new(),
            failures: DashMap::new(),
            latency: Duration::ZERO,
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// 为每次下载附加固定延迟，用于制造并发窗口
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 注册 URL 对应的响应字节
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.payloads.insert(url.into(), bytes);
    }

    /// 注册 URL 对应的固定失败
    pub fn fail_with(&self, url: impl Into<String>, error: FetchError) {
        self.failures.insert(url.into(), error);
    }

    /// 取消 URL 的固定失败，模拟资源恢复
    pub fn clear_failure(&self, url: &str) {
        self.failures.remove(url);
    }

    /// 实际执行过的下载次数
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

impl Default for FakeAudioFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioFetcherPort for FakeAudioFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if let Some(error) = self.failures.get(url) {
            return Err(error.clone());
        }
        match self.payloads.get(url) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
