//! Audio Fetcher Port - 音频资源下载
//!
//! 定义音频资源获取的抽象接口，具体实现使用 reqwest（HTTP）
//! 或测试用的内存 Fake

use async_trait::async_trait;
use thiserror::Error;

/// 下载错误
///
/// 错误需要在去重的并发请求之间广播，因此保持 Clone，
/// 底层错误以字符串形式携带
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// 传输层失败（连接失败、DNS 解析失败等）
    #[error("Network error: {0}")]
    Network(String),

    /// 服务端返回非成功状态码
    #[error("Unexpected status {status} fetching {url}")]
    Status { url: String, status: u16 },

    /// 请求超时
    #[error("Request timed out")]
    Timeout,

    /// 下载在完成前被中断（加载任务异常结束）
    #[error("Fetch interrupted before completion")]
    Interrupted,
}

/// Audio Fetcher Port
///
/// 拉取编码音频的原始字节，不做任何解码
#[async_trait]
pub trait AudioFetcherPort: Send + Sync {
    /// 下载 url 指向的资源，返回完整字节
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
