//! Audio Cache Port - 音频缓存管理
//!
//! 定义音频缓存的抽象接口，具体实现为内存 LRU 缓存
//!
//! 缓存以资源 URL 为 key，保存解码后的 PCM 缓冲，
//! 总字节数受预算约束，超出时按最久未访问淘汰

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::{DecodeError, FetchError};
use crate::domain::audio::AudioBuffer;

/// 缓存加载错误
///
/// 去重的并发请求共享同一次加载结果，失败时所有等待方
/// 收到同一个错误，因此保持 Clone
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// 资源下载失败
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// 字节无法解码为音频
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// 缓存统计信息（只读快照，无副作用）
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// 当前条目数
    pub entry_count: usize,
    /// 当前总字节数
    pub total_bytes: u64,
    /// 字节预算上限
    pub max_bytes: u64,
    /// 命中次数
    pub hit_count: u64,
    /// 未命中次数
    pub miss_count: u64,
}

/// Audio Cache Port
///
/// 有界内存的解码音频缓存：
/// - 同一 URL 的并发 get/preload 合并为一次下载+解码
/// - 插入超出预算时同步淘汰最久未访问的条目
/// - 失败的加载不会留下任何条目
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 预加载资源（幂等）
    ///
    /// 已缓存时只刷新访问时间；有同 URL 请求在途时
    /// 等待并复用该次加载，不发起重复下载
    async fn preload(&self, url: &str) -> Result<(), CacheError>;

    /// 获取解码缓冲，未命中时执行与 preload 相同的加载流程
    ///
    /// 命中同时更新访问时间（LRU touch）
    async fn get(&self, url: &str) -> Result<Arc<AudioBuffer>, CacheError>;

    /// 清空全部条目，总字节数归零
    ///
    /// 不会向已清空的缓存回填在途解码的结果；
    /// 在途请求的等待方仍会正常拿到缓冲
    fn clear(&self);

    /// 获取缓存统计信息
    fn stats(&self) -> CacheStats;

    /// 批量预热（best-effort）
    ///
    /// 单个资源失败只记录日志，不阻断其余资源，
    /// 也不向调用方传播错误
    async fn preload_many(&self, urls: &[String]) {
        let results = join_all(urls.iter().map(|url| self.preload(url))).await;
        for (url, result) in urls.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(url = %url, error = %e, "Preload failed, skipping resource");
            }
        }
    }
}
