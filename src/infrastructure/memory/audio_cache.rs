//! In-Memory LRU Audio Cache Implementation
//!
//! 以 URL 为 key 缓存解码后的 PCM 缓冲：
//! - 总字节数受预算约束，插入时同步淘汰最久未访问的条目
//! - 同一 URL 的并发加载通过 in-flight 表合并为一次下载+解码
//! - 访问时间使用单调递增的 tick 计数，不存在时钟分辨率碰撞
//!
//! 所有共享状态集中在一把锁内，锁从不跨 await 持有，
//! 每次缓存变更对观察者而言都是原子的

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::application::ports::{
    AudioCachePort, AudioDecoderPort, AudioFetcherPort, CacheError, CacheStats, FetchError,
};
use crate::config::CacheConfig;
use crate::domain::audio::AudioBuffer;

type LoadResult = Result<Arc<AudioBuffer>, CacheError>;

/// 缓存条目
struct CacheEntry {
    buffer: Arc<AudioBuffer>,
    size_bytes: u64,
    /// 单调递增的访问序号，每次命中更新
    last_accessed: u64,
}

/// 锁内共享状态
///
/// 不变量：同一 URL 至多出现在 entries 与 in_flight 之一；
/// total_bytes 恒为 entries 内 size_bytes 之和
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    total_bytes: u64,
    /// url -> 在途加载的结果通道（None = 尚未结束）
    in_flight: HashMap<String, watch::Receiver<Option<LoadResult>>>,
    /// 访问序号发生器
    tick: u64,
    /// clear() 递增；旧世代的在途解码完成后不回填
    generation: u64,
}

/// 锁内判定的加载路径
enum Claim {
    /// 命中，已刷新访问时间
    Hit(Arc<AudioBuffer>),
    /// 同 URL 加载在途，等待其结果
    Join(watch::Receiver<Option<LoadResult>>),
    /// 本调用负责下载+解码
    Load {
        tx: watch::Sender<Option<LoadResult>>,
        generation: u64,
    },
}

/// 内存音频缓存
pub struct InMemoryAudioCache {
    fetcher: Arc<dyn AudioFetcherPort>,
    decoder: Arc<dyn AudioDecoderPort>,
    max_bytes: u64,
    inner: Mutex<CacheInner>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl InMemoryAudioCache {
    /// 创建新的缓存实例
    pub fn new(
        config: CacheConfig,
        fetcher: Arc<dyn AudioFetcherPort>,
        decoder: Arc<dyn AudioDecoderPort>,
    ) -> Self {
        tracing::info!(max_bytes = config.max_bytes, "InMemoryAudioCache initialized");
        Self {
            fetcher,
            decoder,
            max_bytes: config.max_bytes,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                total_bytes: 0,
                in_flight: HashMap::new(),
                tick: 0,
                generation: 0,
            }),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 锁内判定当前 URL 的加载路径
    fn claim(&self, url: &str) -> Claim {
        let mut inner = self.inner.lock().unwrap();

        if let Some(entry) = inner.entries.get(url) {
            let buffer = entry.buffer.clone();
            inner.tick += 1;
            let tick = inner.tick;
            if let Some(entry) = inner.entries.get_mut(url) {
                entry.last_accessed = tick;
            }
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Claim::Hit(buffer);
        }

        if let Some(rx) = inner.in_flight.get(url) {
            return Claim::Join(rx.clone());
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        inner.in_flight.insert(url.to_string(), rx);
        Claim::Load {
            tx,
            generation: inner.generation,
        }
    }

    /// 获取缓冲，未命中时按既定路径加载
    async fn get_or_load(&self, url: &str) -> LoadResult {
        match self.claim(url) {
            Claim::Hit(buffer) => Ok(buffer),
            Claim::Join(rx) => Self::join_in_flight(rx).await,
            Claim::Load { tx, generation } => self.load(url, tx, generation).await,
        }
    }

    /// 等待在途加载结束，拿到与发起方相同的结果
    async fn join_in_flight(mut rx: watch::Receiver<Option<LoadResult>>) -> LoadResult {
        loop {
            {
                let current = rx.borrow().clone();
                if let Some(result) = current {
                    return result;
                }
            }
            if rx.changed().await.is_err() {
                // 加载任务在发布结果前消失（被取消或 panic）
                return Err(CacheError::Fetch(FetchError::Interrupted));
            }
        }
    }

    /// 执行下载+解码，结算 in-flight 并广播结果
    async fn load(
        &self,
        url: &str,
        tx: watch::Sender<Option<LoadResult>>,
        generation: u64,
    ) -> LoadResult {
        let result: LoadResult = async {
            let bytes = self.fetcher.fetch(url).await?;
            let buffer = self.decoder.decode(bytes).await?;
            Ok(Arc::new(buffer))
        }
        .await;

        {
            let mut inner = self.inner.lock().unwrap();
            inner.in_flight.remove(url);

            match &result {
                Ok(buffer) => {
                    if inner.generation == generation {
                        Self::insert_locked(&mut inner, self.max_bytes, url, buffer.clone());
                    } else {
                        // clear() 赢得竞态：结果仍交付等待方，但不回填缓存
                        tracing::debug!(url = %url, "Cache cleared during load, result not inserted");
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Audio load failed");
                }
            }
        }

        // 等待方可能已全部离开，忽略发送失败
        let _ = tx.send(Some(result.clone()));
        result
    }

    /// 锁内插入条目，先淘汰直到预算满足或缓存为空
    ///
    /// 单个超预算的条目仍会插入（此时它独占整个缓存）
    fn insert_locked(inner: &mut CacheInner, max_bytes: u64, url: &str, buffer: Arc<AudioBuffer>) {
        let size_bytes = buffer.size_bytes();

        while inner.total_bytes + size_bytes > max_bytes && !inner.entries.is_empty() {
            Self::evict_lru_locked(inner);
        }

        inner.tick += 1;
        let last_accessed = inner.tick;
        inner.total_bytes += size_bytes;
        inner.entries.insert(
            url.to_string(),
            CacheEntry {
                buffer,
                size_bytes,
                last_accessed,
            },
        );

        tracing::debug!(
            url = %url,
            size_bytes = size_bytes,
            total_bytes = inner.total_bytes,
            "Audio cached"
        );
    }

    /// 锁内淘汰恰好一个最久未访问的条目
    fn evict_lru_locked(inner: &mut CacheInner) {
        let oldest = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(url, _)| url.clone());

        if let Some(url) = oldest {
            if let Some(entry) = inner.entries.remove(&url) {
                inner.total_bytes -= entry.size_bytes;
                tracing::debug!(
                    url = %url,
                    size_bytes = entry.size_bytes,
                    "LRU evicted cache entry"
                );
            }
        }
    }
}

#[async_trait]
impl AudioCachePort for InMemoryAudioCache {
    async fn preload(&self, url: &str) -> Result<(), CacheError> {
        self.get_or_load(url).await.map(|_| ())
    }

    async fn get(&self, url: &str) -> Result<Arc<AudioBuffer>, CacheError> {
        self.get_or_load(url).await
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.total_bytes = 0;
        inner.generation += 1;
        tracing::debug!(dropped_entries = dropped, "Audio cache cleared");
    }

    fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        CacheStats {
            entry_count: inner.entries.len(),
            total_bytes: inner.total_bytes,
            max_bytes: self.max_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
