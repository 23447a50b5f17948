//! 应用层端口定义
//!
//! 所有端口均为 async trait，具体实现位于 infrastructure/

mod audio_cache;
mod audio_decoder;
mod audio_fetcher;

pub use audio_cache::{AudioCachePort, CacheError, CacheStats};
pub use audio_decoder::{AudioDecoderPort, DecodeError};
pub use audio_fetcher::{AudioFetcherPort, FetchError};
