//! 播放错误定义

use thiserror::Error;

use crate::application::ports::CacheError;

/// 播放错误
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// 资源加载失败（下载或解码）
    #[error("Failed to load audio resource: {0}")]
    Load(#[from] CacheError),

    /// 片段边界非法
    #[error("Invalid segment bounds: start={start}, end={end}, duration={duration}")]
    InvalidSegment {
        start: f64,
        end: f64,
        duration: f64,
    },

    /// 控制器已销毁
    #[error("Controller has been destroyed")]
    Destroyed,
}
