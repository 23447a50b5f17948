//! 配置模块
//!
//! 本 crate 只有两个配置结构体：缓存预算与播放初始参数。
//! 不读取环境变量，不读取配置文件，由宿主应用构造并传入。

mod types;

pub use types::{CacheConfig, PlaybackConfig};
