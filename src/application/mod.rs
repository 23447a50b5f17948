//! 应用层
//!
//! Ports: 缓存/下载/解码端口定义
//! Playback: 播放控制器与事件系统

pub mod playback;
pub mod ports;
