//! 领域层
//!
//! Audio Context: 解码音频数据与资源描述

pub mod audio;
