//! 播放事件系统
//!
//! 按事件类型订阅的回调注册表：
//! - 同一事件的多个订阅者按订阅顺序被调用
//! - on 返回稳定句柄，off 以句柄注销，不依赖回调同一性
//! - off 返回后该回调不会再被调用
//!
//! 事件 payload 可序列化，UI 层可直接转发为 JSON

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// 播放事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum PlayerEvent {
    /// 资源元数据就绪（真实时长已知）
    LoadedMetadata { duration_seconds: f64 },
    /// 播放实际开始
    Play,
    /// 播放暂停
    Pause,
    /// 播放到达资源末尾（未循环）
    Ended,
    /// 播放进度
    TimeUpdate {
        position_seconds: f64,
        duration_seconds: f64,
    },
    /// 异步失败（无直接调用方可拒绝时经此通道上报）
    Error {
        kind: ErrorKind,
        url: String,
        operation: String,
        message: String,
    },
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlayerEvent::LoadedMetadata { .. } => EventKind::LoadedMetadata,
            PlayerEvent::Play => EventKind::Play,
            PlayerEvent::Pause => EventKind::Pause,
            PlayerEvent::Ended => EventKind::Ended,
            PlayerEvent::TimeUpdate { .. } => EventKind::TimeUpdate,
            PlayerEvent::Error { .. } => EventKind::Error,
        }
    }
}

/// 事件类型（订阅 key）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    LoadedMetadata,
    Play,
    Pause,
    Ended,
    TimeUpdate,
    Error,
}

/// 错误事件分类
///
/// 事件通道只承载没有直接调用方可收错的异步失败，
/// 即加载路径的下载与解码；播放控制的失败都以
/// `PlaybackError` 经 Result 返回给调用方，不走事件通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Fetch,
    Decode,
}

/// 订阅句柄，off 时传回
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    kind: EventKind,
    id: Uuid,
}

type Callback = std::sync::Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// 回调注册表
///
/// 回调在 emit 调用线程上同步执行；回调内不得再调用
/// 同一控制器的 on/off，否则会在注册表锁上自锁
pub(crate) struct ListenerRegistry {
    channels: DashMap<EventKind, Vec<(Uuid, Callback)>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// 订阅某类事件，返回稳定句柄
    pub(crate) fn on(&self, kind: EventKind, callback: Callback) -> ListenerHandle {
        let id = Uuid::new_v4();
        self.channels.entry(kind).or_default().push((id, callback));
        ListenerHandle { kind, id }
    }

    /// 注销订阅；返回后该回调不再被调用
    pub(crate) fn off(&self, handle: &ListenerHandle) {
        if let Some(mut listeners) = self.channels.get_mut(&handle.kind) {
            listeners.retain(|(id, _)| *id != handle.id);
        }
    }

    /// 按订阅顺序调用所有订阅者
    pub(crate) fn emit(&self, event: &PlayerEvent) {
        if let Some(listeners) = self.channels.get(&event.kind()) {
            for (_, callback) in listeners.iter() {
                callback(event);
            }
        }
    }

    /// 清空全部订阅
    pub(crate) fn clear(&self) {
        self.channels.clear();
    }
}
