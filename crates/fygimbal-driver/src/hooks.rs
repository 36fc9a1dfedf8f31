//! 钩子系统（Hook System）
//!
//! 接收线程在收到数据包、飞行器传感器数据或诊断数据报时触发观察者回调。
//!
//! # 设计原则
//!
//! - **非阻塞**: 回调在接收线程中执行，应尽快返回，耗时处理请转发到 Channel
//! - **隔离**: 单个回调 panic 不会影响其他回调，也不会终止接收线程
//!
//! # 使用示例
//!
//! ```rust
//! use fygimbal_driver::hooks::{ChannelObserver, HookManager, LinkObserver, TelemetryEvent};
//! use fygimbal_driver::FlyerSensors;
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! let (observer, rx) = ChannelObserver::new(16);
//! hooks.add_observer(Arc::new(observer) as Arc<dyn LinkObserver>);
//!
//! hooks.trigger_flyer_sensors(&FlyerSensors { values: vec![1, 2, 3] });
//! assert!(matches!(rx.try_recv(), Ok(TelemetryEvent::FlyerSensors(_))));
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use fygimbal_link::FlyerSensors;
use fygimbal_protocol::Packet;
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// 链路观察者
///
/// 所有方法都有空的默认实现，只需覆盖关心的事件。
///
/// # 示例
///
/// ```rust
/// use fygimbal_driver::hooks::LinkObserver;
/// use fygimbal_driver::FlyerSensors;
/// use crossbeam_channel::{Sender, bounded};
///
/// struct SensorForwarder {
///     sender: Sender<Vec<i32>>,
/// }
///
/// impl LinkObserver for SensorForwarder {
///     fn on_flyer_sensors(&self, sensors: &FlyerSensors) {
///         // 使用 try_send，非阻塞
///         let _ = self.sender.try_send(sensors.values.clone());
///     }
/// }
/// ```
pub trait LinkObserver: Send + Sync {
    /// 解码出一个来自对端的云台数据包（分发之前调用）
    fn on_packet(&self, packet: &Packet) {
        let _ = packet;
    }

    /// 数据包发送成功后调用
    fn on_packet_sent(&self, packet: &Packet) {
        let _ = packet;
    }

    /// 收到飞行器传感器数据
    fn on_flyer_sensors(&self, sensors: &FlyerSensors) {
        let _ = sensors;
    }

    /// 诊断数据报：未知标签，或来自非对端地址
    fn on_raw_datagram(&self, src: SocketAddr, datagram: &[u8]) {
        let _ = (src, datagram);
    }
}

/// 钩子管理器
///
/// 回调列表本身不是线程安全的，需要外部同步（`GimbalContext` 中为 `RwLock<HookManager>`）。
/// 每个 `trigger_*` 返回失败（panic）的回调数量，由调用方计入指标。
#[derive(Default)]
pub struct HookManager {
    observers: Vec<Arc<dyn LinkObserver>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LinkObserver>) {
        self.observers.push(observer);
    }

    /// 移除所有观察者
    pub fn clear(&mut self) {
        self.observers.clear();
    }

    fn trigger(&self, event: &str, f: impl Fn(&dyn LinkObserver)) -> usize {
        let mut failures = 0;
        for observer in self.observers.iter() {
            if catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))).is_err() {
                warn!("Observer panicked while handling {}", event);
                failures += 1;
            }
        }
        failures
    }

    pub fn trigger_packet(&self, packet: &Packet) -> usize {
        self.trigger("packet", |o| o.on_packet(packet))
    }

    pub fn trigger_packet_sent(&self, packet: &Packet) -> usize {
        self.trigger("sent packet", |o| o.on_packet_sent(packet))
    }

    pub fn trigger_flyer_sensors(&self, sensors: &FlyerSensors) -> usize {
        self.trigger("flyer sensors", |o| o.on_flyer_sensors(sensors))
    }

    pub fn trigger_raw_datagram(&self, src: SocketAddr, datagram: &[u8]) -> usize {
        self.trigger("raw datagram", |o| o.on_raw_datagram(src, datagram))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

/// 遥测事件（由 `ChannelObserver` 转发）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    Packet(Packet),
    FlyerSensors(FlyerSensors),
    Raw { src: SocketAddr, data: Vec<u8> },
}

/// 把观察到的事件转发到有界 Channel
///
/// 队列满时丢弃事件并计数，绝不阻塞接收线程。
pub struct ChannelObserver {
    sender: Sender<TelemetryEvent>,
    dropped: AtomicU64,
}

impl ChannelObserver {
    /// 创建观察者和对应的接收端
    pub fn new(capacity: usize) -> (Self, Receiver<TelemetryEvent>) {
        let (sender, receiver) = bounded(capacity);
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// 因队列满而丢弃的事件数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn forward(&self, event: TelemetryEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {},
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            },
            // 接收端已经不在了，没有人关心
            Err(TrySendError::Disconnected(_)) => {},
        }
    }
}

impl LinkObserver for ChannelObserver {
    fn on_packet(&self, packet: &Packet) {
        self.forward(TelemetryEvent::Packet(packet.clone()));
    }

    fn on_flyer_sensors(&self, sensors: &FlyerSensors) {
        self.forward(TelemetryEvent::FlyerSensors(sensors.clone()));
    }

    fn on_raw_datagram(&self, src: SocketAddr, datagram: &[u8]) {
        self.forward(TelemetryEvent::Raw {
            src,
            data: datagram.to_vec(),
        });
    }
}
