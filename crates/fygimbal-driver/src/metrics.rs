//! 链路性能指标
//!
//! 所有计数器都使用原子操作，可以在任何线程读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 链路实时指标
///
/// # 使用示例
///
/// ```rust
/// use fygimbal_driver::GimbalMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = GimbalMetrics::new();
/// metrics.rx_datagrams.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.rx_datagrams, 1);
/// ```
#[derive(Debug, Default)]
pub struct GimbalMetrics {
    /// 收到的数据报总数（包括来自未知地址的）
    pub rx_datagrams: AtomicU64,

    /// 来自非对端地址的数据报
    pub rx_foreign: AtomicU64,

    /// 解码出的云台数据包
    pub rx_packets: AtomicU64,

    /// 飞行器传感器数据报
    pub rx_flyer_sensors: AtomicU64,

    /// 未知标签的数据报
    pub rx_unknown: AtomicU64,

    /// 解码器检测到的 CRC 错误
    pub crc_errors: AtomicU64,

    /// 进入应答队列的数据包
    pub responses_queued: AtomicU64,

    /// 等待应答时丢弃的命令不匹配数据包
    pub responses_ignored: AtomicU64,

    /// 没有处理规则的数据包
    pub packets_unhandled: AtomicU64,

    /// 发送的数据包总数（含握手应答）
    pub tx_packets: AtomicU64,

    /// 事务发送尝试次数（每次重试计一次）
    pub transaction_attempts: AtomicU64,

    /// 单次尝试超时次数
    pub transaction_timeouts: AtomicU64,

    /// 分发回调或观察者失败（返回错误或 panic）次数
    pub handler_failures: AtomicU64,

    /// socket 接收错误次数
    pub socket_errors: AtomicU64,
}

impl GimbalMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 计数器加一
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    ///
    /// 各计数器分别原子读取，彼此之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rx_datagrams: self.rx_datagrams.load(Ordering::Relaxed),
            rx_foreign: self.rx_foreign.load(Ordering::Relaxed),
            rx_packets: self.rx_packets.load(Ordering::Relaxed),
            rx_flyer_sensors: self.rx_flyer_sensors.load(Ordering::Relaxed),
            rx_unknown: self.rx_unknown.load(Ordering::Relaxed),
            crc_errors: self.crc_errors.load(Ordering::Relaxed),
            responses_queued: self.responses_queued.load(Ordering::Relaxed),
            responses_ignored: self.responses_ignored.load(Ordering::Relaxed),
            packets_unhandled: self.packets_unhandled.load(Ordering::Relaxed),
            tx_packets: self.tx_packets.load(Ordering::Relaxed),
            transaction_attempts: self.transaction_attempts.load(Ordering::Relaxed),
            transaction_timeouts: self.transaction_timeouts.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            socket_errors: self.socket_errors.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器（用于测试）
    pub fn reset(&self) {
        for counter in [
            &self.rx_datagrams,
            &self.rx_foreign,
            &self.rx_packets,
            &self.rx_flyer_sensors,
            &self.rx_unknown,
            &self.crc_errors,
            &self.responses_queued,
            &self.responses_ignored,
            &self.packets_unhandled,
            &self.tx_packets,
            &self.transaction_attempts,
            &self.transaction_timeouts,
            &self.handler_failures,
            &self.socket_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 指标快照（不可变）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rx_datagrams: u64,
    pub rx_foreign: u64,
    pub rx_packets: u64,
    pub rx_flyer_sensors: u64,
    pub rx_unknown: u64,
    pub crc_errors: u64,
    pub responses_queued: u64,
    pub responses_ignored: u64,
    pub packets_unhandled: u64,
    pub tx_packets: u64,
    pub transaction_attempts: u64,
    pub transaction_timeouts: u64,
    pub handler_failures: u64,
    pub socket_errors: u64,
}

impl MetricsSnapshot {
    /// 单次尝试超时率（百分比）
    ///
    /// 没有任何尝试时返回 0.0。
    pub fn timeout_rate(&self) -> f64 {
        if self.transaction_attempts == 0 {
            return 0.0;
        }
        (self.transaction_timeouts as f64 / self.transaction_attempts as f64) * 100.0
    }
}
