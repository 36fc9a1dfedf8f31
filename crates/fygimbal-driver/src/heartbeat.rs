//! Link liveness monitoring
//!
//! 记录最近一次收到对端数据包的时间。只用于诊断：
//! 握手建立的 `connected` 状态不会因为链路静默而回退。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 链路活性监视器
///
/// 时间戳以实例创建时刻为基准的微秒数存储在原子变量中，
/// 接收线程写、任意线程读，无需加锁。
#[derive(Debug)]
pub struct ConnectionMonitor {
    anchor: Instant,
    /// 0 表示从未收到数据包；否则为 `elapsed_us + 1`
    last_packet: AtomicU64,
}

impl ConnectionMonitor {
    /// Create a monitor that has not seen any packet yet
    ///
    /// # Example
    /// ```
    /// # use fygimbal_driver::heartbeat::ConnectionMonitor;
    /// # use std::time::Duration;
    /// let monitor = ConnectionMonitor::new();
    /// assert!(!monitor.is_alive(Duration::from_secs(1)));
    ///
    /// monitor.register_packet();
    /// assert!(monitor.is_alive(Duration::from_secs(1)));
    /// ```
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            last_packet: AtomicU64::new(0),
        }
    }

    fn now_micros(&self) -> u64 {
        self.anchor.elapsed().as_micros() as u64
    }

    /// Register a datagram received from the peer
    pub fn register_packet(&self) {
        let now = self.now_micros().saturating_add(1);
        self.last_packet.store(now, Ordering::Relaxed);
    }

    /// Time since the last packet, `None` if nothing was ever received
    pub fn time_since_last_packet(&self) -> Option<Duration> {
        match self.last_packet.load(Ordering::Relaxed) {
            0 => None,
            last => {
                let elapsed_us = self.now_micros().saturating_add(1).saturating_sub(last);
                Some(Duration::from_micros(elapsed_us))
            },
        }
    }

    /// Returns true if a packet arrived within `window`
    pub fn is_alive(&self, window: Duration) -> bool {
        self.time_since_last_packet()
            .is_some_and(|elapsed| elapsed < window)
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}
