//! 连接状态与共享上下文
//!
//! 连接状态和固件版本放在同一个监视器（Mutex + Condvar）中；
//! 等待握手的调用线程阻塞在条件变量上，由接收线程唤醒。

use crate::error::DriverError;
use crate::heartbeat::ConnectionMonitor;
use crate::hooks::HookManager;
use crate::metrics::GimbalMetrics;
use fygimbal_protocol::{FirmwareVersion, Packet};
use parking_lot::{Condvar, Mutex, RwLock};
use std::time::Duration;
use tracing::{info, trace};

/// 连接状态快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub version: Option<FirmwareVersion>,
}

#[derive(Debug, Default)]
struct Inner {
    state: ConnectionState,
    /// 接收线程已退出
    closed: bool,
}

/// 连接监视器
///
/// `connected` 只会从 false 变为 true，不会自动回退。
#[derive(Debug, Default)]
pub struct LinkState {
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl LinkState {
    pub fn new(connected: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState {
                    connected,
                    version: None,
                },
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn snapshot(&self) -> ConnectionState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().state.connected
    }

    pub fn version(&self) -> Option<FirmwareVersion> {
        self.inner.lock().state.version
    }

    /// 记录版本上报（覆盖旧值）
    pub fn set_version(&self, version: FirmwareVersion) {
        self.inner.lock().state.version = Some(version);
    }

    /// 仅在版本未知时写入，返回是否写入
    pub fn seed_version(&self, version: FirmwareVersion) -> bool {
        let mut inner = self.inner.lock();
        if inner.state.version.is_some() {
            return false;
        }
        inner.state.version = Some(version);
        true
    }

    /// 标记为已连接并唤醒所有等待者
    pub fn mark_connected(&self) {
        let mut inner = self.inner.lock();
        inner.state.connected = true;
        self.cond.notify_all();
    }

    /// 处理握手
    ///
    /// 在持有监视器锁的情况下切换到已连接并调用 `send_ack`，然后唤醒所有等待者。
    /// 应答先于任何被唤醒线程的数据包发出。`send_ack` 不得再访问本监视器。
    ///
    /// 返回本次是否发生了状态切换。
    pub fn attach<E>(&self, send_ack: impl FnOnce() -> Result<(), E>) -> Result<bool, E> {
        let mut inner = self.inner.lock();
        let newly_connected = !inner.state.connected;
        inner.state.connected = true;
        let result = send_ack();
        self.cond.notify_all();
        drop(inner);
        result.map(|()| newly_connected)
    }

    /// 接收线程退出时调用，唤醒所有等待者
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// 等待握手完成
    ///
    /// # 错误
    /// - `DriverError::Closed`: 接收线程已退出
    /// - `DriverError::Timeout`: 超时仍未连接
    pub fn wait_connected(&self, timeout: Duration) -> Result<(), DriverError> {
        let mut inner = self.inner.lock();
        if !inner.closed && !inner.state.connected {
            self.cond.wait_while_for(
                &mut inner,
                |inner| !inner.closed && !inner.state.connected,
                timeout,
            );
        }
        if inner.closed {
            Err(DriverError::Closed)
        } else if inner.state.connected {
            Ok(())
        } else {
            Err(DriverError::Timeout)
        }
    }
}

/// 接收线程与调用线程共享的上下文
pub struct GimbalContext {
    /// 连接监视器
    pub link: LinkState,
    /// 性能指标
    pub metrics: GimbalMetrics,
    /// 观察者
    pub hooks: RwLock<HookManager>,
    /// 链路活性
    pub liveness: ConnectionMonitor,
    /// 逐包日志
    pub verbose: bool,
}

impl GimbalContext {
    pub fn new(connected: bool, verbose: bool) -> Self {
        Self {
            link: LinkState::new(connected),
            metrics: GimbalMetrics::new(),
            hooks: RwLock::new(HookManager::new()),
            liveness: ConnectionMonitor::new(),
            verbose,
        }
    }

    /// 记录一个数据包事件（verbose 时为 info，否则为 trace）
    pub fn log_packet(&self, direction: &str, packet: &Packet) {
        if self.verbose {
            info!("{} {}", direction, packet);
        } else {
            trace!("{} {}", direction, packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_initial_state() {
        let state = LinkState::new(false);
        assert_eq!(state.snapshot(), ConnectionState::default());
        assert!(LinkState::new(true).is_connected());
    }

    #[test]
    fn test_wait_connected_times_out() {
        let state = LinkState::new(false);
        let start = Instant::now();
        let err = state.wait_connected(Duration::from_millis(50)).unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_attach_wakes_waiters() {
        let state = Arc::new(LinkState::new(false));

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let state = state.clone();
                thread::spawn(move || state.wait_connected(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        let newly = state.attach(|| Ok::<(), DriverError>(())).unwrap();
        assert!(newly);

        for waiter in waiters {
            assert!(waiter.join().unwrap().is_ok());
        }
    }

    #[test]
    fn test_attach_twice_reports_no_transition() {
        let state = LinkState::new(false);
        let mut acks = 0;
        assert!(state.attach(|| Ok::<(), DriverError>(acks += 1)).unwrap());
        assert!(!state.attach(|| Ok::<(), DriverError>(acks += 1)).unwrap());
        // 每次握手都会应答
        assert_eq!(acks, 2);
        assert!(state.is_connected());
    }

    #[test]
    fn test_attach_ack_failure_still_connects() {
        let state = LinkState::new(false);
        let result = state.attach(|| Err(DriverError::IoThread("send failed".into())));
        assert!(result.is_err());
        assert!(state.is_connected());
    }

    #[test]
    fn test_close_wakes_waiters_with_closed() {
        let state = Arc::new(LinkState::new(false));
        let waiter = {
            let state = state.clone();
            thread::spawn(move || state.wait_connected(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(50));
        state.close();

        assert!(matches!(waiter.join().unwrap(), Err(DriverError::Closed)));
        assert!(state.is_closed());
    }

    #[test]
    fn test_seed_version_keeps_existing() {
        let state = LinkState::new(false);
        assert!(state.seed_version(FirmwareVersion::from_hundredths(250)));
        assert!(!state.seed_version(FirmwareVersion::from_hundredths(300)));
        assert_eq!(state.version(), Some(FirmwareVersion::from_hundredths(250)));

        state.set_version(FirmwareVersion::from_hundredths(310));
        assert_eq!(state.version(), Some(FirmwareVersion::from_hundredths(310)));
    }
}
