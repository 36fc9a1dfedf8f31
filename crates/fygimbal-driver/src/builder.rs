//! Builder 模式实现
//!
//! 提供链式构造 `GimbalPort` 实例的便捷方式。

use crate::config::GimbalConfig;
use crate::error::DriverError;
use crate::hooks::LinkObserver;
use crate::port::GimbalPort;
use fygimbal_link::MessageTags;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// GimbalPort Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use fygimbal_driver::GimbalPortBuilder;
/// use std::time::Duration;
///
/// // 使用默认地址，启动时探测已有连接
/// let port = GimbalPortBuilder::new().build()?;
///
/// // 本地仿真，跳过探测
/// let port = GimbalPortBuilder::new()
///     .local_addr("127.0.0.1:9024".parse().unwrap())
///     .peer_addr("127.0.0.1:9025".parse().unwrap())
///     .transaction_timeout(Duration::from_millis(500))
///     .transaction_retries(3)
///     .assume_connected(true)
///     .build()?;
/// # Ok::<(), fygimbal_driver::DriverError>(())
/// ```
#[derive(Default)]
pub struct GimbalPortBuilder {
    config: GimbalConfig,
    observers: Vec<Arc<dyn LinkObserver>>,
}

impl GimbalPortBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换配置（之前的链式设置会被覆盖）
    pub fn config(mut self, config: GimbalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn local_addr(mut self, addr: SocketAddr) -> Self {
        self.config.link.local_addr = addr;
        self
    }

    pub fn peer_addr(mut self, addr: SocketAddr) -> Self {
        self.config.link.peer_addr = addr;
        self
    }

    pub fn tags(mut self, tags: MessageTags) -> Self {
        self.config.link.tags = tags;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.link.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn transaction_timeout(mut self, timeout: Duration) -> Self {
        self.config.transaction_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn transaction_retries(mut self, retries: u32) -> Self {
        self.config.transaction_retries = retries;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 指定初始连接状态，跳过启动探测
    pub fn assume_connected(mut self, connected: bool) -> Self {
        self.config.connected = Some(connected);
        self
    }

    pub fn axes(mut self, axes: impl Into<Vec<u8>>) -> Self {
        self.config.axes = axes.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// 注册观察者（在接收线程启动前生效）
    pub fn observer(mut self, observer: Arc<dyn LinkObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// 当前配置（用于检查链式设置的结果）
    pub fn peek_config(&self) -> &GimbalConfig {
        &self.config
    }

    /// 构建端口
    ///
    /// # 错误
    /// - `DriverError::Link`: socket 绑定失败
    /// - `DriverError::IoThread`: 接收线程创建失败
    pub fn build(self) -> Result<GimbalPort, DriverError> {
        GimbalPort::start(self.config, self.observers)
    }
}
