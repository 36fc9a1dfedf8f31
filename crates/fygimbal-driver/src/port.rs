//! 云台端口（对外 API）
//!
//! `GimbalPort` 拥有连接状态和应答队列，后台接收线程只持有共享上下文和队列发送端。
//! 调用线程只在等待握手或执行事务时阻塞。

use crate::config::GimbalConfig;
use crate::dispatch::Dispatcher;
use crate::error::DriverError;
use crate::hooks::LinkObserver;
use crate::metrics::GimbalMetrics;
use crate::pipeline::rx_loop;
use crate::state::{ConnectionState, GimbalContext};
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded, unbounded};
use fygimbal_link::{FlyerSocket, LedPixel, LinkConfig};
use fygimbal_protocol::ids::{TARGET_YAW, VALUE_IDENTITY};
use fygimbal_protocol::{FirmwareVersion, Packet, ParamFormat, control};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 等待接收线程退出的最长时间
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        let (tx, rx) = bounded(1);

        // 看门狗线程负责 join，本线程只等待结果
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            // 超时后看门狗线程继续运行，随进程退出回收
            Err(RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 单次事务的超时与重试覆盖项
///
/// 未设置的字段使用 `GimbalConfig` 中的默认值。
///
/// # Example
///
/// ```
/// use fygimbal_driver::TransactionOptions;
/// use std::time::Duration;
///
/// let options = TransactionOptions::new()
///     .timeout(Duration::from_millis(100))
///     .retries(0);
/// assert_eq!(options.retries, Some(0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
}

impl TransactionOptions {
    pub const fn new() -> Self {
        Self {
            timeout: None,
            retries: None,
        }
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// 云台端口
///
/// 所有方法只需要 `&self`，可以通过 `Arc` 在多个线程间共享；事务互斥执行。
///
/// # Example
///
/// ```no_run
/// use fygimbal_driver::{GimbalPort, GimbalConfig, ParamFormat};
///
/// let port = GimbalPort::new(GimbalConfig::default())?;
/// port.wait_connect(None)?;
///
/// let axes = port.axes().to_vec();
/// port.set_motors(true, &axes)?;
/// let angles = port.get_vector_param(0x2C, &axes, ParamFormat::I16, Default::default())?;
/// println!("encoder angles: {:?}", angles);
/// # Ok::<(), fygimbal_driver::DriverError>(())
/// ```
pub struct GimbalPort {
    socket: Arc<FlyerSocket>,
    ctx: Arc<GimbalContext>,
    /// 应答队列接收端（发送端在接收线程的分发器中）
    responses: Receiver<Packet>,
    /// 事务互斥锁，与连接监视器相互独立
    transaction_lock: Mutex<()>,
    config: GimbalConfig,
    is_running: Arc<AtomicBool>,
    rx_thread: Mutex<Option<JoinHandle<()>>>,
}

impl GimbalPort {
    /// 使用配置创建端口
    pub fn new(config: GimbalConfig) -> Result<Self, DriverError> {
        Self::start(config, Vec::new())
    }

    /// 绑定 socket、启动接收线程，并按配置确定初始连接状态
    ///
    /// 观察者在接收线程启动前注册，不会错过任何事件。
    ///
    /// # 错误
    /// - `DriverError::Link`: socket 绑定失败
    /// - `DriverError::IoThread`: 接收线程创建失败
    pub fn start(
        config: GimbalConfig,
        observers: Vec<Arc<dyn LinkObserver>>,
    ) -> Result<Self, DriverError> {
        let socket = Arc::new(FlyerSocket::bind(config.link.clone())?);
        let ctx = Arc::new(GimbalContext::new(
            config.connected.unwrap_or(false),
            config.verbose,
        ));
        {
            let mut hooks = ctx.hooks.write();
            for observer in observers {
                hooks.add_observer(observer);
            }
        }

        let (response_tx, response_rx) = unbounded();
        let is_running = Arc::new(AtomicBool::new(true));

        let rx_thread = {
            let socket = socket.clone();
            let ctx = ctx.clone();
            let is_running = is_running.clone();
            std::thread::Builder::new()
                .name("fygimbal-rx".into())
                .spawn(move || {
                    let dispatcher = Dispatcher::new(ctx.clone(), socket.clone(), response_tx);
                    rx_loop(socket, ctx, is_running, |packet| dispatcher.handle(packet));
                })
                .map_err(|e| DriverError::IoThread(e.to_string()))?
        };

        let port = Self {
            socket,
            ctx,
            responses: response_rx,
            transaction_lock: Mutex::new(()),
            config,
            is_running,
            rx_thread: Mutex::new(Some(rx_thread)),
        };

        if port.config.connected.is_none() {
            port.probe()?;
        }

        if port.is_connected() {
            match port.version() {
                Some(version) => info!("Already connected to gimbal, version {}", version),
                None => info!("Already connected to gimbal"),
            }
        } else {
            info!("Waiting for gimbal to power on");
        }

        Ok(port)
    }

    /// 探测已有连接
    ///
    /// 对主 MCU 读取 identity 参数（不重试，短超时），不等待握手。
    /// 成功则标记为已连接，并在版本未知时用返回值（I16）作为固件版本。
    ///
    /// # 返回
    /// - `Ok(true)`: 云台已在线
    /// - `Ok(false)`: 超时，继续等待握手
    pub fn probe(&self) -> Result<bool, DriverError> {
        debug!("Checking for existing connection");
        let request = control::get_value(TARGET_YAW, VALUE_IDENTITY);

        match self.run_transaction(&request, self.config.probe_timeout(), 0) {
            Ok(response) => {
                // identity 参数按默认的有符号 16 位格式读取，负值不是版本号
                match ParamFormat::I16.decode(response.data()) {
                    Ok(raw) => match u16::try_from(raw) {
                        Ok(hundredths) => {
                            let version = FirmwareVersion::from_hundredths(hundredths);
                            if self.ctx.link.seed_version(version) {
                                debug!("Firmware version from identity parameter: {}", version);
                            }
                        },
                        Err(_) => debug!("Identity parameter {} is not a version", raw),
                    },
                    Err(e) => warn!("Unexpected identity response {}: {}", response, e),
                }
                self.ctx.link.mark_connected();
                Ok(true)
            },
            Err(DriverError::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn config(&self) -> &GimbalConfig {
        &self.config
    }

    pub fn link_config(&self) -> &LinkConfig {
        self.socket.config()
    }

    /// 默认的轴目标
    pub fn axes(&self) -> &[u8] {
        &self.config.axes
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.link.is_connected()
    }

    pub fn version(&self) -> Option<FirmwareVersion> {
        self.ctx.link.version()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.ctx.link.snapshot()
    }

    /// 接收线程是否已退出
    pub fn is_closed(&self) -> bool {
        self.ctx.link.is_closed()
    }

    pub fn metrics(&self) -> &GimbalMetrics {
        &self.ctx.metrics
    }

    /// 注册观察者（在接收线程中回调）
    pub fn add_observer(&self, observer: Arc<dyn LinkObserver>) {
        self.ctx.hooks.write().add_observer(observer);
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DriverError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.socket.peer_addr()
    }

    /// 距离最近一次收到对端数据报的时间
    pub fn time_since_last_packet(&self) -> Option<Duration> {
        self.ctx.liveness.time_since_last_packet()
    }

    /// 对端在 `window` 内是否发送过数据报（仅诊断，不影响连接状态）
    pub fn is_alive(&self, window: Duration) -> bool {
        self.ctx.liveness.is_alive(window)
    }

    /// 等待握手完成
    ///
    /// `timeout` 为 `None` 时使用配置的 `connect_timeout`。
    ///
    /// # 错误
    /// - `DriverError::Timeout`: 超时仍未连接
    /// - `DriverError::Closed`: 端口已关闭
    pub fn wait_connect(&self, timeout: Option<Duration>) -> Result<(), DriverError> {
        self.ctx
            .link
            .wait_connected(timeout.unwrap_or_else(|| self.config.connect_timeout()))
    }

    /// 发送数据包（不等待应答）
    pub fn send(&self, packet: &Packet) -> Result<(), DriverError> {
        self.wait_connect(None)?;
        self.write_packet(packet)
    }

    /// 发送数据包并等待同命令的应答，超时重试
    ///
    /// 对端始终不应答时恰好尝试 `retries + 1` 次，然后返回 `Timeout`。
    ///
    /// # 错误
    /// - `DriverError::Timeout`: 等待握手超时，或重试次数耗尽
    /// - `DriverError::Closed`: 接收线程已退出
    /// - `DriverError::Link`: socket 错误（不重试）
    pub fn transaction(
        &self,
        packet: &Packet,
        options: TransactionOptions,
    ) -> Result<Packet, DriverError> {
        self.wait_connect(None)?;
        let timeout = options.timeout.unwrap_or_else(|| self.config.transaction_timeout());
        let retries = options.retries.unwrap_or(self.config.transaction_retries);
        self.run_transaction(packet, timeout, retries)
    }

    /// 确认之前发送的命令都已被处理
    ///
    /// 读取一次 identity 参数，不重试。
    pub fn flush(&self, timeout: Option<Duration>) -> Result<(), DriverError> {
        let mut options = TransactionOptions::new().retries(0);
        options.timeout = timeout;
        self.transaction(&control::get_value(TARGET_YAW, VALUE_IDENTITY), options)?;
        Ok(())
    }

    /// 发送 LED 帧（发往飞行器，不经过云台）
    pub fn send_leds(&self, pixels: &[LedPixel]) -> Result<(), DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        self.socket.send_leds(pixels)?;
        Ok(())
    }

    /// 关闭端口：停止并等待接收线程
    ///
    /// 之后所有事务返回 `Closed`。重复调用无副作用。
    pub fn close(&self) {
        // Release: 之前的写入对接收线程可见
        self.is_running.store(false, Ordering::Release);

        if let Some(handle) = self.rx_thread.lock().take()
            && let Err(_e) = handle.join_timeout(JOIN_TIMEOUT)
        {
            error!(
                "RX thread panicked or failed to shut down within {:?}",
                JOIN_TIMEOUT
            );
        }

        // 接收线程未能按时退出时也要让等待者看到关闭状态
        self.ctx.link.close();
    }

    /// 事务主体（不等待握手）
    fn run_transaction(
        &self,
        packet: &Packet,
        timeout: Duration,
        retries: u32,
    ) -> Result<Packet, DriverError> {
        let mut remaining = retries;
        loop {
            let attempt = {
                let _guard = self.transaction_lock.lock();
                GimbalMetrics::bump(&self.ctx.metrics.transaction_attempts);
                self.write_packet(packet)?;
                self.wait_response(packet.command(), timeout)
            };

            match attempt {
                Err(DriverError::Timeout) => {
                    GimbalMetrics::bump(&self.ctx.metrics.transaction_timeouts);
                    if remaining == 0 {
                        warn!(
                            "Transaction timed out after {} attempt(s): {}",
                            retries as u64 + 1,
                            packet
                        );
                        return Err(DriverError::Timeout);
                    }
                    remaining -= 1;
                    debug!("Retrying {} ({} retries left)", packet, remaining);
                },
                other => return other,
            }
        }
    }

    /// 从应答队列取出第一个命令匹配的数据包，丢弃其余数据包
    fn wait_response(&self, command: u8, timeout: Duration) -> Result<Packet, DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.responses.recv_deadline(deadline) {
                Ok(packet) if packet.command() == command => return Ok(packet),
                Ok(packet) => {
                    GimbalMetrics::bump(&self.ctx.metrics.responses_ignored);
                    if self.ctx.verbose {
                        info!("Ignored response {}", packet);
                    } else {
                        debug!("Ignored response {}", packet);
                    }
                },
                Err(RecvTimeoutError::Timeout) => return Err(DriverError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(DriverError::Closed),
            }
        }
    }

    /// 直接写出数据包（不等待握手）
    fn write_packet(&self, packet: &Packet) -> Result<(), DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        self.ctx.log_packet("TX", packet);
        self.socket.send_packet(packet)?;
        GimbalMetrics::bump(&self.ctx.metrics.tx_packets);

        let failures = self.ctx.hooks.read().trigger_packet_sent(packet);
        if failures > 0 {
            self.ctx
                .metrics
                .handler_failures
                .fetch_add(failures as u64, Ordering::Relaxed);
        }
        Ok(())
    }
}

impl Drop for GimbalPort {
    fn drop(&mut self) {
        self.close();
    }
}
