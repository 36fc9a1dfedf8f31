//! 云台端口配置

use fygimbal_link::LinkConfig;
use fygimbal_protocol::ids::DEFAULT_AXES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 云台端口配置
///
/// 所有时间字段以毫秒为单位，便于写入 TOML 配置文件。
///
/// # Example
///
/// ```
/// use fygimbal_driver::GimbalConfig;
/// use std::time::Duration;
///
/// let config = GimbalConfig::default();
/// assert_eq!(config.transaction_timeout(), Duration::from_secs(2));
/// assert_eq!(config.transaction_retries, 15);
/// assert_eq!(config.axes, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GimbalConfig {
    /// UDP 链路配置
    pub link: LinkConfig,
    /// 单次事务尝试的应答超时（毫秒）
    pub transaction_timeout_ms: u64,
    /// 超时后的重试次数（总尝试次数 = retries + 1）
    pub transaction_retries: u32,
    /// 等待握手的超时（毫秒）
    pub connect_timeout_ms: u64,
    /// 启动探测（读取 identity 参数）的超时（毫秒）
    pub probe_timeout_ms: u64,
    /// 初始连接状态
    ///
    /// - `None`: 启动时探测已有连接
    /// - `Some(true)`: 视为已连接，跳过探测
    /// - `Some(false)`: 直接等待握手
    pub connected: Option<bool>,
    /// 默认的轴目标（向量参数、电机、校准、保存）
    pub axes: Vec<u8>,
    /// 以 info 级别记录每个收发数据包和被忽略的应答
    pub verbose: bool,
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            transaction_timeout_ms: 2000,
            transaction_retries: 15,
            connect_timeout_ms: 10_000,
            probe_timeout_ms: 100,
            connected: None,
            axes: DEFAULT_AXES.to_vec(),
            verbose: false,
        }
    }
}

impl GimbalConfig {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
