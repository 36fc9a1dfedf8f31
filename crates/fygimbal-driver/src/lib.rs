//! # FY Gimbal Driver
//!
//! 云台连接与事务管理：后台接收线程、数据包分发、握手、
//! 单发命令以及带重试的同步事务。
//!
//! ## 线程模型
//!
//! - 每个端口一个接收线程，只阻塞在 socket 读（带短超时以便观察停止标志）
//! - 调用线程只在等待握手或事务应答时阻塞
//! - 事务互斥执行，应答按接收顺序交付
//!
//! ## 模块
//!
//! - `port`: 对外 API（`GimbalPort`）
//! - `params`: 参数、电机、校准与保存操作
//! - `pipeline`: 接收线程主循环
//! - `dispatch`: 数据包分发规则
//! - `state`: 连接监视器与共享上下文
//! - `hooks`: 观察者回调
//! - `heartbeat`: 链路活性（仅诊断）
//! - `metrics`: 原子计数器
//!
//! ## Example
//!
//! ```no_run
//! use fygimbal_driver::{GimbalPortBuilder, ParamFormat, TransactionOptions};
//!
//! let port = GimbalPortBuilder::new().verbose(true).build()?;
//! port.wait_connect(None)?;
//!
//! let identity = port.get_param(0, 0x7F, ParamFormat::U16)?;
//! println!("identity: {}", identity);
//!
//! let axes = port.axes().to_vec();
//! port.save_params(&axes, TransactionOptions::default())?;
//! # Ok::<(), fygimbal_driver::DriverError>(())
//! ```

pub mod builder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod heartbeat;
pub mod hooks;
pub mod metrics;
mod params;
pub mod pipeline;
pub mod port;
pub mod state;

pub use builder::GimbalPortBuilder;
pub use config::GimbalConfig;
pub use error::DriverError;
pub use hooks::{ChannelObserver, HookManager, LinkObserver, TelemetryEvent};
pub use metrics::{GimbalMetrics, MetricsSnapshot};
pub use port::{GimbalPort, TransactionOptions};
pub use state::ConnectionState;

// 重新导出下层常用类型
pub use fygimbal_link::{FlyerSensors, LedPixel, LinkConfig, MessageTags};
pub use fygimbal_protocol::{FirmwareVersion, Framing, Packet, ParamFormat, control, ids};
