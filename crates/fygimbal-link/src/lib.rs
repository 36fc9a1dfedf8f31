//! # FY Gimbal Link Layer
//!
//! 地面站与飞行器之间的 UDP 数据报层：标签表、数据报分类、
//! 传感器/LED 负载编解码和 socket 封装。

pub mod config;
pub mod message;
pub mod socket;

pub use config::{DEFAULT_PORT, LinkConfig, MessageTags};
pub use message::{Datagram, FlyerSensors, LedPixel, gimbal_datagram, led_datagram};
pub use socket::FlyerSocket;

// 重新导出协议层的 Packet
pub use fygimbal_protocol::Packet;

use fygimbal_protocol::ProtocolError;
use thiserror::Error;

/// 链路层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Protocol Error: {0}")]
    Protocol(#[from] ProtocolError),
}
