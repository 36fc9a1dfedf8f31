//! 驱动层错误类型定义

use fygimbal_link::LinkError;
use fygimbal_protocol::{Packet, ProtocolError};
use std::io;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 链路（socket）错误，不重试
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 协议编解码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 等待连接或事务重试预算耗尽
    #[error("Operation timeout")]
    Timeout,

    /// 云台返回了不符合预期的应答（协议违例，不重试）
    #[error("Unexpected response from target {target}: {response}")]
    UnexpectedResponse { target: u8, response: Packet },

    /// 接收线程已退出，事务无法完成
    #[error("Link closed")]
    Closed,

    /// 无效输入
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}

impl DriverError {
    /// 是否为可重试的超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout)
    }
}

/// 转换为 `io::Error`，便于在只接受 IO 错误的调用链中上报
impl From<DriverError> for io::Error {
    fn from(err: DriverError) -> Self {
        let kind = match &err {
            DriverError::Link(LinkError::Io(e)) => e.kind(),
            DriverError::Timeout => io::ErrorKind::TimedOut,
            DriverError::Closed => io::ErrorKind::NotConnected,
            DriverError::UnexpectedResponse { .. } | DriverError::Protocol(_) => {
                io::ErrorKind::InvalidData
            },
            DriverError::InvalidInput(_) => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
