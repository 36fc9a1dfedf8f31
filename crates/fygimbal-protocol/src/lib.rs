//! # FY Gimbal Protocol
//!
//! Feiyu Tech 云台串口协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `packet`: 逻辑数据包与帧格式
//! - `framing`: 帧编码与流式解码
//! - `ids`: 命令、目标与参数编号常量
//! - `param`: 参数数值格式
//! - `control`: 控制数据包构建
//! - `feedback`: 上报数据解析
//!
//! ## 字节序
//!
//! 协议中所有多字节字段均为小端。

pub mod control;
pub mod feedback;
pub mod framing;
pub mod ids;
pub mod packet;
pub mod param;

// 重新导出常用类型
pub use feedback::{FirmwareVersion, VersionReport};
pub use framing::{DEFAULT_MAX_PAYLOAD, PacketReceiver, checksum, encode, encode_into};
pub use packet::{Framing, Packet};
pub use param::ParamFormat;

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid payload length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Payload too long for {framing} framing: {len} bytes")]
    PayloadTooLong { framing: Framing, len: usize },

    #[error("Value {value} out of range for format {format}")]
    ValueOutOfRange { format: ParamFormat, value: i32 },

    #[error("Parse error: {0}")]
    ParseError(String),
}
