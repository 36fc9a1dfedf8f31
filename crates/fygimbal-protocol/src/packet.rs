//! 逻辑数据包与帧格式

use crate::ProtocolError;
use bytes::Bytes;
use std::fmt;

/// 帧格式
///
/// 云台协议有两种线上编码，它们只在同步字、长度字段宽度和 CRC 算法上不同：
///
/// | 帧格式      | 同步字    | 长度字段  | CRC                  |
/// |-------------|-----------|-----------|----------------------|
/// | `Compact`   | `A5 5A`   | `u8`      | CRC-16/XMODEM        |
/// | `Extended`  | `55 AA`   | `u16` LE  | CRC-16/CCITT-FALSE   |
///
/// `Extended` 最初用于 bootloader，固件也用它上报版本号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Framing {
    /// 普通帧（短格式）
    #[default]
    Compact,
    /// 扩展帧（长格式）
    Extended,
}

impl Framing {
    /// 帧头同步字
    pub const fn sync(self) -> [u8; 2] {
        match self {
            Framing::Compact => [0xA5, 0x5A],
            Framing::Extended => [0x55, 0xAA],
        }
    }

    /// 根据同步字识别帧格式
    pub fn from_sync(bytes: [u8; 2]) -> Option<Self> {
        if bytes == Framing::Compact.sync() {
            Some(Framing::Compact)
        } else if bytes == Framing::Extended.sync() {
            Some(Framing::Extended)
        } else {
            None
        }
    }

    /// 长度字段宽度（字节）
    pub const fn length_width(self) -> usize {
        match self {
            Framing::Compact => 1,
            Framing::Extended => 2,
        }
    }

    /// 该格式能承载的最大 payload 长度
    pub const fn max_payload(self) -> usize {
        match self {
            Framing::Compact => u8::MAX as usize,
            Framing::Extended => u16::MAX as usize,
        }
    }

    /// 帧头长度：同步字 + target + command + 长度字段
    pub const fn header_len(self) -> usize {
        2 + 2 + self.length_width()
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Compact => f.write_str("compact"),
            Framing::Extended => f.write_str("extended"),
        }
    }
}

/// 云台协议数据包
///
/// 构造后不可变。接收时帧格式由解码器填写；发送时由构造函数根据 payload
/// 长度决定（能放进 `Compact` 就用 `Compact`），也可以通过
/// [`Packet::with_framing`] 显式指定。
///
/// # Example
///
/// ```
/// use fygimbal_protocol::{Framing, Packet};
///
/// let packet = Packet::new(0, 0x06, vec![0x7F]);
/// assert_eq!(packet.framing(), Framing::Compact);
/// assert_eq!(packet.data(), &[0x7F]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    target: u8,
    command: u8,
    data: Bytes,
    framing: Framing,
}

impl Packet {
    /// 创建数据包，帧格式按 payload 长度自动选择
    pub fn new(target: u8, command: u8, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let framing = if data.len() <= Framing::Compact.max_payload() {
            Framing::Compact
        } else {
            Framing::Extended
        };
        Self {
            target,
            command,
            data,
            framing,
        }
    }

    /// 创建指定帧格式的数据包
    ///
    /// # 错误
    /// - `ProtocolError::PayloadTooLong`: payload 超出该格式长度字段的表示范围
    pub fn with_framing(
        target: u8,
        command: u8,
        data: impl Into<Bytes>,
        framing: Framing,
    ) -> Result<Self, ProtocolError> {
        let data = data.into();
        if data.len() > framing.max_payload() {
            return Err(ProtocolError::PayloadTooLong {
                framing,
                len: data.len(),
            });
        }
        Ok(Self {
            target,
            command,
            data,
            framing,
        })
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// payload 切片
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// payload 的共享句柄（零拷贝克隆）
    pub fn payload(&self) -> Bytes {
        self.data.clone()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet {{ target: 0x{:02x}, command: 0x{:02x}, framing: {}, data: [{}] }}",
            self.target,
            self.command,
            self.framing,
            hex::encode(&self.data)
        )
    }
}
