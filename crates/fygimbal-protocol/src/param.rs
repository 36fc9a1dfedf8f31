//! 参数数值格式
//!
//! 参数值在线上以小端整数表示，宽度和符号由调用方指定。

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// 参数数值格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParamFormat {
    /// 有符号 8 位
    I8,
    /// 无符号 8 位
    U8,
    /// 有符号 16 位小端（默认）
    #[default]
    I16,
    /// 无符号 16 位小端
    U16,
}

impl ParamFormat {
    /// 编码后占用的字节数
    pub const fn size(self) -> usize {
        match self {
            ParamFormat::I8 | ParamFormat::U8 => 1,
            ParamFormat::I16 | ParamFormat::U16 => 2,
        }
    }

    /// 可表示的取值范围
    pub const fn range(self) -> (i32, i32) {
        match self {
            ParamFormat::I8 => (i8::MIN as i32, i8::MAX as i32),
            ParamFormat::U8 => (0, u8::MAX as i32),
            ParamFormat::I16 => (i16::MIN as i32, i16::MAX as i32),
            ParamFormat::U16 => (0, u16::MAX as i32),
        }
    }

    /// 解码 payload
    ///
    /// payload 长度必须与格式宽度完全一致。
    pub fn decode(self, data: &[u8]) -> Result<i32, ProtocolError> {
        if data.len() != self.size() {
            return Err(ProtocolError::InvalidLength {
                expected: self.size(),
                actual: data.len(),
            });
        }
        let value = match self {
            ParamFormat::I8 => data[0] as i8 as i32,
            ParamFormat::U8 => data[0] as i32,
            ParamFormat::I16 => i16::from_le_bytes([data[0], data[1]]) as i32,
            ParamFormat::U16 => u16::from_le_bytes([data[0], data[1]]) as i32,
        };
        Ok(value)
    }

    /// 将数值编码追加到 `out`
    ///
    /// # 错误
    /// - `ProtocolError::ValueOutOfRange`: 数值超出该格式的表示范围
    pub fn encode_into(self, value: i32, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
        let (min, max) = self.range();
        if value < min || value > max {
            return Err(ProtocolError::ValueOutOfRange {
                format: self,
                value,
            });
        }
        match self {
            ParamFormat::I8 => out.push(value as i8 as u8),
            ParamFormat::U8 => out.push(value as u8),
            ParamFormat::I16 => out.extend_from_slice(&(value as i16).to_le_bytes()),
            ParamFormat::U16 => out.extend_from_slice(&(value as u16).to_le_bytes()),
        }
        Ok(())
    }
}

impl fmt::Display for ParamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamFormat::I8 => "i8",
            ParamFormat::U8 => "u8",
            ParamFormat::I16 => "i16",
            ParamFormat::U16 => "u16",
        };
        f.write_str(name)
    }
}

/// 同时接受 Rust 风格名称（`i16`）和 struct 风格格式码（`h`）
impl FromStr for ParamFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i8" | "b" => Ok(ParamFormat::I8),
            "u8" | "B" => Ok(ParamFormat::U8),
            "i16" | "h" => Ok(ParamFormat::I16),
            "u16" | "H" => Ok(ParamFormat::U16),
            other => Err(ProtocolError::ParseError(format!(
                "unknown parameter format '{}'",
                other
            ))),
        }
    }
}
