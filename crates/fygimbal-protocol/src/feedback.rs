//! 云台上报数据解析

use crate::ids::BOOT_CMD_VERSION;
use crate::packet::{Framing, Packet};
use crate::ProtocolError;
use std::fmt;

/// 固件版本号（定点数，单位为 0.01）
///
/// # Example
///
/// ```
/// use fygimbal_protocol::FirmwareVersion;
///
/// let version = FirmwareVersion::from_hundredths(300);
/// assert_eq!(version.to_string(), "3.00");
/// assert_eq!(version.as_f32(), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwareVersion(u16);

impl FirmwareVersion {
    pub const fn from_hundredths(raw: u16) -> Self {
        Self(raw)
    }

    /// 原始值（百分之一）
    pub const fn hundredths(self) -> u16 {
        self.0
    }

    pub fn as_f32(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// 版本上报（扩展帧，命令 0x00）
///
/// payload：`<u16 reserved, u16 version>`（小端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionReport {
    pub reserved: u16,
    pub version: FirmwareVersion,
}

impl VersionReport {
    /// 判断数据包是否为版本上报
    pub fn matches(packet: &Packet) -> bool {
        packet.framing() == Framing::Extended && packet.command() == BOOT_CMD_VERSION
    }
}

impl TryFrom<&Packet> for VersionReport {
    type Error = ProtocolError;

    fn try_from(packet: &Packet) -> Result<Self, Self::Error> {
        let data = packet.data();
        if data.len() < 4 {
            return Err(ProtocolError::InvalidLength {
                expected: 4,
                actual: data.len(),
            });
        }
        Ok(Self {
            reserved: u16::from_le_bytes([data[0], data[1]]),
            version: FirmwareVersion::from_hundredths(u16::from_le_bytes([data[2], data[3]])),
        })
    }
}
