//! 链路配置

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// 默认 UDP 端口（地面站与飞行器相同）
pub const DEFAULT_PORT: u16 = 9024;

/// 数据报类型标签表
///
/// 每个 UDP 数据报的首字节标识其内容类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTags {
    /// 云台协议数据（其余字节为编码后的数据包流）
    pub gimbal: u8,
    /// 飞行器传感器数据（小端 i32 数组）
    pub flyer_sensors: u8,
    /// APA102 LED 帧（大端 u32 像素数组）
    pub leds: u8,
}

impl Default for MessageTags {
    fn default() -> Self {
        Self {
            gimbal: 0x01,
            flyer_sensors: 0x02,
            leds: 0x05,
        }
    }
}

/// 链路配置
///
/// # Example
///
/// ```
/// use fygimbal_link::LinkConfig;
///
/// // 使用默认配置（10.32.0.1:9024 <-> 10.32.0.8:9024）
/// let config = LinkConfig::default();
///
/// // 本地回环调试
/// let config = LinkConfig {
///     local_addr: "127.0.0.1:9024".parse().unwrap(),
///     peer_addr: "127.0.0.1:9025".parse().unwrap(),
///     ..LinkConfig::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// 地面站绑定地址
    pub local_addr: SocketAddr,
    /// 飞行器地址（只接受来自该地址的数据报）
    pub peer_addr: SocketAddr,
    /// 标签表
    pub tags: MessageTags,
    /// socket 读超时（毫秒），接收线程借此检查停止标志
    pub read_timeout_ms: u64,
    /// 单个数据报的接收缓冲区大小
    pub recv_buffer_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            local_addr: SocketAddr::from(([10, 32, 0, 1], DEFAULT_PORT)),
            peer_addr: SocketAddr::from(([10, 32, 0, 8], DEFAULT_PORT)),
            tags: MessageTags::default(),
            read_timeout_ms: 100,
            recv_buffer_size: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addresses() {
        let config = LinkConfig::default();
        assert_eq!(config.local_addr.to_string(), "10.32.0.1:9024");
        assert_eq!(config.peer_addr.to_string(), "10.32.0.8:9024");
        assert_eq!(config.tags.gimbal, 0x01);
        assert_eq!(config.tags.flyer_sensors, 0x02);
        assert_eq!(config.tags.leds, 0x05);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LinkConfig = toml::from_str(
            r#"
            peer_addr = "127.0.0.1:9100"

            [tags]
            gimbal = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.peer_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(config.local_addr, LinkConfig::default().local_addr);
        assert_eq!(config.tags.gimbal, 16);
        assert_eq!(config.tags.leds, 0x05);
        assert_eq!(config.read_timeout_ms, 100);
    }
}
