//! 数据报分类与负载编解码

use crate::config::MessageTags;
use fygimbal_protocol::{Packet, ProtocolError, encode_into};

/// 入站数据报（按首字节标签分类）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datagram<'a> {
    /// 云台协议字节流（已去掉标签）
    Gimbal(&'a [u8]),
    /// 飞行器传感器数据
    FlyerSensors(FlyerSensors),
    /// 其他标签，原样保留
    Unknown { tag: u8, body: &'a [u8] },
}

impl<'a> Datagram<'a> {
    /// 按标签表分类；空数据报返回 `None`
    pub fn classify(tags: &MessageTags, datagram: &'a [u8]) -> Option<Self> {
        let (&tag, body) = datagram.split_first()?;
        let kind = if tag == tags.gimbal {
            Datagram::Gimbal(body)
        } else if tag == tags.flyer_sensors {
            Datagram::FlyerSensors(FlyerSensors::decode(body))
        } else {
            Datagram::Unknown { tag, body }
        };
        Some(kind)
    }
}

/// 飞行器传感器数据：小端 i32 数组
///
/// 末尾不足 4 字节的部分被忽略。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlyerSensors {
    pub values: Vec<i32>,
}

impl FlyerSensors {
    pub fn decode(body: &[u8]) -> Self {
        let values = body
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self { values }
    }
}

/// 构建云台数据报：`tag + encode(packet)`
pub fn gimbal_datagram(tags: &MessageTags, packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = vec![tags.gimbal];
    encode_into(packet, &mut buf)?;
    Ok(buf)
}

/// APA102 像素
///
/// 线上为大端 u32：`0xE0 | brightness` 作为首字节，随后依次是 R、G、B。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedPixel {
    /// 全局亮度（5 位，0-31）
    pub brightness: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedPixel {
    pub const MAX_BRIGHTNESS: u8 = 0x1F;

    pub fn new(brightness: u8, r: u8, g: u8, b: u8) -> Self {
        Self {
            brightness: brightness.min(Self::MAX_BRIGHTNESS),
            r,
            g,
            b,
        }
    }

    /// 像素字
    pub fn word(&self) -> u32 {
        0xE000_0000
            | ((self.brightness & Self::MAX_BRIGHTNESS) as u32) << 24
            | (self.r as u32) << 16
            | (self.g as u32) << 8
            | self.b as u32
    }
}

/// 构建 LED 帧数据报
pub fn led_datagram(tags: &MessageTags, pixels: &[LedPixel]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + pixels.len() * 4);
    buf.push(tags.leds);
    for pixel in pixels {
        buf.extend_from_slice(&pixel.word().to_be_bytes());
    }
    buf
}
