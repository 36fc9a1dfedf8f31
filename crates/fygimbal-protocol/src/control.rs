//! 控制数据包构建
//!
//! 每个函数构建一个发往云台的数据包，payload 布局与固件保持一致。

use crate::ids::*;
use crate::packet::Packet;
use crate::param::ParamFormat;
use crate::ProtocolError;

/// 读取参数：`[number]`
pub fn get_value(target: u8, number: u8) -> Packet {
    Packet::new(target, CMD_GET_VALUE, vec![number])
}

/// 写入参数：`[number, 0x00, value (LE)]`
///
/// # 错误
/// - `ProtocolError::ValueOutOfRange`: 数值超出 `format` 范围
pub fn set_value(
    target: u8,
    number: u8,
    value: i32,
    format: ParamFormat,
) -> Result<Packet, ProtocolError> {
    let mut data = Vec::with_capacity(2 + format.size());
    data.push(number);
    data.push(0x00);
    format.encode_into(value, &mut data)?;
    Ok(Packet::new(target, CMD_SET_VALUE, data))
}

/// 电机上电 / 断电：`[enable as u8]`
pub fn motor_power(target: u8, enable: bool) -> Packet {
    Packet::new(target, CMD_MOTOR_POWER, vec![enable as u8])
}

/// 保存参数到 flash：`[0x00]`
pub fn save_values(target: u8) -> Packet {
    Packet::new(target, CMD_SAVE_VALUES, vec![0x00])
}

/// 存储校准角度：`[slot]`
pub fn calibrate(target: u8, slot: u8) -> Packet {
    Packet::new(target, CMD_CALIBRATE, vec![slot])
}

/// 握手应答：发往主 MCU，payload `[0x01]`
pub fn attach_ack() -> Packet {
    Packet::new(TARGET_YAW, CMD_SERIAL_ATTACH, vec![ATTACH_ACK])
}
