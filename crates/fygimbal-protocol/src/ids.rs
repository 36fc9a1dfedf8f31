//! 命令、目标与参数编号常量
//!
//! 集中定义云台协议中出现的所有"魔法数"。部分编号的含义来自逆向分析，
//! 尚无厂商文档，命名只反映观察到的行为。

// ============================================================================
// 目标（MCU）编号
// ============================================================================

/// 主 MCU（同时也是偏航轴控制器）
pub const TARGET_YAW: u8 = 0x00;

/// 横滚轴控制器
pub const TARGET_ROLL: u8 = 0x01;

/// 俯仰轴控制器
pub const TARGET_PITCH: u8 = 0x02;

/// 应答目标：云台发回给主机的响应都使用这个目标编号
pub const TARGET_HOST: u8 = 0x03;

/// 默认的轴控制器集合（偏航、横滚、俯仰）
pub const DEFAULT_AXES: [u8; 3] = [TARGET_YAW, TARGET_ROLL, TARGET_PITCH];

// ============================================================================
// 普通（compact）帧命令
// ============================================================================

/// 内部摇杆数据
pub const CMD_INTERNAL_JOYSTICK_DATA: u8 = 0x01;

/// 电机上电 / 断电
pub const CMD_MOTOR_POWER: u8 = 0x03;

/// 将参数保存到 flash
pub const CMD_SAVE_VALUES: u8 = 0x05;

/// 读取参数
pub const CMD_GET_VALUE: u8 = 0x06;

/// 写入参数（无应答）
pub const CMD_SET_VALUE: u8 = 0x08;

/// 串口连接握手：云台发起，主机以 payload `[0x01]` 应答
pub const CMD_SERIAL_ATTACH: u8 = 0x0B;

/// 存储校准角度
pub const CMD_CALIBRATE: u8 = 0x0C;

/// 内部 IMU 数据
pub const CMD_INTERNAL_IMU_DATA: u8 = 0x0D;

/// 握手应答的 payload
pub const ATTACH_ACK: u8 = 0x01;

// ============================================================================
// 扩展（extended / bootloader）帧命令
// ============================================================================

/// 版本上报（`<u16 reserved, u16 version>`，版本以百分之一为单位）
pub const BOOT_CMD_VERSION: u8 = 0x00;
pub const BOOT_CMD_INTERRUPT_BOOT: u8 = 0x01;
pub const BOOT_CMD_WRITE_BLOCK: u8 = 0x02;
pub const BOOT_CMD_WRITE_BLOCK_ACK: u8 = 0x03;
pub const BOOT_CMD_NEXT_MCU: u8 = 0x07;
pub const BOOT_CMD_NEXT_MCU_ACK: u8 = 0x08;

// ============================================================================
// 参数编号
// ============================================================================

/// 控制频率
pub const VALUE_CONTROL_RATE: u8 = 0x03;

/// 编码器角度
pub const VALUE_ENCODER_ANGLES: u8 = 0x2C;

/// 中心校准
pub const VALUE_CENTER_CALIBRATION: u8 = 0x4D;

/// 电机校准
pub const VALUE_MOTOR_CALIBRATION: u8 = 0x64;

/// 电机使能后需要额外写入 1 的参数（作用未知，保持原样）
pub const VALUE_MOTOR_ENABLE_AUX: u8 = 0x67;

/// "身份"参数：读取结果是固件版本（百分之一为单位），用于探测已建立的连接
pub const VALUE_IDENTITY: u8 = 0x7F;
