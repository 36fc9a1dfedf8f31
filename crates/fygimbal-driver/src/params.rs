//! 参数、向量参数、电机、校准与保存操作
//!
//! 全部建立在 [`GimbalPort::send`] 和 [`GimbalPort::transaction`] 之上。

use crate::error::DriverError;
use crate::port::{GimbalPort, TransactionOptions};
use fygimbal_protocol::ids::{TARGET_PITCH, VALUE_MOTOR_ENABLE_AUX};
use fygimbal_protocol::{ParamFormat, control};
use tracing::{debug, info};

impl GimbalPort {
    /// 读取参数（默认超时与重试）
    pub fn get_param(&self, target: u8, number: u8, format: ParamFormat) -> Result<i32, DriverError> {
        self.get_param_with(target, number, format, TransactionOptions::default())
    }

    /// 读取参数
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 应答长度与 `format` 不符
    pub fn get_param_with(
        &self,
        target: u8,
        number: u8,
        format: ParamFormat,
        options: TransactionOptions,
    ) -> Result<i32, DriverError> {
        let response = self.transaction(&control::get_value(target, number), options)?;
        Ok(format.decode(response.data())?)
    }

    /// 写入参数（不等待应答）
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 数值超出 `format` 范围，此时不发送任何数据
    pub fn set_param(
        &self,
        target: u8,
        number: u8,
        value: i32,
        format: ParamFormat,
    ) -> Result<(), DriverError> {
        let packet = control::set_value(target, number, value, format)?;
        self.send(&packet)
    }

    /// 按 `targets` 顺序逐个读取同一编号的参数
    pub fn get_vector_param(
        &self,
        number: u8,
        targets: &[u8],
        format: ParamFormat,
        options: TransactionOptions,
    ) -> Result<Vec<i32>, DriverError> {
        targets
            .iter()
            .map(|&target| self.get_param_with(target, number, format, options))
            .collect()
    }

    /// 按 `targets` 顺序逐个写入，`values[i]` 写入 `targets[i]`
    ///
    /// # 错误
    /// - `DriverError::InvalidInput`: `values` 与 `targets` 长度不同
    pub fn set_vector_param(
        &self,
        number: u8,
        values: &[i32],
        targets: &[u8],
        format: ParamFormat,
    ) -> Result<(), DriverError> {
        if values.len() != targets.len() {
            return Err(DriverError::InvalidInput(format!(
                "{} values for {} targets",
                values.len(),
                targets.len()
            )));
        }
        for (&target, &value) in targets.iter().zip(values) {
            self.set_param(target, number, value, format)?;
        }
        Ok(())
    }

    /// 电机上电 / 断电
    ///
    /// 按目标编号从大到小发送；上电后额外把俯仰控制器的 0x67 参数置 1。
    pub fn set_motors(&self, enable: bool, targets: &[u8]) -> Result<(), DriverError> {
        let mut ordered = targets.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));

        for target in ordered {
            self.send(&control::motor_power(target, enable))?;
        }

        if enable {
            self.set_param(TARGET_PITCH, VALUE_MOTOR_ENABLE_AUX, 1, ParamFormat::I16)?;
        }
        debug!("Motors {} on {:?}", if enable { "on" } else { "off" }, targets);
        Ok(())
    }

    /// 在每个目标上存储当前角度为校准点 `slot`
    pub fn store_calibration_angle(&self, slot: u8, targets: &[u8]) -> Result<(), DriverError> {
        for &target in targets {
            self.transaction(&control::calibrate(target, slot), TransactionOptions::default())?;
        }
        Ok(())
    }

    /// 把参数保存到各目标的 flash
    ///
    /// # 错误
    /// - `DriverError::UnexpectedResponse`: 应答 payload 不是 `[target]`
    pub fn save_params(&self, targets: &[u8], options: TransactionOptions) -> Result<(), DriverError> {
        for &target in targets {
            let response = self.transaction(&control::save_values(target), options)?;
            if response.data() != [target].as_slice() {
                return Err(DriverError::UnexpectedResponse { target, response });
            }
            if self.config().verbose {
                info!("Saved params on MCU {}", target);
            } else {
                debug!("Saved params on MCU {}", target);
            }
        }
        Ok(())
    }
}
