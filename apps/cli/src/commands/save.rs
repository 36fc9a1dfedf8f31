//! 保存参数与校准命令

use crate::commands::connection::LinkArgs;
use crate::commands::param::TransactionArgs;
use anyhow::{Context, Result};
use clap::Args;

/// 把参数保存到 flash
#[derive(Args, Debug)]
pub struct SaveCommand {
    /// 目标控制器（默认使用配置中的轴）
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Option<Vec<u8>>,

    #[command(flatten)]
    pub transaction: TransactionArgs,
}

impl SaveCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let options = self.transaction.options()?;
        let port = link.connect()?;
        let targets = self.targets.clone().unwrap_or_else(|| port.axes().to_vec());

        port.save_params(&targets, options)
            .context("保存参数失败")?;
        println!("✅ 参数已保存: {:?}", targets);
        Ok(())
    }
}

/// 把当前角度存为校准点
#[derive(Args, Debug)]
pub struct CalibrateCommand {
    /// 校准点编号
    pub slot: u8,

    /// 目标控制器（默认使用配置中的轴）
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Option<Vec<u8>>,
}

impl CalibrateCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let port = link.connect()?;
        let targets = self.targets.clone().unwrap_or_else(|| port.axes().to_vec());

        port.store_calibration_angle(self.slot, &targets)
            .with_context(|| format!("存储校准点 {} 失败", self.slot))?;
        println!("✅ 校准点 {} 已存储: {:?}", self.slot, targets);
        Ok(())
    }
}
