//! 电机命令
//!
//! 上电或断电所有轴，然后 flush 确认云台已处理。

use crate::commands::connection::LinkArgs;
use anyhow::{Context, Result};
use clap::{ArgGroup, Args};

/// 电机命令参数
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("power").required(true).args(["on", "off"])))]
pub struct MotorsCommand {
    /// 电机上电
    #[arg(long)]
    pub on: bool,

    /// 电机断电
    #[arg(long)]
    pub off: bool,

    /// 目标控制器（默认使用配置中的轴）
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Option<Vec<u8>>,
}

impl MotorsCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let port = link.connect()?;
        let targets = self.targets.clone().unwrap_or_else(|| port.axes().to_vec());

        port.set_motors(self.on, &targets)
            .context("发送电机命令失败")?;
        port.flush(None).context("云台未确认电机命令")?;

        println!(
            "✅ 电机已{}: {:?}",
            if self.on { "上电" } else { "断电" },
            targets
        );
        Ok(())
    }
}
