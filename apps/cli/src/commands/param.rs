//! 参数读写命令

use crate::commands::connection::LinkArgs;
use anyhow::{Context, Result, anyhow};
use clap::Args;
use fygimbal_driver::{ParamFormat, TransactionOptions};
use std::time::Duration;

/// 解析十进制或 0x 前缀的十六进制编号
pub fn parse_number(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// 把命令行给出的秒数转换为 `Duration`（拒绝负数、NaN 和无穷大）
pub fn parse_seconds(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|e| anyhow!("invalid duration {}s: {}", seconds, e))
}

/// 事务超时与重试覆盖项
#[derive(Args, Debug, Default, Clone)]
pub struct TransactionArgs {
    /// 单次尝试超时（秒）
    #[arg(long)]
    pub timeout: Option<f64>,

    /// 重试次数
    #[arg(long)]
    pub retries: Option<u32>,
}

impl TransactionArgs {
    pub fn options(&self) -> Result<TransactionOptions> {
        Ok(TransactionOptions {
            timeout: self.timeout.map(parse_seconds).transpose()?,
            retries: self.retries,
        })
    }
}

/// 读取单个参数
#[derive(Args, Debug)]
pub struct GetParamCommand {
    /// 目标控制器
    pub target: u8,

    /// 参数编号（支持 0x 前缀）
    #[arg(value_parser = parse_number)]
    pub number: u8,

    /// 数值格式（i8/u8/i16/u16）
    #[arg(short, long, default_value = "i16")]
    pub format: ParamFormat,

    #[command(flatten)]
    pub transaction: TransactionArgs,
}

impl GetParamCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let options = self.transaction.options()?;
        let port = link.connect()?;
        let value = port
            .get_param_with(self.target, self.number, self.format, options)
            .with_context(|| format!("读取参数 {:#04x} 失败", self.number))?;
        println!("{}", value);
        Ok(())
    }
}

/// 写入单个参数
#[derive(Args, Debug)]
pub struct SetParamCommand {
    /// 目标控制器
    pub target: u8,

    /// 参数编号（支持 0x 前缀）
    #[arg(value_parser = parse_number)]
    pub number: u8,

    /// 参数值
    #[arg(allow_hyphen_values = true)]
    pub value: i32,

    /// 数值格式（i8/u8/i16/u16）
    #[arg(short, long, default_value = "i16")]
    pub format: ParamFormat,
}

impl SetParamCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let port = link.connect()?;
        port.set_param(self.target, self.number, self.value, self.format)
            .with_context(|| format!("写入参数 {:#04x} 失败", self.number))?;
        port.flush(None).context("云台未确认参数写入")?;
        println!("✅ {:#04x} = {} (target {})", self.number, self.value, self.target);
        Ok(())
    }
}

/// 读取每个轴上的同一参数
#[derive(Args, Debug)]
pub struct GetVectorCommand {
    /// 参数编号（支持 0x 前缀）
    #[arg(value_parser = parse_number)]
    pub number: u8,

    /// 目标控制器（默认使用配置中的轴）
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Option<Vec<u8>>,

    /// 数值格式（i8/u8/i16/u16）
    #[arg(short, long, default_value = "i16")]
    pub format: ParamFormat,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub transaction: TransactionArgs,
}

impl GetVectorCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let options = self.transaction.options()?;
        let port = link.connect()?;
        let targets = self.targets.clone().unwrap_or_else(|| port.axes().to_vec());
        let values = port
            .get_vector_param(self.number, &targets, self.format, options)
            .with_context(|| format!("读取向量参数 {:#04x} 失败", self.number))?;

        if self.json {
            let entries: Vec<_> = targets
                .iter()
                .zip(&values)
                .map(|(target, value)| serde_json::json!({ "target": target, "value": value }))
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        } else {
            for (target, value) in targets.iter().zip(&values) {
                println!("target {}: {}", target, value);
            }
        }
        Ok(())
    }
}
