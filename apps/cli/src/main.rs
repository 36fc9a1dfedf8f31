//! # fygimbal CLI
//!
//! 通过飞行器 UDP 链路控制云台的命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! fygimbal-cli config init
//!
//! # 查看链路状态
//! fygimbal-cli probe --peer 10.32.0.8:9024
//!
//! # 上电电机并读取每个轴的参数
//! fygimbal-cli motors --on
//! fygimbal-cli get-vector 0x2c --format u16
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    CalibrateCommand, ConfigCommand, GetParamCommand, GetVectorCommand, LedsCommand, LinkArgs,
    MonitorCommand, MotorsCommand, ProbeCommand, SaveCommand, SetParamCommand,
};

/// fygimbal CLI - 云台命令行工具
#[derive(Parser, Debug)]
#[command(name = "fygimbal-cli")]
#[command(about = "Command-line interface for the flyer gimbal UDP link", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 查看连接状态与固件版本
    Probe {
        #[command(flatten)]
        args: ProbeCommand,
    },

    /// 电机上电/断电
    Motors {
        #[command(flatten)]
        args: MotorsCommand,
    },

    /// 读取参数
    GetParam {
        #[command(flatten)]
        args: GetParamCommand,
    },

    /// 写入参数
    SetParam {
        #[command(flatten)]
        args: SetParamCommand,
    },

    /// 读取每个轴上的参数
    GetVector {
        #[command(flatten)]
        args: GetVectorCommand,
    },

    /// 保存参数到 flash
    Save {
        #[command(flatten)]
        args: SaveCommand,
    },

    /// 存储校准角度
    Calibrate {
        #[command(flatten)]
        args: CalibrateCommand,
    },

    /// 监控飞行器遥测
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 设置 LED 灯带颜色
    Leds {
        #[command(flatten)]
        args: LedsCommand,
    },
}

fn init_tracing() -> Result<()> {
    let directive = "fygimbal=info".parse().context("invalid log directive")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let link = &cli.link;

    match &cli.command {
        Commands::Config(cmd) => cmd.execute(link.config.as_deref()),
        Commands::Probe { args } => args.execute(link),
        Commands::Motors { args } => args.execute(link),
        Commands::GetParam { args } => args.execute(link),
        Commands::SetParam { args } => args.execute(link),
        Commands::GetVector { args } => args.execute(link),
        Commands::Save { args } => args.execute(link),
        Commands::Calibrate { args } => args.execute(link),
        Commands::Monitor { args } => args.execute(link),
        Commands::Leds { args } => args.execute(link),
    }
}
