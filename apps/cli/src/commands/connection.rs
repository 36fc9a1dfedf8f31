//! 公共连接参数
//!
//! 所有命令共享：配置文件、地址覆盖、逐包日志。

use crate::commands::config::load_config;
use anyhow::{Context, Result};
use clap::Args;
use fygimbal_driver::{GimbalConfig, GimbalPort, GimbalPortBuilder, LinkObserver};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// 连接参数（命令行优先于配置文件）
#[derive(Args, Debug, Default, Clone)]
pub struct LinkArgs {
    /// 配置文件（默认 <config_dir>/fygimbal/config.toml）
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 地面站绑定地址（如 10.32.0.1:9024）
    #[arg(long, global = true)]
    pub local: Option<SocketAddr>,

    /// 飞行器地址（如 10.32.0.8:9024）
    #[arg(long, global = true)]
    pub peer: Option<SocketAddr>,

    /// 记录每个收发的数据包
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 跳过启动探测，直接视为已连接
    #[arg(long, global = true)]
    pub assume_connected: bool,
}

impl LinkArgs {
    /// 合并配置文件与命令行覆盖项
    pub fn resolve(&self) -> Result<GimbalConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(local) = self.local {
            config.link.local_addr = local;
        }
        if let Some(peer) = self.peer {
            config.link.peer_addr = peer;
        }
        if self.verbose {
            config.verbose = true;
        }
        if self.assume_connected {
            config.connected = Some(true);
        }
        debug!("Effective config: {:?}", config);
        Ok(config)
    }

    /// 打开端口
    pub fn open(&self) -> Result<GimbalPort> {
        self.open_with(Vec::new())
    }

    pub fn open_with(&self, observers: Vec<Arc<dyn LinkObserver>>) -> Result<GimbalPort> {
        let config = self.resolve()?;
        Self::build(config, observers)
    }

    /// 打开端口但不探测云台（只收遥测或发送 LED 帧）
    pub fn open_passive(&self, observers: Vec<Arc<dyn LinkObserver>>) -> Result<GimbalPort> {
        let mut config = self.resolve()?;
        config.connected.get_or_insert(false);
        Self::build(config, observers)
    }

    fn build(config: GimbalConfig, observers: Vec<Arc<dyn LinkObserver>>) -> Result<GimbalPort> {
        let local = config.link.local_addr;
        let mut builder = GimbalPortBuilder::new().config(config);
        for observer in observers {
            builder = builder.observer(observer);
        }
        builder
            .build()
            .with_context(|| format!("无法在 {} 上打开云台链路", local))
    }

    /// 打开端口并等待握手
    pub fn connect(&self) -> Result<GimbalPort> {
        let port = self.open()?;
        if !port.is_connected() {
            println!("⏳ 等待云台上电...");
        }
        port.wait_connect(None).context("等待云台握手超时")?;
        Ok(port)
    }
}
