//! 探测命令
//!
//! 检查云台是否在线，可选地等待握手，然后打印连接状态和链路统计。

use crate::commands::connection::LinkArgs;
use crate::commands::param::parse_seconds;
use anyhow::Result;
use clap::Args;

/// 探测命令参数
#[derive(Args, Debug)]
pub struct ProbeCommand {
    /// 未在线时等待握手的秒数（0 表示不等待）
    #[arg(short, long, default_value_t = 0.0)]
    pub wait: f64,
}

impl ProbeCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let wait = parse_seconds(self.wait)?;
        let port = link.open()?;

        if !port.is_connected() && !wait.is_zero() {
            println!("⏳ 等待云台握手（最多 {:.1}s）...", self.wait);
            // 超时不是错误，下面照常打印状态
            let _ = port.wait_connect(Some(wait));
        }

        let state = port.connection_state();
        println!("飞行器: {}", port.peer_addr());
        println!("  已连接: {}", if state.connected { "是" } else { "否" });
        match state.version {
            Some(version) => println!("  固件版本: {}", version),
            None => println!("  固件版本: (未知)"),
        }
        match port.time_since_last_packet() {
            Some(elapsed) => println!("  最近数据: {:?} 前", elapsed),
            None => println!("  最近数据: (无)"),
        }

        let metrics = port.metrics().snapshot();
        println!(
            "  收包: {} 数据报 / {} 数据包，发包: {}",
            metrics.rx_datagrams, metrics.rx_packets, metrics.tx_packets
        );
        Ok(())
    }
}
