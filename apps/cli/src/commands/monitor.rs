//! 遥测监控命令
//!
//! 打印飞行器传感器数据和诊断数据报，直到 Ctrl-C。

use crate::commands::connection::LinkArgs;
use anyhow::{Context, Result};
use clap::Args;
use fygimbal_driver::{ChannelObserver, LinkObserver, TelemetryEvent};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 监控命令参数
#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// 同时打印解码出的云台数据包
    #[arg(long)]
    pub packets: bool,

    /// 以 JSON Lines 输出
    #[arg(long)]
    pub json: bool,

    /// 事件缓冲区大小
    #[arg(long, default_value_t = 256)]
    pub buffer: usize,
}

/// JSON 输出行
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EventLine {
    FlyerSensors { values: Vec<i32> },
    Packet { target: u8, command: u8, data: String },
    Raw { src: String, data: String },
}

impl From<&TelemetryEvent> for EventLine {
    fn from(event: &TelemetryEvent) -> Self {
        match event {
            TelemetryEvent::FlyerSensors(sensors) => EventLine::FlyerSensors {
                values: sensors.values.clone(),
            },
            TelemetryEvent::Packet(packet) => EventLine::Packet {
                target: packet.target(),
                command: packet.command(),
                data: hex::encode(packet.data()),
            },
            TelemetryEvent::Raw { src, data } => EventLine::Raw {
                src: src.to_string(),
                data: hex::encode(data),
            },
        }
    }
}

impl MonitorCommand {
    pub fn execute(&self, link: &LinkArgs) -> Result<()> {
        let running = Arc::new(AtomicBool::new(true));
        {
            let running = running.clone();
            ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
                .context("无法注册 Ctrl-C 处理函数")?;
        }

        let (observer, events) = ChannelObserver::new(self.buffer.max(1));
        let observer = Arc::new(observer);
        let port = link.open_passive(vec![observer.clone() as Arc<dyn LinkObserver>])?;
        println!("📡 监听 {}（Ctrl-C 退出）", port.local_addr()?);

        while running.load(Ordering::SeqCst) {
            let event = match events.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => event,
                Err(_) => continue,
            };
            if matches!(event, TelemetryEvent::Packet(_)) && !self.packets {
                continue;
            }

            if self.json {
                println!("{}", serde_json::to_string(&EventLine::from(&event))?);
            } else {
                match &event {
                    TelemetryEvent::FlyerSensors(sensors) => {
                        println!("Flyer sensors: {:?}", sensors.values)
                    },
                    TelemetryEvent::Packet(packet) => println!("RX {}", packet),
                    TelemetryEvent::Raw { src, data } => {
                        println!("UDP from {} {}", src, hex::encode(data))
                    },
                }
            }
        }

        let metrics = port.metrics().snapshot();
        println!(
            "\n收包 {} 个数据报（传感器 {}，诊断 {}），丢弃事件 {}",
            metrics.rx_datagrams,
            metrics.rx_flyer_sensors,
            metrics.rx_foreign + metrics.rx_unknown,
            observer.dropped()
        );
        Ok(())
    }
}
