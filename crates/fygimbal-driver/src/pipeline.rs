//! 接收线程主循环
//!
//! 唯一持有 socket 读端的线程。按来源地址和首字节标签拆分数据报，
//! 把云台字节流送入解码器，并把解码出的数据包按到达顺序交给分发回调。

use crate::error::DriverError;
use crate::metrics::GimbalMetrics;
use crate::state::GimbalContext;
use fygimbal_link::{Datagram, FlyerSocket};
use fygimbal_protocol::{Packet, PacketReceiver};
use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// socket 出错后的退避时间，避免错误风暴占满 CPU
const ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// RX 线程主循环
///
/// # 参数
/// - `socket`: 共享 socket（只读端在本线程使用）
/// - `ctx`: 共享状态上下文
/// - `is_running`: 运行标志（用于生命周期联动）
/// - `on_packet`: 分发回调，返回的错误或 panic 会被记录并计数，不会终止循环
///
/// 退出时关闭连接监视器，所有等待者收到 `Closed`。
pub fn rx_loop(
    socket: Arc<FlyerSocket>,
    ctx: Arc<GimbalContext>,
    is_running: Arc<AtomicBool>,
    mut on_packet: impl FnMut(Packet) -> Result<(), DriverError>,
) {
    let mut receiver = PacketReceiver::new();
    let mut buf = vec![0u8; socket.config().recv_buffer_size.max(1)];
    let peer = socket.peer_addr();
    let tags = socket.config().tags;

    loop {
        // Acquire: If we see false, we must see all cleanup writes from other threads
        if !is_running.load(Ordering::Acquire) {
            trace!("RX thread: is_running flag is false, exiting");
            break;
        }

        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(Some(received)) => received,
            Ok(None) => continue, // 读超时，回到循环顶部检查运行标志
            Err(e) => {
                GimbalMetrics::bump(&ctx.metrics.socket_errors);
                error!("RX socket error: {}", e);
                std::thread::sleep(ERROR_BACKOFF);
                continue;
            },
        };
        GimbalMetrics::bump(&ctx.metrics.rx_datagrams);
        let datagram = &buf[..len];

        if src != peer {
            GimbalMetrics::bump(&ctx.metrics.rx_foreign);
            debug!("UDP from {} {}", src, hex::encode(datagram));
            trigger_raw(&ctx, src, datagram);
            continue;
        }
        ctx.liveness.register_packet();

        match Datagram::classify(&tags, datagram) {
            None => trace!("Ignored empty datagram"),
            Some(Datagram::Gimbal(body)) => {
                let crc_before = receiver.crc_errors();
                receiver.push(body);

                while let Some(packet) = receiver.next_packet() {
                    GimbalMetrics::bump(&ctx.metrics.rx_packets);
                    ctx.log_packet("RX", &packet);

                    let observer_failures = ctx.hooks.read().trigger_packet(&packet);
                    add_failures(&ctx, observer_failures);

                    dispatch_isolated(&ctx, &mut on_packet, packet);
                }

                let new_crc_errors = receiver.crc_errors() - crc_before;
                if new_crc_errors > 0 {
                    ctx.metrics
                        .crc_errors
                        .fetch_add(new_crc_errors, Ordering::Relaxed);
                    warn!("Dropped {} packet(s) with bad CRC", new_crc_errors);
                }
            },
            Some(Datagram::FlyerSensors(sensors)) => {
                GimbalMetrics::bump(&ctx.metrics.rx_flyer_sensors);
                if ctx.verbose {
                    info!("Flyer sensors: {:?}", sensors.values);
                } else {
                    trace!("Flyer sensors: {:?}", sensors.values);
                }
                let failures = ctx.hooks.read().trigger_flyer_sensors(&sensors);
                add_failures(&ctx, failures);
            },
            Some(Datagram::Unknown { tag, .. }) => {
                GimbalMetrics::bump(&ctx.metrics.rx_unknown);
                debug!("UDP from {} tag {:#04x}: {}", src, tag, hex::encode(datagram));
                trigger_raw(&ctx, src, datagram);
            },
        }
    }

    ctx.link.close();
    trace!("RX thread: loop exited due to is_running flag");
}

/// 调用分发回调，捕获错误和 panic
fn dispatch_isolated(
    ctx: &GimbalContext,
    on_packet: &mut impl FnMut(Packet) -> Result<(), DriverError>,
    packet: Packet,
) {
    match catch_unwind(AssertUnwindSafe(|| on_packet(packet))) {
        Ok(Ok(())) => {},
        Ok(Err(e)) => {
            GimbalMetrics::bump(&ctx.metrics.handler_failures);
            error!("Packet handler failed: {}", e);
        },
        Err(panic) => {
            GimbalMetrics::bump(&ctx.metrics.handler_failures);
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Packet handler panicked: {}", reason);
        },
    }
}

fn trigger_raw(ctx: &GimbalContext, src: SocketAddr, datagram: &[u8]) {
    let failures = ctx.hooks.read().trigger_raw_datagram(src, datagram);
    add_failures(ctx, failures);
}

fn add_failures(ctx: &GimbalContext, failures: usize) {
    if failures > 0 {
        ctx.metrics
            .handler_failures
            .fetch_add(failures as u64, Ordering::Relaxed);
    }
}
