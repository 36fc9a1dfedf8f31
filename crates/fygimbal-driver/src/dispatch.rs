//! 数据包分发
//!
//! 接收线程对每个解码出的数据包按顺序匹配规则，第一条命中的规则生效：
//!
//! 1. 扩展帧 + 命令 0x00：版本上报，更新固件版本
//! 2. 普通帧 + 命令 0x0B：握手，切换为已连接并应答
//! 3. 目标 0x03：事务应答，进入应答队列
//! 4. 其他：丢弃

use crate::error::DriverError;
use crate::metrics::GimbalMetrics;
use crate::state::GimbalContext;
use crossbeam_channel::Sender;
use fygimbal_link::FlyerSocket;
use fygimbal_protocol::ids::{BOOT_CMD_VERSION, CMD_SERIAL_ATTACH, TARGET_HOST};
use fygimbal_protocol::{Framing, Packet, VersionReport, control};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// 分发规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    VersionReport,
    Attach,
    Response,
    Unhandled,
}

/// 为数据包选择分发规则
pub fn route(packet: &Packet) -> Route {
    match packet.framing() {
        Framing::Extended if packet.command() == BOOT_CMD_VERSION => Route::VersionReport,
        Framing::Compact if packet.command() == CMD_SERIAL_ATTACH => Route::Attach,
        _ if packet.target() == TARGET_HOST => Route::Response,
        _ => Route::Unhandled,
    }
}

/// 接收线程持有的分发器
///
/// 只持有共享上下文、socket 和应答队列的发送端，不拥有连接状态。
pub struct Dispatcher {
    ctx: Arc<GimbalContext>,
    socket: Arc<FlyerSocket>,
    responses: Sender<Packet>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<GimbalContext>, socket: Arc<FlyerSocket>, responses: Sender<Packet>) -> Self {
        Self {
            ctx,
            socket,
            responses,
        }
    }

    /// 处理一个数据包
    ///
    /// 返回的错误只会被接收线程记录，不会中断接收。
    pub fn handle(&self, packet: Packet) -> Result<(), DriverError> {
        match route(&packet) {
            Route::VersionReport => self.handle_version(&packet),
            Route::Attach => self.handle_attach(),
            Route::Response => {
                trace!("Queued response {}", packet);
                GimbalMetrics::bump(&self.ctx.metrics.responses_queued);
                if self.responses.send(packet).is_err() {
                    // 端口已释放，接收线程即将退出
                    debug!("Response queue disconnected");
                }
                Ok(())
            },
            Route::Unhandled => {
                GimbalMetrics::bump(&self.ctx.metrics.packets_unhandled);
                trace!("Unhandled packet {}", packet);
                Ok(())
            },
        }
    }

    fn handle_version(&self, packet: &Packet) -> Result<(), DriverError> {
        match VersionReport::try_from(packet) {
            Ok(report) => {
                debug!("Firmware version report: {}", report.version);
                self.ctx.link.set_version(report.version);
            },
            Err(e) => {
                GimbalMetrics::bump(&self.ctx.metrics.packets_unhandled);
                warn!("Dropped malformed version report {}: {}", packet, e);
            },
        }
        Ok(())
    }

    fn handle_attach(&self) -> Result<(), DriverError> {
        let ack = control::attach_ack();
        let newly_connected = self.ctx.link.attach(|| {
            self.ctx.log_packet("TX", &ack);
            self.socket.send_packet(&ack)?;
            GimbalMetrics::bump(&self.ctx.metrics.tx_packets);
            Ok::<(), DriverError>(())
        })?;

        if newly_connected {
            match self.ctx.link.version() {
                Some(version) => info!("Connected to gimbal, firmware version {}", version),
                None => info!("Connected to gimbal, firmware version unknown"),
            }
        } else {
            debug!("Repeated attach request acknowledged");
        }

        // 观察者在监视器锁之外触发
        let failures = self.ctx.hooks.read().trigger_packet_sent(&ack);
        for _ in 0..failures {
            GimbalMetrics::bump(&self.ctx.metrics.handler_failures);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use fygimbal_link::LinkConfig;
    use fygimbal_protocol::FirmwareVersion;
    use std::net::UdpSocket;
    use std::time::Duration;

    #[test]
    fn test_route_rules() {
        let version = Packet::with_framing(0, 0x00, vec![0, 0, 0x2C, 0x01], Framing::Extended).unwrap();
        assert_eq!(route(&version), Route::VersionReport);

        // 普通帧的命令 0x00 不是版本上报
        assert_eq!(route(&Packet::new(3, 0x00, Vec::<u8>::new())), Route::Response);

        assert_eq!(route(&Packet::new(0, 0x0B, vec![0x01])), Route::Attach);
        // 扩展帧的 0x0B 不是握手
        let long_attach = Packet::with_framing(3, 0x0B, Vec::<u8>::new(), Framing::Extended).unwrap();
        assert_eq!(route(&long_attach), Route::Response);

        assert_eq!(route(&Packet::new(3, 0x06, vec![1, 0])), Route::Response);
        assert_eq!(route(&Packet::new(1, 0x06, vec![1, 0])), Route::Unhandled);
    }

    fn dispatcher(connected: bool) -> (Dispatcher, UdpSocket, crossbeam_channel::Receiver<Packet>) {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let socket = FlyerSocket::bind(LinkConfig {
            local_addr: "127.0.0.1:0".parse().unwrap(),
            peer_addr: peer.local_addr().unwrap(),
            ..LinkConfig::default()
        })
        .unwrap();
        let (tx, rx) = unbounded();
        let ctx = Arc::new(GimbalContext::new(connected, false));
        (Dispatcher::new(ctx, Arc::new(socket), tx), peer, rx)
    }

    #[test]
    fn test_version_report_updates_state() {
        let (dispatcher, _peer, rx) = dispatcher(false);
        let packet = Packet::with_framing(0, 0x00, vec![0, 0, 0x2C, 0x01], Framing::Extended).unwrap();

        dispatcher.handle(packet).unwrap();

        assert_eq!(
            dispatcher.ctx.link.version(),
            Some(FirmwareVersion::from_hundredths(300))
        );
        assert!(rx.try_recv().is_err(), "version report must not be queued");
    }

    #[test]
    fn test_short_version_report_is_dropped() {
        let (dispatcher, _peer, _rx) = dispatcher(false);
        let packet = Packet::with_framing(0, 0x00, vec![0, 0], Framing::Extended).unwrap();

        assert!(dispatcher.handle(packet).is_ok());
        assert_eq!(dispatcher.ctx.link.version(), None);
        assert_eq!(dispatcher.ctx.metrics.snapshot().packets_unhandled, 1);
    }

    #[test]
    fn test_attach_connects_and_acks() {
        let (dispatcher, peer, _rx) = dispatcher(false);

        dispatcher.handle(Packet::new(0, 0x0B, vec![0x01])).unwrap();
        assert!(dispatcher.ctx.link.is_connected());

        let mut buf = [0u8; 64];
        let (len, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], &[0x01, 0xa5, 0x5a, 0x00, 0x0b, 0x01, 0x01, 0xe1, 0xd3]);
        assert_eq!(dispatcher.ctx.metrics.snapshot().tx_packets, 1);
    }

    #[test]
    fn test_responses_are_queued_in_order() {
        let (dispatcher, _peer, rx) = dispatcher(true);

        dispatcher.handle(Packet::new(3, 0x06, vec![1, 0])).unwrap();
        dispatcher.handle(Packet::new(3, 0x05, vec![2])).unwrap();
        dispatcher.handle(Packet::new(2, 0x05, vec![2])).unwrap();

        assert_eq!(rx.try_recv().unwrap().command(), 0x06);
        assert_eq!(rx.try_recv().unwrap().command(), 0x05);
        assert!(rx.try_recv().is_err());

        let snapshot = dispatcher.ctx.metrics.snapshot();
        assert_eq!(snapshot.responses_queued, 2);
        assert_eq!(snapshot.packets_unhandled, 1);
    }
}
