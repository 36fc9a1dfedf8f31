//! UDP socket 封装
//!
//! `FlyerSocket` 只与配置中的一个对端通信。`UdpSocket` 的收发都只需要 `&self`，
//! 因此同一个实例可以通过 `Arc` 在接收线程和调用线程之间共享。

use crate::config::LinkConfig;
use crate::message::{LedPixel, gimbal_datagram, led_datagram};
use crate::LinkError;
use fygimbal_protocol::Packet;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::debug;

pub struct FlyerSocket {
    socket: UdpSocket,
    config: LinkConfig,
}

impl FlyerSocket {
    /// 绑定本地地址并设置读超时
    ///
    /// # 错误
    /// - `LinkError::Io`: 绑定失败（地址被占用、网卡不存在等）
    pub fn bind(config: LinkConfig) -> Result<Self, LinkError> {
        let socket = UdpSocket::bind(config.local_addr)?;
        if config.read_timeout_ms > 0 {
            socket.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        debug!(
            "Bound {} (peer {})",
            socket.local_addr()?,
            config.peer_addr
        );
        Ok(Self { socket, config })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// 实际绑定的本地地址（绑定端口 0 时用于获取系统分配的端口）
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.config.peer_addr
    }

    /// 发送云台数据包
    pub fn send_packet(&self, packet: &Packet) -> Result<usize, LinkError> {
        let datagram = gimbal_datagram(&self.config.tags, packet)?;
        self.send_raw(&datagram)
    }

    /// 发送 LED 帧
    pub fn send_leds(&self, pixels: &[LedPixel]) -> Result<usize, LinkError> {
        let datagram = led_datagram(&self.config.tags, pixels);
        self.send_raw(&datagram)
    }

    /// 发送原始数据报（调用方负责标签）
    pub fn send_raw(&self, datagram: &[u8]) -> Result<usize, LinkError> {
        Ok(self.socket.send_to(datagram, self.config.peer_addr)?)
    }

    /// 接收一个数据报
    ///
    /// # 返回
    /// - `Ok(Some((len, src)))`: 收到数据报
    /// - `Ok(None)`: 读超时
    /// - `Err`: socket 错误
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, LinkError> {
        match self.socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            },
            Err(e) => Err(LinkError::Io(e)),
        }
    }
}
