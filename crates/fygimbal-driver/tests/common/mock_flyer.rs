//! 回环 UDP 上的模拟飞行器
//!
//! 在 127.0.0.1 上绑定一个随机端口，解码收到的云台数据包并记录下来，
//! 再把应答函数返回的数据包发回给来源地址。

use fygimbal_driver::{GimbalConfig, LinkConfig, MessageTags, Packet};
use fygimbal_protocol::{Framing, PacketReceiver, encode};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Responder = Box<dyn FnMut(&Packet) -> Vec<Packet> + Send>;

pub struct MockFlyer {
    socket: Arc<UdpSocket>,
    received: Arc<Mutex<Vec<Packet>>>,
    datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockFlyer {
    /// 启动模拟飞行器，`responder` 为每个收到的数据包生成应答
    pub fn start(responder: impl FnMut(&Packet) -> Vec<Packet> + Send + 'static) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").unwrap());
        socket.set_read_timeout(Some(Duration::from_millis(10))).unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let datagrams = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let socket = socket.clone();
            let received = received.clone();
            let datagrams = datagrams.clone();
            let running = running.clone();
            let mut responder: Responder = Box::new(responder);
            thread::spawn(move || {
                let tags = MessageTags::default();
                let mut decoder = PacketReceiver::new();
                let mut buf = [0u8; 4096];

                while running.load(Ordering::Acquire) {
                    let (len, src) = match socket.recv_from(&mut buf) {
                        Ok(r) => r,
                        Err(_) => continue,
                    };
                    datagrams.lock().unwrap().push(buf[..len].to_vec());
                    if len == 0 || buf[0] != tags.gimbal {
                        continue;
                    }

                    for packet in decoder.parse(&buf[1..len]) {
                        received.lock().unwrap().push(packet.clone());
                        for reply in responder(&packet) {
                            let _ = socket.send_to(&tagged(&reply), src);
                        }
                    }
                }
            })
        };

        Self {
            socket,
            received,
            datagrams,
            running,
            handle: Some(handle),
        }
    }

    /// 从不应答的飞行器
    pub fn silent() -> Self {
        Self::start(|_| Vec::new())
    }

    pub fn addr(&self) -> SocketAddr {
        self.socket.local_addr().unwrap()
    }

    /// 已收到的云台数据包（按到达顺序）
    pub fn received(&self) -> Vec<Packet> {
        self.received.lock().unwrap().clone()
    }

    /// 已收到的原始数据报（含标签）
    pub fn datagrams(&self) -> Vec<Vec<u8>> {
        self.datagrams.lock().unwrap().clone()
    }

    /// 等待至少收到 `count` 个数据包
    pub fn wait_for_packets(&self, count: usize, timeout: Duration) -> Vec<Packet> {
        let deadline = Instant::now() + timeout;
        loop {
            let packets = self.received();
            if packets.len() >= count || Instant::now() >= deadline {
                return packets;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// 向地面站发送一个云台数据包
    pub fn send_packet(&self, dest: SocketAddr, packet: &Packet) {
        self.socket.send_to(&tagged(packet), dest).unwrap();
    }

    pub fn send_raw(&self, dest: SocketAddr, datagram: &[u8]) {
        self.socket.send_to(datagram, dest).unwrap();
    }

    /// 发送握手请求（普通帧，命令 0x0B）
    pub fn announce(&self, dest: SocketAddr) {
        self.send_packet(dest, &Packet::new(0, 0x0B, vec![0x00]));
    }

    /// 发送版本上报（扩展帧，命令 0x00）
    pub fn report_version(&self, dest: SocketAddr, hundredths: u16) {
        let mut data = vec![0x00, 0x00];
        data.extend_from_slice(&hundredths.to_le_bytes());
        let packet = Packet::with_framing(0, 0x00, data, Framing::Extended).unwrap();
        self.send_packet(dest, &packet);
    }
}

impl Drop for MockFlyer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn tagged(packet: &Packet) -> Vec<u8> {
    let mut datagram = vec![MessageTags::default().gimbal];
    datagram.extend(encode(packet).unwrap());
    datagram
}

/// 指向模拟飞行器的端口配置（已连接、短超时）
pub fn port_config(flyer: &MockFlyer) -> GimbalConfig {
    GimbalConfig {
        link: LinkConfig {
            local_addr: "127.0.0.1:0".parse().unwrap(),
            peer_addr: flyer.addr(),
            read_timeout_ms: 10,
            ..LinkConfig::default()
        },
        transaction_timeout_ms: 100,
        transaction_retries: 2,
        connect_timeout_ms: 500,
        connected: Some(true),
        ..GimbalConfig::default()
    }
}

/// 主机应答（目标 0x03）
pub fn host_reply(command: u8, data: impl Into<Vec<u8>>) -> Packet {
    Packet::new(0x03, command, data.into())
}

/// 轮询直到条件成立
pub fn wait_until(timeout: Duration, mut f: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !f() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    true
}
