//! 握手、启动探测与版本上报

mod common;

use common::{MockFlyer, host_reply, port_config, wait_until};
use fygimbal_driver::ids::{CMD_GET_VALUE, CMD_SERIAL_ATTACH, VALUE_IDENTITY};
use fygimbal_driver::{FirmwareVersion, GimbalConfig, GimbalPort, ParamFormat, control};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn disconnected_config(flyer: &MockFlyer) -> GimbalConfig {
    GimbalConfig {
        connected: Some(false),
        ..port_config(flyer)
    }
}

#[test]
fn test_send_blocks_until_connect_timeout() {
    let flyer = MockFlyer::silent();
    let port = GimbalPort::new(GimbalConfig {
        connect_timeout_ms: 100,
        ..disconnected_config(&flyer)
    })
    .unwrap();

    let start = Instant::now();
    let err = port.send(&control::motor_power(0, true)).unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(100));

    let err = port.get_param(0, 0x10, ParamFormat::I16).unwrap_err();
    assert!(err.is_timeout());

    thread::sleep(Duration::from_millis(30));
    assert!(flyer.received().is_empty(), "nothing may be sent before the handshake");
}

#[test]
fn test_handshake_unblocks_pending_transaction() {
    let flyer = MockFlyer::start(|packet| {
        if packet.command() == CMD_GET_VALUE {
            vec![host_reply(CMD_GET_VALUE, vec![0x07, 0x00])]
        } else {
            Vec::new()
        }
    });
    let port = Arc::new(
        GimbalPort::new(GimbalConfig {
            connect_timeout_ms: 3000,
            ..disconnected_config(&flyer)
        })
        .unwrap(),
    );
    assert!(!port.is_connected());

    let waiter = {
        let port = port.clone();
        thread::spawn(move || port.get_param(1, 0x22, ParamFormat::I16))
    };

    thread::sleep(Duration::from_millis(100));
    flyer.announce(port.local_addr().unwrap());

    assert_eq!(waiter.join().unwrap().unwrap(), 7);
    assert!(port.is_connected());

    // 应答先于被唤醒线程的请求发出
    let packets = flyer.wait_for_packets(2, Duration::from_secs(1));
    assert_eq!(packets[0], control::attach_ack());
    assert_eq!(packets[0].data(), &[0x01]);
    assert_eq!(packets[1].command(), CMD_GET_VALUE);
}

#[test]
fn test_repeated_handshake_is_acknowledged_again() {
    let flyer = MockFlyer::silent();
    let port = GimbalPort::new(disconnected_config(&flyer)).unwrap();
    let local = port.local_addr().unwrap();

    flyer.announce(local);
    flyer.announce(local);

    let packets = flyer.wait_for_packets(2, Duration::from_secs(1));
    assert_eq!(packets.len(), 2);
    assert!(packets.iter().all(|p| p.command() == CMD_SERIAL_ATTACH));
    assert!(port.is_connected());
}

#[test]
fn test_wait_connect_override_timeout() {
    let flyer = MockFlyer::silent();
    let port = GimbalPort::new(disconnected_config(&flyer)).unwrap();

    let start = Instant::now();
    assert!(port.wait_connect(Some(Duration::from_millis(30))).unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_millis(400));
}

#[test]
fn test_probe_detects_existing_connection() {
    let flyer = MockFlyer::start(|packet| {
        if packet.command() == CMD_GET_VALUE && packet.data() == [VALUE_IDENTITY].as_slice() {
            vec![host_reply(CMD_GET_VALUE, 300u16.to_le_bytes().to_vec())]
        } else {
            Vec::new()
        }
    });
    let port = GimbalPort::new(GimbalConfig {
        connected: None,
        ..port_config(&flyer)
    })
    .unwrap();

    assert!(port.is_connected());
    assert_eq!(port.version(), Some(FirmwareVersion::from_hundredths(300)));

    // 探测只尝试一次，目标为主 MCU
    let packets = flyer.received();
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].target(), 0);
    assert_eq!(packets[0].data(), &[VALUE_IDENTITY]);
}

#[test]
fn test_startup_identity_is_signed() {
    // 0x8000 按 I16 解码为负数，不能作为版本号
    let flyer = MockFlyer::start(|packet| {
        if packet.command() == CMD_GET_VALUE {
            vec![host_reply(CMD_GET_VALUE, vec![0x00, 0x80])]
        } else {
            Vec::new()
        }
    });
    let port = GimbalPort::new(GimbalConfig {
        connected: None,
        ..port_config(&flyer)
    })
    .unwrap();

    assert!(port.is_connected());
    assert_eq!(port.version(), None);
}

#[test]
fn test_probe_timeout_waits_for_handshake() {
    let flyer = MockFlyer::silent();
    let start = Instant::now();
    let port = GimbalPort::new(GimbalConfig {
        connected: None,
        probe_timeout_ms: 50,
        ..port_config(&flyer)
    })
    .unwrap();

    assert!(!port.is_connected());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(flyer.wait_for_packets(1, Duration::from_millis(200)).len(), 1);

    flyer.announce(port.local_addr().unwrap());
    assert!(port.wait_connect(Some(Duration::from_secs(1))).is_ok());
}

#[test]
fn test_version_report_is_recorded() {
    let flyer = MockFlyer::silent();
    let port = GimbalPort::new(disconnected_config(&flyer)).unwrap();
    let local = port.local_addr().unwrap();

    flyer.report_version(local, 312);
    assert!(wait_until(Duration::from_secs(1), || port.version().is_some()));
    assert_eq!(port.version().unwrap().to_string(), "3.12");

    // 版本上报不改变连接状态
    assert!(!port.is_connected());
}

#[test]
fn test_probe_keeps_reported_version() {
    // 上报的版本优先于 identity 参数
    let flyer = MockFlyer::start(|packet| {
        if packet.command() == CMD_GET_VALUE {
            vec![host_reply(CMD_GET_VALUE, 250u16.to_le_bytes().to_vec())]
        } else {
            Vec::new()
        }
    });
    let port = GimbalPort::new(disconnected_config(&flyer)).unwrap();
    let local = port.local_addr().unwrap();

    flyer.report_version(local, 312);
    assert!(wait_until(Duration::from_secs(1), || port.version().is_some()));

    assert!(port.probe().unwrap());
    assert!(port.is_connected());
    assert_eq!(port.version(), Some(FirmwareVersion::from_hundredths(312)));
}
