//! 帧编码与流式解码
//!
//! 线上格式（所有多字节字段均为小端）：
//!
//! ```text
//! +--------+--------+---------+-----------+----------+---------+
//! | sync 2 | target | command | length    | data ... | crc16   |
//! +--------+--------+---------+-----------+----------+---------+
//!                   \________ CRC 覆盖范围 ________/
//! ```
//!
//! `length` 在 `Compact` 帧中占 1 字节，在 `Extended` 帧中占 2 字节。

use crate::packet::{Framing, Packet};
use crate::ProtocolError;
use bytes::Bytes;
use crc::{CRC_16_IBM_3740, CRC_16_XMODEM, Crc};
use tracing::{debug, trace};

/// 解码器默认接受的最大 payload 长度
///
/// 云台数据包远小于此值；超过它的长度字段视为误同步。
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

const CRC_COMPACT: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
// CRC-16/IBM-3740 即常说的 CRC-16/CCITT-FALSE
const CRC_EXTENDED: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// 计算帧体（target 起到 data 结束）的 CRC
pub fn checksum(framing: Framing, body: &[u8]) -> u16 {
    match framing {
        Framing::Compact => CRC_COMPACT.checksum(body),
        Framing::Extended => CRC_EXTENDED.checksum(body),
    }
}

/// 将数据包编码追加到 `out`
///
/// # 错误
/// - `ProtocolError::PayloadTooLong`: payload 超出长度字段范围
pub fn encode_into(packet: &Packet, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    let framing = packet.framing();
    let data = packet.data();
    if data.len() > framing.max_payload() {
        return Err(ProtocolError::PayloadTooLong {
            framing,
            len: data.len(),
        });
    }

    out.reserve(framing.header_len() + data.len() + 2);
    out.extend_from_slice(&framing.sync());

    let body_start = out.len();
    out.push(packet.target());
    out.push(packet.command());
    match framing {
        Framing::Compact => out.push(data.len() as u8),
        Framing::Extended => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
    }
    out.extend_from_slice(data);

    let crc = checksum(framing, &out[body_start..]);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(())
}

/// 将数据包编码为新的字节向量
pub fn encode(packet: &Packet) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::new();
    encode_into(packet, &mut out)?;
    Ok(out)
}

/// 流式解码器
///
/// 输入可以在任意位置被切分，未完整的帧会缓存到下一次输入。
/// 遇到无法识别的字节、CRC 错误或超过 `max_payload` 的长度字段时，
/// 解码器向前滑动一个字节重新寻找同步字。
///
/// # Example
///
/// ```
/// use fygimbal_protocol::{Packet, PacketReceiver, encode};
///
/// let wire = encode(&Packet::new(3, 0x06, vec![0x2C, 0x01])).unwrap();
/// let mut rx = PacketReceiver::new();
///
/// assert!(rx.parse(&wire[..4]).is_empty());
/// let packets = rx.parse(&wire[4..]);
/// assert_eq!(packets.len(), 1);
/// assert_eq!(packets[0].data(), &[0x2C, 0x01]);
/// ```
#[derive(Debug)]
pub struct PacketReceiver {
    buffer: Vec<u8>,
    max_payload: usize,
    crc_errors: u64,
    discarded_bytes: u64,
}

impl Default for PacketReceiver {
    fn default() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }
}

impl PacketReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定可接受的最大 payload 长度
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_payload,
            crc_errors: 0,
            discarded_bytes: 0,
        }
    }

    /// 追加输入字节
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// 追加输入并取出所有已完整的数据包（按到达顺序）
    pub fn parse(&mut self, bytes: &[u8]) -> Vec<Packet> {
        self.push(bytes);
        let mut packets = Vec::new();
        while let Some(packet) = self.next_packet() {
            packets.push(packet);
        }
        packets
    }

    /// 尝试从缓冲区取出下一个完整数据包
    pub fn next_packet(&mut self) -> Option<Packet> {
        loop {
            let start = match self.find_sync() {
                Some(start) => start,
                None => {
                    self.discard_unsynced_tail();
                    return None;
                },
            };
            if start > 0 {
                self.discard(start);
            }

            let framing = Framing::from_sync([self.buffer[0], self.buffer[1]])?;
            let header_len = framing.header_len();
            if self.buffer.len() < header_len {
                return None;
            }

            let len = match framing {
                Framing::Compact => self.buffer[4] as usize,
                Framing::Extended => u16::from_le_bytes([self.buffer[4], self.buffer[5]]) as usize,
            };
            if len > self.max_payload {
                debug!(
                    "Ignoring {} sync with length {} (max {})",
                    framing, len, self.max_payload
                );
                self.discard(1);
                continue;
            }
            let body_end = header_len + len;
            let total = body_end + 2;
            if self.buffer.len() < total {
                return None;
            }

            let expected = checksum(framing, &self.buffer[2..body_end]);
            let received = u16::from_le_bytes([self.buffer[body_end], self.buffer[body_end + 1]]);
            if expected != received {
                self.crc_errors += 1;
                debug!(
                    "CRC mismatch on {} frame: expected 0x{:04x}, got 0x{:04x}",
                    framing, expected, received
                );
                self.discard(1);
                continue;
            }

            let packet = Packet::with_framing(
                self.buffer[2],
                self.buffer[3],
                Bytes::copy_from_slice(&self.buffer[header_len..body_end]),
                framing,
            )
            .ok()?;
            self.buffer.drain(..total);
            trace!("decoded {}", packet);
            return Some(packet);
        }
    }

    /// 当前缓存的未解析字节数
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// 累计 CRC 错误次数
    pub fn crc_errors(&self) -> u64 {
        self.crc_errors
    }

    /// 累计因失步丢弃的字节数
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    /// 清空缓冲区（统计保留）
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    fn find_sync(&self) -> Option<usize> {
        self.buffer
            .windows(2)
            .position(|w| Framing::from_sync([w[0], w[1]]).is_some())
    }

    /// 没有找到同步字时，只保留可能是同步字前半部分的最后一个字节
    fn discard_unsynced_tail(&mut self) {
        let keep = match self.buffer.last() {
            Some(&b) if b == Framing::Compact.sync()[0] || b == Framing::Extended.sync()[0] => 1,
            _ => 0,
        };
        let drop = self.buffer.len() - keep;
        if drop > 0 {
            self.discard(drop);
        }
    }

    fn discard(&mut self, n: usize) {
        self.buffer.drain(..n);
        self.discarded_bytes += n as u64;
    }
}

impl Iterator for PacketReceiver {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        self.next_packet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_extended_cmd01() {
        let packet = Packet::with_framing(0, 1, Bytes::new(), Framing::Extended).unwrap();
        let wire = encode(&packet).unwrap();
        assert_eq!(wire, vec![0x55, 0xaa, 0x00, 0x01, 0x00, 0x00, 0xf0, 0xb3]);
    }

    #[test]
    fn test_encode_compact_set_value() {
        let packet = Packet::new(0, 8, vec![0x65, 0x00, 0x2c, 0x01]);
        let wire = encode(&packet).unwrap();
        assert_eq!(
            wire,
            vec![0xa5, 0x5a, 0x00, 0x08, 0x04, 0x65, 0x00, 0x2c, 0x01, 0x79, 0x32]
        );
    }

    #[test]
    fn test_encode_attach_ack() {
        let packet = Packet::new(0, 0x0B, vec![0x01]);
        let wire = encode(&packet).unwrap();
        assert_eq!(wire, vec![0xa5, 0x5a, 0x00, 0x0b, 0x01, 0x01, 0xe1, 0xd3]);
    }

    #[test]
    fn test_decode_version_report() {
        let wire = [
            0x55, 0xaa, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x2c, 0x01, 0x35, 0x64,
        ];
        let mut rx = PacketReceiver::new();
        let packets = rx.parse(&wire);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].framing(), Framing::Extended);
        assert_eq!(packets[0].command(), 0x00);
        assert_eq!(packets[0].data(), &[0x00, 0x00, 0x2c, 0x01]);
        assert_eq!(rx.buffered(), 0);
    }

    #[test]
    fn test_decode_multiple_packets_in_order() {
        let mut wire = encode(&Packet::new(3, 0x06, vec![0x01, 0x00])).unwrap();
        wire.extend(encode(&Packet::new(3, 0x05, vec![0x02])).unwrap());
        wire.extend(encode(&Packet::new(0, 0x0B, Bytes::new())).unwrap());

        let packets = PacketReceiver::new().parse(&wire);
        let commands: Vec<u8> = packets.iter().map(|p| p.command()).collect();
        assert_eq!(commands, vec![0x06, 0x05, 0x0B]);
    }

    #[test]
    fn test_decode_skips_leading_garbage() {
        let mut wire = vec![0x00, 0x11, 0xA5, 0x22];
        wire.extend(encode(&Packet::new(3, 0x06, vec![0x7F])).unwrap());

        let mut rx = PacketReceiver::new();
        let packets = rx.parse(&wire);
        assert_eq!(packets.len(), 1);
        assert_eq!(rx.discarded_bytes(), 4);
    }

    #[test]
    fn test_decode_resyncs_after_crc_error() {
        let mut bad = encode(&Packet::new(3, 0x06, vec![0x01, 0x02])).unwrap();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let good = encode(&Packet::new(3, 0x0C, vec![0x05])).unwrap();

        let mut rx = PacketReceiver::new();
        let mut wire = bad;
        wire.extend(&good);
        let packets = rx.parse(&wire);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].command(), 0x0C);
        assert_eq!(rx.crc_errors(), 1);
    }

    #[test]
    fn test_decode_skips_false_sync_inside_corrupt_frame() {
        // payload 中含有扩展帧同步字和 0xFFFF 长度
        let mut bad = encode(&Packet::new(3, 0x06, vec![0x55, 0xAA, 0x00, 0x00, 0xFF, 0xFF])).unwrap();
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;

        let mut rx = PacketReceiver::new();
        assert!(rx.parse(&bad).is_empty());
        assert_eq!(rx.crc_errors(), 1);

        let good = encode(&Packet::new(3, 0x06, vec![0x2C, 0x01])).unwrap();
        let decoded: usize = (0..50).map(|_| rx.parse(&good).len()).sum();
        assert_eq!(decoded, 50);
        assert_eq!(rx.buffered(), 0);
    }

    #[test]
    fn test_max_payload_is_configurable() {
        let wire = encode(&Packet::new(3, 0x06, vec![0u8; 32])).unwrap();

        assert!(PacketReceiver::with_max_payload(16).parse(&wire).is_empty());
        assert_eq!(PacketReceiver::with_max_payload(32).parse(&wire).len(), 1);
    }

    #[test]
    fn test_decode_keeps_partial_sync_byte() {
        let wire = encode(&Packet::new(1, 0x03, vec![0x01])).unwrap();
        let mut rx = PacketReceiver::new();

        assert!(rx.parse(&wire[..1]).is_empty());
        assert_eq!(rx.buffered(), 1);
        assert_eq!(rx.parse(&wire[1..]).len(), 1);
    }

    #[test]
    fn test_iterator_drains_buffer() {
        let mut rx = PacketReceiver::new();
        rx.push(&encode(&Packet::new(3, 0x06, vec![0x01, 0x00])).unwrap());
        rx.push(&encode(&Packet::new(3, 0x06, vec![0x02, 0x00])).unwrap());
        assert_eq!(rx.by_ref().count(), 2);
        assert_eq!(rx.buffered(), 0);
    }

    fn arb_packet() -> impl Strategy<Value = Packet> {
        (
            any::<u8>(),
            any::<u8>(),
            prop::collection::vec(any::<u8>(), 0..600),
            any::<bool>(),
        )
            .prop_map(|(target, command, data, extended)| {
                if extended {
                    Packet::with_framing(target, command, data, Framing::Extended).unwrap()
                } else {
                    Packet::new(target, command, data)
                }
            })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(packet in arb_packet()) {
            let wire = encode(&packet).unwrap();
            let decoded = PacketReceiver::new().parse(&wire);
            prop_assert_eq!(decoded, vec![packet]);
        }

        #[test]
        fn prop_decode_is_split_invariant(
            packets in prop::collection::vec(arb_packet(), 1..5),
            split in any::<prop::sample::Index>(),
        ) {
            let mut wire = Vec::new();
            for p in &packets {
                encode_into(p, &mut wire).unwrap();
            }
            let cut = split.index(wire.len() + 1);

            let mut rx = PacketReceiver::new();
            let mut decoded = rx.parse(&wire[..cut]);
            decoded.extend(rx.parse(&wire[cut..]));
            prop_assert_eq!(decoded, packets);
        }
    }
}
