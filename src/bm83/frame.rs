//! Frame codec for the BM83 UART protocol.
//!
//! Frame format (both directions):
//! - START (1 byte): 0xAA
//! - LENGTH (2 bytes, big-endian): code byte + payload, checksum excluded
//! - CODE (1 byte): event code (inbound) or command opcode (outbound)
//! - PAYLOAD (LENGTH - 1 bytes)
//! - CHECKSUM (1 byte): `0xFF - Σ(length bytes, code, payload) + 1`, mod 256,
//!   so every byte after the start word sums to zero.

use heapless::Vec;

use super::protocol::START_WORD;
use crate::config::MAX_FRAME_PAYLOAD;
use crate::logging::{trace_frame, Direction};
use crate::queue::ByteQueue;
use crate::log_warn;

/// Start word + two length bytes.
const HEADER_LEN: usize = 3;

/// Outbound byte sink: the transport's TX queue or UART driver.
pub trait Transmit {
    /// Append one byte to the outbound path.
    fn write_byte(&mut self, byte: u8);

    /// Bytes that can still be written before the sink is full.
    fn free(&self) -> usize;

    /// Signal that a complete frame is queued and transmission may start.
    fn begin_transmit(&mut self) {}
}

impl<const N: usize> Transmit for ByteQueue<N> {
    fn write_byte(&mut self, byte: u8) {
        self.push(byte);
    }

    fn free(&self) -> usize {
        ByteQueue::<N>::free(self)
    }
}

/// A decoded inbound frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Event code.
    pub code: u8,
    /// Bytes following the event code (`DB0..`).
    pub payload: Vec<u8, MAX_FRAME_PAYLOAD>,
    /// Checksum byte as received.
    pub checksum: u8,
}

impl Frame {
    /// Value of the on-wire length field for this frame.
    pub fn length(&self) -> u16 {
        (self.payload.len() + 1) as u16
    }

    /// Checksum the sender should have put on this frame.
    pub fn expected_checksum(&self) -> u8 {
        fold_checksum(
            self.length(),
            core::iter::once(&self.code).chain(self.payload.iter()),
        )
    }

    pub fn checksum_ok(&self) -> bool {
        self.checksum == self.expected_checksum()
    }
}

/// Checksum for an outbound command (`body` = opcode + parameters).
pub fn checksum(body: &[u8]) -> u8 {
    fold_checksum(body.len() as u16, body.iter())
}

fn fold_checksum<'a>(length: u16, bytes: impl Iterator<Item = &'a u8>) -> u8 {
    let [hi, lo] = length.to_be_bytes();
    let sum = bytes.fold(0xFFu8.wrapping_sub(hi).wrapping_sub(lo), |acc, b| {
        acc.wrapping_sub(*b)
    });
    sum.wrapping_add(1)
}

/// Try to pull exactly one frame off the front of `rx`.
///
/// Returns `None` when the queue holds noise (one byte is discarded) or an
/// incomplete frame (nothing is consumed; retry on the next tick).
pub fn decode<const N: usize>(rx: &mut ByteQueue<N>, now_ms: u64) -> Option<Frame> {
    if rx.len() < HEADER_LEN {
        return None;
    }

    if rx.peek(0) != START_WORD {
        let byte = rx.pop().unwrap_or_default();
        log_warn!("BT: Invalid Start Word [{:02X}]", byte);
        return None;
    }

    let length = u16::from_be_bytes([rx.peek(1), rx.peek(2)]);
    let payload_len = usize::from(length).saturating_sub(1);
    let frame_len = HEADER_LEN + usize::from(length) + 1;
    if length == 0 || payload_len > MAX_FRAME_PAYLOAD || frame_len > N {
        // Not a frame we could ever complete; leaving it would stall the queue.
        rx.pop();
        log_warn!("BT: Frame length {} exceeds buffer, resyncing", length);
        return None;
    }

    if rx.len() < frame_len {
        return None;
    }

    for _ in 0..HEADER_LEN {
        rx.pop();
    }
    let code = rx.pop().unwrap_or_default();
    let mut payload = Vec::new();
    for _ in 0..payload_len {
        let _ = payload.push(rx.pop().unwrap_or_default());
    }
    let checksum = rx.pop().unwrap_or_default();

    trace_frame(Direction::Rx, now_ms, length, code, &payload, checksum);

    let frame = Frame {
        code,
        payload,
        checksum,
    };
    if !frame.checksum_ok() {
        log_warn!(
            "BT: Checksum mismatch on {:02X}: got {:02X}, expected {:02X}",
            code,
            checksum,
            frame.expected_checksum()
        );
    }
    Some(frame)
}

/// Frame `command` (opcode + parameters) onto `tx` and kick transmission.
///
/// A frame that does not fit in `tx` as a whole is dropped with a warning;
/// nothing is written.
pub fn encode<T: Transmit>(tx: &mut T, command: &[u8], now_ms: u64) {
    let Some((&code, params)) = command.split_first() else {
        return;
    };

    let frame_len = HEADER_LEN + command.len() + 1;
    if tx.free() < frame_len {
        log_warn!(
            "BT: TX full, dropped command {:02X} ({} bytes free, {} needed)",
            code,
            tx.free(),
            frame_len
        );
        return;
    }

    let length = command.len() as u16;
    let [hi, lo] = length.to_be_bytes();
    let checksum = checksum(command);

    tx.write_byte(START_WORD);
    tx.write_byte(hi);
    tx.write_byte(lo);
    for &b in command {
        tx.write_byte(b);
    }
    tx.write_byte(checksum);

    trace_frame(Direction::Tx, now_ms, length, code, params, checksum);
    tx.begin_transmit();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<const N: usize>(q: &mut ByteQueue<N>) -> std::vec::Vec<u8> {
        core::iter::from_fn(|| q.pop()).collect()
    }

    #[test]
    fn checksum_matches_formula() {
        // 0xFF - 0x00 - 0x02 - 0x14 - 0x02 + 1
        assert_eq!(checksum(&[0x14, 0x02]), 0xE8);
        assert_eq!(checksum(&[0x02, 0x00, 0x06]), 0xF5);
    }

    #[test]
    fn checksum_zeroes_the_byte_sum() {
        let body = [0x0B, 0x01, 0x20, 0x00, 0x00, 0x09, 0xFF, 0xFF];
        let total = (body.len() as u8)
            .wrapping_add(body.iter().fold(0u8, |a, b| a.wrapping_add(*b)))
            .wrapping_add(checksum(&body));
        assert_eq!(total, 0);
    }

    #[test]
    fn encode_writes_full_frame() {
        let mut tx: ByteQueue<16> = ByteQueue::new();
        encode(&mut tx, &[0x14, 0x02], 0);
        assert_eq!(drain(&mut tx), [0xAA, 0x00, 0x02, 0x14, 0x02, 0xE8]);
    }

    #[test]
    fn encode_ignores_empty_command() {
        let mut tx: ByteQueue<16> = ByteQueue::new();
        encode(&mut tx, &[], 0);
        assert!(tx.is_empty());
    }

    #[test]
    fn encode_then_decode_reproduces_command() {
        let mut q: ByteQueue<64> = ByteQueue::new();
        let command = [0x0B, 0x03, 0x10, 0x00, 0x00, 0x01, 0x03];
        encode(&mut q, &command, 0);

        let frame = decode(&mut q, 0).expect("frame");
        assert_eq!(frame.code, 0x0B);
        assert_eq!(&frame.payload[..], &command[1..]);
        assert_eq!(frame.checksum, checksum(&command));
        assert!(frame.checksum_ok());
        assert!(q.is_empty());
    }

    #[test]
    fn decode_waits_for_complete_frame() {
        let mut q: ByteQueue<64> = ByteQueue::new();
        q.extend_from_slice(&[0xAA, 0x00, 0x03, 0x02, 0x00]);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 5);

        q.push(0x06);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 6);

        q.push(0xF5);
        let frame = decode(&mut q, 0).expect("frame");
        assert_eq!(frame.code, 0x02);
        assert_eq!(&frame.payload[..], &[0x00, 0x06]);
        assert!(frame.checksum_ok());
    }

    #[test]
    fn decode_needs_three_bytes_before_looking() {
        let mut q: ByteQueue<8> = ByteQueue::new();
        q.extend_from_slice(&[0x55, 0x66]);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn decode_discards_one_noise_byte_per_call() {
        let mut q: ByteQueue<64> = ByteQueue::new();
        q.extend_from_slice(&[0x11, 0x22, 0xAA, 0x00, 0x02, 0x00, 0x14, 0xE9]);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 7);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 6);

        let frame = decode(&mut q, 0).expect("frame after resync");
        assert_eq!(frame.code, 0x00);
        assert_eq!(&frame.payload[..], &[0x14]);
    }

    #[test]
    fn decode_skips_zero_length() {
        let mut q: ByteQueue<16> = ByteQueue::new();
        q.extend_from_slice(&[0xAA, 0x00, 0x00, 0xFF]);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 3);
        assert_eq!(q.peek(0), 0x00);
    }

    #[test]
    fn decode_drops_start_word_of_impossible_length() {
        let mut q: ByteQueue<16> = ByteQueue::new();
        q.extend_from_slice(&[0xAA, 0x01, 0x00, 0x01]);
        assert!(decode(&mut q, 0).is_none());
        assert_eq!(q.len(), 3);
        assert_eq!(q.peek(0), 0x01);
    }

    #[test]
    fn decode_keeps_frames_with_bad_checksum() {
        let mut q: ByteQueue<16> = ByteQueue::new();
        q.extend_from_slice(&[0xAA, 0x00, 0x03, 0x02, 0x00, 0x06, 0x00]);
        let frame = decode(&mut q, 0).expect("frame");
        assert!(!frame.checksum_ok());
        assert_eq!(frame.expected_checksum(), 0xF5);
    }

    #[test]
    fn encode_skips_frame_that_does_not_fit() {
        let mut tx: ByteQueue<8> = ByteQueue::new();
        tx.extend_from_slice(&[1, 2, 3, 4, 5]);
        encode(&mut tx, &[0x14, 0x02], 0);
        assert_eq!(drain(&mut tx), [1, 2, 3, 4, 5]);

        // Exactly enough room is fine.
        let mut tx: ByteQueue<8> = ByteQueue::new();
        tx.extend_from_slice(&[1, 2]);
        encode(&mut tx, &[0x14, 0x02], 0);
        assert_eq!(drain(&mut tx), [1, 2, 0xAA, 0x00, 0x02, 0x14, 0x02, 0xE8]);
    }

    #[test]
    fn decode_takes_only_one_frame_per_call() {
        let mut q: ByteQueue<64> = ByteQueue::new();
        encode(&mut q, &[0x14, 0x01], 0);
        encode(&mut q, &[0x14, 0x02], 0);
        let first = decode(&mut q, 0).expect("first");
        assert_eq!(&first.payload[..], &[0x01]);
        assert_eq!(q.len(), 6);
        let second = decode(&mut q, 0).expect("second");
        assert_eq!(&second.payload[..], &[0x02]);
    }
}
