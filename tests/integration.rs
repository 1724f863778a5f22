//! Integration tests for the BM83 protocol engine through its public API.

use bm83_bridge::bm83::protocol::{avrcp_pdu, btm_status, AvrcpEvent};
use bm83_bridge::bm83::{commands, CallStatus, LinkStatus, PlaybackStatus, PowerState};
use bm83_bridge::config::{RX_QUEUE_SIZE, TX_QUEUE_SIZE};
use bm83_bridge::{Bm83, BtEvent, ByteQueue};

struct Harness {
    engine: Bm83,
    rx: ByteQueue<RX_QUEUE_SIZE>,
    tx: ByteQueue<TX_QUEUE_SIZE>,
}

impl Harness {
    fn new() -> Self {
        Self {
            engine: Bm83::new(),
            rx: ByteQueue::new(),
            tx: ByteQueue::new(),
        }
    }

    /// Queue `body` as a module event, framed the same way the module does.
    fn receive(&mut self, body: &[u8]) {
        bm83_bridge::bm83::frame::encode(&mut self.rx, body, 0);
    }

    /// Process until the RX queue stops shrinking.
    fn run(&mut self) -> Vec<BtEvent> {
        let mut events = Vec::new();
        loop {
            let before = self.rx.len();
            events.extend(self.engine.process(&mut self.rx, &mut self.tx, 0));
            if self.rx.len() == before {
                return events;
            }
        }
    }

    fn sent(&mut self) -> Vec<u8> {
        std::iter::from_fn(|| self.tx.pop()).collect()
    }

    fn connect_phone(&mut self) {
        self.receive(&[0x1F, 0x01, 0x01, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        self.run();
        let device = self.engine.paired_devices().get(1).cloned().unwrap();
        let cmd = commands::connect(self.engine.state_mut(), &device);
        self.engine.send(&cmd, &mut self.tx, 0);
        self.receive(&[0x01, btm_status::A2DP_CONN, 0x01]);
        self.receive(&[0x01, btm_status::AVRCP_CONN, 0x01]);
        self.run();
        self.sent();
    }
}

fn avc(ctype: u8, pdu: u8, tail: &[u8]) -> Vec<u8> {
    let mut body = vec![0x1A, 0x01, ctype, 0x48, 0x00, 0x00, 0x19, 0x58, pdu, 0x00, 0x00, 0x00];
    body.extend_from_slice(tail);
    body
}

#[test]
fn raw_call_status_frame_is_acknowledged() {
    let mut h = Harness::new();
    h.rx.extend_from_slice(&[0xAA, 0x00, 0x03, 0x02, 0x00, 0x06, 0xF5]);

    assert_eq!(h.run(), [BtEvent::CallStatusUpdate(CallStatus::Active)]);
    assert_eq!(h.engine.status().call_status, CallStatus::Active);
    assert_eq!(h.sent(), [0xAA, 0x00, 0x02, 0x14, 0x02, 0xE8]);
}

#[test]
fn full_tx_queue_never_carries_partial_frames() {
    let mut engine = Bm83::new();
    let mut tx: ByteQueue<8> = ByteQueue::new();
    tx.extend_from_slice(&[0x55; 4]);

    // Needs 7 bytes, only 4 are free.
    engine.send(&commands::read_linked_device_information(engine.state(), 0x00), &mut tx, 0);
    assert_eq!(tx.len(), 4);

    // A 5-byte frame still fits.
    engine.send(&commands::read_link_status(), &mut tx, 0);
    let sent: Vec<u8> = std::iter::from_fn(|| tx.pop()).collect();
    assert_eq!(sent, [0x55, 0x55, 0x55, 0x55, 0xAA, 0x00, 0x01, 0x0D, 0xF2]);
}

#[test]
fn frames_split_across_reads_are_reassembled() {
    let mut h = Harness::new();
    let frame = [0xAA, 0x00, 0x03, 0x02, 0x00, 0x02, 0xF9];

    h.rx.extend_from_slice(&frame[..3]);
    assert!(h.run().is_empty());
    h.rx.extend_from_slice(&frame[3..]);
    assert_eq!(h.run(), [BtEvent::CallStatusUpdate(CallStatus::Incoming)]);
}

#[test]
fn paired_device_reply_fills_registry() {
    let mut h = Harness::new();
    h.receive(&[
        0x1F, 0x02, //
        0x01, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, //
        0x02, 0xF6, 0xE5, 0xD4, 0xC3, 0xB2, 0xA1,
    ]);

    assert_eq!(h.run(), [BtEvent::DeviceFound]);
    let paired = h.engine.paired_devices();
    assert_eq!(paired.len(), 2);
    assert_eq!(
        paired.get(1).map(|d| d.mac_id),
        Some([0x11, 0x22, 0x33, 0x44, 0x55, 0x66])
    );
    assert_eq!(
        paired.get(2).map(|d| d.mac_id),
        Some([0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6])
    );
}

#[test]
fn capabilities_reply_sets_supported_events() {
    let mut h = Harness::new();
    h.connect_phone();

    let reply = avc(
        0x0C,
        avrcp_pdu::GET_CAPABILITIES,
        &[avrcp_pdu::CAP_TYPE_EVENTS, 0x02, 0x01, 0x02],
    );
    h.receive(&reply);
    assert_eq!(
        h.run(),
        [BtEvent::AvrcpPduChange {
            kind: avrcp_pdu::GET_CAPABILITIES,
            value: 0x00
        }]
    );

    let caps = h.engine.active_device().avrcp_caps;
    assert!(caps.supports(AvrcpEvent::PlaybackStatusChanged));
    assert!(caps.supports(AvrcpEvent::TrackChanged));
    assert!(!caps.supports(AvrcpEvent::VolumeChanged));
}

#[test]
fn playback_change_notification() {
    let mut h = Harness::new();
    h.connect_phone();

    h.receive(&avc(
        0x0D,
        avrcp_pdu::REGISTER_NOTIFICATION,
        &[AvrcpEvent::PlaybackStatusChanged.code(), 0x01],
    ));
    assert_eq!(
        h.run(),
        [
            BtEvent::PlaybackStatusChange(PlaybackStatus::Playing),
            BtEvent::AvrcpPduChange {
                kind: AvrcpEvent::PlaybackStatusChanged.code(),
                value: 0x01
            },
        ]
    );
    assert_eq!(h.engine.status().playback_status, PlaybackStatus::Playing);
}

#[test]
fn element_attributes_reply_updates_metadata() {
    let mut h = Harness::new();
    h.connect_phone();

    let mut tail = vec![0x02];
    for (id, value) in [(0x01u8, "Song"), (0x02, "Band")] {
        tail.extend_from_slice(&[0x00, 0x00, 0x00, id, 0x00, 0x6A]);
        tail.extend_from_slice(&(value.len() as u16).to_be_bytes());
        tail.extend_from_slice(value.as_bytes());
    }
    h.receive(&avc(0x0C, avrcp_pdu::GET_ELEMENT_ATTRIBUTES, &tail));

    assert_eq!(h.run(), [BtEvent::MetadataUpdate]);
    let metadata = h.engine.metadata();
    assert_eq!(metadata.title.as_str(), "Song");
    assert_eq!(metadata.artist.as_str(), "Band");
    assert!(metadata.album.is_empty());
}

#[test]
fn standby_while_connected_drops_device() {
    let mut h = Harness::new();
    h.connect_phone();
    assert_eq!(h.engine.status().status, LinkStatus::Connected);

    h.receive(&[0x01, btm_status::STANDBY_ON]);
    assert_eq!(h.run(), [BtEvent::DeviceDisconnected, BtEvent::BootStatus]);
    assert!(h.engine.active_device().is_empty());
    assert_eq!(h.engine.status().status, LinkStatus::Disconnected);
    assert_eq!(h.engine.status().power_state, PowerState::Standby);
    // Acknowledged like any other event.
    assert_eq!(h.sent(), [0xAA, 0x00, 0x02, 0x14, 0x01, 0xE9]);
}
