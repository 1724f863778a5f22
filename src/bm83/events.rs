//! Event dispatch: routes decoded frames into state updates and
//! application notifications.

use heapless::Vec;

use super::frame::{self, Frame, Transmit};
use super::metadata;
use super::protocol::{
    avc_rsp, avrcp_pdu, avrcp_playback, btm_status, call_status, cmd, initial_status, link_state,
    linked_device_query, AvrcpEvent, EventCode,
};
use super::state::{
    copy_text, BtState, CallStatus, LinkStatus, LinkType, MacId, MetadataStatus, PlaybackStatus,
    PowerState, Profile, ScoStatus,
};
use crate::config::{MAC_ID_LEN, MAX_NOTIFICATIONS};
use crate::{log_debug, log_info, log_warn};

/// Notifications raised for the application layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BtEvent {
    /// Title/artist/album were replaced.
    MetadataUpdate,
    PlaybackStatusChange(PlaybackStatus),
    DeviceConnected,
    DeviceDisconnected,
    DeviceLinkConnected(LinkType),
    DeviceLinkDisconnected(LinkType),
    /// The module finished booting or reported itself powered off; it
    /// needs a power-on.
    Boot,
    /// Power state changed (on or standby).
    BootStatus,
    /// The paired-device registry was refreshed.
    DeviceFound,
    CallStatusUpdate(CallStatus),
    CallerIdUpdate,
    VolumeUpdate(u8),
    /// An AVRCP PDU or notification changed. `kind` is the PDU id for
    /// capability replies and the AVRCP event id otherwise.
    AvrcpPduChange { kind: u8, value: u8 },
    LinkBackStatus { status: u8, detail: u8 },
}

/// Notifications raised by one frame.
pub type Notifications = Vec<BtEvent, MAX_NOTIFICATIONS>;

/// Acknowledge receipt of `code`. The command-ACK event itself is never
/// acknowledged.
pub fn acknowledge<T: Transmit>(tx: &mut T, code: u8, now_ms: u64) {
    if code == EventCode::CommandAck.code() {
        return;
    }
    frame::encode(tx, &[cmd::EVENT_ACK, code], now_ms);
}

/// Apply `frame` to `state` and collect the resulting notifications.
///
/// Unknown event codes and sub-types are ignored.
pub fn dispatch(state: &mut BtState, frame: &Frame, now_ms: u64) -> Notifications {
    let mut out = Notifications::new();
    let payload = &frame.payload[..];

    let Some(event) = EventCode::from_code(frame.code) else {
        return out;
    };

    match event {
        EventCode::CommandAck => {
            log_debug!("BT: Command ACK [{:02X}] status {:02X}", byte(payload, 0), byte(payload, 1));
        }
        EventCode::BtmStatus => handle_btm_status(state, payload, &mut out),
        EventCode::CallStatus => handle_call_status(state, payload, &mut out),
        EventCode::CallerId => handle_caller_id(state, payload, &mut out),
        EventCode::ReadLinkedDeviceInformationReply => {
            handle_linked_device_information(state, payload, &mut out)
        }
        EventCode::AvcSpecificRsp => handle_avc_specific_response(state, payload, now_ms, &mut out),
        EventCode::ReadLinkStatusReply => handle_link_status(state, payload, &mut out),
        EventCode::ReadPairedDeviceRecordReply => {
            handle_paired_device_record(state, payload, &mut out)
        }
        EventCode::ReportLinkBackStatus => raise(
            &mut out,
            BtEvent::LinkBackStatus {
                status: byte(payload, 0),
                detail: byte(payload, 1),
            },
        ),
        EventCode::ReportBtmInitialStatus => {
            if payload.first() == Some(&initial_status::BOOT_COMPLETE) {
                log_info!("BT: Boot complete");
                raise(&mut out, BtEvent::Boot);
            }
        }
    }

    out
}

/// Payload byte at `index`, or 0 when the frame is shorter.
fn byte(payload: &[u8], index: usize) -> u8 {
    payload.get(index).copied().unwrap_or(0)
}

fn raise(out: &mut Notifications, event: BtEvent) {
    if out.push(event).is_err() {
        log_warn!("BT: Notification dropped: {:?}", event);
    }
}

/// Module went to standby. A device still on record counts as lost.
fn enter_standby(state: &mut BtState, out: &mut Notifications) {
    if state.has_active_device() {
        state.active.clear();
        log_debug!("BT: Device Disconnected [BTM Standby]");
        raise(out, BtEvent::DeviceDisconnected);
    }
    state.status.status = LinkStatus::Disconnected;
    state.status.power_state = PowerState::Standby;
    raise(out, BtEvent::BootStatus);
}

fn handle_btm_status(state: &mut BtState, payload: &[u8], out: &mut Notifications) {
    let Some(&status) = payload.first() else {
        return;
    };

    match status {
        btm_status::POWER_OFF => {
            log_debug!("BT: Power Off");
            state.status.power_state = PowerState::Off;
            state.status.status = LinkStatus::Off;
        }
        btm_status::POWER_ON => {
            log_debug!("BT: Power On");
            state.status.power_state = PowerState::On;
            state.status.status = LinkStatus::Disconnected;
            raise(out, BtEvent::BootStatus);
        }
        btm_status::PAIRING_ON => {
            log_debug!("BT: Pairing On");
            state.status.discoverable = true;
        }
        btm_status::PAIRING_OK => {
            log_debug!("BT: Pairing Ok");
            state.status.discoverable = false;
        }
        btm_status::PAIRING_NOK => {
            log_debug!("BT: Pairing Error");
            state.status.discoverable = false;
        }
        btm_status::HFP_CONN => {
            log_debug!("BT: HFP Open");
            state.active.device_id = byte(payload, 1);
            state.active.hfp_link_id = Some(1);
            state.status.status = LinkStatus::Connected;
            state.status.clear_pairing_error(Profile::Hfp);
            raise(out, BtEvent::DeviceLinkConnected(LinkType::Hfp));
        }
        btm_status::A2DP_CONN => {
            log_debug!("BT: A2DP Open");
            state.active.device_id = byte(payload, 1);
            state.active.a2dp_link_id = Some(1);
            state.status.status = LinkStatus::Connected;
            state.status.clear_pairing_error(Profile::A2dp);
            raise(out, BtEvent::DeviceLinkConnected(LinkType::A2dp));
        }
        btm_status::AVRCP_CONN => {
            log_debug!("BT: AVRCP Open");
            state.active.avrcp_link_id = Some(1);
            state.status.status = LinkStatus::Connected;
            state.status.clear_pairing_error(Profile::Avrcp);
            raise(out, BtEvent::DeviceLinkConnected(LinkType::Avrcp));
        }
        btm_status::HFP_DISCO => {
            log_debug!("BT: HFP Closed");
            state.active.hfp_link_id = None;
            state.status.status = LinkStatus::Disconnected;
            raise(out, BtEvent::DeviceLinkDisconnected(LinkType::Hfp));
        }
        btm_status::A2DP_DISCO => {
            log_debug!("BT: A2DP Closed");
            state.active.device_id = 0;
            state.active.a2dp_link_id = None;
            state.status.status = LinkStatus::Disconnected;
            raise(out, BtEvent::DeviceLinkDisconnected(LinkType::A2dp));
        }
        btm_status::AVRCP_DISCO => {
            log_debug!("BT: AVRCP Closed");
            state.active.avrcp_link_id = None;
            state.status.status = LinkStatus::Disconnected;
            raise(out, BtEvent::DeviceLinkDisconnected(LinkType::Avrcp));
        }
        btm_status::SCO_CONN => {
            log_debug!("BT: SCO Open");
            state.status.sco_status = ScoStatus::Open;
        }
        btm_status::SCO_DISCO => {
            log_debug!("BT: SCO Closed");
            state.status.sco_status = ScoStatus::Closed;
        }
        btm_status::STANDBY_ON => {
            log_debug!("BT: Standby On");
            enter_standby(state, out);
        }
        btm_status::ACL_CONN => {
            log_debug!("BT: Device Connected");
            state.active.clear();
            state.status.status = LinkStatus::Connected;
            raise(out, BtEvent::DeviceConnected);
        }
        btm_status::ACL_DISCO => {
            log_debug!("BT: Device Disconnected");
            state.active.clear();
            state.status.status = LinkStatus::Disconnected;
            raise(out, BtEvent::DeviceLinkDisconnected(LinkType::Acl));
            raise(out, BtEvent::DeviceDisconnected);
        }
        btm_status::LINK_BACK_ACL => {
            log_debug!("BT: Link Back ACL");
            state.status.status = LinkStatus::Connected;
        }
        btm_status::STANDARD_SPP_CONN
        | btm_status::STANDARD_SPP_IAP_DISCO
        | btm_status::IAP_CONN
        | btm_status::MAP_CONN
        | btm_status::MAP_OPERATION_FORBIDDEN
        | btm_status::MAP_DISCO
        | btm_status::SPP_IAP_DISCO_NO_OTHER_PROFILE
        | btm_status::INQUIRY_ON
        | btm_status::AUDIO_SRC_NOT_AUX_NOT_A2DP
        | btm_status::AUDIO_SRC_AUX_IN
        | btm_status::AUDIO_SRC_A2DP => {
            log_debug!("BT: BTM status {:02X} ignored", status);
        }
        _ => {}
    }
}

fn handle_call_status(state: &mut BtState, payload: &[u8], out: &mut Notifications) {
    let next = match payload.get(1).copied() {
        Some(call_status::IDLE) => CallStatus::Inactive,
        Some(call_status::VOICE_DIAL) => CallStatus::VoiceRecognition,
        Some(call_status::INCOMING) => CallStatus::Incoming,
        Some(call_status::OUTGOING) => CallStatus::Outgoing,
        Some(
            call_status::ACTIVE | call_status::ACTIVE_CALL_WAITING | call_status::ACTIVE_CALL_HOLD,
        ) => CallStatus::Active,
        _ => return,
    };

    if state.status.call_status != next {
        log_debug!("BT: Call status {:?}", next);
        state.status.call_status = next;
        raise(out, BtEvent::CallStatusUpdate(next));
    }
}

fn handle_caller_id(state: &mut BtState, payload: &[u8], out: &mut Notifications) {
    let number = payload.get(1..).unwrap_or_default();
    if copy_text(&mut state.caller_id, number).is_err() {
        log_warn!("BT: Caller ID truncated");
    }
    log_debug!("BT: Caller ID {}", state.caller_id.as_str());
    raise(out, BtEvent::CallerIdUpdate);
}

fn handle_linked_device_information(
    state: &mut BtState,
    payload: &[u8],
    out: &mut Notifications,
) {
    if payload.get(1) != Some(&linked_device_query::NAME) {
        return;
    }

    let name = payload.get(2..).unwrap_or_default();
    if copy_text(&mut state.active.device_name, name).is_err() {
        log_warn!("BT: Device name truncated");
    }
    if let Err(e) = state
        .paired
        .set_name(&state.active.mac_id, state.active.device_name.as_str())
    {
        log_warn!("BT: Paired device name not stored: {:?}", e);
    }

    log_info!("BT: Connected Device: {}", state.active.device_name.as_str());
    raise(out, BtEvent::DeviceConnected);
}

fn handle_link_status(state: &mut BtState, payload: &[u8], out: &mut Notifications) {
    match payload.first().copied() {
        Some(link_state::POWER_OFF) => {
            log_debug!("BT: Powered Off");
            state.status.status = LinkStatus::Off;
            state.status.power_state = PowerState::Off;
            raise(out, BtEvent::Boot);
        }
        Some(link_state::PAIRING_ON) => {
            log_debug!("BT: Pairing On");
            state.status.discoverable = true;
        }
        Some(link_state::STANDBY) => {
            log_debug!("BT: Standby On");
            enter_standby(state, out);
        }
        Some(
            link_state::HF_CONNECTED_ONLY
            | link_state::A2DP_CONNECTED_ONLY
            | link_state::SPP_CONNECTED_ONLY
            | link_state::MULTI_PROFILES_CONNECTED,
        ) => {
            state.status.connectable = true;
            state.status.discoverable = false;
            state.status.status = LinkStatus::Connected;
        }
        _ => {}
    }
}

fn handle_paired_device_record(state: &mut BtState, payload: &[u8], out: &mut Notifications) {
    let count = usize::from(byte(payload, 0));
    let records = payload.get(1..).unwrap_or_default();

    let mut seen = 0;
    for record in records.chunks_exact(1 + MAC_ID_LEN).take(count) {
        let number = record[0];
        // Sent least significant byte first.
        let mut mac_id: MacId = [0; MAC_ID_LEN];
        for (dst, src) in mac_id.iter_mut().zip(record[1..].iter().rev()) {
            *dst = *src;
        }
        if let Err(e) = state.paired.upsert(number, mac_id) {
            log_warn!("BT: Paired device {} not stored: {:?}", number, e);
        }
        seen += 1;
    }
    if seen < count {
        log_warn!("BT: Paired device reply truncated ({} of {})", seen, count);
    }

    log_debug!("BT: {} paired devices", state.paired.len());
    raise(out, BtEvent::DeviceFound);
}

fn handle_avc_specific_response(
    state: &mut BtState,
    payload: &[u8],
    now_ms: u64,
    out: &mut Notifications,
) {
    let pdu = if payload.len() > 7 { payload[7] } else { 0 };

    match byte(payload, 1) {
        avc_rsp::NOT_IMPLEMENTED => {
            log_warn!("BT: AVRCP Not Implemented: {:02X}", pdu);
        }
        avc_rsp::ACCEPTED => {
            log_debug!("BT: AVRCP Accept: {:02X}", pdu);
        }
        avc_rsp::REJECTED => {
            log_warn!("BT: AVRCP Reject: {:02X}", pdu);
        }
        avc_rsp::STABLE => {
            log_debug!("BT: AVRCP Stable: {:02X}", pdu);
            if pdu == avrcp_pdu::GET_CAPABILITIES && byte(payload, 11) == avrcp_pdu::CAP_TYPE_EVENTS
            {
                let caps = &mut state.active.avrcp_caps;
                caps.clear();
                let count = usize::from(byte(payload, 12));
                let events = payload.get(13..).unwrap_or_default();
                for event in events.iter().take(count).filter_map(|&c| AvrcpEvent::from_code(c)) {
                    caps.set(event);
                }
                raise(
                    out,
                    BtEvent::AvrcpPduChange {
                        kind: avrcp_pdu::GET_CAPABILITIES,
                        value: 0x00,
                    },
                );
            } else if pdu == avrcp_pdu::GET_ELEMENT_ATTRIBUTES {
                if metadata::assemble(payload, &mut state.metadata).is_err() {
                    log_warn!("BT: Metadata truncated");
                }
                state.status.metadata_status = MetadataStatus::New;
                state.status.metadata_timestamp = now_ms;
                raise(out, BtEvent::MetadataUpdate);
            }
        }
        avc_rsp::INTERIM => {
            log_debug!("BT: AVRCP Interim: {:02X}", pdu);
            let kind = byte(payload, 11);
            if matches!(
                AvrcpEvent::from_code(kind),
                Some(AvrcpEvent::TrackChanged | AvrcpEvent::NowPlayingContentChanged)
            ) {
                raise(out, BtEvent::AvrcpPduChange { kind, value: 0x01 });
            }
        }
        avc_rsp::CHANGED => {
            log_debug!("BT: AVRCP Changed: {:02X}", pdu);
            if pdu == avrcp_pdu::REGISTER_NOTIFICATION {
                let kind = byte(payload, 11);
                let mut value = byte(payload, 12);
                match AvrcpEvent::from_code(kind) {
                    Some(AvrcpEvent::PlaybackStatusChanged) => {
                        update_playback(state, value, out);
                    }
                    Some(AvrcpEvent::VolumeChanged) => {
                        state.active.a2dp_volume = value;
                        raise(out, BtEvent::VolumeUpdate(value));
                    }
                    Some(AvrcpEvent::TrackChanged) => value = 0x00,
                    _ => {}
                }
                raise(out, BtEvent::AvrcpPduChange { kind, value });
            }
        }
        _ => {}
    }
}

fn update_playback(state: &mut BtState, value: u8, out: &mut Notifications) {
    let next = match value {
        avrcp_playback::PAUSED => PlaybackStatus::Paused,
        avrcp_playback::PLAYING => PlaybackStatus::Playing,
        _ => return,
    };
    if state.status.playback_status != next {
        state.status.playback_status = next;
        raise(out, BtEvent::PlaybackStatusChange(next));
    }
}
