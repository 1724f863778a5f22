//! BM83 UART command set: opcodes, event codes and data values.
//!
//! Payload offsets in the decode routines are counted from the first byte
//! after the event code (`DB0`).

/// Start-of-frame marker.
pub const START_WORD: u8 = 0xAA;

/// Command opcodes (host → module).
pub mod cmd {
    pub const MMI_ACTION: u8 = 0x02;
    pub const MUSIC_CONTROL: u8 = 0x04;
    pub const VENDOR_AT_COMMAND: u8 = 0x0A;
    pub const AVC_VENDOR_DEPENDENT_CMD: u8 = 0x0B;
    pub const READ_LINK_STATUS: u8 = 0x0D;
    pub const READ_PAIRED_DEVICE_RECORD: u8 = 0x0E;
    pub const BTM_UTILITY_FUNCTION: u8 = 0x13;
    pub const EVENT_ACK: u8 = 0x14;
    pub const READ_LINKED_DEVICE_INFORMATION: u8 = 0x16;
    pub const PROFILES_LINK_BACK: u8 = 0x17;
    pub const DISCONNECT: u8 = 0x18;
}

/// MMI action codes carried by `cmd::MMI_ACTION`.
pub mod mmi {
    pub const ACCEPT_CALL: u8 = 0x04;
    pub const END_CALL: u8 = 0x06;
    pub const VOICE_RECOGNITION_OPEN: u8 = 0x0A;
    pub const VOICE_RECOGNITION_CLOSE: u8 = 0x0B;
    pub const POWER_ON_PRESS: u8 = 0x51;
    pub const POWER_ON_RELEASE: u8 = 0x52;
    pub const PAIRING_ENTER: u8 = 0x5D;
    pub const PAIRING_EXIT: u8 = 0x6B;
}

/// `cmd::PROFILES_LINK_BACK` parameters.
pub mod link_back {
    pub const LAST_DEVICE: u8 = 0x00;
    pub const MAC_ID: u8 = 0x05;
    pub const PROFILE_A2DP: u8 = 0x04;
    pub const PROFILES_A2DP_HF: u8 = 0x06;
}

/// `cmd::DISCONNECT` flag bits.
pub mod disconnect {
    pub const HF: u8 = 0x02;
    pub const A2DP: u8 = 0x04;
    pub const SPP: u8 = 0x08;
    pub const ALL: u8 = HF | A2DP | SPP;
}

/// `cmd::READ_LINKED_DEVICE_INFORMATION` query types.
pub mod linked_device_query {
    pub const NAME: u8 = 0x00;
}

/// Event codes (module → host) handled by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventCode {
    CommandAck,
    BtmStatus,
    CallStatus,
    CallerId,
    ReadLinkedDeviceInformationReply,
    AvcSpecificRsp,
    ReadLinkStatusReply,
    ReadPairedDeviceRecordReply,
    ReportLinkBackStatus,
    ReportBtmInitialStatus,
}

impl EventCode {
    /// Look a raw event code up in the dispatch table.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(EventCode::CommandAck),
            0x01 => Some(EventCode::BtmStatus),
            0x02 => Some(EventCode::CallStatus),
            0x03 => Some(EventCode::CallerId),
            0x17 => Some(EventCode::ReadLinkedDeviceInformationReply),
            0x1A => Some(EventCode::AvcSpecificRsp),
            0x1E => Some(EventCode::ReadLinkStatusReply),
            0x1F => Some(EventCode::ReadPairedDeviceRecordReply),
            0x23 => Some(EventCode::ReportLinkBackStatus),
            0x30 => Some(EventCode::ReportBtmInitialStatus),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            EventCode::CommandAck => 0x00,
            EventCode::BtmStatus => 0x01,
            EventCode::CallStatus => 0x02,
            EventCode::CallerId => 0x03,
            EventCode::ReadLinkedDeviceInformationReply => 0x17,
            EventCode::AvcSpecificRsp => 0x1A,
            EventCode::ReadLinkStatusReply => 0x1E,
            EventCode::ReadPairedDeviceRecordReply => 0x1F,
            EventCode::ReportLinkBackStatus => 0x23,
            EventCode::ReportBtmInitialStatus => 0x30,
        }
    }
}

/// `EventCode::BtmStatus` DB0 values.
pub mod btm_status {
    pub const POWER_OFF: u8 = 0x00;
    pub const PAIRING_ON: u8 = 0x01;
    pub const POWER_ON: u8 = 0x02;
    pub const PAIRING_OK: u8 = 0x03;
    pub const PAIRING_NOK: u8 = 0x04;
    pub const HFP_CONN: u8 = 0x05;
    pub const A2DP_CONN: u8 = 0x06;
    pub const HFP_DISCO: u8 = 0x07;
    pub const A2DP_DISCO: u8 = 0x08;
    pub const SCO_CONN: u8 = 0x09;
    pub const SCO_DISCO: u8 = 0x0A;
    pub const AVRCP_CONN: u8 = 0x0B;
    pub const AVRCP_DISCO: u8 = 0x0C;
    pub const STANDARD_SPP_CONN: u8 = 0x0D;
    pub const STANDARD_SPP_IAP_DISCO: u8 = 0x0E;
    pub const STANDBY_ON: u8 = 0x0F;
    pub const IAP_CONN: u8 = 0x10;
    pub const ACL_DISCO: u8 = 0x11;
    pub const MAP_CONN: u8 = 0x12;
    pub const MAP_OPERATION_FORBIDDEN: u8 = 0x13;
    pub const MAP_DISCO: u8 = 0x14;
    pub const ACL_CONN: u8 = 0x15;
    pub const SPP_IAP_DISCO_NO_OTHER_PROFILE: u8 = 0x16;
    pub const LINK_BACK_ACL: u8 = 0x17;
    pub const INQUIRY_ON: u8 = 0x18;
    pub const AUDIO_SRC_NOT_AUX_NOT_A2DP: u8 = 0x80;
    pub const AUDIO_SRC_AUX_IN: u8 = 0x81;
    pub const AUDIO_SRC_A2DP: u8 = 0x82;
}

/// `EventCode::CallStatus` DB1 values.
pub mod call_status {
    pub const IDLE: u8 = 0x00;
    pub const VOICE_DIAL: u8 = 0x01;
    pub const INCOMING: u8 = 0x02;
    pub const OUTGOING: u8 = 0x03;
    pub const ACTIVE: u8 = 0x04;
    pub const ACTIVE_CALL_WAITING: u8 = 0x05;
    pub const ACTIVE_CALL_HOLD: u8 = 0x06;
}

/// `EventCode::ReadLinkStatusReply` DB0 values.
pub mod link_state {
    pub const POWER_OFF: u8 = 0x00;
    pub const PAIRING_ON: u8 = 0x01;
    pub const STANDBY: u8 = 0x02;
    pub const HF_CONNECTED_ONLY: u8 = 0x03;
    pub const A2DP_CONNECTED_ONLY: u8 = 0x04;
    pub const SPP_CONNECTED_ONLY: u8 = 0x05;
    pub const MULTI_PROFILES_CONNECTED: u8 = 0x06;
}

/// `EventCode::ReportBtmInitialStatus` DB0 values.
pub mod initial_status {
    pub const BOOT_COMPLETE: u8 = 0x00;
}

/// AVC response types (`EventCode::AvcSpecificRsp` DB1).
pub mod avc_rsp {
    pub const NOT_IMPLEMENTED: u8 = 0x08;
    pub const ACCEPTED: u8 = 0x09;
    pub const REJECTED: u8 = 0x0A;
    pub const STABLE: u8 = 0x0C;
    pub const CHANGED: u8 = 0x0D;
    pub const INTERIM: u8 = 0x0F;
}

/// AVRCP vendor-dependent PDU ids.
pub mod avrcp_pdu {
    pub const GET_CAPABILITIES: u8 = 0x10;
    pub const GET_ELEMENT_ATTRIBUTES: u8 = 0x20;
    pub const REGISTER_NOTIFICATION: u8 = 0x31;

    /// Capability id for the list of supported events.
    pub const CAP_TYPE_EVENTS: u8 = 0x03;
}

/// AVRCP playback status values.
pub mod avrcp_playback {
    pub const STOPPED: u8 = 0x00;
    pub const PLAYING: u8 = 0x01;
    pub const PAUSED: u8 = 0x02;
}

/// Media attribute ids in a get-element-attributes reply.
pub mod element_attribute {
    pub const TITLE: u8 = 0x01;
    pub const ARTIST: u8 = 0x02;
    pub const ALBUM: u8 = 0x03;
}

/// `cmd::MUSIC_CONTROL` actions.
pub mod music {
    pub const STOP_FF_RWD: u8 = 0x00;
    pub const PLAY: u8 = 0x05;
    pub const PAUSE: u8 = 0x06;
    pub const PLAY_PAUSE_TOGGLE: u8 = 0x07;
    pub const STOP: u8 = 0x08;
    pub const NEXT: u8 = 0x09;
    pub const PREVIOUS: u8 = 0x0A;
}

/// AVRCP notification event ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AvrcpEvent {
    PlaybackStatusChanged,
    TrackChanged,
    TrackReachedEnd,
    TrackReachedStart,
    PlaybackPosChanged,
    NowPlayingContentChanged,
    VolumeChanged,
}

impl AvrcpEvent {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(AvrcpEvent::PlaybackStatusChanged),
            0x02 => Some(AvrcpEvent::TrackChanged),
            0x03 => Some(AvrcpEvent::TrackReachedEnd),
            0x04 => Some(AvrcpEvent::TrackReachedStart),
            0x05 => Some(AvrcpEvent::PlaybackPosChanged),
            0x09 => Some(AvrcpEvent::NowPlayingContentChanged),
            0x0D => Some(AvrcpEvent::VolumeChanged),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            AvrcpEvent::PlaybackStatusChanged => 0x01,
            AvrcpEvent::TrackChanged => 0x02,
            AvrcpEvent::TrackReachedEnd => 0x03,
            AvrcpEvent::TrackReachedStart => 0x04,
            AvrcpEvent::PlaybackPosChanged => 0x05,
            AvrcpEvent::NowPlayingContentChanged => 0x09,
            AvrcpEvent::VolumeChanged => 0x0D,
        }
    }
}
