//! Connection, call and media state tracked for the BM83.
//!
//! Everything here is mutated by decoded events (and the optimistic
//! updates made by command builders) and read by the application layer.

use heapless::{String, Vec};

use super::protocol::AvrcpEvent;
use crate::config::{
    CALLER_ID_FIELD_SIZE, DEVICE_NAME_LEN, MAC_ID_LEN, MAX_PAIRED_DEVICES, MAX_PAIRING_ERRORS,
    METADATA_FIELD_SIZE, PROFILE_COUNT,
};
use crate::error::Error;

/// Bluetooth MAC address as stored by the host (most significant byte first).
pub type MacId = [u8; MAC_ID_LEN];

/// Overall connection status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    #[default]
    Off,
    Disconnected,
    Connected,
    Connecting,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    #[default]
    Off,
    On,
    Standby,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallStatus {
    #[default]
    Inactive,
    Active,
    VoiceRecognition,
    Incoming,
    Outgoing,
}

/// State of the synchronous (voice) audio channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScoStatus {
    #[default]
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackStatus {
    #[default]
    Paused,
    Playing,
}

/// Whether the stored metadata has been published yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MetadataStatus {
    #[default]
    New,
    Current,
}

/// Link kind carried by link connect/disconnect notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkType {
    Acl,
    A2dp,
    Avrcp,
    Hfp,
    Ble,
}

/// Profiles that keep a pairing-error counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Profile {
    A2dp,
    Avrcp,
    Hfp,
    Map,
}

impl Profile {
    const fn index(self) -> usize {
        match self {
            Profile::A2dp => 0,
            Profile::Avrcp => 1,
            Profile::Hfp => 2,
            Profile::Map => 3,
        }
    }
}

/// AVRCP notification events the connected device said it supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AvrcpCapabilities {
    pub playback_status_changed: bool,
    pub track_changed: bool,
    pub track_reached_end: bool,
    pub track_reached_start: bool,
    pub playback_pos_changed: bool,
    pub now_playing_changed: bool,
    pub volume_changed: bool,
}

impl AvrcpCapabilities {
    fn flag_mut(&mut self, event: AvrcpEvent) -> &mut bool {
        match event {
            AvrcpEvent::PlaybackStatusChanged => &mut self.playback_status_changed,
            AvrcpEvent::TrackChanged => &mut self.track_changed,
            AvrcpEvent::TrackReachedEnd => &mut self.track_reached_end,
            AvrcpEvent::TrackReachedStart => &mut self.track_reached_start,
            AvrcpEvent::PlaybackPosChanged => &mut self.playback_pos_changed,
            AvrcpEvent::NowPlayingContentChanged => &mut self.now_playing_changed,
            AvrcpEvent::VolumeChanged => &mut self.volume_changed,
        }
    }

    pub fn set(&mut self, event: AvrcpEvent) {
        *self.flag_mut(event) = true;
    }

    pub fn supports(&self, event: AvrcpEvent) -> bool {
        match event {
            AvrcpEvent::PlaybackStatusChanged => self.playback_status_changed,
            AvrcpEvent::TrackChanged => self.track_changed,
            AvrcpEvent::TrackReachedEnd => self.track_reached_end,
            AvrcpEvent::TrackReachedStart => self.track_reached_start,
            AvrcpEvent::PlaybackPosChanged => self.playback_pos_changed,
            AvrcpEvent::NowPlayingContentChanged => self.now_playing_changed,
            AvrcpEvent::VolumeChanged => self.volume_changed,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The device currently linked to the module.
///
/// Link ids are `None` while the matching profile is closed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveConnection {
    pub mac_id: MacId,
    pub device_name: String<DEVICE_NAME_LEN>,
    /// Module-assigned device id; its lower nibble is the link database
    /// index used by most commands.
    pub device_id: u8,
    pub avrcp_link_id: Option<u8>,
    pub a2dp_link_id: Option<u8>,
    pub hfp_link_id: Option<u8>,
    pub ble_link_id: Option<u8>,
    pub map_link_id: Option<u8>,
    pub pbap_link_id: Option<u8>,
    pub a2dp_volume: u8,
    pub avrcp_caps: AvrcpCapabilities,
}

impl ActiveConnection {
    /// Database index sent with device-addressed commands.
    pub fn database_index(&self) -> u8 {
        self.device_id & 0x0F
    }

    /// True when no device data has been recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// One entry of the module's link database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairedDevice {
    pub mac_id: MacId,
    pub device_name: String<DEVICE_NAME_LEN>,
    /// 1-based slot in the module's link database.
    pub number: u8,
}

/// Devices reported by the last paired-device-record reply.
#[derive(Clone, Debug, Default)]
pub struct PairedDevices {
    devices: Vec<PairedDevice, MAX_PAIRED_DEVICES>,
}

impl PairedDevices {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairedDevice> {
        self.devices.iter()
    }

    /// Entry stored for link database slot `number`.
    pub fn get(&self, number: u8) -> Option<&PairedDevice> {
        self.devices.iter().find(|d| d.number == number)
    }

    pub fn find_by_mac(&self, mac_id: &MacId) -> Option<&PairedDevice> {
        self.devices.iter().find(|d| &d.mac_id == mac_id)
    }

    /// Record `mac_id` at slot `number`, replacing whatever held that slot.
    ///
    /// A known name is kept when the slot still holds the same device.
    pub fn upsert(&mut self, number: u8, mac_id: MacId) -> Result<(), Error> {
        if number == 0 {
            return Err(Error::InvalidSlot);
        }
        if let Some(existing) = self.devices.iter_mut().find(|d| d.number == number) {
            if existing.mac_id != mac_id {
                existing.mac_id = mac_id;
                existing.device_name.clear();
            }
            return Ok(());
        }
        self.devices
            .push(PairedDevice {
                mac_id,
                device_name: String::new(),
                number,
            })
            .map_err(|_| Error::RegistryFull)
    }

    /// Name the entry matching `mac_id`. Returns `Ok(false)` if none does.
    pub fn set_name(&mut self, mac_id: &MacId, name: &str) -> Result<bool, Error> {
        match self.devices.iter_mut().find(|d| &d.mac_id == mac_id) {
            Some(device) => copy_str(&mut device.device_name, name).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

/// Scalar module status fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleStatus {
    pub status: LinkStatus,
    pub power_state: PowerState,
    pub discoverable: bool,
    pub connectable: bool,
    pub call_status: CallStatus,
    pub sco_status: ScoStatus,
    pub playback_status: PlaybackStatus,
    pub metadata_status: MetadataStatus,
    /// Time (ms) the last metadata reply arrived.
    pub metadata_timestamp: u64,
    pairing_errors: [u8; PROFILE_COUNT],
}

impl ModuleStatus {
    /// Count a failed connection attempt for `profile`, saturating.
    pub fn record_pairing_error(&mut self, profile: Profile) {
        let count = &mut self.pairing_errors[profile.index()];
        *count = (*count + 1).min(MAX_PAIRING_ERRORS);
    }

    pub fn clear_pairing_error(&mut self, profile: Profile) {
        self.pairing_errors[profile.index()] = 0;
    }

    pub fn pairing_errors(&self, profile: Profile) -> u8 {
        self.pairing_errors[profile.index()]
    }

    /// True once `profile` has failed `MAX_PAIRING_ERRORS` times in a row.
    pub fn pairing_exhausted(&self, profile: Profile) -> bool {
        self.pairing_errors(profile) >= MAX_PAIRING_ERRORS
    }
}

/// Track metadata assembled from element-attribute replies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String<METADATA_FIELD_SIZE>,
    pub artist: String<METADATA_FIELD_SIZE>,
    pub album: String<METADATA_FIELD_SIZE>,
}

impl Metadata {
    pub fn clear(&mut self) {
        self.title.clear();
        self.artist.clear();
        self.album.clear();
    }
}

/// Everything the engine knows about the module and its peer.
#[derive(Clone, Debug, Default)]
pub struct BtState {
    pub active: ActiveConnection,
    pub paired: PairedDevices,
    pub status: ModuleStatus,
    pub metadata: Metadata,
    pub caller_id: String<CALLER_ID_FIELD_SIZE>,
}

impl BtState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device is considered present while connected or while any of
    /// its data is still recorded.
    pub fn has_active_device(&self) -> bool {
        self.status.status == LinkStatus::Connected || !self.active.is_empty()
    }
}

/// Copy `src` into `dst`, cutting at the last whole character that fits.
pub(crate) fn copy_str<const N: usize>(dst: &mut String<N>, src: &str) -> Result<(), Error> {
    dst.clear();
    for c in src.chars() {
        if dst.push(c).is_err() {
            return Err(Error::FieldTruncated);
        }
    }
    Ok(())
}

/// Copy raw text bytes from the wire into `dst`.
///
/// The value ends at the first NUL or the first invalid UTF-8 sequence.
pub(crate) fn copy_text<const N: usize>(dst: &mut String<N>, src: &[u8]) -> Result<(), Error> {
    let src = match src.iter().position(|&b| b == 0) {
        Some(end) => &src[..end],
        None => src,
    };
    let text = match core::str::from_utf8(src) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&src[..e.valid_up_to()]).unwrap_or_default(),
    };
    copy_str(dst, text)
}
