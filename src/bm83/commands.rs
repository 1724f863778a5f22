//! Outbound command construction.
//!
//! Builders return the unframed command (opcode + parameters); hand the
//! result to [`Bm83::send`](super::Bm83::send) to frame and queue it.
//! Builders that start a connection or change pairing mode also update the
//! state optimistically, before the module confirms.

use heapless::Vec;

use super::protocol::{avrcp_pdu, cmd, link_back, mmi};
use super::state::{BtState, LinkStatus, PairedDevice};
use crate::config::{MAC_ID_LEN, MAX_AT_COMMAND_LEN, MAX_COMMAND_LEN};
use crate::error::Error;
use crate::log_error;

/// One unframed command.
pub type Command = Vec<u8, MAX_COMMAND_LEN>;

/// Fixed-layout commands are all shorter than `MAX_COMMAND_LEN`.
fn command(bytes: &[u8]) -> Command {
    let mut c = Command::new();
    let _ = c.extend_from_slice(bytes);
    c
}

/// Link-back to a specific device from the link database.
fn link_back_device(dev: &PairedDevice, profiles: u8) -> Command {
    let mut c = command(&[
        cmd::PROFILES_LINK_BACK,
        link_back::MAC_ID,
        dev.number.saturating_sub(1),
        profiles,
    ]);
    // The module expects the MAC least significant byte first.
    for &b in dev.mac_id.iter().rev() {
        let _ = c.push(b);
    }
    c
}

/// Connect to `dev` over A2DP and make it the active device.
pub fn connect(state: &mut BtState, dev: &PairedDevice) -> Command {
    state.active.mac_id = dev.mac_id;
    state.status.status = LinkStatus::Connecting;
    link_back_device(dev, link_back::PROFILE_A2DP)
}

pub fn link_back_last_device(state: &mut BtState) -> Command {
    state.status.status = LinkStatus::Connecting;
    command(&[cmd::PROFILES_LINK_BACK, link_back::LAST_DEVICE])
}

/// Reconnect A2DP and HFP to `dev`.
pub fn link_back_profile(state: &mut BtState, dev: &PairedDevice) -> Command {
    state.status.status = LinkStatus::Connecting;
    link_back_device(dev, link_back::PROFILES_A2DP_HF)
}

/// Drop the profiles selected by `flags` (see `protocol::disconnect`).
pub fn disconnect(flags: u8) -> Command {
    command(&[cmd::DISCONNECT, flags])
}

pub fn pairing_enable(state: &mut BtState) -> Command {
    state.status.discoverable = true;
    command(&[cmd::MMI_ACTION, 0x00, mmi::PAIRING_ENTER])
}

pub fn pairing_disable(state: &mut BtState) -> Command {
    state.status.discoverable = false;
    command(&[cmd::MMI_ACTION, 0x00, mmi::PAIRING_EXIT])
}

fn mmi_for_device(state: &BtState, action: u8) -> Command {
    command(&[cmd::MMI_ACTION, state.active.database_index(), action])
}

pub fn call_accept(state: &BtState) -> Command {
    mmi_for_device(state, mmi::ACCEPT_CALL)
}

pub fn call_end(state: &BtState) -> Command {
    mmi_for_device(state, mmi::END_CALL)
}

pub fn voice_recognition_open(state: &BtState) -> Command {
    mmi_for_device(state, mmi::VOICE_RECOGNITION_OPEN)
}

pub fn voice_recognition_close(state: &BtState) -> Command {
    mmi_for_device(state, mmi::VOICE_RECOGNITION_CLOSE)
}

/// Playback control (see `protocol::music`).
pub fn music_control(action: u8) -> Command {
    command(&[cmd::MUSIC_CONTROL, 0x00, action])
}

/// Pass an AT command through to the phone's HFP gateway.
pub fn vendor_at_command(state: &BtState, at: &str) -> Result<Command, Error> {
    let text = at.as_bytes();
    if text.len() > MAX_AT_COMMAND_LEN {
        log_error!("BT: AT Command too long for buffer");
        return Err(Error::CommandTooLong {
            len: text.len(),
            max: MAX_AT_COMMAND_LEN,
        });
    }
    let mut c = command(&[cmd::VENDOR_AT_COMMAND, state.active.database_index()]);
    c.extend_from_slice(text).map_err(|_| Error::BufferOverflow)?;
    Ok(c)
}

/// Power-key press followed by release.
pub fn power_on() -> [Command; 2] {
    [
        command(&[cmd::MMI_ACTION, 0x00, mmi::POWER_ON_PRESS]),
        command(&[cmd::MMI_ACTION, 0x00, mmi::POWER_ON_RELEASE]),
    ]
}

/// Ask which AVRCP notification events the device supports.
pub fn avrcp_get_capabilities(state: &BtState) -> Command {
    command(&[
        cmd::AVC_VENDOR_DEPENDENT_CMD,
        state.active.database_index(),
        avrcp_pdu::GET_CAPABILITIES,
        0x00, // reserved
        0x00, // parameter length
        0x01,
        avrcp_pdu::CAP_TYPE_EVENTS,
    ])
}

/// Request every element attribute of the current track.
pub fn avrcp_get_element_attributes(state: &BtState) -> Command {
    let mut c = command(&[
        cmd::AVC_VENDOR_DEPENDENT_CMD,
        state.active.database_index(),
        avrcp_pdu::GET_ELEMENT_ATTRIBUTES,
        0x00,
        0x00,
        0x09,
    ]);
    // Identifier (8 bytes, "playing") and attribute count 0 ("all").
    let _ = c.extend_from_slice(&[0x00; 9]);
    c
}

pub fn avrcp_register_notification(state: &BtState, event: u8) -> Command {
    command(&[
        cmd::AVC_VENDOR_DEPENDENT_CMD,
        state.active.database_index(),
        avrcp_pdu::REGISTER_NOTIFICATION,
        0x00,
        0x00,
        0x05,
        event,
        0x00, // playback interval
        0x00,
        0x00,
        0x00,
    ])
}

pub fn btm_utility_function(kind: u8, param: u8) -> Command {
    command(&[cmd::BTM_UTILITY_FUNCTION, kind, param])
}

pub fn read_link_status() -> Command {
    command(&[cmd::READ_LINK_STATUS])
}

pub fn read_linked_device_information(state: &BtState, query: u8) -> Command {
    command(&[
        cmd::READ_LINKED_DEVICE_INFORMATION,
        state.active.database_index(),
        query,
    ])
}

pub fn read_paired_devices() -> Command {
    command(&[cmd::READ_PAIRED_DEVICE_RECORD])
}

pub fn event_ack(code: u8) -> Command {
    command(&[cmd::EVENT_ACK, code])
}

const _: () = assert!(2 + MAX_AT_COMMAND_LEN <= MAX_COMMAND_LEN);
const _: () = assert!(4 + MAC_ID_LEN <= MAX_COMMAND_LEN);
