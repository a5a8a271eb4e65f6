/*++

Licensed under the Apache-2.0 license.

File Name:

    tables.rs

Abstract:

    Fixed lookup tables for the TrustFLEX (ATECC608) data zone: slot kinds,
    sizes and the pre-computed lock/key configuration register values.

--*/

/// Number of data-zone slots on the device.
pub const SLOT_COUNT: usize = 16;

/// Pseudo-slot index carrying the root CA public key input.
pub const CA_PUBKEY_SLOT: usize = 16;

/// Slots whose mode is switched to `Random` when left unused.
pub const SECRET_SLOTS: [usize; 3] = [5, 6, 9];

/// Device certificate slot.
pub const DEVICE_CERT_SLOT: usize = 10;

/// Signer certificate slot.
pub const SIGNER_CERT_SLOT: usize = 12;

// Fixed widths of the certificate subject name fields. These are part of
// the compressed-certificate template contract (see tflx-template).
pub const DEVICE_ORG_NAME_LEN: usize = 24;
pub const DEVICE_COMMON_NAME_LEN: usize = 20;
pub const SIGNER_ORG_NAME_LEN: usize = 24;
pub const SIGNER_COMMON_NAME_LEN: usize = 33;
pub const ROOT_ORG_NAME_LEN: usize = 24;
pub const ROOT_COMMON_NAME_LEN: usize = 33;

/// What a data-zone slot stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Private,
    Secret,
    General,
    Cert,
    Public,
}

/// How user data reaches a slot during provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadClass {
    /// Slot content is never taken from the profile (private keys,
    /// reserved slots).
    NoLoad,
    /// Slot content is spliced from profile hex data.
    Load,
    /// Slot content comes from a compressed certificate template.
    Cert,
}

/// Kind of each data-zone slot.
pub fn slot_kind(slot: usize) -> Option<SlotKind> {
    match slot {
        0..=4 => Some(SlotKind::Private),
        5 | 6 | 9 => Some(SlotKind::Secret),
        7 | 8 => Some(SlotKind::General),
        10 | 11 | 12 => Some(SlotKind::Cert),
        13..=15 => Some(SlotKind::Public),
        _ => None,
    }
}

/// Load class of each slot, including the CA public-key pseudo-slot.
pub fn load_class(slot: usize) -> Option<LoadClass> {
    match slot {
        0..=4 | 7 | 11 => Some(LoadClass::NoLoad),
        5 | 6 | 8 | 9 | 13..=15 => Some(LoadClass::Load),
        10 | 12 => Some(LoadClass::Cert),
        CA_PUBKEY_SLOT => Some(LoadClass::Load),
        _ => None,
    }
}

/// Declared byte size of the data a slot expects from the user.
pub fn slot_size(slot: usize) -> Option<usize> {
    match slot {
        0..=7 => Some(32),
        8 => Some(416),
        9..=16 => Some(64),
        _ => None,
    }
}

/// Physical slot size on the device; slot data is zero-padded to this.
pub fn padded_size(slot: usize) -> Option<usize> {
    match slot {
        0..=7 => Some(36),
        8 => Some(416),
        9..=15 => Some(72),
        _ => None,
    }
}

/// SlotConfiguration values for slots that may be re-locked later.
const SLOT_CONFIG_LOCKABLE: [(usize, &str); 11] = [
    (2, "85 20"),
    (3, "85 20"),
    (4, "85 20"),
    (5, "8F 46"),
    (6, "8F 0F"),
    (8, "0F 0F"),
    (10, "0F 0F"),
    (11, "0F 0F"),
    (12, "0F 0F"),
    (13, "0F 0F"),
    (15, "0F 0F"),
];

/// KeyConfiguration values for slots that may be re-locked later.
const KEY_CONFIG_LOCKABLE: [(usize, &str); 11] = [
    (2, "73 00"),
    (3, "73 00"),
    (4, "73 00"),
    (5, "38 00"),
    (6, "7C 00"),
    (8, "3C 00"),
    (10, "3C 00"),
    (11, "30 00"),
    (12, "3C 00"),
    (13, "30 00"),
    (15, "30 00"),
];

/// SlotConfiguration values for slots fixed at manufacture.
const SLOT_CONFIG_PERMANENT: [(usize, &str); 11] = [
    (2, "85 A0"),
    (3, "85 A0"),
    (4, "85 A0"),
    (5, "8F C6"),
    (6, "0F 8F"),
    (8, "0F 8F"),
    (10, "0F 8F"),
    (11, "0F 8F"),
    (12, "0F 8F"),
    (13, "0F 8F"),
    (15, "0F 8F"),
];

/// KeyConfiguration values for slots fixed at manufacture.
const KEY_CONFIG_PERMANENT: [(usize, &str); 11] = [
    (2, "53 00"),
    (3, "53 00"),
    (4, "53 00"),
    (5, "18 00"),
    (6, "5C 00"),
    (8, "1C 00"),
    (10, "1C 00"),
    (11, "10 00"),
    (12, "1C 00"),
    (13, "10 00"),
    (15, "10 00"),
];

fn lookup(table: &'static [(usize, &'static str)], slot: usize) -> Option<&'static str> {
    table.iter().find(|(s, _)| *s == slot).map(|(_, v)| *v)
}

/// Two-byte SlotConfiguration value for a slot, selected by whether the
/// slot stays lockable or is made permanent. `None` for slots whose
/// configuration the tool never rewrites.
pub fn slot_config(slot: usize, lockable: bool) -> Option<&'static str> {
    if lockable {
        lookup(&SLOT_CONFIG_LOCKABLE, slot)
    } else {
        lookup(&SLOT_CONFIG_PERMANENT, slot)
    }
}

/// Two-byte KeyConfiguration value for a slot; see [`slot_config`].
pub fn key_config(slot: usize, lockable: bool) -> Option<&'static str> {
    if lockable {
        lookup(&KEY_CONFIG_LOCKABLE, slot)
    } else {
        lookup(&KEY_CONFIG_PERMANENT, slot)
    }
}
