/*++

Licensed under the Apache-2.0 license.

File Name:

    model.rs

Abstract:

    Provisioning profile data model and TOML loading. The profile is the
    file-based equivalent of the original configurator form: per-slot data
    sources, certificate fields, lock flags and device options.

--*/

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_derive::{Deserialize, Serialize};

use crate::pem;

/// Part number stamped into the document when none is configured.
pub const DEFAULT_PART_NUMBER: &str = "ATECC608B-MAHxx-p";

/// Default manufacturer id byte.
pub const DEFAULT_MAN_ID: &str = "01";

/// Device interface selection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    I2c,
    Swi,
}

/// Provisioning use cases that impose slot requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    SecureBoot,
    SecureKeyRotation,
    IpProtection,
    Disposable,
    CustomPki,
}

/// Where a slot's data comes from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSource {
    #[default]
    Unused,
    Hex,
    Pem,
}

/// One slot's configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotEntry {
    #[serde(default)]
    pub source: SlotSource,

    /// Inline hex data (`source = "hex"`); also holds the extracted key
    /// after PEM resolution.
    pub data: Option<String>,

    /// PEM file path, relative to the profile (`source = "pem"`).
    pub file: Option<PathBuf>,

    /// Keep the slot's configuration re-lockable instead of permanent.
    #[serde(default)]
    pub lockable: bool,

    /// Write-lock the slot in the generated document.
    #[serde(default)]
    pub lock: bool,
}

impl SlotEntry {
    /// Normalized hex data, if the slot carries any.
    pub fn hex(&self) -> Option<String> {
        if self.source == SlotSource::Unused {
            return None;
        }
        self.data.as_deref().map(tflx_hexfmt::unprettify)
    }

    pub fn is_used(&self) -> bool {
        self.source != SlotSource::Unused
    }
}

/// Which certificate template a cert slot uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertSource {
    #[default]
    Microchip,
    Custom,
}

/// Custom-certificate fields for the device or signer certificate.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertConfig {
    #[serde(default)]
    pub source: CertSource,

    pub org_name: Option<String>,

    pub common_name: Option<String>,

    /// Certificate validity in years, 0..=31. Zero pins the expiry date to
    /// the RFC 5280 "no well-defined expiration" value.
    pub valid_years: Option<u32>,

    /// Derive the device certificate common name from the chip serial
    /// number (device certificate only; defaults to true).
    pub common_name_from_serial: Option<bool>,
}

impl CertConfig {
    pub fn is_custom(&self) -> bool {
        self.source == CertSource::Custom
    }
}

/// Device and signer certificate configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Certs {
    #[serde(default)]
    pub device: CertConfig,

    #[serde(default)]
    pub signer: CertConfig,
}

/// Root CA identity: signer certificate issuer names and the CA public key
/// that verifies the signer certificate.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootCa {
    pub org_name: Option<String>,

    pub common_name: Option<String>,

    #[serde(default)]
    pub public_key: SlotEntry,
}

/// The provisioning profile.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub part_number: Option<String>,

    pub man_id: Option<String>,

    #[serde(default)]
    pub interface: Interface,

    /// Enable the secure boot / persistent latch configuration on slot 0.
    #[serde(default)]
    pub secure_boot_latch: bool,

    #[serde(default)]
    pub use_cases: Vec<UseCase>,

    #[serde(default, with = "slot_keys")]
    pub slots: BTreeMap<u8, SlotEntry>,

    #[serde(default)]
    pub certs: Certs,

    pub root_ca: Option<RootCa>,
}

/// TOML table keys are always strings; bridge `[slots.N]` section names to
/// numeric slot indices.
mod slot_keys {
    use super::SlotEntry;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        slots: &BTreeMap<u8, SlotEntry>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        slots
            .iter()
            .map(|(slot, entry)| (slot.to_string(), entry))
            .collect::<BTreeMap<String, &SlotEntry>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u8, SlotEntry>, D::Error> {
        BTreeMap::<String, SlotEntry>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, entry)| {
                let slot = key
                    .parse::<u8>()
                    .map_err(|_| D::Error::custom(format!("invalid slot index {key:?}")))?;
                Ok((slot, entry))
            })
            .collect()
    }
}

impl Profile {
    /// Part number, falling back to the default.
    pub fn part_number(&self) -> &str {
        match self.part_number.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => DEFAULT_PART_NUMBER,
        }
    }

    /// Slot entry, if configured at all.
    pub fn slot(&self, slot: usize) -> Option<&SlotEntry> {
        self.slots.get(&(slot as u8))
    }

    /// Normalized hex data for a slot, `None` when unused.
    pub fn slot_hex(&self, slot: usize) -> Option<String> {
        self.slot(slot).and_then(SlotEntry::hex)
    }

    /// Normalized root CA public key hex, `None` when not provided.
    pub fn ca_public_key_hex(&self) -> Option<String> {
        self.root_ca.as_ref().and_then(|ca| ca.public_key.hex())
    }

    /// Whether the device certificate common name tracks the serial number.
    pub fn device_cn_from_serial(&self) -> bool {
        self.certs
            .device
            .common_name_from_serial
            .unwrap_or(true)
    }
}

fn resolve_entry(entry: &mut SlotEntry, base: &Path, what: &str) -> anyhow::Result<()> {
    if entry.source != SlotSource::Pem {
        return Ok(());
    }
    // Inline PEM text in `data` takes precedence over a file path.
    if let Some(text) = entry.data.clone() {
        let hex = pem::key_hex_from_pem(&text)
            .with_context(|| format!("{what}: failed to extract key from inline PEM"))?;
        entry.data = Some(hex);
        return Ok(());
    }
    let rel = entry
        .file
        .as_ref()
        .with_context(|| format!("{what}: source is \"pem\" but no file or data is set"))?;
    let path = if rel.is_absolute() {
        rel.clone()
    } else {
        base.join(rel)
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("{what}: failed to read PEM file {}", path.display()))?;
    let hex = pem::key_hex_from_pem(&text)
        .with_context(|| format!("{what}: failed to extract key from {}", path.display()))?;
    entry.data = Some(hex);
    Ok(())
}

/// Load a provisioning profile from a TOML file, resolving PEM-sourced
/// slots to hex immediately.
pub fn load_profile(path: &Path) -> anyhow::Result<Profile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read the profile file {}", path.display()))?;
    let mut profile: Profile = toml::from_str(&text)
        .with_context(|| format!("Failed to parse profile file {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    for (slot, entry) in profile.slots.iter_mut() {
        resolve_entry(entry, &base, &format!("slot {slot}"))?;
    }
    if let Some(ca) = profile.root_ca.as_mut() {
        resolve_entry(&mut ca.public_key, &base, "root CA public key")?;
    }
    Ok(profile)
}
