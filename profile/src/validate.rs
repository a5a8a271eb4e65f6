/*++

Licensed under the Apache-2.0 license.

File Name:

    validate.rs

Abstract:

    Profile validation: MAN-ID format, per-slot data lengths, certificate
    fields and use-case slot requirements. All findings are collected and
    reported together; any finding aborts package generation.

--*/

use anyhow::{anyhow, bail};
use tflx_hexfmt::{is_hex, unprettify};

use crate::model::{CertConfig, Profile, UseCase};
use crate::tables;

/// Upper bound on certificate validity years.
pub const MAX_VALID_YEARS: u32 = 31;

/// Normalize and validate the manufacturer id. Empty input falls back to
/// the default; the result is always exactly one hex byte.
pub fn normalize_man_id(raw: Option<&str>) -> anyhow::Result<String> {
    let raw = match raw {
        None => return Ok(crate::model::DEFAULT_MAN_ID.to_string()),
        Some(s) if s.trim().is_empty() => return Ok(crate::model::DEFAULT_MAN_ID.to_string()),
        Some(s) => s,
    };
    let norm = unprettify(raw);
    if !is_hex(&norm) {
        bail!("invalid MAN-ID: non-hexadecimal characters found");
    }
    if norm.len() != 2 {
        bail!("invalid MAN-ID: MAN-ID is a 1 byte hexadecimal number");
    }
    Ok(norm)
}

fn check_slot_data(profile: &Profile, issues: &mut Vec<String>) {
    for (&slot, entry) in &profile.slots {
        let slot = slot as usize;
        if !entry.is_used() {
            continue;
        }
        match tables::load_class(slot) {
            Some(tables::LoadClass::Load) if slot < tables::SLOT_COUNT => {}
            _ => {
                issues.push(format!("slot {slot} does not accept profile data"));
                continue;
            }
        }
        let Some(hex) = entry.hex() else {
            issues.push(format!("slot {slot}: no data provided"));
            continue;
        };
        let expected = tables::slot_size(slot).unwrap_or(0);
        if !is_hex(&hex) {
            issues.push(format!("slot {slot}: data contains non-hex characters"));
        } else if hex.len() != expected * 2 {
            issues.push(format!(
                "slot {slot}: expects {expected} bytes, got {}",
                hex.len() / 2
            ));
        }
    }

    if let Some(ca) = &profile.root_ca {
        if ca.public_key.is_used() {
            match ca.public_key.hex() {
                Some(hex) if is_hex(&hex) && hex.len() == 128 => {}
                Some(hex) => issues.push(format!(
                    "root CA public key: expects 64 bytes of hex, got {} chars",
                    hex.len()
                )),
                None => issues.push("root CA public key: no data provided".into()),
            }
        }
    }
}

fn check_name(
    name: Option<&str>,
    width: usize,
    what: &str,
    issues: &mut Vec<String>,
) {
    match name {
        None => issues.push(format!("{what} is required for custom certificates")),
        Some(s) if s.is_empty() => issues.push(format!("{what} cannot be empty")),
        Some(s) if s.len() > width => {
            issues.push(format!("{what} exceeds the {width} character field"))
        }
        Some(_) => {}
    }
}

fn check_cert(
    cert: &CertConfig,
    org_width: usize,
    cn_width: usize,
    what: &str,
    issues: &mut Vec<String>,
) {
    if !cert.is_custom() {
        return;
    }
    check_name(
        cert.org_name.as_deref(),
        org_width,
        &format!("{what} org name"),
        issues,
    );
    check_name(
        cert.common_name.as_deref(),
        cn_width,
        &format!("{what} common name"),
        issues,
    );
    match cert.valid_years {
        None => issues.push(format!("{what}: valid_years is required")),
        Some(y) if y > MAX_VALID_YEARS => issues.push(format!(
            "{what}: validity can be 0 to {MAX_VALID_YEARS} years \
             (0 sets the expiry date to year 9999)"
        )),
        Some(_) => {}
    }
}

fn check_certs(profile: &Profile, issues: &mut Vec<String>) {
    let device = &profile.certs.device;
    let signer = &profile.certs.signer;

    if device.is_custom() != signer.is_custom() {
        issues.push("device and signer certificates must both be custom or both default".into());
    }

    check_cert(
        device,
        tables::DEVICE_ORG_NAME_LEN,
        tables::DEVICE_COMMON_NAME_LEN,
        "device certificate",
        issues,
    );
    check_cert(
        signer,
        tables::SIGNER_ORG_NAME_LEN,
        tables::SIGNER_COMMON_NAME_LEN,
        "signer certificate",
        issues,
    );

    if signer.is_custom() {
        match &profile.root_ca {
            None => issues.push("custom certificates require a [root_ca] section".into()),
            Some(ca) => {
                check_name(
                    ca.org_name.as_deref(),
                    tables::ROOT_ORG_NAME_LEN,
                    "root CA org name",
                    issues,
                );
                check_name(
                    ca.common_name.as_deref(),
                    tables::ROOT_COMMON_NAME_LEN,
                    "root CA common name",
                    issues,
                );
                if !ca.public_key.is_used() {
                    issues.push("custom certificates require the root CA public key".into());
                }
            }
        }
    }
}

fn slot_populated(profile: &Profile, slot: usize) -> bool {
    profile.slot(slot).is_some_and(|e| e.is_used())
}

fn require_slot(profile: &Profile, slot: usize, missing: &mut Vec<String>) {
    if !slot_populated(profile, slot) {
        let name = format!("slot {slot}");
        if !missing.contains(&name) {
            missing.push(name);
        }
    }
}

fn check_use_cases(profile: &Profile, issues: &mut Vec<String>) {
    let mut missing: Vec<String> = vec![];

    for uc in &profile.use_cases {
        match uc {
            UseCase::SecureBoot => require_slot(profile, 15, &mut missing),
            UseCase::SecureKeyRotation => {
                require_slot(profile, 13, &mut missing);
                require_slot(profile, 14, &mut missing);
            }
            UseCase::IpProtection | UseCase::Disposable => require_slot(profile, 5, &mut missing),
            UseCase::CustomPki => {
                if !profile.certs.device.is_custom() || !profile.certs.signer.is_custom() {
                    issues.push(
                        "custom-pki use case requires custom device and signer certificates"
                            .into(),
                    );
                }
                if profile.ca_public_key_hex().is_none() {
                    missing.push("root CA public key data".into());
                }
            }
        }
    }

    if !missing.is_empty() {
        issues.push(format!(
            "the selected use cases require data in: {}",
            missing.join(", ")
        ));
    }
}

/// Validate a loaded profile. All findings are reported in one error.
pub fn validate(profile: &Profile) -> anyhow::Result<()> {
    let mut issues: Vec<String> = vec![];

    if let Err(e) = normalize_man_id(profile.man_id.as_deref()) {
        issues.push(e.to_string());
    }
    check_slot_data(profile, &mut issues);
    check_certs(profile, &mut issues);
    check_use_cases(profile, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("profile validation failed:\n  - {}", issues.join("\n  - ")))
    }
}
