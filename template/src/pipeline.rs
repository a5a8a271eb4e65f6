/*++

Licensed under the Apache-2.0 license.

File Name:

    pipeline.rs

Abstract:

    Whole-document provisioning pipeline: takes a validated profile and the
    XML template and produces the package file set. The step order mirrors
    the device provisioning flow; rearranging it changes the output.

--*/

use anyhow::Context;
use tflx_hexfmt::{pretty_print, unprettify};
use tflx_profile::tables::{self, LoadClass};
use tflx_profile::{normalize_man_id, CertConfig, Profile};

use crate::cert::{self, CertNames};
use crate::certdef::{self, SourceFile};
use crate::dom::{self, Element};
use crate::{assets, locks, slots};

/// Base name of the provisioning archive.
pub const PACKAGE_BASENAME: &str = "TFLXTLS_Provisioning_package";

/// The generated provisioning package, in archive order.
#[derive(Debug)]
pub struct Package {
    pub files: Vec<SourceFile>,

    /// At least one secret slot carries user data; the XML stores it in
    /// the clear.
    pub contains_secrets: bool,
}

/// Run the pipeline against the bundled factory template.
pub fn generate(profile: &Profile) -> anyhow::Result<Package> {
    generate_with_template(profile, assets::TFLXTLS_XML)
}

/// Run the pipeline against a caller-supplied template document.
pub fn generate_with_template(profile: &Profile, template_xml: &str) -> anyhow::Result<Package> {
    let mut root =
        dom::parse(template_xml).context("failed to parse the provisioning template")?;
    let mut files = Vec::new();

    apply_interface(&mut root, profile)?;

    if profile.certs.signer.is_custom() {
        let ca = profile
            .ca_public_key_hex()
            .context("custom signer certificate requires a root CA public key")?;
        root.descendant_mut("CAPublicKey", 0)
            .context("template has no CAPublicKey element")?
            .set_text(block_text(&ca));
    }

    // Serial-number common-name elements only survive for a custom device
    // certificate that keeps the serial-derived CN.
    let sn_cn = profile.certs.device.is_custom() && profile.device_cn_from_serial();
    if !sn_cn {
        let device_cert = root
            .descendant_mut("CompressedCert", 0)
            .context("template has no device CompressedCert element")?;
        device_cert.remove_child("Element", 5);
        device_cert.remove_child("Element", 4);
    }

    for slot in 0..tables::SLOT_COUNT {
        match tables::load_class(slot) {
            Some(LoadClass::Load) => {
                if let Some(hex) = profile.slot_hex(slot) {
                    slots::apply_slot_data(&mut root, slot, &hex)?;
                }
            }
            Some(LoadClass::Cert) => {
                files.extend(process_cert_slot(&mut root, profile, slot, sn_cn)?);
            }
            _ => {}
        }
    }

    let mut contains_secrets = false;
    for slot in tables::SECRET_SLOTS {
        if profile.slot_hex(slot).is_some() {
            contains_secrets = true;
        } else {
            slots::randomize_slot(&mut root, slot)?;
        }
    }
    slots::strip_random_slot_data(&mut root)?;

    let man_id = normalize_man_id(profile.man_id.as_deref())?;
    root.descendant_mut("SN8", 0)
        .context("template has no SN8 element")?
        .set_text(man_id);
    root.descendant_mut("PartNumber", 0)
        .context("template has no PartNumber element")?
        .set_text(profile.part_number());

    if profile.secure_boot_latch {
        root.descendant_mut("SecureBoot", 0)
            .context("template has no SecureBoot element")?
            .set_text("0B F7");
        root.descendant_mut("KeyConfiguration", 0)
            .context("template has no KeyConfiguration elements")?
            .set_text("53 10");
    }

    locks::apply_locks(&mut root, profile)?;

    files.push(SourceFile {
        name: format!("{}.xml", profile.part_number()),
        content: render(&root)?,
    });
    Ok(Package {
        files,
        contains_secrets,
    })
}

fn apply_interface(root: &mut Element, profile: &Profile) -> anyhow::Result<()> {
    let (enable, address) = match profile.interface {
        tflx_profile::Interface::I2c => ("01", "6C"),
        tflx_profile::Interface::Swi => ("00", "03"),
    };
    root.descendant_mut("I2CEnable", 0)
        .context("template has no I2CEnable element")?
        .set_text(enable);
    root.descendant_mut("I2CAddress", 0)
        .context("template has no I2CAddress element")?
        .set_text(address);
    Ok(())
}

/// Hex block formatted the way the template nests multi-line text: tab
/// indented lines and a closing-tag indent.
fn block_text(hex: &str) -> String {
    let mut text = String::from("\n");
    for line in pretty_print(hex, 32).lines() {
        text.push_str("\t\t");
        text.push_str(line.trim_end());
        text.push('\n');
    }
    text.push_str("\t\t\t");
    text
}

fn required<'a>(field: Option<&'a str>, what: &str) -> anyhow::Result<&'a str> {
    field.with_context(|| format!("{what} is required for a custom certificate"))
}

fn cert_names<'a>(
    profile: &'a Profile,
    cfg: &'a CertConfig,
    slot: usize,
) -> anyhow::Result<CertNames<'a>> {
    if slot == tables::DEVICE_CERT_SLOT {
        let signer = &profile.certs.signer;
        Ok(CertNames {
            issuer_org: required(signer.org_name.as_deref(), "signer org_name")?,
            issuer_cn: required(signer.common_name.as_deref(), "signer common_name")?,
            subject_org: required(cfg.org_name.as_deref(), "device org_name")?,
            subject_cn: required(cfg.common_name.as_deref(), "device common_name")?,
        })
    } else {
        let ca = profile
            .root_ca
            .as_ref()
            .context("custom signer certificate requires a [root_ca] section")?;
        Ok(CertNames {
            issuer_org: required(ca.org_name.as_deref(), "root CA org_name")?,
            issuer_cn: required(ca.common_name.as_deref(), "root CA common_name")?,
            subject_org: required(cfg.org_name.as_deref(), "signer org_name")?,
            subject_cn: required(cfg.common_name.as_deref(), "signer common_name")?,
        })
    }
}

/// Position of the `CompressedCert` element whose `Index` attribute matches
/// the slot's `CompressedCert` link.
fn compressed_cert_pos(root: &Element, slot: usize) -> anyhow::Result<usize> {
    let link = root
        .descendant("Slot", slot)
        .and_then(|el| el.attr("CompressedCert"))
        .with_context(|| format!("slot {slot} carries no CompressedCert link"))?
        .to_string();
    (0..root.descendant_count("CompressedCert"))
        .find(|&n| {
            root.descendant("CompressedCert", n)
                .and_then(|el| el.attr("Index"))
                == Some(link.as_str())
        })
        .with_context(|| format!("template has no CompressedCert with Index {link}"))
}

fn process_cert_slot(
    root: &mut Element,
    profile: &Profile,
    slot: usize,
    sn_cn: bool,
) -> anyhow::Result<Vec<SourceFile>> {
    let device = slot == tables::DEVICE_CERT_SLOT;
    let cfg = if device {
        &profile.certs.device
    } else {
        &profile.certs.signer
    };
    let pos = compressed_cert_pos(root, slot)?;

    let spliced = if cfg.is_custom() {
        let names = cert_names(profile, cfg, slot)?;
        let years = cfg
            .valid_years
            .context("valid_years is required for a custom certificate")?;
        let cc = root
            .descendant_mut("CompressedCert", pos)
            .with_context(|| format!("template has no CompressedCert for slot {slot}"))?;
        let template_data = cc
            .descendant_mut("TemplateData", 0)
            .with_context(|| format!("CompressedCert for slot {slot} has no TemplateData"))?;
        let template_hex = unprettify(&template_data.text());
        let spliced = if device {
            cert::splice_device(&template_hex, &names)?
        } else {
            cert::splice_signer(&template_hex, &names)?
        };
        let spliced = cert::apply_validity(&spliced, years);
        template_data.set_text(block_text(&spliced));
        cc.set_attr("ValidYears", years.to_string());
        Some(spliced)
    } else {
        None
    };

    Ok(if device {
        certdef::device_sources(spliced.as_deref(), sn_cn)
    } else {
        // The signer definition always embeds the verifying CA public key,
        // factory default or user supplied.
        let ca = root
            .descendant("CompressedCert", pos)
            .and_then(|cc| cc.descendant("CAPublicKey", 0))
            .map(|el| unprettify(&el.text()))
            .with_context(|| format!("CompressedCert for slot {slot} has no CAPublicKey"))?;
        certdef::signer_sources(spliced.as_deref(), &ca)
    })
}

fn render(root: &Element) -> anyhow::Result<String> {
    let xml = dom::serialize(root)?;
    let mut out = String::from("<?xml version='1.0' encoding='utf-8'?> \n");
    for line in xml.lines() {
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tflx_profile::{CertSource, RootCa, SlotEntry, SlotSource};

    fn hex_entry(bytes: usize) -> SlotEntry {
        SlotEntry {
            source: SlotSource::Hex,
            data: Some("A5".repeat(bytes)),
            file: None,
            lockable: false,
            lock: false,
        }
    }

    fn custom_pki_profile() -> Profile {
        let mut profile = Profile::default();
        profile.certs.device = tflx_profile::CertConfig {
            source: CertSource::Custom,
            org_name: Some("Example Corp".into()),
            common_name: Some("Example Device".into()),
            valid_years: Some(0),
            common_name_from_serial: Some(true),
        };
        profile.certs.signer = tflx_profile::CertConfig {
            source: CertSource::Custom,
            org_name: Some("Example Corp".into()),
            common_name: Some("Example Signer 001".into()),
            valid_years: Some(10),
            common_name_from_serial: None,
        };
        profile.root_ca = Some(RootCa {
            org_name: Some("Example Corp".into()),
            common_name: Some("Example Root CA".into()),
            public_key: hex_entry(64),
        });
        profile
    }

    fn package_xml(package: &Package) -> &str {
        &package.files.last().unwrap().content
    }

    #[test]
    fn test_default_profile_package() {
        let package = generate(&Profile::default()).unwrap();
        // Device defs, signer defs, then the XML.
        let names: Vec<&str> = package.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "tflxtls_cust_cert_def_device.h",
                "tflxtls_cust_cert_def_device.c",
                "tflxtls_cust_cert_def_signer.h",
                "tflxtls_cust_cert_def_signer.c",
                "ATECC608B-MAHxx-p.xml",
            ]
        );
        assert!(!package.contains_secrets);
        let xml = package_xml(&package);
        assert!(xml.starts_with("<?xml version='1.0' encoding='utf-8'?> \n"));
        assert!(xml.contains("<PartNumber>ATECC608B-MAHxx-p</PartNumber>"));
        assert!(xml.contains("<SN8>01</SN8>"));
        // Unused secret slots go random and lose their data.
        assert!(xml.contains(r#"<Slot Index="5" Mode="Random"/>"#));
        assert!(xml.contains(r#"<Slot Index="9" Mode="Random"/>"#));
    }

    #[test]
    fn test_swi_interface() {
        let mut profile = Profile::default();
        profile.interface = tflx_profile::Interface::Swi;
        let package = generate(&profile).unwrap();
        let xml = package_xml(&package);
        assert!(xml.contains("<I2CEnable>00</I2CEnable>"));
        assert!(xml.contains("<I2CAddress>03</I2CAddress>"));
    }

    #[test]
    fn test_secret_slot_data_flagged() {
        let mut profile = Profile::default();
        profile.slots.insert(5, hex_entry(32));
        let package = generate(&profile).unwrap();
        assert!(package.contains_secrets);
        let xml = package_xml(&package);
        assert!(xml.contains(r#"<Slot Index="5" Mode="Static">"#));
        // The other secret slots still went random.
        assert!(xml.contains(r#"<Slot Index="6" Mode="Random"/>"#));
    }

    #[test]
    fn test_custom_pki_package() {
        let package = generate(&custom_pki_profile()).unwrap();
        let xml = package_xml(&package);
        // Spliced names land in the template data hex.
        let device_hex = unprettify(xml);
        assert!(device_hex.contains(&tflx_hexfmt::ascii_to_hex("Example Device")));
        assert!(device_hex.contains(&tflx_hexfmt::ascii_to_hex("Example Root CA")));
        // Device validity of zero pins the expiry; the signer keeps its date.
        assert!(device_hex.contains(&tflx_hexfmt::ascii_to_hex("99991231235959Z")));
        assert!(xml.contains(r#"ValidYears="0""#));
        assert!(xml.contains(r#"ValidYears="10""#));
        // The CA public key replaces the factory key.
        assert!(device_hex.contains(&"A5".repeat(64)));
        // Custom cert defs carry the spliced template.
        let device_c = &package.files[1].content;
        assert!(device_c.contains("g_cert_template_3_device"));
    }

    #[test]
    fn test_serial_cn_disabled_drops_elements() {
        let mut profile = custom_pki_profile();
        profile.certs.device.common_name_from_serial = Some(false);
        let package = generate(&profile).unwrap();
        let xml = package_xml(&package);
        assert!(!xml.contains("SubjectCN-SN-Part1"));
        assert!(!xml.contains("SubjectCN-SN-Part2"));
        // Factory profile keeps them.
        let factory = generate(&Profile::default()).unwrap();
        assert!(!package_xml(&factory).contains("SubjectCN-SN-Part1"));
    }

    #[test]
    fn test_secure_boot_latch() {
        let mut profile = Profile::default();
        profile.secure_boot_latch = true;
        let package = generate(&profile).unwrap();
        let xml = package_xml(&package);
        assert!(xml.contains("<SecureBoot>0B F7</SecureBoot>"));
        assert!(xml.contains(r#"<KeyConfiguration Index="0">53 10</KeyConfiguration>"#));
    }

    #[test]
    fn test_locked_slot_updates_mask() {
        let mut profile = Profile::default();
        let mut entry = hex_entry(32);
        entry.lock = true;
        profile.slots.insert(5, entry);
        let package = generate(&profile).unwrap();
        assert!(package_xml(&package).contains("<SlotLocked>FF DF</SlotLocked>"));
    }

    #[test]
    fn test_public_key_slot_layout_in_document() {
        let mut profile = Profile::default();
        profile.slots.insert(13, hex_entry(64));
        let package = generate(&profile).unwrap();
        let xml = package_xml(&package);
        // 72 byte slot: reserved words framing each coordinate.
        assert!(xml.contains("00 00 00 00"));
        assert!(unprettify(xml).contains(&format!("00000000{}", "A5".repeat(32))));
    }

    #[test]
    fn test_man_id_applied() {
        let mut profile = Profile::default();
        profile.man_id = Some("0x2C".into());
        let package = generate(&profile).unwrap();
        assert!(package_xml(&package).contains("<SN8>2C</SN8>"));
    }

    #[test]
    fn test_bad_man_id_rejected() {
        let mut profile = Profile::default();
        profile.man_id = Some("2C0".into());
        assert!(generate(&profile).is_err());
    }

    #[test]
    fn test_no_blank_lines_in_output() {
        let package = generate(&Profile::default()).unwrap();
        assert!(package_xml(&package)
            .lines()
            .all(|line| !line.trim().is_empty()));
    }
}
