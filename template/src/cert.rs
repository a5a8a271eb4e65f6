/*++

Licensed under the Apache-2.0 license.

File Name:

    cert.rs

Abstract:

    Compressed-certificate field splicing. The device and signer templates
    are fixed-layout blobs; subject and issuer name fields live at fixed
    byte offsets tied to the bundled template version. The offsets are an
    external contract shared with the provisioning service and must never
    be inferred from the template content.

--*/

use std::ops::Range;

use anyhow::{ensure, Context};
use tflx_hexfmt::{ascii_to_hex, pad_string};
use tflx_profile::tables;

/// Device certificate template size in bytes.
pub const DEVICE_TEMPLATE_LEN: usize = 232;

/// Signer certificate template size in bytes.
pub const SIGNER_TEMPLATE_LEN: usize = 239;

/// Byte range of the issuer organization name field.
const ISSUER_ORG: Range<usize> = 56..80;

/// Byte range of the issuer common name field.
const ISSUER_CN: Range<usize> = 91..124;

/// Byte range of the subject organization name field.
const SUBJECT_ORG: Range<usize> = 171..195;

/// Byte range of the device certificate subject common name field.
const DEVICE_SUBJECT_CN: Range<usize> = 206..226;

/// Byte range of the signer certificate subject common name field.
const SIGNER_SUBJECT_CN: Range<usize> = 206..239;

/// Hex of the template notAfter value (`20461108050000Z`).
const NOT_AFTER_PATTERN: &str = "32303436313130383035303030305A";

/// RFC 5280 4.1.2.5 "no well-defined expiration date" value.
const NO_EXPIRY_DATE: &str = "99991231235959Z";

/// The four name fields spliced into a certificate template.
#[derive(Debug)]
pub struct CertNames<'a> {
    pub issuer_org: &'a str,
    pub issuer_cn: &'a str,
    pub subject_org: &'a str,
    pub subject_cn: &'a str,
}

fn splice(
    template_hex: &str,
    template_len: usize,
    fields: [(Range<usize>, &str); 4],
) -> anyhow::Result<String> {
    ensure!(
        template_hex.len() == template_len * 2,
        "certificate template is {} bytes, expected {template_len}",
        template_hex.len() / 2
    );
    let mut out = String::with_capacity(template_hex.len());
    let mut cursor = 0;
    for (range, text) in fields {
        out.push_str(&template_hex[cursor * 2..range.start * 2]);
        let padded = pad_string(text, range.end - range.start)
            .with_context(|| format!("certificate name field at offset {}", range.start))?;
        out.push_str(&ascii_to_hex(&padded));
        cursor = range.end;
    }
    out.push_str(&template_hex[cursor * 2..]);
    Ok(out)
}

/// Splice the device certificate name fields. The issuer is the signer
/// certificate subject.
pub fn splice_device(template_hex: &str, names: &CertNames) -> anyhow::Result<String> {
    debug_assert_eq!(ISSUER_ORG.len(), tables::SIGNER_ORG_NAME_LEN);
    debug_assert_eq!(ISSUER_CN.len(), tables::SIGNER_COMMON_NAME_LEN);
    debug_assert_eq!(SUBJECT_ORG.len(), tables::DEVICE_ORG_NAME_LEN);
    debug_assert_eq!(DEVICE_SUBJECT_CN.len(), tables::DEVICE_COMMON_NAME_LEN);
    splice(
        template_hex,
        DEVICE_TEMPLATE_LEN,
        [
            (ISSUER_ORG, names.issuer_org),
            (ISSUER_CN, names.issuer_cn),
            (SUBJECT_ORG, names.subject_org),
            (DEVICE_SUBJECT_CN, names.subject_cn),
        ],
    )
}

/// Splice the signer certificate name fields. The issuer is the root CA.
pub fn splice_signer(template_hex: &str, names: &CertNames) -> anyhow::Result<String> {
    debug_assert_eq!(ISSUER_ORG.len(), tables::ROOT_ORG_NAME_LEN);
    debug_assert_eq!(ISSUER_CN.len(), tables::ROOT_COMMON_NAME_LEN);
    debug_assert_eq!(SUBJECT_ORG.len(), tables::SIGNER_ORG_NAME_LEN);
    debug_assert_eq!(SIGNER_SUBJECT_CN.len(), tables::SIGNER_COMMON_NAME_LEN);
    splice(
        template_hex,
        SIGNER_TEMPLATE_LEN,
        [
            (ISSUER_ORG, names.issuer_org),
            (ISSUER_CN, names.issuer_cn),
            (SUBJECT_ORG, names.subject_org),
            (SIGNER_SUBJECT_CN, names.subject_cn),
        ],
    )
}

/// Apply the validity policy to a spliced certificate. Zero years pins the
/// notAfter field to the maximum GeneralizedTime value; any other value
/// keeps the template date.
pub fn apply_validity(cert_hex: &str, valid_years: u32) -> String {
    if valid_years == 0 {
        cert_hex.replace(NOT_AFTER_PATTERN, &ascii_to_hex(NO_EXPIRY_DATE))
    } else {
        cert_hex.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets;
    use tflx_hexfmt::unprettify;

    fn device_template() -> String {
        let root = crate::dom::parse(assets::TFLXTLS_XML).unwrap();
        unprettify(&root.descendant("TemplateData", 0).unwrap().text())
    }

    fn signer_template() -> String {
        let root = crate::dom::parse(assets::TFLXTLS_XML).unwrap();
        unprettify(&root.descendant("TemplateData", 1).unwrap().text())
    }

    const NAMES: CertNames = CertNames {
        issuer_org: "Example Corp",
        issuer_cn: "Example Signer 001",
        subject_org: "Example Corp",
        subject_cn: "Example Device",
    };

    #[test]
    fn test_device_splice_layout() {
        let spliced = splice_device(&device_template(), &NAMES).unwrap();
        assert_eq!(spliced.len(), DEVICE_TEMPLATE_LEN * 2);
        let bytes = hex::decode(&spliced).unwrap();
        assert_eq!(&bytes[56..80], b"Example Corp            ");
        assert_eq!(
            &bytes[91..124],
            b"Example Signer 001               "
        );
        assert_eq!(&bytes[206..226], b"Example Device      ");
        // Bytes outside the name fields are untouched.
        let orig = hex::decode(device_template()).unwrap();
        assert_eq!(bytes[..56], orig[..56]);
        assert_eq!(bytes[80..91], orig[80..91]);
        assert_eq!(bytes[124..171], orig[124..171]);
        assert_eq!(bytes[226..], orig[226..]);
    }

    #[test]
    fn test_signer_splice_layout() {
        let spliced = splice_signer(&signer_template(), &NAMES).unwrap();
        assert_eq!(spliced.len(), SIGNER_TEMPLATE_LEN * 2);
        let bytes = hex::decode(&spliced).unwrap();
        assert_eq!(&bytes[206..239], b"Example Device                   ");
    }

    #[test]
    fn test_name_too_long_rejected() {
        let names = CertNames {
            subject_cn: "a device name longer than the twenty byte field",
            ..NAMES
        };
        assert!(splice_device(&device_template(), &names).is_err());
    }

    #[test]
    fn test_wrong_template_size_rejected() {
        assert!(splice_device(&signer_template(), &NAMES).is_err());
    }

    #[test]
    fn test_validity_zero_pins_expiry() {
        let spliced = splice_device(&device_template(), &NAMES).unwrap();
        let pinned = apply_validity(&spliced, 0);
        assert!(!pinned.contains(NOT_AFTER_PATTERN));
        assert!(pinned.contains(&ascii_to_hex(NO_EXPIRY_DATE)));
        assert_eq!(pinned.len(), spliced.len());
    }

    #[test]
    fn test_validity_nonzero_keeps_date() {
        let spliced = splice_device(&device_template(), &NAMES).unwrap();
        assert_eq!(apply_validity(&spliced, 10), spliced);
    }
}
