/*++

Licensed under the Apache-2.0 license.

File Name:

    certdef.rs

Abstract:

    Companion atcacert definition sources. The provisioning package carries
    C sources describing each compressed certificate so firmware can
    reassemble the full X.509 certificate on the host side. Custom
    certificates get their spliced template rendered into the fragments;
    factory certificates use the pre-rendered default arrays.

--*/

use tflx_hexfmt::to_c_array;

use crate::assets;

pub const DEVICE_CERT_DEF_BASENAME: &str = "tflxtls_cust_cert_def_device";
pub const SIGNER_CERT_DEF_BASENAME: &str = "tflxtls_cust_cert_def_signer";

/// One file destined for the provisioning archive.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

impl SourceFile {
    fn new(name: impl Into<String>, content: String) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }
}

/// Device certificate definition sources. `cert_hex` is the spliced
/// template for a custom certificate, `None` for the factory default.
/// `cn_from_serial` keeps the serial-number common-name elements.
pub fn device_sources(cert_hex: Option<&str>, cn_from_serial: bool) -> Vec<SourceFile> {
    let mut c = String::from(assets::DEVICE_CERT_DEF_C_P1);
    match cert_hex {
        Some(hex) => {
            c.push_str(&to_c_array(hex, 32));
            if cn_from_serial {
                c.push_str(assets::DEVICE_CERT_DEF_C_P2);
            }
            c.push_str(assets::DEVICE_CERT_DEF_C_P3);
            c.push_str(if cn_from_serial {
                assets::DEVICE_CERT_DEF_C_P5
            } else {
                assets::DEVICE_CERT_DEF_C_P4
            });
        }
        None => {
            c.push_str(assets::DEVICE_CERT_DEF_C_HEX);
            c.push_str(assets::DEVICE_CERT_DEF_C_P2);
            c.push_str(assets::DEVICE_CERT_DEF_C_P3);
            c.push_str(assets::DEVICE_CERT_DEF_C_P5);
        }
    }
    vec![
        SourceFile::new(
            format!("{DEVICE_CERT_DEF_BASENAME}.h"),
            assets::DEVICE_CERT_DEF_H.to_string(),
        ),
        SourceFile::new(format!("{DEVICE_CERT_DEF_BASENAME}.c"), c),
    ]
}

/// Signer certificate definition sources. The CA public key that verifies
/// the signer certificate is always rendered into the C file.
pub fn signer_sources(cert_hex: Option<&str>, ca_public_key_hex: &str) -> Vec<SourceFile> {
    let mut c = String::from(assets::SIGNER_CERT_DEF_C_P1);
    match cert_hex {
        Some(hex) => c.push_str(&to_c_array(hex, 32)),
        None => c.push_str(assets::SIGNER_CERT_DEF_C_HEX),
    }
    c.push_str(assets::SIGNER_CERT_DEF_C_P2);
    c.push_str(&to_c_array(ca_public_key_hex, 32));
    c.push_str(assets::SIGNER_CERT_DEF_C_P3);
    vec![
        SourceFile::new(
            format!("{SIGNER_CERT_DEF_BASENAME}.h"),
            assets::SIGNER_CERT_DEF_H.to_string(),
        ),
        SourceFile::new(format!("{SIGNER_CERT_DEF_BASENAME}.c"), c),
    ]
}
