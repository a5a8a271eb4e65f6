/*++

Licensed under the Apache-2.0 license.

File Name:

    assets.rs

Abstract:

    Embedded provisioning assets: the factory configuration XML template
    and the cert_def C source fragments the package emitter concatenates.

--*/

/// Factory TFLXTLS provisioning XML template.
pub const TFLXTLS_XML: &str = include_str!("../assets/tflxtls.xml");

pub const DEVICE_CERT_DEF_H: &str = include_str!("../assets/certdef/device_h.txt");
pub const DEVICE_CERT_DEF_C_P1: &str = include_str!("../assets/certdef/device_c_p1.txt");
pub const DEVICE_CERT_DEF_C_HEX: &str = include_str!("../assets/certdef/device_c_hex.txt");
pub const DEVICE_CERT_DEF_C_P2: &str = include_str!("../assets/certdef/device_c_p2.txt");
pub const DEVICE_CERT_DEF_C_P3: &str = include_str!("../assets/certdef/device_c_p3.txt");
pub const DEVICE_CERT_DEF_C_P4: &str = include_str!("../assets/certdef/device_c_p4.txt");
pub const DEVICE_CERT_DEF_C_P5: &str = include_str!("../assets/certdef/device_c_p5.txt");

pub const SIGNER_CERT_DEF_H: &str = include_str!("../assets/certdef/signer_h.txt");
pub const SIGNER_CERT_DEF_C_P1: &str = include_str!("../assets/certdef/signer_c_p1.txt");
pub const SIGNER_CERT_DEF_C_HEX: &str = include_str!("../assets/certdef/signer_c_hex.txt");
pub const SIGNER_CERT_DEF_C_P2: &str = include_str!("../assets/certdef/signer_c_p2.txt");
pub const SIGNER_CERT_DEF_C_P3: &str = include_str!("../assets/certdef/signer_c_p3.txt");
