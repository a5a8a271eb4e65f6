/*++

Licensed under the Apache-2.0 license.

File Name:

    sample.rs

Abstract:

    File contains the commented example provisioning profile.

--*/

const SAMPLE_PROFILE: &str = r##"# TFLXTLS provisioning profile.
#
# Every section is optional; an empty profile produces the factory
# configuration with Microchip-issued certificates.

# Ordering part number, stamped into the provisioning XML name and body.
part_number = "ATECC608B-TFLXTLS"

# One-byte manufacturer id in hex. Defaults to "01".
man_id = "01"

# Device interface: "i2c" or "swi".
interface = "i2c"

# Enable the secure boot persistent latch configuration on slot 0.
secure_boot_latch = false

# Use cases drive slot requirements at validation time:
#   "secure-boot"         requires slot 15
#   "secure-key-rotation" requires slots 13 and 14
#   "ip-protection"       requires slot 5
#   "disposable"          requires slot 5
#   "custom-pki"          requires custom certificates and a root CA key
use_cases = []

# Loadable slots take inline hex or a PEM file (path relative to this
# profile). Secret slots left out of the profile are generated on-device.
#
# [slots.5]
# source = "hex"
# data = "00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F
#         10 11 12 13 14 15 16 17 18 19 1A 1B 1C 1D 1E 1F"
# lockable = false   # permanent configuration when locked
# lock = false       # write-lock the slot in the generated document
#
# [slots.13]
# source = "pem"
# file = "rotating_public.pem"

# Certificate sources: "microchip" (factory templates) or "custom".
[certs.device]
source = "microchip"
# org_name = "Example Corp"        # at most 24 characters
# common_name = "Example Device"   # at most 20 characters
# valid_years = 10                 # 0 means no expiration
# common_name_from_serial = true   # derive the CN from the chip serial

[certs.signer]
source = "microchip"
# org_name = "Example Corp"            # at most 24 characters
# common_name = "Example Signer 001"   # at most 33 characters
# valid_years = 10

# Root CA identity, required for a custom signer certificate.
#
# [root_ca]
# org_name = "Example Corp"         # at most 24 characters
# common_name = "Example Root CA"   # at most 33 characters
# public_key = { source = "pem", file = "root_public.pem" }
"##;

pub(crate) fn run_cmd() -> anyhow::Result<()> {
    print!("{SAMPLE_PROFILE}");
    Ok(())
}
