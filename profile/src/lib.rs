/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Provisioning profile model, fixed slot tables and validation for the
    TFLX provisioning tools.

--*/

mod model;
mod pem;
pub mod tables;
mod validate;

pub use model::{
    load_profile, CertConfig, CertSource, Certs, Interface, Profile, RootCa, SlotEntry,
    SlotSource, UseCase, DEFAULT_MAN_ID, DEFAULT_PART_NUMBER,
};
pub use pem::key_hex_from_pem;
pub use validate::{normalize_man_id, validate, MAX_VALID_YEARS};
