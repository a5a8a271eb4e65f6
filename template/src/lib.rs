/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Provisioning document templating: XML document model, slot and
    certificate splicing, companion cert_def sources and the
    whole-document pipeline.

--*/

pub mod assets;
pub mod cert;
pub mod certdef;
pub mod dom;
mod locks;
mod pipeline;
pub mod slots;

pub use certdef::SourceFile;
pub use pipeline::{generate, generate_with_template, Package, PACKAGE_BASENAME};
