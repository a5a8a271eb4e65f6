/*++

Licensed under the Apache-2.0 license.

File Name:

    generate.rs

Abstract:

    File contains implementation of the provisioning package generation
    command.

--*/

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ArgMatches;
use zip::write::FileOptions;
use zip::CompressionMethod;

use tflx_template::{Package, PACKAGE_BASENAME};

pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let profile_path: &PathBuf = args
        .get_one::<PathBuf>("profile")
        .with_context(|| "profile arg not specified")?;

    let template_path = args.get_one::<PathBuf>("template");

    let out_dir = args
        .get_one::<PathBuf>("out-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let profile = tflx_profile::load_profile(profile_path)?;
    tflx_profile::validate(&profile)?;

    let package = match template_path {
        Some(path) => {
            let template = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template file {}", path.display()))?;
            tflx_template::generate_with_template(&profile, &template)?
        }
        None => tflx_template::generate(&profile)?,
    };

    let archive_path = write_archive(&out_dir, &package)?;
    println!("Created {}", archive_path.display());

    if package.contains_secrets {
        eprintln!(
            "Warning: the provisioning XML carries secret slot data in the clear; \
             handle the package accordingly"
        );
    }
    Ok(())
}

/// Write the package files into a single zip archive. The entries are
/// accumulated in package order and flushed once.
fn write_archive(out_dir: &Path, package: &Package) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    let path = out_dir.join(format!("{PACKAGE_BASENAME}.zip"));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create archive {}", path.display()))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in &package.files {
        writer
            .start_file(entry.name.as_str(), options)
            .with_context(|| format!("Failed to add {} to the archive", entry.name))?;
        writer
            .write_all(entry.content.as_bytes())
            .with_context(|| format!("Failed to write {} to the archive", entry.name))?;
    }
    writer.finish().context("Failed to finish the archive")?;
    Ok(path)
}
