// Licensed under the Apache-2.0 license

use std::io::Read;
use std::process::Stdio;

const PROGRAM_BIN: &str = env!("CARGO_BIN_EXE_tflx-provision");

const MINIMAL_PROFILE: &str = r#"
part_number = "ATECC608B-TFLXTLS"
"#;

fn run(args: &[&str]) -> std::process::Output {
    std::process::Command::new(PROGRAM_BIN)
        .args(args)
        .stderr(Stdio::piped())
        .output()
        .unwrap()
}

fn archive_entries(path: &std::path::Path) -> Vec<(String, String)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        entries.push((entry.name().to_string(), content));
    }
    entries
}

#[test]
fn test_generate_default_package() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("profile.toml");
    std::fs::write(&profile, MINIMAL_PROFILE).unwrap();

    let out = run(&[
        "generate",
        "--profile",
        profile.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0), "{:?}", out);

    let archive = dir.path().join("TFLXTLS_Provisioning_package.zip");
    let entries = archive_entries(&archive);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        [
            "tflxtls_cust_cert_def_device.h",
            "tflxtls_cust_cert_def_device.c",
            "tflxtls_cust_cert_def_signer.h",
            "tflxtls_cust_cert_def_signer.c",
            "ATECC608B-TFLXTLS.xml",
        ]
    );
    let xml = &entries[4].1;
    assert!(xml.starts_with("<?xml version='1.0' encoding='utf-8'?>"));
    assert!(xml.contains("<PartNumber>ATECC608B-TFLXTLS</PartNumber>"));
    // No secret data, no warning.
    assert!(!String::from_utf8_lossy(&out.stderr).contains("secret"));
}

#[test]
fn test_secret_slot_warning() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("profile.toml");
    std::fs::write(
        &profile,
        format!(
            "{MINIMAL_PROFILE}\n[slots.5]\nsource = \"hex\"\ndata = \"{}\"\n",
            "A5 ".repeat(32).trim_end()
        ),
    )
    .unwrap();

    let out = run(&[
        "generate",
        "--profile",
        profile.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0), "{:?}", out);
    assert!(String::from_utf8_lossy(&out.stderr).contains("secret"));
}

#[test]
fn test_invalid_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("profile.toml");
    std::fs::write(&profile, "man_id = \"not-hex\"\n").unwrap();

    let out = run(&[
        "generate",
        "--profile",
        profile.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("MAN-ID"));
    assert!(!dir.path().join("TFLXTLS_Provisioning_package.zip").exists());
}

#[test]
fn test_sample_profile_generates() {
    let out = run(&["sample-profile"]);
    assert_eq!(out.status.code(), Some(0));

    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("profile.toml");
    std::fs::write(&profile, &out.stdout).unwrap();

    let out = run(&[
        "generate",
        "--profile",
        profile.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0), "{:?}", out);
}

#[test]
fn test_custom_template_override() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("profile.toml");
    std::fs::write(&profile, MINIMAL_PROFILE).unwrap();

    let out = run(&["sample-profile"]);
    assert_eq!(out.status.code(), Some(0));

    // A truncated template is rejected without writing an archive.
    let template = dir.path().join("template.xml");
    std::fs::write(&template, "<ATECC608B>").unwrap();
    let out = run(&[
        "generate",
        "--profile",
        profile.to_str().unwrap(),
        "--template",
        template.to_str().unwrap(),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.path().join("TFLXTLS_Provisioning_package.zip").exists());
}
