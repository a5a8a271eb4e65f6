/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    Main entry point for the TFLXTLS provisioning package generator.

--*/
use std::path::PathBuf;

use clap::{arg, value_parser, Command};

mod generate;
mod sample;

fn main() {
    let sub_cmds = vec![
        Command::new("generate")
            .about("Generate a TFLXTLS provisioning package from a profile")
            .arg(
                arg!(--"profile" <FILE> "Provisioning profile (TOML)")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"template" <FILE> "Override the bundled provisioning XML template")
                    .required(false)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"out-dir" <DIR> "Output directory for the package archive")
                    .required(false)
                    .value_parser(value_parser!(PathBuf)),
            ),
        Command::new("sample-profile").about("Print a commented example provisioning profile"),
    ];

    let cmd = Command::new("tflx-provision")
        .arg_required_else_help(true)
        .subcommands(sub_cmds)
        .about("TrustFLEX ATECC608 provisioning package tools")
        .get_matches();

    let result = match cmd.subcommand().unwrap() {
        ("generate", args) => generate::run_cmd(args),
        ("sample-profile", _) => sample::run_cmd(),
        (_, _) => unreachable!(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
