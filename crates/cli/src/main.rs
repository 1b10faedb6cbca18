// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `packer`: the demo CLI front end for the build execution engine.
//!
//! Concrete platform builders, communicator transports, and template
//! variable interpolation are out of scope for this workspace; this binary
//! exists to drive `packer-engine` end to end against the built-in
//! `packer.null` fixture builder.

mod color;
mod commands;
mod exit_error;
mod logging;
mod null_builder;

use clap::{Parser, Subcommand};

use crate::commands::build::BuildArgs;
use crate::exit_error::ExitError;

#[derive(Parser)]
#[command(name = "packer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a template's builds.
    Build(BuildArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Build(args) => commands::build::run(args).await,
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}
