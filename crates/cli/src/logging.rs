// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup for the `packer` binary: `tracing-subscriber` with an
//! `EnvFilter` (`PACKER_LOG`, default `info`), writing to stderr so stdout
//! stays clean for build output. No file appender: this binary persists
//! nothing between invocations.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init(timestamp_ui: bool) {
    let filter = EnvFilter::try_from_env("PACKER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    if timestamp_ui {
        let layer = fmt::layer().with_writer(std::io::stderr).with_timer(fmt::time::SystemTime);
        tracing_subscriber::registry().with(filter).with(layer).init();
    } else {
        let layer = fmt::layer().with_writer(std::io::stderr).without_time();
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}
