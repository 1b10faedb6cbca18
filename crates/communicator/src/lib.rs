// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! packer-communicator: the transport-agnostic Communicator Contract (C3)
//! used by the Provisioner Driver, plus the `none` transport and (under
//! `test-support`) an in-memory recording double.

pub mod command;
pub mod communicator;
pub mod error;
pub mod none;

#[cfg(any(test, feature = "test-support"))]
pub mod recording;

pub use command::{CommandHandle, RemoteCommand};
pub use communicator::{Communicator, Excludes, FileInfo};
pub use error::CommunicatorError;
pub use none::NoneCommunicator;

#[cfg(any(test, feature = "test-support"))]
pub use recording::{RecordedCall, RecordingCommunicator};
