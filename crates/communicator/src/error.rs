// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Communicator contract (§4.3).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommunicatorError {
    #[error("connection lost")]
    ConnectionLost,

    #[error("remote command exited with code {0}")]
    RemoteCommandFailed(i32),

    /// Returned by transports (e.g. the `none` communicator) that reject
    /// every operation.
    #[error("operation unsupported by this communicator")]
    Unsupported,

    #[error("operation timed out")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
