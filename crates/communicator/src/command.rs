// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A remote command in flight, as started by [`crate::Communicator::start`].

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::CommunicatorError;

/// A command to run on the remote machine.
#[derive(Debug, Clone)]
pub struct RemoteCommand {
    pub command: String,
}

impl RemoteCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

/// Handle to a running remote process, returned by `Communicator::start`.
///
/// `wait` and `cancel` are each expected to be called at most once by a
/// well-behaved caller; `stdin`/`stdout`/`stderr` may each be taken at most
/// once, mirroring `tokio::process::Child`'s stream-taking API.
#[async_trait]
pub trait CommandHandle: Send + Sync {
    /// Block until the remote process exits, returning its exit code.
    async fn wait(&mut self) -> Result<i32, CommunicatorError>;

    /// Forcibly terminate the remote process.
    async fn cancel(&mut self) -> Result<(), CommunicatorError>;

    /// Take ownership of the process's stdin stream, if still available.
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Send + Unpin>>;

    /// Take ownership of the process's stdout stream, if still available.
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;

    /// Take ownership of the process's stderr stream, if still available.
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>>;
}
