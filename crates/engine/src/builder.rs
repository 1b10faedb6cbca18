// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Builder Contract & Lifecycle (C6): `prepare` merges raw configs and
//! validates side-effect-free; `run` performs the build and returns zero or
//! one [`Artifact`].

use async_trait::async_trait;
use packer_core::{Artifact, ConfigError, HookBus, StateBag, Warning};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Outcome of [`Builder::prepare`]: accumulated warnings plus, on success,
/// nothing further to report. Config errors are fatal to the Build and are
/// returned as `Err`.
pub type PrepareOutcome = (Vec<Warning>, Vec<ConfigError>);

/// A component that produces a machine image for a specific platform.
///
/// `prepare` MUST be side-effect-free: no network calls, no disk writes, no
/// VM launches. This is load-bearing for the Coordinator's two-phase
/// prepare-all-then-run behavior (§9).
#[async_trait]
pub trait Builder: Send + Sync {
    /// Stable public identifier for this builder type (e.g.
    /// `"packer.null"`). Changing it breaks post-processor compatibility.
    fn builder_id(&self) -> &'static str;

    /// Merge `raw` fragments in order (later wins) and validate. Returns
    /// accumulated warnings and, if any fragment is invalid, the full list
    /// of config errors found (not just the first).
    async fn prepare(&mut self, raw: &[Value]) -> PrepareOutcome;

    /// Perform the build.
    ///
    /// Returns `Ok(Some(artifact))` on success, `Ok(None)` when the build
    /// legitimately produces no artifact, or `Err` on failure. Must honor
    /// `cancel` promptly — within the time needed to clean up one step —
    /// and must leave no external resources behind unless explicitly
    /// configured to via the state bag (e.g. `keep_registered`).
    async fn run(
        &self,
        bag: &StateBag,
        cancel: CancellationToken,
        hooks: &HookBus,
    ) -> Result<Option<Artifact>, BuilderRunError>;
}

/// Error surfaced by [`Builder::run`].
#[derive(Debug, thiserror::Error)]
#[error("builder run failed: {0}")]
pub struct BuilderRunError(pub String);

impl BuilderRunError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
