// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-level errors: everything the Coordinator itself can fail with,
//! distinct from a single Build's `StepError`/`PostProcessorError` (those
//! live in `packer_core::error` and are aggregated, not propagated).

use packer_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// `-only`/`-except` left no builds selected (§4.9 step 1).
    #[error("no builds matched the given -only/-except filters")]
    NoBuildsMatched,

    /// At least one Build failed `prepare`; collected across all builds
    /// and reported before any Run (§4.9 step 2).
    #[error("{} build(s) failed to prepare", .0.len())]
    PrepareFailed(Vec<(String, Vec<ConfigError>)>),
}
