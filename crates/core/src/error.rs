// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy shared by every crate in the workspace (§7): config
//! errors and warnings surfaced by `prepare`, step failures, cancellation,
//! and post-processor failures. Each variant here is a leaf the Coordinator
//! aggregates and reports — it never reinterprets a Build's error, only
//! collects it.

use thiserror::Error;

/// Surfaced by a Builder's `prepare`. Aggregated across all config blocks;
/// every `ConfigError` from every block is collected and reported before
/// the first Run, never just the first one found.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Non-fatal diagnostic accumulated by `prepare`; never affects exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning(pub String);

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A step's `execute` failed outright (after any transient-error retry
/// budget was exhausted). Recorded in the state bag's `error` key; the
/// runner halts and unwinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("step {step} failed: {message}")]
pub struct StepError {
    pub step: String,
    pub message: String,
}

impl StepError {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self { step: step.into(), message: message.into() }
    }
}

/// Halts a Post-Processor's sequence only; other sequences and other
/// Builds continue unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("post-processor {post_processor} failed: {message}")]
pub struct PostProcessorError {
    pub post_processor: String,
    pub message: String,
}

impl PostProcessorError {
    pub fn new(post_processor: impl Into<String>, message: impl Into<String>) -> Self {
        Self { post_processor: post_processor.into(), message: message.into() }
    }
}

/// Final disposition of one Build, as reported by the Coordinator (§7,
/// §4.9.8). `Cancelled` and `Failed` are both exit-code failures but are
/// reported distinctly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    #[error("build succeeded")]
    Succeeded,
    #[error("build failed: {0}")]
    Failed(StepError),
    #[error("build cancelled")]
    Cancelled,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
