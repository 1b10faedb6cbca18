// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Step Runner (C2): sequences an ordered list of named steps over a
//! shared [`StateBag`], guaranteeing LIFO cleanup on success, failure, or
//! cancellation.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::state_bag::StateBag;

/// Directive returned by [`Step::execute`].
///
/// A `Halt` is not itself an error — the step is expected to have recorded
/// one in the [`StateBag`] under [`crate::state_bag::KEY_ERROR`] if it
/// wishes to report one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirective {
    Continue,
    Halt,
}

crate::simple_display! {
    StepDirective {
        Continue => "continue",
        Halt => "halt",
    }
}

/// A single unit of work inside a Build's Run.
///
/// Steps have no persistent identity — a fresh instance is built per Build.
/// `execute` and `cleanup` are each called at most once per run.
#[async_trait]
pub trait Step: Send + Sync {
    /// Name used in logs and in step-failure error messages.
    fn name(&self) -> &str;

    /// Perform the step's work, reading and writing the shared state bag.
    async fn execute(&self, bag: &StateBag, cancel: &CancellationToken) -> StepDirective;

    /// Undo whatever `execute` set up. Always called if `execute` was
    /// entered, regardless of the directive it returned, whether the run
    /// was cancelled, or whether an earlier cleanup panicked.
    ///
    /// Default: no-op, for steps with nothing to tear down.
    async fn cleanup(&self, _bag: &StateBag) {}
}

/// Invoked between steps when debug mode is enabled, blocking on user
/// confirmation before the runner advances to the next step.
#[async_trait]
pub trait DebugPause: Send + Sync {
    async fn pause_after(&self, completed_step: &str);
}

/// Outcome of one [`StepRunner::run`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All steps executed and returned `Continue`.
    Completed,
    /// A step returned `Halt` (inspect the state bag's `error` key for why).
    Halted,
    /// The cancellation token fired before all steps ran.
    Cancelled,
}

/// Executes an ordered sequence of [`Step`]s over one [`StateBag`].
pub struct StepRunner {
    steps: Vec<Box<dyn Step>>,
    debug_pause: Option<Arc<dyn DebugPause>>,
}

impl StepRunner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps, debug_pause: None }
    }

    /// Attach the pause-after-step hook used when debug mode is enabled.
    pub fn with_debug_pause(mut self, pause: Arc<dyn DebugPause>) -> Self {
        self.debug_pause = Some(pause);
        self
    }

    /// Run the configured steps in order, then unwind cleanup in reverse.
    ///
    /// At-most-once execute and at-most-once cleanup per step is guaranteed:
    /// each step is pushed onto the "entered" stack immediately before its
    /// `execute` is awaited, and the unwind loop walks that stack, not the
    /// original list, so a step whose `execute` was never reached never
    /// gets a `cleanup` call either.
    pub async fn run(&self, bag: &StateBag, cancel: CancellationToken) -> RunOutcome {
        let mut entered: Vec<&dyn Step> = Vec::with_capacity(self.steps.len());
        let mut outcome = RunOutcome::Completed;

        for step in &self.steps {
            if cancel.is_cancelled() {
                bag.set_cancelled();
                outcome = RunOutcome::Cancelled;
                break;
            }

            tracing::debug!(step = step.name(), "step: execute");
            entered.push(step.as_ref());
            let directive = step.execute(bag, &cancel).await;
            tracing::debug!(step = step.name(), directive = %directive, "step: executed");

            if cancel.is_cancelled() {
                bag.set_cancelled();
                outcome = RunOutcome::Cancelled;
                break;
            }

            match directive {
                StepDirective::Continue => {}
                StepDirective::Halt => {
                    bag.set_halted();
                    outcome = RunOutcome::Halted;
                    break;
                }
            }

            if bag.is_debug() {
                if let Some(pause) = &self.debug_pause {
                    pause.pause_after(step.name()).await;
                }
            }
        }

        self.unwind(entered, bag).await;
        outcome
    }

    /// Run cleanup for every entered step, LIFO, tolerating panics.
    ///
    /// A cleanup panic is caught, logged, and recorded into the bag's
    /// `error` key (if nothing more specific is already there) rather than
    /// unwinding past the rest of the cleanup stack.
    async fn unwind(&self, entered: Vec<&dyn Step>, bag: &StateBag) {
        for step in entered.into_iter().rev() {
            tracing::debug!(step = step.name(), "step: cleanup");
            let result = AssertUnwindSafe(step.cleanup(bag)).catch_unwind().await;
            if let Err(panic) = result {
                let message = panic_message(&panic);
                tracing::error!(step = step.name(), %message, "step cleanup panicked");
                if bag.error().is_none() {
                    bag.set_error(format!("cleanup of step {} panicked: {message}", step.name()));
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
