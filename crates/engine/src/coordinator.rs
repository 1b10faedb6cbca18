// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Build Coordinator (C9): orchestrates N concurrent Builds with
//! bounded parallelism, `-only`/`-except` filtering, an on-error policy,
//! cancellation propagation, and aggregate, template-order-preserving
//! results.

use std::sync::Arc;

use packer_core::{Artifact, ConfigError, HookBus, StateBag, Warning, KEY_BUILD_NAME, KEY_DEBUG, KEY_FORCE};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::builder::Builder;
use crate::error::CoordinatorError;
use crate::post_processor::Sequence;

/// Failure-handling policy selected by `-on-error` (default `cleanup`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnErrorPolicy {
    /// Cancel siblings cooperatively; their Step Runners still unwind and
    /// clean up normally.
    Cleanup,
    /// Cancel siblings and hard-abort their tasks: in-flight cleanup is not
    /// allowed to complete.
    Abort,
    /// Ask the operator (via [`AskHandler`]) what to do; falls back to
    /// `Cleanup` if no handler is configured.
    Ask,
}

/// Operator decision for the `ask` policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskDecision {
    Retry,
    Cleanup,
    Abort,
}

/// Collaborator consulted once per failing Build under the `ask` policy.
///
/// Genuinely interactive prompting is a UI concern and out of scope here;
/// this trait is the seam a CLI front end hangs a real terminal prompt off.
#[async_trait::async_trait]
pub trait AskHandler: Send + Sync {
    async fn ask(&self, build_name: &str, error: &str) -> AskDecision;
}

/// Coordinator-wide configuration, built from CLI flags (§6).
pub struct CoordinatorConfig {
    pub only: Vec<String>,
    pub except: Vec<String>,
    /// Max concurrent builds; 0 = unlimited.
    pub parallel_builds: usize,
    pub on_error: OnErrorPolicy,
    pub debug: bool,
    pub force: bool,
    pub ask_handler: Option<Arc<dyn AskHandler>>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            only: Vec::new(),
            except: Vec::new(),
            parallel_builds: 0,
            on_error: OnErrorPolicy::Cleanup,
            debug: false,
            force: false,
            ask_handler: None,
        }
    }
}

/// One Build as handed to the Coordinator: a name, a Builder, its raw
/// config fragments, the Hook Bus it will `run` against (already wired
/// with a [`crate::provisioner::ProvisionerDriver`] subscribed to
/// `provision`, if this build has provisioners), and its post-processor
/// sequences.
pub struct BuildSpec {
    pub name: String,
    pub builder: Box<dyn Builder>,
    pub raw_config: Vec<Value>,
    pub hooks: HookBus,
    pub post_processor_sequences: Vec<Sequence>,
}

/// Final disposition of one Build, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    Succeeded,
    Failed(String),
    Cancelled,
}

/// Per-build outcome, in template order regardless of completion order.
pub struct BuildResult {
    pub name: String,
    pub status: BuildStatus,
    pub warnings: Vec<Warning>,
    /// Surviving artifacts after post-processing (zero, one, or more if a
    /// build fans out into several post-processor sequences).
    pub artifacts: Vec<Artifact>,
}

/// Orchestrates N concurrent Builds per §4.9's 8-step algorithm.
pub struct BuildCoordinator {
    config: CoordinatorConfig,
}

impl BuildCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    /// Run every Build selected by `-only`/`-except`, in template order.
    pub async fn run(
        &self,
        builds: Vec<BuildSpec>,
        cancel: CancellationToken,
    ) -> Result<Vec<BuildResult>, CoordinatorError> {
        // Step 1: apply -only/-except.
        let selected = apply_filters(builds, &self.config.only, &self.config.except);
        if selected.is_empty() {
            return Err(CoordinatorError::NoBuildsMatched);
        }

        // Step 2: prepare every build before any Run.
        let (mut prepared, prepare_failures) = self.prepare_all(selected).await;
        if !prepare_failures.is_empty() {
            return Err(CoordinatorError::PrepareFailed(prepare_failures));
        }

        // Step 3 is folded into step 4's per-build state bag setup below.
        let bound = self.effective_parallelism(prepared.len());
        let permits = Arc::new(Semaphore::new(bound));

        // Step 4/5: launch builds, feed artifacts into post-processing,
        // respecting the same bound across both phases combined.
        let count = prepared.len();
        let mut tokens = Vec::with_capacity(count);
        let mut names = Vec::with_capacity(count);
        let mut handles: Vec<JoinHandle<TaskOutcome>> = Vec::with_capacity(count);

        for prepared_build in prepared.drain(..) {
            let token = cancel.child_token();
            tokens.push(token.clone());
            names.push(prepared_build.spec.name.clone());
            let permits = permits.clone();
            let debug = self.config.debug;
            let force = self.config.force;

            handles.push(tokio::spawn(async move {
                run_one_build(prepared_build, token, permits, debug, force).await
            }));
        }

        // Step 6/7: watch completions as they arrive; react to failure per
        // the configured on-error policy.
        let results = self.drain_with_policy(names, tokens, handles).await;

        Ok(results)
    }

    fn effective_parallelism(&self, build_count: usize) -> usize {
        if self.config.debug {
            1
        } else if self.config.parallel_builds == 0 {
            build_count.max(1)
        } else {
            self.config.parallel_builds
        }
    }

    async fn prepare_all(
        &self,
        builds: Vec<BuildSpec>,
    ) -> (Vec<PreparedBuild>, Vec<(String, Vec<ConfigError>)>) {
        let mut prepared = Vec::with_capacity(builds.len());
        let mut failures = Vec::new();

        for mut build in builds {
            let (warnings, errors) = build.builder.prepare(&build.raw_config).await;
            for warning in &warnings {
                tracing::warn!(build = %build.name, %warning, "prepare: warning");
            }
            if !errors.is_empty() {
                tracing::error!(build = %build.name, count = errors.len(), "prepare: failed");
                failures.push((build.name.clone(), errors));
                continue;
            }
            prepared.push(PreparedBuild { spec: build, warnings });
        }

        (prepared, failures)
    }

    async fn drain_with_policy(
        &self,
        names: Vec<String>,
        tokens: Vec<CancellationToken>,
        handles: Vec<JoinHandle<TaskOutcome>>,
    ) -> Vec<BuildResult> {
        let mut slots: Vec<Option<BuildResult>> = (0..handles.len()).map(|_| None).collect();
        let mut failed = false;

        // Poll completions as they arrive (not in template order) so we can
        // react to a failure before the rest finish, then re-assemble the
        // ordered result vector at the end.
        let mut indices: Vec<usize> = (0..handles.len()).collect();
        let mut remaining = handles;
        while !remaining.is_empty() {
            let (joined, idx_pos, rest) = futures_util::future::select_all(remaining).await;
            remaining = rest;
            let idx = indices.remove(idx_pos);

            // A build whose task was hard-aborted (`abort` policy) never
            // gets to fill in its own `TaskOutcome::name` — recover it from
            // the name recorded before launch so the result still reports
            // against the right build (§4.9 step 8 requires template-order,
            // per-build reporting even for aborted siblings).
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_err) => TaskOutcome {
                    name: names[idx].clone(),
                    status: if join_err.is_cancelled() {
                        BuildStatus::Cancelled
                    } else {
                        BuildStatus::Failed(join_err.to_string())
                    },
                    warnings: Vec::new(),
                    artifacts: Vec::new(),
                },
            };

            let is_failure = matches!(outcome.status, BuildStatus::Failed(_));
            slots[idx] = Some(BuildResult {
                name: outcome.name,
                status: outcome.status,
                warnings: outcome.warnings,
                artifacts: outcome.artifacts,
            });

            if is_failure && !failed {
                failed = true;
                self.handle_failure(&tokens, &mut remaining, &indices).await;
            }
        }

        // Every slot is filled exactly once above, one per original index,
        // but `filter_map` avoids a panic path entirely rather than relying
        // on that invariant to justify an `expect`.
        slots.into_iter().filter_map(|s| s).collect()
    }

    /// Cancels (and, under `abort`, hard-kills) every still-running sibling
    /// build. `remaining`/`indices` are the in-flight join handles not yet
    /// collected, paired positionally with their original build index.
    async fn handle_failure(
        &self,
        tokens: &[CancellationToken],
        remaining: &mut [JoinHandle<TaskOutcome>],
        indices: &[usize],
    ) {
        let policy = match self.config.on_error {
            OnErrorPolicy::Ask => {
                if let Some(handler) = &self.config.ask_handler {
                    match handler.ask("build", "build failed").await {
                        AskDecision::Abort => OnErrorPolicy::Abort,
                        AskDecision::Cleanup | AskDecision::Retry => OnErrorPolicy::Cleanup,
                    }
                } else {
                    tracing::warn!("on-error=ask with no ask handler configured; defaulting to cleanup");
                    OnErrorPolicy::Cleanup
                }
            }
            other => other,
        };

        for (pos, &original_idx) in indices.iter().enumerate() {
            tokens[original_idx].cancel();
            if policy == OnErrorPolicy::Abort {
                remaining[pos].abort();
            }
        }
    }
}

struct PreparedBuild {
    spec: BuildSpec,
    warnings: Vec<Warning>,
}

struct TaskOutcome {
    name: String,
    status: BuildStatus,
    warnings: Vec<Warning>,
    artifacts: Vec<Artifact>,
}

async fn run_one_build(
    prepared: PreparedBuild,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
    debug: bool,
    force: bool,
) -> TaskOutcome {
    let PreparedBuild { spec, warnings } = prepared;
    let name = spec.name.clone();

    // Held only for the duration of the Build's own Run; released before
    // post-processing starts so each post-processor sequence can acquire
    // its own permit (§4.9 step 5: "respecting the parallelism bound across
    // *all* post-processor sequences and builds combined").
    let permit = match permits.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return TaskOutcome { name, status: BuildStatus::Cancelled, warnings, artifacts: vec![] }
        }
    };

    if cancel.is_cancelled() {
        return TaskOutcome { name, status: BuildStatus::Cancelled, warnings, artifacts: vec![] };
    }

    let bag = StateBag::new();
    bag.put(KEY_BUILD_NAME, name.clone());
    if debug {
        bag.put(KEY_DEBUG, true);
    }
    if force {
        bag.put(KEY_FORCE, true);
    }

    tracing::info!(build = %name, "build: run");
    let run_result = spec.builder.run(&bag, cancel.clone(), &spec.hooks).await;
    drop(permit);

    let artifact = match run_result {
        Ok(artifact) => artifact,
        Err(err) => {
            tracing::error!(build = %name, error = %err, "build: failed");
            return TaskOutcome {
                name,
                status: BuildStatus::Failed(err.to_string()),
                warnings,
                artifacts: vec![],
            };
        }
    };

    if cancel.is_cancelled() {
        return TaskOutcome { name, status: BuildStatus::Cancelled, warnings, artifacts: vec![] };
    }

    let Some(artifact) = artifact else {
        tracing::info!(build = %name, "build: produced no artifact");
        return TaskOutcome { name, status: BuildStatus::Succeeded, warnings, artifacts: vec![] };
    };

    let surviving = run_post_processor_sequences(artifact, &spec.post_processor_sequences, &name, &permits).await;

    TaskOutcome { name, status: BuildStatus::Succeeded, warnings, artifacts: surviving }
}

/// Fans `artifact` out across every configured post-processor sequence,
/// running them in parallel (§3, §4.8: "different sequences fan out in
/// parallel over the same input artifact"). Each sequence gets its own
/// [`Artifact::fork`] sharing the destroy guard, so whichever sequence
/// decides not to keep its input actually destroys the shared resource and
/// every other fork's own destroy call just observes `AlreadyDestroyed`.
async fn run_post_processor_sequences(
    artifact: Artifact,
    sequences: &[Sequence],
    build_name: &str,
    permits: &Arc<Semaphore>,
) -> Vec<Artifact> {
    match sequences {
        [] => vec![artifact],
        [only] => {
            let _permit = permits.acquire().await;
            let outcome = only.run(artifact, build_name).await;
            if let Some(err) = &outcome.error {
                tracing::warn!(build = %build_name, error = %err, "post-processor sequence failed");
            }
            outcome.artifact.into_iter().collect()
        }
        many => {
            let runs = many.iter().map(|sequence| {
                let fork = artifact.fork();
                let permits = permits.clone();
                async move {
                    let _permit = permits.acquire_owned().await;
                    sequence.run(fork, build_name).await
                }
            });
            let outcomes = futures_util::future::join_all(runs).await;
            outcomes
                .into_iter()
                .filter_map(|outcome| {
                    if let Some(err) = &outcome.error {
                        tracing::warn!(build = %build_name, error = %err, "post-processor sequence failed");
                    }
                    outcome.artifact
                })
                .collect()
        }
    }
}

fn apply_filters(builds: Vec<BuildSpec>, only: &[String], except: &[String]) -> Vec<BuildSpec> {
    builds
        .into_iter()
        .filter(|b| {
            if except.iter().any(|n| n == &b.name) {
                return false;
            }
            if !only.is_empty() {
                return only.iter().any(|n| n == &b.name);
            }
            true
        })
        .collect()
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
