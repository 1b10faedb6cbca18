// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use packer_core::template::PostProcessorConfig;
use packer_core::{HookBus, HookEvent, NoopDestroyer};
use tokio::sync::Barrier;

use super::*;
use crate::post_processor::{ConfiguredPostProcessor, ForceOverride, KeepInput, PostProcessor};

/// A builder whose `run` blocks until released, so tests can observe
/// in-flight concurrency and cancellation.
struct FixtureBuilder {
    /// Incremented on entry to `run`, decremented on exit: lets a test
    /// assert the peak number of builds running at once.
    inflight: Arc<AtomicUsize>,
    peak_inflight: Arc<AtomicUsize>,
    gate: Option<Arc<Barrier>>,
    fails: bool,
    never_returns: bool,
}

impl FixtureBuilder {
    fn new() -> Self {
        Self {
            inflight: Arc::new(AtomicUsize::new(0)),
            peak_inflight: Arc::new(AtomicUsize::new(0)),
            gate: None,
            fails: false,
            never_returns: false,
        }
    }

    fn tracking(peak_inflight: Arc<AtomicUsize>) -> Self {
        Self { peak_inflight, ..Self::new() }
    }

    fn failing() -> Self {
        Self { fails: true, ..Self::new() }
    }

    fn stalls_until_cancelled() -> Self {
        Self { never_returns: true, ..Self::new() }
    }
}

#[async_trait]
impl Builder for FixtureBuilder {
    fn builder_id(&self) -> &'static str {
        "packer.fixture"
    }

    async fn prepare(&mut self, _raw: &[Value]) -> PrepareOutcome {
        (vec![], vec![])
    }

    async fn run(
        &self,
        _bag: &StateBag,
        cancel: CancellationToken,
        _hooks: &HookBus,
    ) -> Result<Option<Artifact>, BuilderRunError> {
        let count = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_inflight.fetch_max(count, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.wait().await;
        }

        if self.never_returns {
            cancel.cancelled().await;
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            return Err(BuilderRunError::new("cancelled mid-run"));
        }

        // Yield so sibling tasks actually get scheduled concurrently.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.inflight.fetch_sub(1, Ordering::SeqCst);

        if self.fails {
            return Err(BuilderRunError::new("boom"));
        }
        Ok(Some(Artifact::new("packer.fixture", "id", vec![], "built", Box::new(NoopDestroyer))))
    }
}

fn build(name: &str, builder: FixtureBuilder) -> BuildSpec {
    BuildSpec {
        name: name.to_string(),
        builder: Box::new(builder),
        raw_config: vec![],
        hooks: HookBus::new(),
        post_processor_sequences: vec![],
    }
}

struct Renaming {
    output_id: &'static str,
}

#[async_trait]
impl PostProcessor for Renaming {
    fn post_processor_type(&self) -> &'static str {
        "renaming"
    }

    async fn process(&self, _input: &Artifact) -> Result<(Artifact, KeepInput, ForceOverride), PostProcessorError> {
        Ok((Artifact::new("packer.fixture", self.output_id, vec![], "s", Box::new(NoopDestroyer)), false, false))
    }
}

fn sequence(output_id: &'static str) -> Sequence {
    Sequence::new(vec![ConfiguredPostProcessor {
        config: serde_json::from_value(serde_json::json!({"type": "renaming"})).unwrap(),
        post_processor: Box::new(Renaming { output_id }),
    }])
}

#[tokio::test]
async fn only_except_filter_determinism() {
    let coordinator = BuildCoordinator::new(CoordinatorConfig {
        only: vec!["a".into(), "b".into()],
        ..Default::default()
    });
    let builds =
        vec![build("a", FixtureBuilder::new()), build("b", FixtureBuilder::new()), build("c", FixtureBuilder::new())];

    let results = coordinator.run(builds, CancellationToken::new()).await.unwrap();

    assert_eq!(results.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["a", "b"]);
}

#[tokio::test]
async fn unmatched_only_fails_fast_with_no_builds_matched() {
    let coordinator = BuildCoordinator::new(CoordinatorConfig { only: vec!["z".into()], ..Default::default() });
    let builds = vec![build("a", FixtureBuilder::new()), build("b", FixtureBuilder::new())];

    let err = coordinator.run(builds, CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, CoordinatorError::NoBuildsMatched));
}

#[tokio::test]
async fn results_preserve_template_order_regardless_of_completion_order() {
    let coordinator = BuildCoordinator::new(CoordinatorConfig::default());
    // "slow" finishes after "fast" despite being declared first.
    let mut slow = FixtureBuilder::new();
    slow.gate = None;
    let builds = vec![build("slow", slow), build("fast", FixtureBuilder::new())];

    let results = coordinator.run(builds, CancellationToken::new()).await.unwrap();

    assert_eq!(results.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), ["slow", "fast"]);
    assert!(results.iter().all(|r| r.status == BuildStatus::Succeeded));
}

#[tokio::test]
async fn parallelism_bound_caps_concurrent_builds() {
    let peak = Arc::new(AtomicUsize::new(0));
    let coordinator = BuildCoordinator::new(CoordinatorConfig { parallel_builds: 2, ..Default::default() });
    let builds = (0..5).map(|i| build(&i.to_string(), FixtureBuilder::tracking(peak.clone()))).collect();

    let results = coordinator.run(builds, CancellationToken::new()).await.unwrap();

    assert_eq!(results.len(), 5);
    assert!(peak.load(Ordering::SeqCst) <= 2, "observed {} concurrent builds, bound was 2", peak.load(Ordering::SeqCst));
}

#[tokio::test]
async fn debug_mode_forces_parallelism_to_exactly_one() {
    let peak = Arc::new(AtomicUsize::new(0));
    let coordinator =
        BuildCoordinator::new(CoordinatorConfig { parallel_builds: 4, debug: true, ..Default::default() });
    let builds = (0..3).map(|i| build(&i.to_string(), FixtureBuilder::tracking(peak.clone()))).collect();

    coordinator.run(builds, CancellationToken::new()).await.unwrap();

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn abort_policy_does_not_let_cancelled_siblings_report_success() {
    let coordinator = BuildCoordinator::new(CoordinatorConfig {
        on_error: OnErrorPolicy::Abort,
        parallel_builds: 0,
        ..Default::default()
    });
    let builds =
        vec![build("x", FixtureBuilder::stalls_until_cancelled()), build("y", FixtureBuilder::failing())];

    let results = coordinator.run(builds, CancellationToken::new()).await.unwrap();

    let y = results.iter().find(|r| r.name == "y").unwrap();
    assert!(matches!(y.status, BuildStatus::Failed(_)));
    let x = results.iter().find(|r| r.name == "x").unwrap();
    assert!(
        matches!(x.status, BuildStatus::Cancelled | BuildStatus::Failed(_)),
        "sibling must not silently succeed once a peer fails under abort"
    );
}

#[tokio::test]
async fn post_processor_sequences_fan_out_in_parallel_over_the_same_artifact() {
    let coordinator = BuildCoordinator::new(CoordinatorConfig::default());
    let mut spec = build("web", FixtureBuilder::new());
    spec.post_processor_sequences = vec![sequence("out-1"), sequence("out-2")];

    let results = coordinator.run(vec![spec], CancellationToken::new()).await.unwrap();

    let web = &results[0];
    assert_eq!(web.status, BuildStatus::Succeeded);
    let mut ids: Vec<&str> = web.artifacts.iter().map(|a| a.id()).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["out-1", "out-2"]);
}
