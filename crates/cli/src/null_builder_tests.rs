// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use packer_core::HookBus;

use super::*;

#[tokio::test]
async fn run_produces_an_artifact_with_no_files() {
    let mut builder = NullBuilder;
    let (warnings, errors) = builder.prepare(&[]).await;
    assert!(warnings.is_empty());
    assert!(errors.is_empty());

    let bag = StateBag::new();
    let hooks = HookBus::new();
    let artifact = builder.run(&bag, CancellationToken::new(), &hooks).await.unwrap().unwrap();

    assert_eq!(artifact.builder_id(), "packer.null");
    assert!(artifact.files().is_empty());
}

#[tokio::test]
async fn run_fails_promptly_when_cancelled_before_provision() {
    let builder = NullBuilder;
    let bag = StateBag::new();
    let hooks = HookBus::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = builder.run(&bag, cancel, &hooks).await.unwrap_err();
    assert!(err.0.contains("cancelled"));
}
