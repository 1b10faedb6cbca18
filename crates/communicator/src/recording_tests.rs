// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use super::*;

#[tokio::test]
async fn start_records_the_command_and_replays_the_scripted_exit_code() {
    let comm = RecordingCommunicator::new().with_exit_code(17);
    let cancel = CancellationToken::new();

    let mut handle = comm.start(RemoteCommand::new("apt-get update"), &cancel).await.unwrap();
    let code = handle.wait().await.unwrap();

    assert_eq!(code, 17);
    assert_eq!(comm.calls(), vec![RecordedCall::Start("apt-get update".to_string())]);
}

#[tokio::test]
async fn upload_records_the_bytes_written() {
    let comm = RecordingCommunicator::new();
    let cancel = CancellationToken::new();
    let mut reader = std::io::Cursor::new(b"provision script".to_vec());

    comm.upload("/tmp/script.sh", &mut reader, None, &cancel).await.unwrap();

    assert_eq!(
        comm.calls(),
        vec![RecordedCall::Upload {
            remote_path: "/tmp/script.sh".to_string(),
            bytes: b"provision script".to_vec(),
        }]
    );
}

#[tokio::test]
async fn test_dir_reports_the_scripted_result() {
    let comm = RecordingCommunicator::new().with_test_dir_result(true);
    let cancel = CancellationToken::new();

    let exists = comm.test_dir("/opt/app", &cancel).await.unwrap();

    assert!(exists);
    assert_eq!(comm.calls(), vec![RecordedCall::TestDir("/opt/app".to_string())]);
}

#[tokio::test]
async fn calls_accumulate_across_operations_in_order() {
    let comm = RecordingCommunicator::new();
    let cancel = CancellationToken::new();

    comm.start(RemoteCommand::new("one"), &cancel).await.unwrap();
    comm.test_dir("/tmp", &cancel).await.unwrap();

    assert_eq!(
        comm.calls(),
        vec![RecordedCall::Start("one".to_string()), RecordedCall::TestDir("/tmp".to_string())]
    );
}
