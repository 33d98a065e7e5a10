//! Multi-run resumption tests against an on-disk checkpoint.
//!
//! Every run uses a fresh `JsonCheckpointStore` over the same file, the way
//! separate scheduled invocations would.

use research_outreach::persistence::{CheckpointStore, JsonCheckpointStore};

use super::test_helpers::{contacts, run_once, FakeGenerator, FixedSource, RecordingDispatcher};

#[tokio::test]
async fn five_contacts_with_quota_two_take_three_runs() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("data").join("email_status.json");
    let source = FixedSource::new(contacts(&["A", "B", "C", "D", "E"]));

    let expected = [
        (2, vec!["a@uni.example", "b@uni.example"], 2),
        (2, vec!["c@uni.example", "d@uni.example"], 4),
        (1, vec!["e@uni.example"], 5),
        (0, vec![], 5),
    ];

    for (run, (sent, attempted, next_index)) in expected.into_iter().enumerate() {
        let store = JsonCheckpointStore::new(&path);
        let dispatcher = RecordingDispatcher::default();
        let report = run_once(&source, &FakeGenerator::default(), &dispatcher, &store, 2)
            .await
            .expect("run succeeds");

        assert_eq!(report.sent, sent, "run {}", run + 1);
        assert_eq!(dispatcher.attempts(), attempted, "run {}", run + 1);
        assert_eq!(report.next_index, next_index, "run {}", run + 1);
        assert_eq!(store.load().next_index, next_index, "run {}", run + 1);
    }

    let store = JsonCheckpointStore::new(&path);
    assert_eq!(store.load().delivered.len(), 5);
}

#[tokio::test]
async fn index_advances_by_quota_regardless_of_failures() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("status.json");
    let source = FixedSource::new(contacts(&["A", "B", "C", "D", "E", "F", "G"]));
    let generator = FakeGenerator::failing_for(&["a@uni.example", "d@uni.example"]);
    let dispatcher = RecordingDispatcher::failing_for(&["e@uni.example"]);
    let quota = 3;

    for run in 1..=4 {
        let store = JsonCheckpointStore::new(&path);
        run_once(&source, &generator, &dispatcher, &store, quota)
            .await
            .expect("run succeeds");
        assert_eq!(store.load().next_index, (run * quota).min(7));
    }

    let delivered = JsonCheckpointStore::new(&path).load().delivered;
    let delivered: Vec<&str> = delivered.iter().map(String::as_str).collect();
    assert_eq!(
        delivered,
        vec!["b@uni.example", "c@uni.example", "f@uni.example", "g@uni.example"]
    );
}

#[tokio::test]
async fn hand_edited_checkpoint_forces_retry() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("status.json");
    let source = FixedSource::new(contacts(&["A", "B"]));

    let store = JsonCheckpointStore::new(&path);
    run_once(
        &source,
        &FakeGenerator::default(),
        &RecordingDispatcher::failing_for(&["b@uni.example"]),
        &store,
        2,
    )
    .await
    .expect("first run");

    // Operator rewinds the index; delivered addresses stay protected.
    let raw = std::fs::read_to_string(&path).expect("read checkpoint");
    let mut json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    json["next_index"] = serde_json::json!(0);
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).expect("write");

    let dispatcher = RecordingDispatcher::default();
    let report = run_once(&source, &FakeGenerator::default(), &dispatcher, &store, 2)
        .await
        .expect("second run");

    assert_eq!(report.skipped, 1);
    assert_eq!(dispatcher.attempts(), vec!["b@uni.example"]);
    assert!(store.load().is_delivered("b@uni.example"));
}
