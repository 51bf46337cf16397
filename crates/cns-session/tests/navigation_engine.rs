//! Integration tests for the navigation engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use cns_core::error::{LoadError, NavigationError};
use cns_core::event::DomainEvent;
use cns_session::application::command_handlers::{NavigationEngine, NavigationOutcome};
use cns_session::application::query_handlers::get_structure;
use cns_session::application::registry::SessionRegistry;
use cns_session::domain::commands::{NavigationCommand, NavigationKind};
use cns_structure::domain::node::NodeRef;
use cns_structure::domain::policy::SkipVisited;
use cns_structure::domain::structure::SequenceBoundary;
use cns_test_support::{
    FailingStructureLoader, FixedClock, RecordingContentSeenPublisher, RecordingDeliveryPort,
    SlowStructureLoader, StaticStructureLoader,
};
use tokio::task::JoinHandle;

const SESSION: &str = "s-1";
const PROCESS: &str = "proc/42";
const TOKEN: &str = "tok-123";

struct Harness {
    engine: NavigationEngine,
    loader: Arc<StaticStructureLoader>,
    publisher: Arc<RecordingContentSeenPublisher>,
    delivery: Arc<RecordingDeliveryPort>,
}

impl Harness {
    fn new() -> Self {
        Self::delivering_to(RecordingDeliveryPort::new())
    }

    fn delivering_to(delivery: RecordingDeliveryPort) -> Self {
        let loader = Arc::new(
            StaticStructureLoader::new()
                .with_process(PROCESS, &["A", "B", "C"])
                .with_process("proc/7", &["X", "Y"])
                .with_process("proc/empty", &[]),
        );
        let publisher = Arc::new(RecordingContentSeenPublisher::new());
        let delivery = Arc::new(delivery);
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let engine = NavigationEngine::new(
            Arc::new(SessionRegistry::new()),
            loader.clone(),
            publisher.clone(),
            delivery.clone(),
            clock,
        );
        Self {
            engine,
            loader,
            publisher,
            delivery,
        }
    }

    async fn send(&self, kind: NavigationKind) -> Result<NavigationOutcome, NavigationError> {
        self.send_for(kind, SESSION, PROCESS).await
    }

    async fn send_for(
        &self,
        kind: NavigationKind,
        session_id: &str,
        process_id: &str,
    ) -> Result<NavigationOutcome, NavigationError> {
        let command = NavigationCommand::new(kind, session_id, process_id, TOKEN);
        self.engine.handle(&command).await
    }

    fn spawn(
        self: &Arc<Self>,
        kind: NavigationKind,
    ) -> JoinHandle<Result<NavigationOutcome, NavigationError>> {
        let harness = Arc::clone(self);
        tokio::spawn(async move { harness.send(kind).await })
    }

    async fn visited(&self) -> Vec<bool> {
        get_structure(self.engine.registry(), SESSION, PROCESS)
            .await
            .unwrap()
            .nodes()
            .iter()
            .map(|node| node.visited())
            .collect()
    }
}

fn delivered_id(outcome: NavigationOutcome) -> String {
    match outcome {
        NavigationOutcome::Delivered(node) => node.content_id,
        other @ NavigationOutcome::Finished { .. } => panic!("expected delivery, got {other:?}"),
    }
}

#[tokio::test]
async fn test_walkthrough_start_forward_backward_first_finish() {
    // Arrange
    let harness = Harness::new();

    // Act & Assert: start delivers A, nothing visited.
    let outcome = harness.send(NavigationKind::Start).await.unwrap();
    assert_eq!(delivered_id(outcome), "A");
    assert_eq!(harness.visited().await, vec![false, false, false]);

    // forward marks A visited and delivers B.
    let outcome = harness.send(NavigationKind::Forward).await.unwrap();
    assert_eq!(delivered_id(outcome), "B");
    assert_eq!(harness.visited().await, vec![true, false, false]);

    // forward marks B visited and delivers C.
    let outcome = harness.send(NavigationKind::Forward).await.unwrap();
    assert_eq!(delivered_id(outcome), "C");
    assert_eq!(harness.visited().await, vec![true, true, false]);

    // backward delivers B, B stays visited.
    let outcome = harness.send(NavigationKind::Backward).await.unwrap();
    assert_eq!(delivered_id(outcome), "B");
    assert_eq!(harness.visited().await, vec![true, true, false]);

    // first delivers A, flags untouched.
    let outcome = harness.send(NavigationKind::First).await.unwrap();
    assert_eq!(delivered_id(outcome), "A");
    assert_eq!(harness.visited().await, vec![true, true, false]);

    // finish removes the entry and delivers nothing.
    let outcome = harness.send(NavigationKind::Finish).await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Finished { removed: true });
    assert!(harness.engine.registry().get(SESSION, PROCESS).is_none());

    let result = harness.send(NavigationKind::Forward).await;
    assert!(matches!(result, Err(NavigationError::NoActiveSession { .. })));

    assert_eq!(
        harness.delivery.delivered_content_ids(),
        vec!["A", "B", "C", "B", "A"]
    );
}

#[tokio::test]
async fn test_every_delivery_publishes_content_seen_with_token() {
    // Arrange
    let harness = Harness::new();

    // Act
    harness.send(NavigationKind::Start).await.unwrap();
    harness.send(NavigationKind::Forward).await.unwrap();

    // Assert
    let published = harness.publisher.published();
    assert_eq!(published.len(), 2);
    let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
    for (event, content_id) in published.iter().zip(["A", "B"]) {
        assert_eq!(event.event_type(), "navigation.content_seen");
        assert_eq!(event.payload.content_id, content_id);
        assert_eq!(event.payload.session_id, SESSION);
        assert_eq!(event.payload.token, TOKEN);
        assert_eq!(event.metadata().occurred_at, fixed_now);
    }

    let delivered = harness.delivery.delivered();
    assert_eq!(delivered[1].session_id, SESSION);
    assert_eq!(delivered[1].service_id, "cns");
    assert_eq!(delivered[1].learning_object.title, "Title B");
}

#[tokio::test]
async fn test_delivered_node_reports_event_id_and_position() {
    // Arrange
    let harness = Harness::new();
    harness.send(NavigationKind::Start).await.unwrap();

    // Act
    let outcome = harness.send(NavigationKind::Forward).await.unwrap();

    // Assert
    let NavigationOutcome::Delivered(node) = outcome else {
        panic!("expected delivery");
    };
    assert_eq!(node.position, NodeRef(1));
    assert_eq!(node.title, "Title B");
    assert_eq!(node.boundary, None);
    assert_eq!(node.event_id, harness.publisher.published()[1].metadata.event_id);
}

#[tokio::test]
async fn test_forward_at_end_signals_end_of_sequence_and_still_delivers() {
    // Arrange
    let harness = Harness::new();
    harness.send(NavigationKind::Start).await.unwrap();
    harness.send(NavigationKind::Forward).await.unwrap();
    harness.send(NavigationKind::Forward).await.unwrap();

    // Act
    let outcome = harness.send(NavigationKind::Forward).await.unwrap();

    // Assert
    let NavigationOutcome::Delivered(node) = outcome else {
        panic!("expected delivery");
    };
    assert_eq!(node.content_id, "C");
    assert_eq!(node.boundary, Some(SequenceBoundary::EndOfSequence));
    assert_eq!(harness.visited().await, vec![true, true, true]);
    assert_eq!(harness.delivery.delivered().len(), 4);
}

#[tokio::test]
async fn test_backward_at_start_signals_start_of_sequence() {
    // Arrange
    let harness = Harness::new();
    harness.send(NavigationKind::Start).await.unwrap();

    // Act
    let outcome = harness.send(NavigationKind::Backward).await.unwrap();

    // Assert
    let NavigationOutcome::Delivered(node) = outcome else {
        panic!("expected delivery");
    };
    assert_eq!(node.content_id, "A");
    assert_eq!(node.boundary, Some(SequenceBoundary::StartOfSequence));
}

#[tokio::test]
async fn test_navigation_without_start_fails_and_delivers_nothing() {
    // Arrange
    let harness = Harness::new();

    // Act & Assert
    for kind in [
        NavigationKind::Forward,
        NavigationKind::Backward,
        NavigationKind::First,
    ] {
        match harness.send(kind).await.unwrap_err() {
            NavigationError::NoActiveSession {
                session_id,
                process_id,
            } => {
                assert_eq!(session_id, SESSION);
                assert_eq!(process_id, PROCESS);
            }
            other => panic!("expected NoActiveSession, got {other:?}"),
        }
    }
    assert!(harness.delivery.delivered().is_empty());
    assert!(harness.publisher.published().is_empty());
}

#[tokio::test]
async fn test_second_start_replaces_structure_and_discards_history() {
    // Arrange
    let harness = Harness::new();
    harness.send(NavigationKind::Start).await.unwrap();
    harness.send(NavigationKind::Forward).await.unwrap();
    let original = harness.engine.registry().get(SESSION, PROCESS).unwrap();

    // Act
    let outcome = harness.send(NavigationKind::Start).await.unwrap();

    // Assert
    assert_eq!(delivered_id(outcome), "A");
    let replaced = harness.engine.registry().get(SESSION, PROCESS).unwrap();
    assert!(Arc::ptr_eq(&original, &replaced));
    assert_eq!(harness.visited().await, vec![false, false, false]);
    assert_eq!(harness.engine.registry().len(), 1);
    assert_eq!(harness.loader.load_count(), 2);
}

#[tokio::test]
async fn test_start_with_empty_structure_fails_without_registering() {
    // Arrange
    let harness = Harness::new();

    // Act
    let result = harness
        .send_for(NavigationKind::Start, SESSION, "proc/empty")
        .await;

    // Assert
    assert!(matches!(result, Err(NavigationError::EmptyStructure { .. })));
    assert!(harness.engine.registry().is_empty());
    assert!(harness.delivery.delivered().is_empty());
}

#[tokio::test]
async fn test_start_with_unknown_process_surfaces_load_error() {
    // Arrange
    let harness = Harness::new();

    // Act
    let result = harness
        .send_for(NavigationKind::Start, SESSION, "proc/unknown")
        .await;

    // Assert
    assert!(matches!(
        result,
        Err(NavigationError::Load(LoadError::MissingDefinition(_)))
    ));
    assert!(harness.engine.registry().is_empty());
}

#[tokio::test]
async fn test_failed_restart_keeps_existing_structure() {
    // Arrange
    let registry = Arc::new(SessionRegistry::new());
    let delivery = Arc::new(RecordingDeliveryPort::new());
    let working = NavigationEngine::new(
        registry.clone(),
        Arc::new(StaticStructureLoader::new().with_process(PROCESS, &["A", "B"])),
        Arc::new(RecordingContentSeenPublisher::new()),
        delivery.clone(),
        Arc::new(FixedClock(Utc::now())),
    );
    let failing = NavigationEngine::new(
        registry.clone(),
        Arc::new(FailingStructureLoader),
        Arc::new(RecordingContentSeenPublisher::new()),
        delivery.clone(),
        Arc::new(FixedClock(Utc::now())),
    );
    let start = NavigationCommand::new(NavigationKind::Start, SESSION, PROCESS, TOKEN);
    working.handle(&start).await.unwrap();

    // Act
    let result = failing.handle(&start).await;

    // Assert
    assert!(matches!(
        result,
        Err(NavigationError::Load(LoadError::UnsupportedFormat(_)))
    ));
    assert!(registry.get(SESSION, PROCESS).is_some());
    assert_eq!(delivery.delivered().len(), 1);
}

#[tokio::test]
async fn test_finish_only_removes_the_addressed_process() {
    // Arrange
    let harness = Harness::new();
    harness.send(NavigationKind::Start).await.unwrap();
    harness
        .send_for(NavigationKind::Start, SESSION, "proc/7")
        .await
        .unwrap();

    // Act
    let outcome = harness
        .send_for(NavigationKind::Finish, SESSION, "proc/7")
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome, NavigationOutcome::Finished { removed: true });
    assert!(harness.engine.registry().get(SESSION, "proc/7").is_none());
    let outcome = harness.send(NavigationKind::Forward).await.unwrap();
    assert_eq!(delivered_id(outcome), "B");
}

#[tokio::test]
async fn test_finish_without_entry_is_noop() {
    // Arrange
    let harness = Harness::new();

    // Act
    let outcome = harness.send(NavigationKind::Finish).await.unwrap();

    // Assert
    assert_eq!(outcome, NavigationOutcome::Finished { removed: false });
    assert!(harness.delivery.delivered().is_empty());
    assert!(harness.publisher.published().is_empty());
}

#[tokio::test]
async fn test_sessions_navigate_independently() {
    // Arrange
    let harness = Harness::new();
    harness
        .send_for(NavigationKind::Start, "s-1", PROCESS)
        .await
        .unwrap();
    harness
        .send_for(NavigationKind::Start, "s-2", PROCESS)
        .await
        .unwrap();

    // Act
    harness
        .send_for(NavigationKind::Forward, "s-1", PROCESS)
        .await
        .unwrap();
    let outcome = harness
        .send_for(NavigationKind::Forward, "s-2", PROCESS)
        .await
        .unwrap();

    // Assert
    assert_eq!(delivered_id(outcome), "B");
    let other = get_structure(harness.engine.registry(), "s-2", PROCESS)
        .await
        .unwrap();
    assert_eq!(other.current(), Some(NodeRef(1)));
}

#[tokio::test]
async fn test_custom_policy_routes_forward_steps() {
    // Arrange
    let registry = Arc::new(SessionRegistry::new());
    let delivery = Arc::new(RecordingDeliveryPort::new());
    let engine = NavigationEngine::new(
        registry,
        Arc::new(StaticStructureLoader::new().with_process(PROCESS, &["A", "B", "C", "D"])),
        Arc::new(RecordingContentSeenPublisher::new()),
        delivery.clone(),
        Arc::new(FixedClock(Utc::now())),
    )
    .with_policy(Arc::new(SkipVisited));
    let command = |kind| NavigationCommand::new(kind, SESSION, PROCESS, TOKEN);

    // Act
    engine.handle(&command(NavigationKind::Start)).await.unwrap();
    engine.handle(&command(NavigationKind::Forward)).await.unwrap();
    engine.handle(&command(NavigationKind::Forward)).await.unwrap();
    engine.handle(&command(NavigationKind::First)).await.unwrap();
    engine.handle(&command(NavigationKind::Forward)).await.unwrap();

    // Assert
    assert_eq!(
        delivery.delivered_content_ids(),
        vec!["A", "B", "C", "A", "C"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_forward_steps_on_one_key_are_serialized() {
    // Arrange
    let harness = Arc::new(Harness::new());
    harness.send(NavigationKind::Start).await.unwrap();

    // Act
    let mut handles = Vec::new();
    for _ in 0..16 {
        let harness = Arc::clone(&harness);
        handles.push(tokio::spawn(async move {
            harness.send(NavigationKind::Forward).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Assert
    let structure = get_structure(harness.engine.registry(), SESSION, PROCESS)
        .await
        .unwrap();
    assert_eq!(structure.current(), Some(NodeRef(2)));
    assert_eq!(harness.visited().await, vec![true, true, true]);

    let ids = harness.delivery.delivered_content_ids();
    assert_eq!(ids.len(), 17);
    assert_eq!(&ids[..3], &["A", "B", "C"]);
    assert!(ids[3..].iter().all(|id| id == "C"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_restart_waits_for_navigation_already_queued_on_the_key() {
    // Arrange
    let harness = Arc::new(Harness::delivering_to(RecordingDeliveryPort::with_delay(
        Duration::from_millis(100),
    )));
    harness.send(NavigationKind::Start).await.unwrap();

    // Act: one forward delivering, one waiting behind it, then a restart.
    let first = harness.spawn(NavigationKind::Forward);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = harness.spawn(NavigationKind::Forward);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let restart = harness.spawn(NavigationKind::Start);
    let outcomes = [
        first.await.unwrap().unwrap(),
        second.await.unwrap().unwrap(),
        restart.await.unwrap().unwrap(),
    ];

    // Assert
    assert_eq!(outcomes.map(delivered_id), ["B", "C", "A"]);
    let ids = harness.delivery.delivered_content_ids();
    assert_eq!(ids, vec!["A", "B", "C", "A"]);
    let structure = get_structure(harness.engine.registry(), SESSION, PROCESS)
        .await
        .unwrap();
    assert_eq!(structure.current_node().unwrap().id(), ids[3]);
    assert_eq!(harness.visited().await, vec![false, false, false]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_forward_after_restart_moves_the_new_structure() {
    // Arrange
    let harness = Arc::new(Harness::delivering_to(RecordingDeliveryPort::with_delay(
        Duration::from_millis(100),
    )));
    harness.send(NavigationKind::Start).await.unwrap();
    harness.send(NavigationKind::Forward).await.unwrap();
    let handle_before_restart = harness.engine.registry().get(SESSION, PROCESS).unwrap();

    // Act
    let restart = harness.spawn(NavigationKind::Start);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let forward = harness.spawn(NavigationKind::Forward);
    restart.await.unwrap().unwrap();
    let outcome = forward.await.unwrap().unwrap();

    // Assert
    assert_eq!(delivered_id(outcome), "B");
    let guard = handle_before_restart.lock().await;
    assert_eq!(guard.as_ref().unwrap().current(), Some(NodeRef(1)));
    drop(guard);
    assert_eq!(harness.visited().await, vec![true, false, false]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_finish_waits_for_delivery_and_turns_away_queued_navigation() {
    // Arrange
    let harness = Arc::new(Harness::delivering_to(RecordingDeliveryPort::with_delay(
        Duration::from_millis(100),
    )));
    harness.send(NavigationKind::Start).await.unwrap();

    // Act: a forward delivering, a finish behind it, a forward behind that.
    let forward = harness.spawn(NavigationKind::Forward);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let finish = harness.spawn(NavigationKind::Finish);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let late = harness.spawn(NavigationKind::Forward);

    // Assert
    assert_eq!(delivered_id(forward.await.unwrap().unwrap()), "B");
    assert_eq!(
        finish.await.unwrap().unwrap(),
        NavigationOutcome::Finished { removed: true }
    );
    assert!(matches!(
        late.await.unwrap(),
        Err(NavigationError::NoActiveSession { .. })
    ));
    assert!(harness.engine.registry().is_empty());
    assert_eq!(harness.delivery.delivered_content_ids(), vec!["A", "B"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_start_after_finish_is_not_lost_to_the_retired_entry() {
    // Arrange
    let harness = Arc::new(Harness::delivering_to(RecordingDeliveryPort::with_delay(
        Duration::from_millis(100),
    )));
    harness.send(NavigationKind::Start).await.unwrap();

    // Act: a forward delivering, then a finish and a restart queued behind it.
    let forward = harness.spawn(NavigationKind::Forward);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let finish = harness.spawn(NavigationKind::Finish);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let restart = harness.spawn(NavigationKind::Start);
    forward.await.unwrap().unwrap();
    finish.await.unwrap().unwrap();
    let outcome = restart.await.unwrap().unwrap();

    // Assert
    assert_eq!(delivered_id(outcome), "A");
    assert_eq!(harness.engine.registry().len(), 1);
    let structure = get_structure(harness.engine.registry(), SESSION, PROCESS)
        .await
        .unwrap();
    assert_eq!(structure.current(), Some(NodeRef(0)));
}

#[tokio::test]
async fn test_slow_loader_times_out_without_registering() {
    // Arrange
    let delivery = Arc::new(RecordingDeliveryPort::new());
    let engine = NavigationEngine::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(SlowStructureLoader::new(
            Duration::from_secs(30),
            StaticStructureLoader::new().with_process(PROCESS, &["A"]),
        )),
        Arc::new(RecordingContentSeenPublisher::new()),
        delivery.clone(),
        Arc::new(FixedClock(Utc::now())),
    )
    .with_load_timeout(Duration::from_millis(20));
    let start = NavigationCommand::new(NavigationKind::Start, SESSION, PROCESS, TOKEN);

    // Act
    let result = engine.handle(&start).await;

    // Assert
    match result.unwrap_err() {
        NavigationError::LoadTimeout {
            process_id,
            timeout,
        } => {
            assert_eq!(process_id, PROCESS);
            assert_eq!(timeout, Duration::from_millis(20));
        }
        other => panic!("expected LoadTimeout, got {other:?}"),
    }
    assert!(engine.registry().is_empty());
    assert!(delivery.delivered().is_empty());
}

#[tokio::test]
async fn test_load_timeout_does_not_bound_delivery() {
    // Arrange
    let delivery = Arc::new(RecordingDeliveryPort::with_delay(Duration::from_millis(150)));
    let engine = NavigationEngine::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(StaticStructureLoader::new().with_process(PROCESS, &["A", "B"])),
        Arc::new(RecordingContentSeenPublisher::new()),
        delivery.clone(),
        Arc::new(FixedClock(Utc::now())),
    )
    .with_load_timeout(Duration::from_millis(20));
    let start = NavigationCommand::new(NavigationKind::Start, SESSION, PROCESS, TOKEN);

    // Act
    let outcome = engine.handle(&start).await.unwrap();

    // Assert
    assert_eq!(delivered_id(outcome), "A");
    assert_eq!(engine.registry().len(), 1);
    assert_eq!(delivery.delivered_content_ids(), vec!["A"]);
}
