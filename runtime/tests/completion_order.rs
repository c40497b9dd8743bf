//! Integration tests for the order in which effect results reach the store
//!
//! Actions produced by effects are reduced in the order the effects finish,
//! not the order their triggering actions were sent. These tests pin that
//! behavior down along with the request/response helpers built on it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use authstate_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use authstate_runtime::{Store, StoreConfig, StoreError};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start a lookup that resolves after `delay_ms`
    Lookup { id: u64, delay_ms: u64 },
    /// Lookup finished (terminal action)
    Resolved { id: u64 },
    /// Lookup failed (terminal action)
    Failed { id: u64 },
}

#[derive(Debug, Clone, Default)]
struct TestState {
    last_resolved: Option<u64>,
    resolved: Vec<u64>,
}

#[derive(Clone)]
struct TestEnvironment;

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Lookup { id, delay_ms } => {
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    if id == 0 {
                        Some(TestAction::Failed { id })
                    } else {
                        Some(TestAction::Resolved { id })
                    }
                }))]
            },
            TestAction::Resolved { id } => {
                state.last_resolved = Some(id);
                state.resolved.push(id);
                smallvec![Effect::None]
            },
            TestAction::Failed { .. } => smallvec![Effect::None],
        }
    }
}

fn store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::with_config(
        TestState::default(),
        TestReducer,
        TestEnvironment,
        StoreConfig::default().with_broadcast_capacity(32),
    )
}

fn is_terminal_for(id: u64) -> impl Fn(&TestAction) -> bool + Send + Sync + 'static {
    move |action| {
        matches!(
            action,
            TestAction::Resolved { id: got } | TestAction::Failed { id: got } if *got == id
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_last_to_complete_wins() {
    let store = store();

    // Sent first, finishes last
    let slow = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    TestAction::Lookup { id: 1, delay_ms: 80 },
                    is_terminal_for(1),
                    Some(Duration::from_secs(2)),
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(5)).await;

    let fast = store
        .send_and_wait_for(
            TestAction::Lookup { id: 2, delay_ms: 5 },
            is_terminal_for(2),
            Some(Duration::from_secs(2)),
        )
        .await;
    assert_eq!(fast, Ok(TestAction::Resolved { id: 2 }));
    assert_eq!(store.state(|s| s.last_resolved).await, Some(2));

    let slow = slow.await.unwrap();
    assert_eq!(slow, Ok(TestAction::Resolved { id: 1 }));

    let (last, order) = store.state(|s| (s.last_resolved, s.resolved.clone())).await;
    assert_eq!(last, Some(1));
    assert_eq!(order, vec![2, 1]);
}

#[tokio::test]
async fn test_waiters_only_match_their_own_result() {
    let store = store();

    let waiters: Vec<_> = (1..=5)
        .map(|id| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .send_and_wait_for(
                        TestAction::Lookup { id, delay_ms: 30 - id * 5 },
                        is_terminal_for(id),
                        Some(Duration::from_secs(2)),
                    )
                    .await
            })
        })
        .collect();

    for (id, waiter) in (1..=5).zip(futures::future::join_all(waiters).await) {
        assert_eq!(waiter.unwrap(), Ok(TestAction::Resolved { id }));
    }

    assert_eq!(store.state(|s| s.resolved.len()).await, 5);
}

#[tokio::test]
async fn test_failure_is_terminal_without_state_change() {
    let store = store();

    let result = store
        .send_and_wait_for(
            TestAction::Lookup { id: 0, delay_ms: 1 },
            is_terminal_for(0),
            None,
        )
        .await;

    assert_eq!(result, Ok(TestAction::Failed { id: 0 }));
    assert_eq!(store.state(|s| s.last_resolved).await, None);
}

#[tokio::test]
async fn test_send_after_shutdown_fails_fast() {
    let store = store();
    store.shutdown(Duration::from_millis(100)).await.unwrap();

    let result = store
        .send_and_wait_for(
            TestAction::Lookup { id: 3, delay_ms: 1 },
            is_terminal_for(3),
            None,
        )
        .await;

    assert_eq!(result, Err(StoreError::ShutdownInProgress));
}
