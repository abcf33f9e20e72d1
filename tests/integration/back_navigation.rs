//! Integration tests for hardware back handling

use crate::integration::test_utils::{confirm_all, router, settle, FakeLauncher};
use navrelay::channel::{BackButtonFlag, Operation};
use navrelay::types::ReplyValue;
use navrelay::{BackOutcome, IgnoreReason, RouterError};
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(400);

#[tokio::test(start_paused = true)]
async fn test_shallow_front_stack_delegates_to_host() {
    let launcher = FakeLauncher::auto(confirm_all());
    let (router, host) = router(&launcher);

    let (_, c1) = router.push("main", None).await;
    c1.await.unwrap();
    let (_, c2) = router.push("b", None).await;
    c2.await.unwrap();

    let outcome = router.on_back_pressed().unwrap();
    assert!(matches!(outcome, BackOutcome::DelegatedToHost));
    assert_eq!(host.maybe_pops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deep_front_stack_pops_within_context() {
    let launcher = FakeLauncher::auto(confirm_all());
    let (router, host) = router(&launcher);

    let mut pages = Vec::new();
    for _ in 0..3 {
        let (page, completion) = router.push("b", None).await;
        completion.await.unwrap();
        pages.push(page);
    }
    let b = router.owner_of(pages[0]).unwrap();

    match router.on_back_pressed().unwrap() {
        BackOutcome::Popping {
            page_id,
            completion,
        } => {
            assert_eq!(page_id, pages[2]);
            assert!(completion.await.unwrap());
        }
        other => panic!("expected a pop, got {:?}", other),
    }
    let (_, last) = launcher.log().pop().unwrap();
    assert_eq!(last.operation, Operation::Pop);
    assert_eq!(router.routes_of(b).len(), 2);
    assert_eq!(host.maybe_pops(), 0);

    tokio::time::advance(DEBOUNCE).await;
    assert!(matches!(
        router.on_back_pressed().unwrap(),
        BackOutcome::DelegatedToHost
    ));
}

#[tokio::test(start_paused = true)]
async fn test_presses_within_debounce_window_are_ignored() {
    let launcher = FakeLauncher::auto(confirm_all());
    let (router, host) = router(&launcher);
    let (_, completion) = router.push("main", None).await;
    completion.await.unwrap();

    assert!(matches!(
        router.on_back_pressed().unwrap(),
        BackOutcome::DelegatedToHost
    ));
    tokio::time::advance(Duration::from_millis(100)).await;
    assert!(matches!(
        router.on_back_pressed().unwrap(),
        BackOutcome::Ignored(IgnoreReason::Debounced)
    ));
    tokio::time::advance(DEBOUNCE).await;
    assert!(matches!(
        router.on_back_pressed().unwrap(),
        BackOutcome::DelegatedToHost
    ));
    assert_eq!(host.maybe_pops(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_engine_can_disable_back_handling() {
    let launcher = FakeLauncher::manual();
    let (router, host) = router(&launcher);

    let (_, pushed) = router.push("main", None).await;
    let main = router.get_context("main").await.unwrap();
    let mut engine = launcher.take_engine(main);
    let request = engine.recv().await;
    engine.reply(&request, ReplyValue::Bool(true));
    pushed.await.unwrap();

    engine.back_button(BackButtonFlag::Disable);
    settle(|| router.is_back_disabled()).await;
    assert!(matches!(
        router.on_back_pressed().unwrap(),
        BackOutcome::Ignored(IgnoreReason::Disabled)
    ));
    assert_eq!(host.maybe_pops(), 0);

    engine.back_button(BackButtonFlag::Enable);
    settle(|| !router.is_back_disabled()).await;
    assert!(matches!(
        router.on_back_pressed().unwrap(),
        BackOutcome::DelegatedToHost
    ));
}

#[tokio::test(start_paused = true)]
async fn test_back_press_without_routes_is_an_invariant_violation() {
    let launcher = FakeLauncher::auto(confirm_all());
    let (router, _) = router(&launcher);

    let err = router.on_back_pressed().unwrap_err();
    assert!(matches!(err, RouterError::InvariantViolation(_)));
    assert!(!err.is_recoverable());
}
