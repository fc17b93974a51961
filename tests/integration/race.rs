//! Overlapping lookups against one presentation target.
//!
//! A slow lookup for one number must never overwrite the output of a
//! lookup for another number that started after it.

use serde_json::json;
use std::time::Duration;

use phone_lookup::engine::{Orchestrator, Presentation, PresentationState, Snapshot};
use phone_lookup::retry::RetryPolicy;
use phone_lookup::types::{SourceRole, Strategy};

use crate::mock_source::ScriptedSource;

const SLOW: &str = "5551111111";
const FAST: &str = "5552222222";

fn orchestrator(premium: &ScriptedSource) -> Orchestrator {
    Orchestrator::new(
        Strategy::PremiumFirst,
        RetryPolicy::none(),
        vec![
            premium.handle("premium", SourceRole::Premium, 30),
            ScriptedSource::default().handle("tcpa", SourceRole::Compliance, 10),
            ScriptedSource::default().handle("person", SourceRole::Person, 20),
        ],
    )
}

fn premium() -> ScriptedSource {
    ScriptedSource::default()
        .with_answer(SLOW, Duration::from_millis(500), json!({"phone": SLOW, "state": "CA"}))
        .with_answer(FAST, Duration::from_millis(50), json!({"phone": FAST, "state": "NY"}))
}

fn shown_state(snapshot: &Snapshot) -> Option<String> {
    match &snapshot.state {
        PresentationState::Ready { report } => report.row("State").map(|r| r.value.clone()),
        _ => None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_first_lookup_cannot_overwrite_newer() {
    let premium = premium();
    let orch = orchestrator(&premium);
    let sink = Presentation::new();
    let mut rx = sink.subscribe();

    let first = orch.resolve_into(&sink, SLOW);
    let second = async {
        // Let the first lookup take its ticket before the second starts.
        tokio::time::sleep(Duration::from_millis(10)).await;
        orch.resolve_into(&sink, FAST).await
    };

    // Record every state the presentation area goes through.
    let watcher = async {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let done = matches!(snapshot.state, PresentationState::Ready { .. })
                && shown_state(&snapshot).as_deref() == Some("NY");
            seen.push(snapshot);
            if done {
                break;
            }
        }
        seen
    };

    let (slow, fast, seen) = tokio::join!(first, second, watcher);

    // Both lookups succeed for their callers...
    assert_eq!(slow.unwrap().row("State").unwrap().value, "CA");
    assert_eq!(fast.unwrap().row("State").unwrap().value, "NY");

    // ...but only the newer one reaches the presentation area.
    let current = sink.current();
    assert_eq!(current.generation, 2);
    assert_eq!(shown_state(&current).as_deref(), Some("NY"));
    assert!(seen.iter().all(|s| shown_state(s).as_deref() != Some("CA")));
    assert_eq!(premium.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_lookups_both_apply() {
    let premium = premium();
    let orch = orchestrator(&premium);
    let sink = Presentation::new();

    orch.resolve_into(&sink, SLOW).await.unwrap();
    assert_eq!(shown_state(&sink.current()).as_deref(), Some("CA"));

    orch.resolve_into(&sink, FAST).await.unwrap();
    assert_eq!(shown_state(&sink.current()).as_deref(), Some("NY"));
    assert_eq!(sink.current().generation, 2);
}

#[tokio::test(start_paused = true)]
async fn test_newer_invalid_input_supersedes_slow_lookup() {
    let premium = premium();
    let orch = orchestrator(&premium);
    let sink = Presentation::new();

    let first = orch.resolve_into(&sink, SLOW);
    let second = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        orch.resolve_into(&sink, "123").await
    };
    let (slow, invalid) = tokio::join!(first, second);

    assert!(slow.is_ok());
    assert!(invalid.is_err());
    assert!(matches!(
        sink.current().state,
        PresentationState::Failed { retryable: false, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_fallback_merge_ignores_completion_order() {
    let tcpa = ScriptedSource::default().with_answer(
        SLOW,
        Duration::from_millis(500),
        json!({"ndnc": "Clean", "sdnc": "Clean"}),
    );
    let person = ScriptedSource::default().with_answer(
        SLOW,
        Duration::from_millis(10),
        json!({"ndnc": "Listed", "state": "CA"}),
    );
    let orch = Orchestrator::new(
        Strategy::PremiumFirst,
        RetryPolicy::none(),
        vec![
            ScriptedSource::default().handle("premium", SourceRole::Premium, 30),
            tcpa.handle("tcpa", SourceRole::Compliance, 10),
            person.handle("person", SourceRole::Person, 20),
        ],
    );

    let started = tokio::time::Instant::now();
    let record = orch.resolve(SLOW).await.unwrap().view();
    let elapsed = started.elapsed();

    // person answered first but still outranks tcpa.
    assert_eq!(record.ndnc, Some(json!("Listed")));
    assert_eq!(record.sdnc, Some(json!("Clean")));
    assert_eq!(record.state, Some(json!("CA")));

    // Both standard sources were in flight at once.
    assert!(elapsed >= Duration::from_millis(500), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(510), "elapsed {elapsed:?}");
    assert_eq!((tcpa.call_count(), person.call_count()), (1, 1));
}
