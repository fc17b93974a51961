//! End-to-end resolution against local HTTP servers.
//!
//! Builds the orchestrator from configuration exactly as the binary
//! does, with every endpoint pointed at a wiremock server.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use phone_lookup::config::{AppConfig, RetryConfig, SourceSpec};
use phone_lookup::engine::{Orchestrator, Presentation, PresentationState};
use phone_lookup::report::Tone;
use phone_lookup::types::{LookupError, Resolution, SourceRole, Strategy};

const PHONE: &str = "5551234567";

fn config(server: &MockServer, strategy: Strategy) -> AppConfig {
    let base = server.uri();
    let mut cfg = AppConfig::default();
    cfg.lookup.strategy = strategy;
    cfg.retry = RetryConfig {
        max_retries: 2,
        delay_ms: 0,
        ..RetryConfig::default()
    };
    cfg.sources = vec![
        SourceSpec::new("premium", &format!("{base}/premium/person?x="), SourceRole::Premium, 30),
        SourceSpec::new("tcpa", &format!("{base}/tcpa/v1?x="), SourceRole::Compliance, 10),
        SourceSpec::new("person", &format!("{base}/person/v3?x="), SourceRole::Person, 20),
    ];
    cfg
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(query_param("x", PHONE))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_premium_answer_skips_standard_sources() {
    let server = MockServer::start().await;
    mount(&server, "/premium/person", ResponseTemplate::new(200).set_body_json(json!({"state": "CA", "ndnc": "Clean"})), 1).await;
    mount(&server, "/tcpa/v1", ResponseTemplate::new(200).set_body_json(json!({})), 0).await;
    mount(&server, "/person/v3", ResponseTemplate::new(200).set_body_json(json!({})), 0).await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::PremiumFirst)).unwrap();
    let Resolution::Merged(record) = orch.resolve(PHONE).await.unwrap() else {
        panic!("expected merged record");
    };
    assert_eq!(record.to_value(), json!({"state": "CA", "ndnc": "Clean"}));
}

#[tokio::test]
async fn test_fallback_merges_with_person_precedence() {
    let server = MockServer::start().await;
    mount(&server, "/premium/person", ResponseTemplate::new(200).set_body_json(serde_json::Value::Null), 1).await;
    mount(&server, "/tcpa/v1", ResponseTemplate::new(200).set_body_json(json!({"phone": PHONE, "ndnc": "Clean", "type": "Clean"})), 1).await;
    mount(
        &server,
        "/person/v3",
        ResponseTemplate::new(200).set_body_json(json!({
            "ndnc": "Listed",
            "owners": [{"name": "Jane Roe", "age": 41, "address": "1 Main St, Springfield IL"}],
            "relatedPersons": ["John Roe"]
        })),
        1,
    )
    .await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::PremiumFirst)).unwrap();
    let sink = Presentation::new();
    let report = orch.resolve_into(&sink, PHONE).await.unwrap();

    let ndnc = report.row("DNC National").unwrap();
    assert_eq!(ndnc.value, "Listed");
    assert_eq!(ndnc.tone, Some(Tone::Listed));
    assert_eq!(report.row("Litigator").unwrap().tone, Some(Tone::Clean));
    assert_eq!(report.row("DNC State").unwrap().value, "N/A");
    assert_eq!(report.owner.as_ref().unwrap().name, "Jane Roe");
    assert_eq!(report.related_persons, vec!["John Roe"]);
    assert!(matches!(sink.current().state, PresentationState::Ready { .. }));
}

#[tokio::test]
async fn test_every_source_retried_then_all_failed() {
    let server = MockServer::start().await;
    // One attempt plus two retries for each source.
    mount(&server, "/premium/person", ResponseTemplate::new(500), 3).await;
    mount(&server, "/tcpa/v1", ResponseTemplate::new(503), 3).await;
    mount(&server, "/person/v3", ResponseTemplate::new(404), 3).await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::PremiumFirst)).unwrap();
    let sink = Presentation::new();
    let err = orch.resolve_into(&sink, PHONE).await.unwrap_err();
    assert_eq!(err, LookupError::AllSourcesFailed { attempted: 3 });
    assert!(matches!(
        sink.current().state,
        PresentationState::Failed { retryable: true, .. }
    ));
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let server = MockServer::start().await;
    mount(&server, "/premium/person", ResponseTemplate::new(200).set_body_json(json!({"error": "quota"})), 1).await;
    Mock::given(method("GET"))
        .and(path("/tcpa/v1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/tcpa/v1", ResponseTemplate::new(200).set_body_json(json!({"sdnc": "Clean"})), 1).await;
    mount(&server, "/person/v3", ResponseTemplate::new(200).set_body_json(json!({})), 1).await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::PremiumFirst)).unwrap();
    let record = orch.resolve(PHONE).await.unwrap().view();
    assert_eq!(record.sdnc, Some(json!("Clean")));
}

#[tokio::test]
async fn test_all_sources_empty_is_no_data() {
    let server = MockServer::start().await;
    mount(&server, "/premium/person", ResponseTemplate::new(200).set_body_json(json!({})), 1).await;
    mount(&server, "/tcpa/v1", ResponseTemplate::new(200).set_body_json(json!({})), 1).await;
    mount(&server, "/person/v3", ResponseTemplate::new(200).set_body_json(json!({"owners": null})), 1).await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::PremiumFirst)).unwrap();
    assert_eq!(orch.resolve(PHONE).await, Err(LookupError::NoData));
}

#[tokio::test]
async fn test_all_parallel_queries_everything() {
    let server = MockServer::start().await;
    mount(&server, "/premium/person", ResponseTemplate::new(200).set_body_json(json!({"state": "TX"})), 1).await;
    mount(&server, "/tcpa/v1", ResponseTemplate::new(200).set_body_json(json!({"ndnc": "Clean"})), 1).await;
    mount(&server, "/person/v3", ResponseTemplate::new(500), 3).await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::AllParallel)).unwrap();
    let resolution = orch.resolve(PHONE).await.unwrap();
    let Resolution::Partitioned(parts) = &resolution else {
        panic!("expected sections");
    };
    assert!(parts.section("person").unwrap().record.is_none());
    let view = resolution.view();
    assert_eq!(view.ndnc, Some(json!("Clean")));
    assert_eq!(view.state, Some(json!("TX")));
}

#[tokio::test]
async fn test_invalid_input_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let orch = Orchestrator::from_config(&config(&server, Strategy::PremiumFirst)).unwrap();
    for bad in ["", "555", "555123456789", "555-123-4567", "phone-numb"] {
        assert!(matches!(orch.resolve(bad).await, Err(LookupError::InvalidInput(_))));
    }
}
