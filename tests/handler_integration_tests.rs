//! Integration tests for web service handlers
//!
//! These tests call the handler functions directly with an in-memory store
//! and a scripted text generator, testing the full code path from request to
//! response.

#![cfg(feature = "web-service")]

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use phenomatch::service::config::ServiceConfig;
use phenomatch::service::handlers::{compare, explain, health, sequences};
use phenomatch::service::server::AppState;
use phenomatch::service::store::{CorpusStore, MemoryStore};
use phenomatch::service::textgen::{
    DisabledTextGenerator, TextGenerator, FALLBACK_CHAT_RESPONSE, FALLBACK_EXPLANATION,
};
use phenomatch::service::types::health_check::HealthCheckResult;
use phenomatch::service::types::*;
use phenomatch::{ComparisonResult, Criteria, NewRecord, Phenotype, SequenceRecord};
use std::sync::Arc;

// ==================== Fixtures ====================

/// Generator that answers every prompt with the same text
struct EchoGenerator(&'static str);

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ServiceError> {
        Ok(self.0.to_string())
    }

    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::Healthy
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

/// Enabled generator whose upstream is down
struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::TextGenerationFailed("upstream 500".to_string()))
    }

    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::Unhealthy {
            reason: "upstream 500".to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn record(gene: &str, sequence: &str, criteria: Criteria, id: &str) -> SequenceRecord {
    NewRecord::classify(gene, sequence, criteria)
        .unwrap()
        .into_record(id.to_string(), Utc::now())
}

/// FSHR/ATGC as typeA and FSHR/ATGG as typeB
fn fshr_corpus() -> Vec<SequenceRecord> {
    vec![
        record("FSHR", "ATGC", Criteria::new(true, true, true), "rec-a"),
        record("FSHR", "ATGG", Criteria::new(false, true, true), "rec-b"),
    ]
}

fn create_test_state(
    records: Vec<SequenceRecord>,
    generator: Arc<dyn TextGenerator>,
) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_records(records));
    let state = AppState::new(ServiceConfig::default(), store.clone(), generator);
    (state, store)
}

fn default_state() -> (AppState, Arc<MemoryStore>) {
    create_test_state(fshr_corpus(), Arc::new(DisabledTextGenerator))
}

fn submission(gene: &str, sequence: &str, c: &str, i: &str, h: &str) -> AddSequenceRequest {
    AddSequenceRequest {
        gene_name: Some(gene.to_string()),
        sequence: Some(sequence.to_string()),
        cysts: Some(c.to_string()),
        irregular_cycle: Some(i.to_string()),
        hyperandrogenism: Some(h.to_string()),
    }
}

fn pair(gene: &str, sequence: &str) -> GeneComparisonInput {
    GeneComparisonInput {
        gene_name: Some(gene.to_string()),
        new_sequence: Some(sequence.to_string()),
    }
}

fn compare_request(entries: Vec<GeneComparisonInput>) -> CompareRequest {
    CompareRequest {
        gene_comparisons: entries,
    }
}

// ==================== Add Sequence Handler Tests ====================

#[tokio::test]
async fn test_add_sequence_stores_classified_record() {
    let (state, store) = create_test_state(Vec::new(), Arc::new(DisabledTextGenerator));

    let request = submission("FSHR", "at gc", "N", "Y", "Y");
    let (status, Json(response)) =
        sequences::add_sequence(State(state), Ok(Json(request)))
            .await
            .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.message, "Sequence added successfully");
    assert_eq!(response.phenotype, Phenotype::TypeB);
    assert_eq!(response.id.len(), 20);

    let stored = store.fetch_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, response.id);
    assert_eq!(stored[0].sequence, "ATGC");
    assert_eq!(stored[0].criteria, Criteria::new(false, true, true));
}

#[tokio::test]
async fn test_add_sequence_unclassifiable_writes_nothing() {
    let (state, store) = default_state();

    let request = submission("FSHR", "ATGC", "N", "N", "N");
    let (status, Json(error)) = sequences::add_sequence(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, "invalid_criteria");
    assert!(error.message.contains("Invalid phenotype combination"));
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_add_sequence_rejects_lowercase_token() {
    let (state, store) = default_state();

    let request = submission("FSHR", "ATGC", "y", "Y", "Y");
    let (status, Json(error)) = sequences::add_sequence(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, "invalid_criteria");
    assert!(error.message.contains("cysts"));
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_add_sequence_rejects_invalid_base() {
    let (state, _) = default_state();

    let request = submission("FSHR", "ATGX", "Y", "Y", "Y");
    let (status, Json(error)) = sequences::add_sequence(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, "invalid_sequence");
}

#[tokio::test]
async fn test_add_sequence_missing_field() {
    let (state, _) = default_state();

    let mut request = submission("FSHR", "ATGC", "Y", "Y", "Y");
    request.hyperandrogenism = None;
    let (status, Json(error)) = sequences::add_sequence(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error.message.contains("hyperandrogenism"));
}

#[tokio::test]
async fn test_add_sequence_malformed_body() {
    let (state, _) = default_state();

    let payload = Json::<AddSequenceRequest>::from_bytes(b"{not json");
    assert!(payload.is_err());
    let (status, Json(error)) = sequences::add_sequence(State(state), payload)
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, "bad_request");
}

#[tokio::test]
async fn test_list_sequences_returns_corpus() {
    let (state, _) = default_state();

    let Json(response) = sequences::list_sequences(State(state)).await.unwrap();
    assert_eq!(response.count, 2);
    let mut ids: Vec<_> = response.records.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["rec-a", "rec-b"]);
}

// ==================== Compare Handler Tests ====================

#[tokio::test]
async fn test_compare_fshr_exact_match() {
    let (state, _) = default_state();

    let request = compare_request(vec![pair("FSHR", "ATGC")]);
    let Json(result) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(
        result,
        ComparisonResult {
            type_a: 100.0,
            type_b: 0.0,
            type_c: 0.0,
            type_d: 0.0,
        }
    );
}

#[tokio::test]
async fn test_compare_unknown_gene_is_all_zero() {
    let (state, _) = default_state();

    let request = compare_request(vec![pair("LHCGR", "ATGC")]);
    let Json(result) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert!(result.is_zero());
}

#[tokio::test]
async fn test_compare_sees_new_submission() {
    let (state, _) = default_state();

    let request = submission("FSHR", "ATGG", "Y", "N", "Y");
    sequences::add_sequence(State(state.clone()), Ok(Json(request)))
        .await
        .unwrap();

    let request = compare_request(vec![pair("FSHR", "ATGG")]);
    let Json(result) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(result.type_a, 0.0);
    assert_eq!(result.type_b, 100.0);
    assert_eq!(result.type_c, 100.0);
    assert_eq!(result.type_d, 0.0);
}

#[tokio::test]
async fn test_compare_percentages_need_not_sum_to_100() {
    let corpus = vec![
        record("FSHR", "ATGC", Criteria::new(true, true, true), "a1"),
        record("FSHR", "ATGC", Criteria::new(false, true, true), "b1"),
        record("FSHR", "TTTT", Criteria::new(true, false, true), "c1"),
    ];
    let (state, _) = create_test_state(corpus, Arc::new(DisabledTextGenerator));

    let request = compare_request(vec![pair("FSHR", "ATGC")]);
    let Json(result) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap();

    let sum = result.type_a + result.type_b + result.type_c + result.type_d;
    assert_eq!(sum, 200.0);
}

#[tokio::test]
async fn test_compare_empty_batch_rejected() {
    let (state, _) = default_state();

    let request = compare_request(Vec::new());
    let (status, Json(error)) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, "bad_request");
}

#[tokio::test]
async fn test_compare_skips_incomplete_entries() {
    let (state, _) = default_state();

    let request = compare_request(vec![
        GeneComparisonInput {
            gene_name: Some("FSHR".to_string()),
            new_sequence: None,
        },
        pair("FSHR", "ATGC"),
    ]);
    let Json(result) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(result.type_a, 100.0);
}

#[tokio::test]
async fn test_compare_all_entries_incomplete_rejected() {
    let (state, _) = default_state();

    let request = compare_request(vec![
        GeneComparisonInput::default(),
        GeneComparisonInput {
            gene_name: Some(String::new()),
            new_sequence: Some("ATGC".to_string()),
        },
    ]);
    let (status, _) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compare_batch_not_an_array() {
    let (state, _) = default_state();

    let payload = Json::<CompareRequest>::from_bytes(br#"{"geneComparisons": "FSHR"}"#);
    let (status, Json(error)) = compare::compare_sequences(State(state), payload)
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, "bad_request");
}

#[tokio::test]
async fn test_compare_batch_too_large() {
    let mut config = ServiceConfig::default();
    config.server.max_batch_size = Some(2);
    let state = AppState::new(
        config,
        Arc::new(MemoryStore::with_records(fshr_corpus())),
        Arc::new(DisabledTextGenerator),
    );

    let request = compare_request(vec![pair("FSHR", "A"), pair("FSHR", "C"), pair("FSHR", "G")]);
    let (status, Json(error)) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error.message.contains('2'));
}

#[tokio::test]
async fn test_compare_legacy_same_schema() {
    let (state, _) = default_state();

    let request = LegacyCompareRequest {
        gene_name: Some("FSHR".to_string()),
        sequence: Some("atgg".to_string()),
    };
    let Json(result) = compare::compare_sequences_legacy(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(result.type_a, 0.0);
    assert_eq!(result.type_b, 100.0);
}

#[tokio::test]
async fn test_compare_whitespace_sequence_is_compared() {
    let (state, _) = create_test_state(
        vec![record("FSHR", "ATGC", Criteria::new(true, true, true), "rec-a")],
        Arc::new(DisabledTextGenerator),
    );

    let request = compare_request(vec![pair("FSHR", "ATGC"), pair("FSHR", "   ")]);
    let Json(result) = compare::compare_sequences(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(result.type_a, 50.0);
}

#[tokio::test]
async fn test_compare_legacy_rounds_to_two_decimals() {
    let typed_a = Criteria::new(true, true, true);
    let (state, _) = create_test_state(
        vec![
            record("FSHR", "ATGC", typed_a, "rec-a"),
            record("FSHR", "ATGA", typed_a, "rec-b"),
            record("FSHR", "ATGT", typed_a, "rec-c"),
        ],
        Arc::new(DisabledTextGenerator),
    );

    let request = LegacyCompareRequest {
        gene_name: Some("FSHR".to_string()),
        sequence: Some("ATGC".to_string()),
    };
    let Json(result) = compare::compare_sequences_legacy(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(result.type_a, 33.33);
    assert_eq!(result.type_b, 0.0);
}

#[tokio::test]
async fn test_compare_legacy_gene_name_is_not_trimmed() {
    let (state, _) = default_state();

    let request = LegacyCompareRequest {
        gene_name: Some(" FSHR ".to_string()),
        sequence: Some("ATGG".to_string()),
    };
    let Json(result) = compare::compare_sequences_legacy(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert!(result.is_zero());
}

#[tokio::test]
async fn test_compare_legacy_missing_sequence() {
    let (state, _) = default_state();

    let request = LegacyCompareRequest {
        gene_name: Some("FSHR".to_string()),
        sequence: None,
    };
    let (status, Json(error)) =
        compare::compare_sequences_legacy(State(state), Ok(Json(request)))
            .await
            .unwrap_err();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error.message.contains("sequence"));
}

// ==================== Explain and Chat Handler Tests ====================

#[tokio::test]
async fn test_explain_uses_top_percentage() {
    let (state, _) = create_test_state(fshr_corpus(), Arc::new(EchoGenerator("**Likely** match")));

    let request = ExplainRequest {
        result: Some(ComparisonResult {
            type_a: 25.0,
            type_b: 75.0,
            type_c: 0.0,
            type_d: 0.0,
        }),
        similarity: None,
        sequences: vec!["ATGC".to_string()],
    };
    let Json(response) = explain::explain(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert_eq!(response.similarity, 0.75);
    assert_eq!(response.phenotype, Some(Phenotype::TypeB));
    assert!(response.generated);
    assert!(response.explanation.contains("<strong>Likely</strong>"));
}

#[tokio::test]
async fn test_explain_falls_back_when_generator_fails() {
    let (state, _) = create_test_state(fshr_corpus(), Arc::new(FailingGenerator));

    let request = ExplainRequest {
        result: None,
        similarity: Some(0.5),
        sequences: Vec::new(),
    };
    let Json(response) = explain::explain(State(state), Ok(Json(request)))
        .await
        .unwrap();

    assert!(!response.generated);
    assert_eq!(response.explanation, FALLBACK_EXPLANATION);
    assert!(response.recommendations.starts_with("<ol>"));
    assert_eq!(response.phenotype, None);
}

#[tokio::test]
async fn test_explain_requires_result_or_similarity() {
    let (state, _) = default_state();

    let (status, _) = explain::explain(State(state), Ok(Json(ExplainRequest::default())))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_explain_rejects_out_of_range_similarity() {
    let (state, _) = default_state();

    let request = ExplainRequest {
        result: None,
        similarity: Some(1.5),
        sequences: Vec::new(),
    };
    let (status, _) = explain::explain(State(state), Ok(Json(request)))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_generated() {
    let (state, _) = create_test_state(Vec::new(), Arc::new(EchoGenerator("Hello")));

    let request = ChatRequest {
        message: Some("What is typeA?".to_string()),
    };
    let Json(response) = explain::chat(State(state), Ok(Json(request))).await.unwrap();

    assert!(response.generated);
    assert_eq!(response.response, "Hello");
}

#[tokio::test]
async fn test_chat_fallback_when_disabled() {
    let (state, _) = default_state();

    let request = ChatRequest {
        message: Some("Hi".to_string()),
    };
    let Json(response) = explain::chat(State(state), Ok(Json(request))).await.unwrap();

    assert!(!response.generated);
    assert_eq!(response.response, FALLBACK_CHAT_RESPONSE);
}

#[tokio::test]
async fn test_chat_requires_message() {
    let (state, _) = default_state();

    let (status, Json(error)) = explain::chat(State(state), Ok(Json(ChatRequest::default())))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error.message.contains("message"));
}

// ==================== Health Handler Tests ====================

#[tokio::test]
async fn test_health_starting_before_first_check() {
    let (state, _) = default_state();

    let Json(response) = health::health_check(State(state)).await.unwrap();
    assert_eq!(response.status, "starting");
    assert!(response.store.is_none());
}

#[tokio::test]
async fn test_health_reports_corpus_size() {
    let (state, _) = default_state();

    let response = health::run_health_check(&state).await;
    assert_eq!(response.status, "healthy");
    assert_eq!(response.corpus_size, Some(2));
    assert_eq!(response.store.unwrap().name, "memory");
    assert_eq!(response.text_generation.unwrap().status, "disabled");
    assert!(response.last_check.is_some());
}

#[tokio::test]
async fn test_health_degraded_when_generator_down() {
    let (state, _) = create_test_state(fshr_corpus(), Arc::new(FailingGenerator));

    let response = health::run_health_check(&state).await;
    assert_eq!(response.status, "degraded");
    let text = response.text_generation.unwrap();
    assert!(!text.available);
    assert_eq!(text.message.as_deref(), Some("upstream 500"));
}
