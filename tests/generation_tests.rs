use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use flashmind::{
    Card, DifficultyLevel, GenerateConfig, GenerationError, generation::GenerationService,
};

/// In-process stand-in for the completion service: serves one canned
/// response and records every request it receives.
#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: Value,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
}

impl StubState {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            hits: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }
}

async fn completions(
    State(state): State<StubState>,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some(request);
    (state.status, Json(state.body.clone()))
}

async fn spawn_stub(state: StubState) -> String {
    let app = Router::new()
        .route("/chat/completions", post(completions))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn completion_with(content: &str) -> Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

fn service(base_url: String) -> GenerationService {
    GenerationService::new("test-key".to_string(), Some(base_url), None)
}

fn text_config(content: &str, quantity: u32) -> GenerateConfig {
    GenerateConfig {
        content: content.to_string(),
        quantity,
        language: "English".to_string(),
        difficulty: DifficultyLevel::Easy,
    }
}

fn card(front: &str, back: &str) -> Card {
    Card {
        id: Uuid::new_v4(),
        front: front.to_string(),
        back: back.to_string(),
        difficulty: None,
    }
}

#[tokio::test]
async fn test_generate_returns_requested_cards_with_fresh_ids() {
    let cards: Vec<Value> = (0..5)
        .map(|i| json!({"front": format!("Q{}", i), "back": format!("A{}", i)}))
        .collect();
    let content = json!({ "cards": cards }).to_string();
    let stub = StubState::new(StatusCode::OK, completion_with(&content));
    let base = spawn_stub(stub.clone()).await;

    let config = text_config("Mitochondria are the powerhouse of the cell.", 5);
    let result = service(base).generate(&config, &[]).await.unwrap();

    assert_eq!(result.len(), 5);
    let mut ids: Vec<Uuid> = result.iter().map(|c| c.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5, "every card gets a fresh unique id");
    for card in &result {
        assert!(card.front.starts_with('Q'));
        assert_eq!(card.difficulty, Some(DifficultyLevel::Easy));
    }
    assert_eq!(stub.hits.load(Ordering::SeqCst), 1, "exactly one network call");
}

#[tokio::test]
async fn test_generate_unauthorized_fails_with_remote_service_error() {
    let stub = StubState::new(
        StatusCode::UNAUTHORIZED,
        json!({"error": {"message": "Invalid API key"}}),
    );
    let base = spawn_stub(stub).await;

    let result = service(base).generate(&text_config("notes", 5), &[]).await;
    match result.unwrap_err() {
        GenerationError::RemoteService(message) => {
            assert_eq!(message, "Invalid API key");
        }
        other => panic!("expected RemoteService, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_non_json_error_body_falls_back_to_status() {
    let stub = StubState::new(StatusCode::INTERNAL_SERVER_ERROR, json!("boom"));
    let base = spawn_stub(stub).await;

    let result = service(base).generate(&text_config("notes", 5), &[]).await;
    match result.unwrap_err() {
        GenerationError::RemoteService(message) => {
            assert!(message.contains("500"), "fallback mentions the status: {}", message);
        }
        other => panic!("expected RemoteService, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_unparseable_content_is_malformed() {
    let stub = StubState::new(
        StatusCode::OK,
        completion_with("I'm sorry, I can't produce JSON today."),
    );
    let base = spawn_stub(stub).await;

    let result = service(base).generate(&text_config("notes", 5), &[]).await;
    assert!(matches!(
        result.unwrap_err(),
        GenerationError::MalformedResponse(_)
    ));
}

#[tokio::test]
async fn test_generate_missing_cards_array_is_malformed() {
    let stub = StubState::new(
        StatusCode::OK,
        completion_with(r#"{"flashcards": [{"front": "a", "back": "b"}]}"#),
    );
    let base = spawn_stub(stub).await;

    let result = service(base).generate(&text_config("notes", 5), &[]).await;
    assert!(matches!(
        result.unwrap_err(),
        GenerationError::MalformedResponse(_)
    ));
}

#[tokio::test]
async fn test_generate_empty_cards_is_empty_result() {
    let stub = StubState::new(StatusCode::OK, completion_with(r#"{"cards": []}"#));
    let base = spawn_stub(stub).await;

    let result = service(base).generate(&text_config("notes", 5), &[]).await;
    assert!(matches!(result.unwrap_err(), GenerationError::EmptyResult));
}

#[tokio::test]
async fn test_generate_accepts_question_answer_field_names() {
    let content = r#"{"cards": [{"question": "What is ATP?", "answer": "Cell energy currency"}]}"#;
    let stub = StubState::new(StatusCode::OK, completion_with(content));
    let base = spawn_stub(stub).await;

    let result = service(base)
        .generate(&text_config("notes", 1), &[])
        .await
        .unwrap();
    assert_eq!(result[0].front, "What is ATP?");
    assert_eq!(result[0].back, "Cell energy currency");
}

#[tokio::test]
async fn test_generate_text_request_embeds_content_and_quantity() {
    let stub = StubState::new(
        StatusCode::OK,
        completion_with(r#"{"cards": [{"front": "a", "back": "b"}]}"#),
    );
    let base = spawn_stub(stub.clone()).await;

    service(base)
        .generate(&text_config("Photosynthesis basics", 7), &[])
        .await
        .unwrap();

    let request = stub.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request["response_format"]["type"], "json_object");
    assert_eq!(request["messages"][0]["role"], "system");
    assert_eq!(request["messages"][1]["role"], "user");

    let user_content = request["messages"][1]["content"].as_str().unwrap();
    assert!(user_content.contains("Photosynthesis basics"));
    assert!(user_content.contains("exactly 7"));

    let system_content = request["messages"][0]["content"].as_str().unwrap();
    assert!(system_content.contains("English"));
    assert!(system_content.contains("easy"));
}

#[tokio::test]
async fn test_generate_with_images_builds_multipart_message() {
    let stub = StubState::new(
        StatusCode::OK,
        completion_with(r#"{"cards": [{"front": "a", "back": "b"}]}"#),
    );
    let base = spawn_stub(stub.clone()).await;

    let images = vec![vec![0xFF, 0xD8, 0xFF, 0xE0], vec![0xFF, 0xD8, 0xFF, 0xE1]];
    let config = text_config("", 3);
    service(base).generate(&config, &images).await.unwrap();

    let request = stub.last_request.lock().unwrap().clone().unwrap();
    let parts = request["messages"][1]["content"].as_array().unwrap();
    assert_eq!(parts.len(), 3, "one text part plus two image parts");
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[1]["type"], "image_url");
    assert!(
        parts[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,")
    );
    assert_eq!(parts[2]["type"], "image_url");
}

#[tokio::test]
async fn test_generate_more_lists_existing_fronts_in_prompt() {
    let stub = StubState::new(
        StatusCode::OK,
        completion_with(r#"{"cards": [{"front": "new", "back": "card"}]}"#),
    );
    let base = spawn_stub(stub.clone()).await;

    let existing = vec![card("What is DNA?", "Genetic material"), card("What is RNA?", "Messenger")];
    service(base)
        .generate_more(
            Some("Molecular biology notes"),
            &existing,
            "English",
            5,
            DifficultyLevel::Medium,
        )
        .await
        .unwrap();

    let request = stub.last_request.lock().unwrap().clone().unwrap();
    let user_content = request["messages"][1]["content"].as_str().unwrap();
    assert!(user_content.contains("Molecular biology notes"));
    assert!(user_content.contains("- What is DNA?"));
    assert!(user_content.contains("- What is RNA?"));
    assert!(user_content.contains("Do not repeat any existing card front verbatim"));
}

#[tokio::test]
async fn test_generate_more_without_source_rebuilds_reference_from_cards() {
    // Image-only decks have no original content; the prompt falls back to
    // the existing cards' front/back pairs instead of failing.
    let stub = StubState::new(
        StatusCode::OK,
        completion_with(r#"{"cards": [{"front": "new", "back": "card"}]}"#),
    );
    let base = spawn_stub(stub.clone()).await;

    let existing = vec![card("What is DNA?", "Genetic material")];
    service(base)
        .generate_more(None, &existing, "English", 3, DifficultyLevel::Medium)
        .await
        .unwrap();

    let request = stub.last_request.lock().unwrap().clone().unwrap();
    let user_content = request["messages"][1]["content"].as_str().unwrap();
    assert!(user_content.contains("What is DNA?: Genetic material"));
}

#[tokio::test]
async fn test_generate_more_passes_provider_duplicates_through() {
    // De-duplication is a prompt-level instruction only: when the
    // provider returns a verbatim duplicate anyway, the client does not
    // filter it out.
    let stub = StubState::new(
        StatusCode::OK,
        completion_with(r#"{"cards": [{"front": "What is DNA?", "back": "dup"}]}"#),
    );
    let base = spawn_stub(stub).await;

    let existing = vec![card("What is DNA?", "Genetic material")];
    let result = service(base)
        .generate_more(Some("notes"), &existing, "English", 1, DifficultyLevel::Easy)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].front, existing[0].front);
}
