use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    capture::InputCollector,
    deck_service::DeckService,
    errors::{ApiError, ErrorContext},
    extraction::extract_document_text,
    generation::GenerationService,
    i18n::Language,
    models::{AppView, Card, Deck, DifficultyLevel, GenerateConfig},
    study::{StudySession, ViewMode},
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn};

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

#[derive(Clone)]
pub struct AppState {
    pub generation: GenerationService,
    pub decks: DeckService,
    pub sessions: Arc<Mutex<HashMap<Uuid, StudySession>>>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Deserialize)]
pub struct GenerateDeckRequest {
    #[serde(default)]
    pub content: String,
    /// Base64-encoded JPEG images, zero or more.
    #[serde(default)]
    pub images: Vec<String>,
    /// Base64-encoded PDF documents, zero or more.
    #[serde(default)]
    pub documents: Vec<String>,
    pub quantity: u32,
    pub language: String,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
}

#[derive(Deserialize)]
pub struct GenerateMoreRequest {
    #[serde(default = "default_more_quantity")]
    pub quantity: u32,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_more_quantity() -> u32 {
    5
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Deserialize)]
pub struct SetViewRequest {
    pub view: AppView,
}

#[derive(Deserialize)]
pub struct SetLanguageRequest {
    pub language: Language,
}

#[derive(Deserialize)]
pub struct JumpRequest {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct SetViewModeRequest {
    pub mode: ViewMode,
}

#[derive(Deserialize)]
pub struct ExtractRequest {
    /// Base64-encoded document bytes.
    pub data: String,
}

#[derive(Serialize)]
pub struct AppStateView {
    pub view: AppView,
    pub active_deck: Option<Uuid>,
    pub language: Language,
}

#[derive(Serialize)]
pub struct ExtractedText {
    pub text: String,
}

#[derive(Serialize)]
pub struct MoreCardsResult {
    pub session: StudySession,
    pub appended: Vec<Card>,
}

// State endpoints

pub async fn get_state(State(state): State<AppState>) -> Json<ApiResponse<AppStateView>> {
    Json(ApiResponse::success(AppStateView {
        view: state.decks.view(),
        active_deck: state.decks.active_deck(),
        language: state.decks.language(),
    }))
}

pub async fn set_view(
    State(state): State<AppState>,
    Json(request): Json<SetViewRequest>,
) -> Json<ApiResponse<AppStateView>> {
    let view = state.decks.set_view(request.view);
    Json(ApiResponse::success(AppStateView {
        view,
        active_deck: state.decks.active_deck(),
        language: state.decks.language(),
    }))
}

pub async fn set_language(
    State(state): State<AppState>,
    Json(request): Json<SetLanguageRequest>,
) -> Json<ApiResponse<AppStateView>> {
    state.decks.set_language(request.language);
    Json(ApiResponse::success(AppStateView {
        view: state.decks.view(),
        active_deck: state.decks.active_deck(),
        language: request.language,
    }))
}

// Deck endpoints

pub async fn generate_deck(
    State(state): State<AppState>,
    Json(request): Json<GenerateDeckRequest>,
) -> ApiResult<Deck> {
    log_api_start!("generate_deck");

    let mut collector = InputCollector::new();
    collector.set_text(&request.content);

    for (i, encoded) in request.images.iter().enumerate() {
        let bytes = STANDARD.decode(encoded).map_err(|_| {
            ApiError::ValidationError(format!("image {} is not valid base64", i))
                .to_response_with_context(ErrorContext::new("generate_deck", "deck"))
        })?;
        collector.add_image(bytes);
    }

    for (i, encoded) in request.documents.iter().enumerate() {
        let bytes = STANDARD.decode(encoded).map_err(|_| {
            ApiError::ValidationError(format!("document {} is not valid base64", i))
                .to_response_with_context(ErrorContext::new("generate_deck", "deck"))
        })?;
        collector
            .add_document(&format!("document-{}", i), &bytes)
            .map_err(|e| {
                ApiError::Extraction(e)
                    .to_response_with_context(ErrorContext::new("generate_deck", "document"))
            })?;
    }

    // Call-site guard: the generation client must never see a request
    // with neither content nor images.
    if collector.is_empty() {
        return Err(
            ApiError::ValidationError("provide text content, images, or documents".to_string())
                .to_response_with_context(ErrorContext::new("generate_deck", "deck")),
        );
    }

    let content = collector.combined_content();
    let has_images = !collector.images().is_empty();
    let config = GenerateConfig {
        content: content.clone(),
        quantity: request.quantity,
        language: request.language,
        difficulty: request.difficulty,
    };

    match state.generation.generate(&config, collector.images()).await {
        Ok(cards) => {
            let original_content = if content.is_empty() { None } else { Some(content) };
            let deck = state.decks.create_deck(
                cards,
                original_content,
                has_images,
                Some(request.difficulty),
            );
            log_api_success!(
                "generate_deck",
                deck_id = deck.id,
                format!("deck created with {} cards", deck.card_count)
            );
            Ok(Json(ApiResponse::success(deck)))
        }
        Err(e) => {
            log_api_error!("generate_deck", error = e, "generation failed");
            Err(ApiError::Generation(e)
                .to_response_with_context(ErrorContext::new("generate_deck", "deck")))
        }
    }
}

pub async fn list_decks(State(state): State<AppState>) -> Json<ApiResponse<Vec<Deck>>> {
    let decks = state.decks.list_decks();
    log_api_success!("list_decks", count = decks.len(), "decks listed");
    Json(ApiResponse::success(decks))
}

pub async fn get_deck(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deck> {
    log_api_start!("get_deck", deck_id = id);

    match state.decks.get_deck(id) {
        Some(deck) => Ok(Json(ApiResponse::success(deck))),
        None => Err(
            ApiError::NotFound(format!("Deck with ID '{}' not found", id))
                .to_response_with_context(
                    ErrorContext::new("get_deck", "deck").with_id(&id.to_string()),
                ),
        ),
    }
}

// Study session endpoints

pub async fn start_study(
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
) -> ApiResult<StudySession> {
    log_api_start!("start_study", deck_id = deck_id);

    let deck = state.decks.select_deck_for_study(deck_id).ok_or_else(|| {
        ApiError::NotFound(format!("Deck with ID '{}' not found", deck_id))
            .to_response_with_context(
                ErrorContext::new("start_study", "deck").with_id(&deck_id.to_string()),
            )
    })?;

    let session = StudySession::new(deck_id, deck.cards.len());
    state
        .sessions
        .lock()
        .unwrap()
        .insert(session.id, session.clone());

    log_api_success!("start_study", session_id = session.id, "study session created");
    Ok(Json(ApiResponse::success(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StudySession> {
    let sessions = state.sessions.lock().unwrap();
    match sessions.get(&id) {
        Some(session) => Ok(Json(ApiResponse::success(session.clone()))),
        None => Err(session_not_found(id, "get_session")),
    }
}

pub async fn session_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StudySession> {
    with_session(&state, id, "session_next", |session| {
        session.next();
        Ok(())
    })
}

pub async fn session_prev(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StudySession> {
    with_session(&state, id, "session_prev", |session| {
        session.prev();
        Ok(())
    })
}

pub async fn session_flip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StudySession> {
    with_session(&state, id, "session_flip", |session| {
        session.flip();
        Ok(())
    })
}

pub async fn session_jump(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JumpRequest>,
) -> ApiResult<StudySession> {
    with_session(&state, id, "session_jump", |session| {
        if session.jump_to(request.index) {
            Ok(())
        } else {
            Err(ApiError::ValidationError(format!(
                "index {} is out of range",
                request.index
            )))
        }
    })
}

pub async fn session_view_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetViewModeRequest>,
) -> ApiResult<StudySession> {
    with_session(&state, id, "session_view_mode", |session| {
        session.set_view_mode(request.mode);
        Ok(())
    })
}

/// Request additional generated cards for the session's deck.
///
/// Single-flight per deck: a second request while one is pending for the
/// same deck — from this session or any other — is rejected without
/// issuing a network call. The completion call happens outside all
/// locks; a resolution arriving after the session was torn down is
/// discarded rather than applied to stale state.
pub async fn session_more(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateMoreRequest>,
) -> ApiResult<MoreCardsResult> {
    log_api_start!("request_more", session_id = id);

    // Claim the deck's in-flight slot and snapshot what the prompt needs.
    let (deck_id, original_content, existing, difficulty) = {
        let sessions = state.sessions.lock().unwrap();
        let session = sessions
            .get(&id)
            .ok_or_else(|| session_not_found(id, "request_more"))?;

        if !session.can_request_more() {
            return Err(ApiError::ValidationError(
                "more cards can only be requested at the end of the deck or from grid/list view"
                    .to_string(),
            )
            .to_response_with_context(
                ErrorContext::new("request_more", "session").with_id(&id.to_string()),
            ));
        }

        let deck_id = session.deck_id;
        let deck = state.decks.get_deck(deck_id).ok_or_else(|| {
            ApiError::NotFound(format!("Deck with ID '{}' not found", deck_id))
                .to_response_with_context(
                    ErrorContext::new("request_more", "deck").with_id(&deck_id.to_string()),
                )
        })?;

        if !state.decks.begin_generation(deck_id) {
            log_api_warn!("request_more", session_id = id, "request already in flight");
            return Err(ApiError::Conflict(
                "a generation request is already in flight for this deck".to_string(),
            )
            .to_response_with_context(
                ErrorContext::new("request_more", "deck").with_id(&deck_id.to_string()),
            ));
        }

        (
            deck_id,
            deck.original_content.clone(),
            deck.cards.clone(),
            deck.difficulty.unwrap_or_default(),
        )
    };

    // Suspension point: the only await in the request-more path.
    let result = state
        .generation
        .generate_more(
            original_content.as_deref(),
            &existing,
            &request.language,
            request.quantity,
            difficulty,
        )
        .await;

    let mut sessions = state.sessions.lock().unwrap();
    let Some(session) = sessions.get_mut(&id) else {
        // The session was torn down while the request was in flight.
        state.decks.end_generation(deck_id);
        warn!(
            session_id = %id,
            "Discarding generation result for ended session"
        );
        return Err(session_not_found(id, "request_more"));
    };

    match result {
        Ok(cards) => {
            let appended = cards.len();
            let Some(new_total) = state.decks.append_cards(deck_id, cards.clone()) else {
                state.decks.end_generation(deck_id);
                return Err(ApiError::NotFound(format!(
                    "Deck with ID '{}' not found",
                    deck_id
                ))
                .to_response_with_context(
                    ErrorContext::new("request_more", "deck").with_id(&deck_id.to_string()),
                ));
            };
            state.decks.end_generation(deck_id);
            // The batch starts where the deck now ends, not at this
            // session's possibly stale count.
            session.complete_more(new_total - appended, appended);
            info!(
                session_id = %id,
                deck_id = %deck_id,
                appended,
                "Appended generated cards to deck"
            );
            Ok(Json(ApiResponse::success(MoreCardsResult {
                session: session.clone(),
                appended: cards,
            })))
        }
        Err(e) => {
            state.decks.end_generation(deck_id);
            log_api_error!("request_more", session_id = id, error = e, "generation failed");
            Err(ApiError::Generation(e).to_response_with_context(
                ErrorContext::new("request_more", "session").with_id(&id.to_string()),
            ))
        }
    }
}

pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AppStateView> {
    let removed = state.sessions.lock().unwrap().remove(&id);
    if removed.is_none() {
        return Err(session_not_found(id, "end_session"));
    }

    state.decks.clear_active_deck();
    log_api_success!("end_session", session_id = id, "study session ended");
    Ok(Json(ApiResponse::success(AppStateView {
        view: state.decks.view(),
        active_deck: None,
        language: state.decks.language(),
    })))
}

// Extraction endpoint

pub async fn extract_text(
    State(_state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> ApiResult<ExtractedText> {
    log_api_start!("extract_text");

    let bytes = STANDARD.decode(&request.data).map_err(|_| {
        ApiError::ValidationError("document payload is not valid base64".to_string())
            .to_response_with_context(ErrorContext::new("extract_text", "document"))
    })?;

    match extract_document_text(&bytes) {
        Ok(text) => {
            log_api_success!("extract_text", format!("extracted {} chars", text.len()));
            Ok(Json(ApiResponse::success(ExtractedText { text })))
        }
        Err(e) => Err(ApiError::Extraction(e)
            .to_response_with_context(ErrorContext::new("extract_text", "document"))),
    }
}

// Helpers

fn session_not_found(id: Uuid, operation: &str) -> (StatusCode, Json<ApiResponse<()>>) {
    ApiError::NotFound(format!("Study session '{}' not found", id)).to_response_with_context(
        ErrorContext::new(operation, "session").with_id(&id.to_string()),
    )
}

fn with_session<F>(
    state: &AppState,
    id: Uuid,
    operation: &str,
    apply: F,
) -> ApiResult<StudySession>
where
    F: FnOnce(&mut StudySession) -> Result<(), ApiError>,
{
    let mut sessions = state.sessions.lock().unwrap();
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| session_not_found(id, operation))?;

    apply(session).map_err(|e| {
        e.to_response_with_context(ErrorContext::new(operation, "session").with_id(&id.to_string()))
    })?;

    Ok(Json(ApiResponse::success(session.clone())))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/state/view", put(set_view))
        .route("/api/state/language", put(set_language))
        .route("/api/generate", post(generate_deck))
        .route("/api/decks", get(list_decks))
        .route("/api/decks/:id", get(get_deck))
        .route("/api/decks/:id/study", post(start_study))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id", delete(end_session))
        .route("/api/sessions/:id/next", post(session_next))
        .route("/api/sessions/:id/prev", post(session_prev))
        .route("/api/sessions/:id/flip", post(session_flip))
        .route("/api/sessions/:id/jump", post(session_jump))
        .route("/api/sessions/:id/view-mode", put(session_view_mode))
        .route("/api/sessions/:id/more", post(session_more))
        .route("/api/extract", post(extract_text))
        .with_state(state)
}
