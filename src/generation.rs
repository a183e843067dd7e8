//! Generation client: the one boundary that talks to the remote
//! chat-completion service.
//!
//! All AI-specific logic lives here: prompt construction, the single
//! network call per operation, and defensive normalization of the
//! provider's JSON into strict [`Card`] values. The provider's output
//! shape is not contractually guaranteed beyond "valid JSON with a
//! cards-shaped array", so parsing is two-stage: parse to an untyped
//! tree, then map-with-defaults into `Card`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::LlmConfig;
use crate::errors::GenerationError;
use crate::log_generation;
use crate::models::{Card, DifficultyLevel, GenerateConfig};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Placeholder substituted for any card field the provider omitted.
pub const FIELD_PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

/// Plain text for text-only requests, multi-part for vision requests.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Client for the remote completion service.
#[derive(Debug, Clone)]
pub struct GenerationService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl GenerationService {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: None,
            top_p: None,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        let mut service = Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.model.clone(),
        );
        service.temperature = config.temperature;
        service.top_p = config.top_p;
        service
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Generate a fresh batch of cards from text content and/or images.
    ///
    /// `config.content` may be empty only when at least one image is
    /// supplied; callers guard that precondition, not this client.
    pub async fn generate(
        &self,
        config: &GenerateConfig,
        images: &[Vec<u8>],
    ) -> Result<Vec<Card>, GenerationError> {
        info!(
            model = %self.model,
            content_length = config.content.len(),
            image_count = images.len(),
            quantity = config.quantity,
            language = %config.language,
            difficulty = %config.difficulty,
            "Generating flashcards"
        );

        let system = system_prompt(&config.language, config.difficulty);
        let user = if images.is_empty() {
            MessageContent::Text(format!(
                "Generate exactly {} flashcards from the following content:\n\n{}",
                config.quantity, config.content
            ))
        } else {
            let instruction = if config.content.trim().is_empty() {
                format!(
                    "Extract the key facts from the attached images and generate exactly {} flashcards.",
                    config.quantity
                )
            } else {
                format!(
                    "Extract the key facts from the attached images and the following content, and generate exactly {} flashcards:\n\n{}",
                    config.quantity, config.content
                )
            };
            let mut parts = vec![ContentPart::Text { text: instruction }];
            for image in images {
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{}", STANDARD.encode(image)),
                    },
                });
            }
            MessageContent::Parts(parts)
        };

        let content = self.make_request(system, user).await?;
        let cards = normalize_cards(&content, Some(config.difficulty))?;
        log_generation!(success, "generate", model = self.model, card_count = cards.len());
        Ok(cards)
    }

    /// Generate additional cards for an existing deck, steering the model
    /// away from material the deck already covers.
    ///
    /// Duplication avoidance is a prompt-level instruction only; the
    /// provider's output is passed through without client-side filtering.
    pub async fn generate_more(
        &self,
        original_content: Option<&str>,
        existing: &[Card],
        language: &str,
        quantity: u32,
        difficulty: DifficultyLevel,
    ) -> Result<Vec<Card>, GenerationError> {
        info!(
            model = %self.model,
            existing_count = existing.len(),
            quantity,
            language = %language,
            difficulty = %difficulty,
            "Generating additional flashcards"
        );

        // Image-only decks carry no usable source text; reconstruct
        // reference material from the cards themselves.
        let reference = match original_content {
            Some(content) if !content.trim().is_empty() && content.trim() != FIELD_PLACEHOLDER => {
                content.trim().to_string()
            }
            _ => existing
                .iter()
                .map(|card| format!("{}: {}", card.front, card.back))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        let covered = existing
            .iter()
            .map(|card| format!("- {}", card.front))
            .collect::<Vec<_>>()
            .join("\n");

        let system = system_prompt(language, difficulty);
        let user = MessageContent::Text(format!(
            "Reference material:\n{}\n\nCard fronts already covered:\n{}\n\n\
             Generate exactly {} additional flashcards. Prefer source material \
             not yet covered by the existing cards; only re-angle existing \
             questions when nothing new remains. Do not repeat any existing \
             card front verbatim.",
            reference, covered, quantity
        ));

        let content = self.make_request(system, user).await?;
        let cards = normalize_cards(&content, Some(difficulty))?;
        log_generation!(success, "generate_more", model = self.model, card_count = cards.len());
        Ok(cards)
    }

    /// Issue exactly one completion request and return the first choice's
    /// message content.
    async fn make_request(
        &self,
        system: String,
        user: MessageContent,
    ) -> Result<String, GenerationError> {
        let request_body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(system),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerationError::RemoteService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .map(|e| e.message)
                .unwrap_or_else(|| format!("completion request failed with status {}", status));
            error!(
                status = %status,
                error = %message,
                "Completion API request failed"
            );
            return Err(GenerationError::RemoteService(message));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                GenerationError::MalformedResponse("no choices in completion response".to_string())
            })?;

        debug!(
            response_length = content.len(),
            "Received completion response"
        );

        Ok(content)
    }
}

fn system_prompt(language: &str, difficulty: DifficultyLevel) -> String {
    format!(
        "You are an expert study assistant. Break the provided material into a set of flashcards.\n\
         You must respond with valid JSON in exactly this format: \
         {{\"cards\": [{{\"front\": \"question or concept\", \"back\": \"short answer or explanation\"}}]}}\n\
         Each card must cover exactly one atomic fact or concept.\n\
         Write all card text in {}.\n\
         Target {} difficulty.",
        language, difficulty
    )
}

/// Extract a JSON document from a completion that may be wrapped in
/// markdown fences or surrounding prose.
fn extract_json(content: &str) -> &str {
    if let Some(start) = content.find("```json") {
        if let Some(end) = content[start + 7..].find("```") {
            return content[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = content.find("```") {
        if let Some(end) = content[start + 3..].find("```") {
            let candidate = content[start + 3..start + 3 + end].trim();
            if candidate.starts_with('{') || candidate.starts_with('[') {
                return candidate;
            }
        }
    }

    // Salvage from surrounding prose: whichever of an object or an array
    // opens first is the document. A bare array of card objects must not
    // be sliced at its first element's brace.
    let brace = content.find('{');
    let bracket = content.find('[');
    let array_first = match (brace, bracket) {
        (Some(b), Some(k)) => k < b,
        (None, Some(_)) => true,
        _ => false,
    };

    if array_first {
        if let (Some(start), Some(end)) = (bracket, content.rfind(']')) {
            if end > start {
                return &content[start..=end];
            }
        }
    } else if let (Some(start), Some(end)) = (brace, content.rfind('}')) {
        if end > start {
            return &content[start..=end];
        }
    }

    content.trim()
}

/// Map the provider's untyped card list into strict [`Card`] values.
///
/// Accepts either a `{"cards": [...]}` object or a bare array, and either
/// `front`/`back` or `question`/`answer` field names (first non-empty
/// wins). A single malformed entry gets placeholder fields rather than
/// discarding the whole batch.
fn normalize_cards(
    content: &str,
    difficulty: Option<DifficultyLevel>,
) -> Result<Vec<Card>, GenerationError> {
    let value: Value = serde_json::from_str(extract_json(content))
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let raw_cards = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("cards") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(GenerationError::MalformedResponse(
                    "cards field is not an array".to_string(),
                ));
            }
            None => {
                return Err(GenerationError::MalformedResponse(
                    "response has no cards array".to_string(),
                ));
            }
        },
        _ => {
            return Err(GenerationError::MalformedResponse(
                "response is neither an object nor an array".to_string(),
            ));
        }
    };

    if raw_cards.is_empty() {
        return Err(GenerationError::EmptyResult);
    }

    let cards = raw_cards
        .iter()
        .map(|entry| Card {
            id: Uuid::new_v4(),
            front: first_non_empty(entry, &["front", "question"]),
            back: first_non_empty(entry, &["back", "answer"]),
            difficulty,
        })
        .collect();

    Ok(cards)
}

fn first_non_empty(entry: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| entry.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string())
}
