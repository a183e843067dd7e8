use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Difficulty requested for generation and stamped onto generated cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Easy => write!(f, "easy"),
            DifficultyLevel::Medium => write!(f, "medium"),
            DifficultyLevel::Hard => write!(f, "hard"),
        }
    }
}

/// One question/answer unit. Immutable once created; ids are unique
/// within a deck (cross-deck collisions are harmless).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    pub difficulty: Option<DifficultyLevel>,
}

/// A named collection of flashcards plus display metadata.
///
/// `card_count`, `title` and `description` reflect the deck at creation
/// time and are intentionally not resynced when cards are appended later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub cards: Vec<Card>,
    pub last_studied: String,
    pub card_count: usize,
    pub original_content: Option<String>,
    pub difficulty: Option<DifficultyLevel>,
    pub created_at: DateTime<Utc>,
}

/// Which top-level screen the client is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppView {
    Generate,
    Library,
    Study,
}

/// Transient input consumed by the generation client. `quantity` is a
/// request hint, not a hard guarantee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub content: String,
    pub quantity: u32,
    pub language: String,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&DifficultyLevel::Easy).unwrap(),
            "\"easy\""
        );
        let parsed: DifficultyLevel = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed, DifficultyLevel::Hard);
    }

    #[test]
    fn test_app_view_serde() {
        assert_eq!(
            serde_json::to_string(&AppView::Library).unwrap(),
            "\"library\""
        );
        let parsed: AppView = serde_json::from_str("\"generate\"").unwrap();
        assert_eq!(parsed, AppView::Generate);
    }

    #[test]
    fn test_difficulty_display_matches_prompt_vocabulary() {
        assert_eq!(DifficultyLevel::Easy.to_string(), "easy");
        assert_eq!(DifficultyLevel::Medium.to_string(), "medium");
        assert_eq!(DifficultyLevel::Hard.to_string(), "hard");
    }

    #[test]
    fn test_deck_serializes_and_restores_card_count() {
        let cards = vec![
            Card {
                id: Uuid::new_v4(),
                front: "f1".to_string(),
                back: "b1".to_string(),
                difficulty: None,
            },
            Card {
                id: Uuid::new_v4(),
                front: "f2".to_string(),
                back: "b2".to_string(),
                difficulty: None,
            },
        ];
        let deck = Deck {
            id: Uuid::new_v4(),
            title: "Test".to_string(),
            description: "desc".to_string(),
            icon: "auto_awesome".to_string(),
            category: "Generated".to_string(),
            card_count: cards.len(),
            cards,
            last_studied: "Just now".to_string(),
            original_content: Some("source".to_string()),
            difficulty: Some(DifficultyLevel::Easy),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&deck).unwrap();
        let restored: Deck = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.cards.len(), restored.card_count);
        assert_eq!(restored.cards.len(), 2);
    }
}
