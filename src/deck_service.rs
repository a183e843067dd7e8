//! Deck orchestrator: owns the deck list, the active view and the active
//! deck for the lifetime of the process. Reducer-style operations only;
//! no persistence by design (reloading loses all decks).

use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::i18n::Language;
use crate::models::{AppView, Card, Deck, DifficultyLevel};

const TITLE_MAX_LEN: usize = 30;

#[derive(Debug)]
struct DeckStore {
    decks: Vec<Deck>,
    view: AppView,
    active_deck: Option<Uuid>,
    language: Language,
    /// Decks with a "generate more" request currently in flight.
    generating: HashSet<Uuid>,
}

impl Default for DeckStore {
    fn default() -> Self {
        Self {
            decks: Vec::new(),
            view: AppView::Generate,
            active_deck: None,
            language: Language::default(),
            generating: HashSet::new(),
        }
    }
}

/// Shared handle to the single owned state container.
#[derive(Debug, Clone, Default)]
pub struct DeckService {
    inner: Arc<Mutex<DeckStore>>,
}

impl DeckService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap freshly generated cards into a deck, prepend it to the deck
    /// list and switch the active view to the library.
    ///
    /// The title comes from the first line of the source text; image-only
    /// and empty sources fall back to a localized fixed title.
    pub fn create_deck(
        &self,
        cards: Vec<Card>,
        original_content: Option<String>,
        has_images: bool,
        difficulty: Option<DifficultyLevel>,
    ) -> Deck {
        let mut store = self.inner.lock().unwrap();
        let lang = store.language;
        let t = lang.translations();

        let title = if has_images {
            t.deck_scanned_title.to_string()
        } else {
            original_content
                .as_deref()
                .and_then(|content| content.lines().next())
                .map(|line| line.chars().take(TITLE_MAX_LEN).collect::<String>())
                .filter(|line| !line.trim().is_empty())
                .unwrap_or_else(|| t.deck_untitled_title.to_string())
        };

        let deck = Deck {
            id: Uuid::new_v4(),
            title,
            description: lang.deck_description(cards.len()),
            icon: if has_images {
                "photo_camera".to_string()
            } else {
                "auto_awesome".to_string()
            },
            category: "Generated".to_string(),
            card_count: cards.len(),
            cards,
            last_studied: t.deck_just_now.to_string(),
            original_content,
            difficulty,
            created_at: Utc::now(),
        };

        info!(
            deck_id = %deck.id,
            title = %deck.title,
            card_count = deck.card_count,
            "Deck created"
        );

        store.decks.insert(0, deck.clone());
        store.view = AppView::Library;
        deck
    }

    /// Set the active deck and switch to the study view.
    pub fn select_deck_for_study(&self, deck_id: Uuid) -> Option<Deck> {
        let mut store = self.inner.lock().unwrap();
        let deck = store.decks.iter().find(|d| d.id == deck_id).cloned()?;
        store.active_deck = Some(deck_id);
        store.view = AppView::Study;
        Some(deck)
    }

    /// Change the active view. Selecting study without an active deck
    /// falls back to generate.
    pub fn set_view(&self, view: AppView) -> AppView {
        let mut store = self.inner.lock().unwrap();
        store.view = if view == AppView::Study && store.active_deck.is_none() {
            AppView::Generate
        } else {
            view
        };
        store.view
    }

    /// Append cards to a deck in one atomic step; no partial deck state
    /// is observable. Deck metadata (`card_count`, title, description) is
    /// deliberately left at its creation-time values.
    pub fn append_cards(&self, deck_id: Uuid, cards: Vec<Card>) -> Option<usize> {
        let mut store = self.inner.lock().unwrap();
        let deck = store.decks.iter_mut().find(|d| d.id == deck_id)?;
        deck.cards.extend(cards);
        Some(deck.cards.len())
    }

    /// Claim a deck's single in-flight generation slot. Returns false
    /// while a request for the same deck is already pending; the caller
    /// must then skip the network call entirely. The slot is shared by
    /// every session studying the deck, so concurrent "generate more"
    /// requests are serialized per deck.
    pub fn begin_generation(&self, deck_id: Uuid) -> bool {
        self.inner.lock().unwrap().generating.insert(deck_id)
    }

    /// Release a deck's generation slot, on success and on every exit
    /// path.
    pub fn end_generation(&self, deck_id: Uuid) {
        self.inner.lock().unwrap().generating.remove(&deck_id);
    }

    pub fn get_deck(&self, deck_id: Uuid) -> Option<Deck> {
        self.inner
            .lock()
            .unwrap()
            .decks
            .iter()
            .find(|d| d.id == deck_id)
            .cloned()
    }

    pub fn list_decks(&self) -> Vec<Deck> {
        self.inner.lock().unwrap().decks.clone()
    }

    pub fn view(&self) -> AppView {
        self.inner.lock().unwrap().view
    }

    pub fn active_deck(&self) -> Option<Uuid> {
        self.inner.lock().unwrap().active_deck
    }

    pub fn clear_active_deck(&self) {
        let mut store = self.inner.lock().unwrap();
        store.active_deck = None;
        store.view = AppView::Library;
    }

    pub fn set_language(&self, language: Language) {
        self.inner.lock().unwrap().language = language;
    }

    pub fn language(&self) -> Language {
        self.inner.lock().unwrap().language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card {
                id: Uuid::new_v4(),
                front: format!("front {}", i),
                back: format!("back {}", i),
                difficulty: None,
            })
            .collect()
    }

    #[test]
    fn test_create_deck_titles_from_first_line() {
        let service = DeckService::new();
        let deck = service.create_deck(
            cards(2),
            Some("Mitochondria basics\nmore detail here".to_string()),
            false,
            None,
        );
        assert_eq!(deck.title, "Mitochondria basics");
        assert_eq!(deck.card_count, 2);
        assert_eq!(deck.cards.len(), deck.card_count);
    }

    #[test]
    fn test_create_deck_truncates_long_titles() {
        let service = DeckService::new();
        let long_line = "x".repeat(80);
        let deck = service.create_deck(cards(1), Some(long_line), false, None);
        assert_eq!(deck.title.chars().count(), 30);
    }

    #[test]
    fn test_image_only_deck_gets_scanned_title() {
        let service = DeckService::new();
        service.set_language(Language::En);
        let deck = service.create_deck(cards(1), None, true, None);
        assert_eq!(deck.title, "Scanned Deck");
        assert_eq!(deck.icon, "photo_camera");
        assert!(deck.original_content.is_none());
    }

    #[test]
    fn test_empty_content_gets_untitled_fallback() {
        let service = DeckService::new();
        service.set_language(Language::En);
        let deck = service.create_deck(cards(1), Some("  ".to_string()), false, None);
        assert_eq!(deck.title, "Untitled Deck");
    }

    #[test]
    fn test_default_locale_titles_are_chinese() {
        let service = DeckService::new();
        let deck = service.create_deck(cards(1), None, true, None);
        assert_eq!(deck.title, "扫描生成的卡组");
        assert_eq!(deck.last_studied, "刚刚");
    }

    #[test]
    fn test_new_decks_are_prepended_and_view_switches_to_library() {
        let service = DeckService::new();
        let first = service.create_deck(cards(1), Some("first".to_string()), false, None);
        let second = service.create_deck(cards(1), Some("second".to_string()), false, None);
        let decks = service.list_decks();
        assert_eq!(decks[0].id, second.id);
        assert_eq!(decks[1].id, first.id);
        assert_eq!(service.view(), AppView::Library);
    }

    #[test]
    fn test_study_without_active_deck_falls_back_to_generate() {
        let service = DeckService::new();
        assert_eq!(service.set_view(AppView::Study), AppView::Generate);

        let deck = service.create_deck(cards(1), Some("notes".to_string()), false, None);
        service.select_deck_for_study(deck.id);
        assert_eq!(service.view(), AppView::Study);
        assert_eq!(service.active_deck(), Some(deck.id));
    }

    #[test]
    fn test_append_cards_grows_deck_but_not_card_count() {
        let service = DeckService::new();
        let deck = service.create_deck(cards(2), Some("notes".to_string()), false, None);
        let new_len = service.append_cards(deck.id, cards(3)).unwrap();
        assert_eq!(new_len, 5);

        let stored = service.get_deck(deck.id).unwrap();
        assert_eq!(stored.cards.len(), 5);
        // Creation-time metadata intentionally stays stale after appends.
        assert_eq!(stored.card_count, 2);
    }

    #[test]
    fn test_append_to_unknown_deck_is_none() {
        let service = DeckService::new();
        assert!(service.append_cards(Uuid::new_v4(), cards(1)).is_none());
    }

    #[test]
    fn test_generation_slot_is_single_flight_per_deck() {
        let service = DeckService::new();
        let deck = service.create_deck(cards(1), Some("notes".to_string()), false, None);
        assert!(service.begin_generation(deck.id));
        assert!(!service.begin_generation(deck.id));
        service.end_generation(deck.id);
        assert!(service.begin_generation(deck.id));
    }

    #[test]
    fn test_generation_slots_are_independent_across_decks() {
        let service = DeckService::new();
        let first = service.create_deck(cards(1), Some("first".to_string()), false, None);
        let second = service.create_deck(cards(1), Some("second".to_string()), false, None);
        assert!(service.begin_generation(first.id));
        assert!(service.begin_generation(second.id));
    }
}
