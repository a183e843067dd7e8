//! Per-deck study session state machine.
//!
//! Navigation (`next`/`prev`/`flip`/`jump_to`) is synchronous and
//! instantaneous; the only suspension point is the "generate more" call,
//! whose in-flight slot lives with the deck store so that parallel
//! sessions on the same deck are serialized. The session holds no card
//! data itself, only the deck reference, the cursor and the current card
//! count.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the reviewer currently is within the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StudyState {
    Reviewing { index: usize, flipped: bool },
    /// Sentinel reached when the index advances past the last card.
    AddMore,
}

/// Orthogonal presentation state; grid/list allow jumping to any index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Cards,
    Grid,
    List,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub state: StudyState,
    pub view_mode: ViewMode,
    pub card_count: usize,
}

impl StudySession {
    pub fn new(deck_id: Uuid, card_count: usize) -> Self {
        let state = if card_count == 0 {
            StudyState::AddMore
        } else {
            StudyState::Reviewing {
                index: 0,
                flipped: false,
            }
        };
        Self {
            id: Uuid::new_v4(),
            deck_id,
            state,
            view_mode: ViewMode::default(),
            card_count,
        }
    }

    /// Advance to the next card, unflipped; past the last card the
    /// session enters `AddMore`. No-op once in `AddMore`.
    pub fn next(&mut self) {
        if let StudyState::Reviewing { index, .. } = self.state {
            self.state = if index + 1 < self.card_count {
                StudyState::Reviewing {
                    index: index + 1,
                    flipped: false,
                }
            } else {
                StudyState::AddMore
            };
        }
    }

    /// Step back to the previous card, unflipped. No-op at index 0 and in
    /// `AddMore`.
    pub fn prev(&mut self) {
        if let StudyState::Reviewing { index, .. } = self.state {
            if index > 0 {
                self.state = StudyState::Reviewing {
                    index: index - 1,
                    flipped: false,
                };
            }
        }
    }

    /// Toggle the flip state in place. No-op in `AddMore`.
    pub fn flip(&mut self) {
        if let StudyState::Reviewing { index, flipped } = self.state {
            self.state = StudyState::Reviewing {
                index,
                flipped: !flipped,
            };
        }
    }

    /// Jump directly to an index from any state, unflipped. Returns false
    /// (and stays put) when the index is out of range.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.card_count {
            return false;
        }
        self.state = StudyState::Reviewing {
            index,
            flipped: false,
        };
        true
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Whether "generate more" is actionable right now: from the
    /// `AddMore` sentinel, or via the explicit grid/list affordance.
    pub fn can_request_more(&self) -> bool {
        self.state == StudyState::AddMore || self.view_mode != ViewMode::Cards
    }

    /// Apply a successful "generate more" result. `start_index` is where
    /// the appended batch begins in the deck, which can be past this
    /// session's own count when other sessions grew the deck in the
    /// meantime; the cursor lands on the first newly appended card.
    pub fn complete_more(&mut self, start_index: usize, appended: usize) {
        self.card_count = start_index + appended;
        if appended > 0 {
            self.state = StudyState::Reviewing {
                index: start_index,
                flipped: false,
            };
        }
    }
}
