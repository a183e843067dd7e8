//! Static UI translation table. Pure data, no logic.
//!
//! The UI locale is selected independently of the generation language
//! passed to the completion service.

use serde::{Deserialize, Serialize};

/// UI locale. Chinese is the launch locale and stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Zh,
}

#[derive(Debug)]
pub struct Translations {
    pub nav_library: &'static str,
    pub nav_generate: &'static str,
    pub generator_placeholder: &'static str,
    pub generator_generate: &'static str,
    pub generator_generating: &'static str,
    pub generator_camera_denied: &'static str,
    pub library_title: &'static str,
    pub library_subtitle: &'static str,
    pub library_cards: &'static str,
    pub study_question: &'static str,
    pub study_answer: &'static str,
    pub study_tap_reveal: &'static str,
    pub study_review: &'static str,
    pub study_got_it: &'static str,
    pub deck_scanned_title: &'static str,
    pub deck_untitled_title: &'static str,
    pub deck_just_now: &'static str,
    pub generation_failed: &'static str,
}

const EN: Translations = Translations {
    nav_library: "Library",
    nav_generate: "Create",
    generator_placeholder: "Paste notes or capture photo...",
    generator_generate: "Generate Cards",
    generator_generating: "Scanning & Creating...",
    generator_camera_denied: "Cannot access camera. Please ensure permissions are granted.",
    library_title: "My Decks",
    library_subtitle: "Your knowledge garden.",
    library_cards: "Cards",
    study_question: "Front",
    study_answer: "Back",
    study_tap_reveal: "Tap to flip",
    study_review: "Again",
    study_got_it: "Known",
    deck_scanned_title: "Scanned Deck",
    deck_untitled_title: "Untitled Deck",
    deck_just_now: "Just now",
    generation_failed: "Generation failed. Try different content or check your connection.",
};

const ZH: Translations = Translations {
    nav_library: "我的馆藏",
    nav_generate: "开始创建",
    generator_placeholder: "粘贴内容或拍照取词...",
    generator_generate: "生成卡片",
    generator_generating: "正在扫描并生成...",
    generator_camera_denied: "无法访问相机，请确保已授予权限。",
    library_title: "我的卡包",
    library_subtitle: "您的知识资产库。",
    library_cards: "张卡片",
    study_question: "正面",
    study_answer: "背面",
    study_tap_reveal: "点击翻面",
    study_review: "再来一次",
    study_got_it: "掌握了",
    deck_scanned_title: "扫描生成的卡组",
    deck_untitled_title: "未命名卡组",
    deck_just_now: "刚刚",
    generation_failed: "生成失败，请尝试换一个内容或检查网络。",
};

impl Language {
    pub fn translations(self) -> &'static Translations {
        match self {
            Language::En => &EN,
            Language::Zh => &ZH,
        }
    }

    /// Localized description for a freshly generated deck.
    pub fn deck_description(self, card_count: usize) -> String {
        match self {
            Language::En => format!(
                "AI-generated deck with {} cards based on your content.",
                card_count
            ),
            Language::Zh => format!("基于您提供的内容生成的 {} 张记忆卡片。", card_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_per_language() {
        assert_eq!(Language::En.translations().deck_scanned_title, "Scanned Deck");
        assert_eq!(Language::Zh.translations().deck_scanned_title, "扫描生成的卡组");
        assert_eq!(Language::En.translations().deck_just_now, "Just now");
        assert_eq!(Language::Zh.translations().deck_just_now, "刚刚");
    }

    #[test]
    fn test_deck_description_embeds_count() {
        assert!(Language::En.deck_description(5).contains("5 cards"));
        assert!(Language::Zh.deck_description(5).contains("5 张"));
    }

    #[test]
    fn test_default_locale_is_chinese() {
        assert_eq!(Language::default(), Language::Zh);
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::Zh).unwrap(), "\"zh\"");
        let parsed: Language = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Language::En);
    }
}
