pub mod api;
pub mod capture;
pub mod config;
pub mod deck_service;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod i18n;
pub mod logging;
pub mod models;
pub mod study;

pub use capture::InputCollector;
pub use config::Config;
pub use deck_service::DeckService;
pub use errors::*;
pub use extraction::extract_document_text;
pub use generation::GenerationService;
pub use i18n::Language;
pub use models::*;
pub use study::{StudySession, StudyState, ViewMode};
