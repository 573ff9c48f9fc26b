//! Translation seam.
//!
//! Catalogue loading is the host application's business; filters only need
//! a way to translate group titles for the active language.

use std::collections::HashMap;

/// Context-aware message translation.
pub trait Translate: Send + Sync {
    fn pgettext(&self, context: &str, message: &str) -> String;

    /// Active language code, if any.
    fn language(&self) -> Option<&str> {
        None
    }
}

/// Returns every message untranslated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslation;

impl Translate for NoTranslation {
    fn pgettext(&self, _context: &str, message: &str) -> String {
        message.to_string()
    }
}

/// In-memory catalogue for one language.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    language: String,
    messages: HashMap<(String, String), String>,
}

impl MessageCatalog {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            messages: HashMap::new(),
        }
    }

    pub fn with_message(
        mut self,
        context: impl Into<String>,
        message: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        self.messages
            .insert((context.into(), message.into()), translation.into());
        self
    }
}

impl Translate for MessageCatalog {
    fn pgettext(&self, context: &str, message: &str) -> String {
        self.messages
            .get(&(context.to_string(), message.to_string()))
            .cloned()
            .unwrap_or_else(|| message.to_string())
    }

    fn language(&self) -> Option<&str> {
        Some(&self.language)
    }
}
