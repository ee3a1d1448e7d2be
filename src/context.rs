// src/context.rs
// Tiny, Copy, 'static-only: handed to every transform call, including from
// worker threads.

use crate::lang::{DEFAULT_LANG, Lang, LangEntry};

/// Runtime context passed to every transform.
///
/// Contains:
/// - `lang`: the language the stage was configured with
/// - `lang_entry`: the static rules looked up once for that language
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub lang: Lang,
    pub lang_entry: LangEntry,
}

impl Default for Context {
    #[inline(always)]
    fn default() -> Self {
        Self::new(DEFAULT_LANG)
    }
}

impl Context {
    /// Create a context using the canonical static data for a language.
    #[inline(always)]
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            lang_entry: lang.entry(),
        }
    }
}
