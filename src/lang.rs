pub mod data;

use crate::ENG;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lang {
    pub code: &'static str,
    pub name: &'static str,
}

impl Lang {
    #[inline(always)]
    pub const fn code(&self) -> &'static str {
        self.code
    }
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a language by its ISO 639-1 code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Lang> {
        data::from_code(code)
    }

    /// Static tokenizer / normalizer rules for this language.
    #[inline]
    pub fn entry(&self) -> LangEntry {
        data::LANG_TABLE
            .get(self.code)
            .copied()
            .unwrap_or(data::FALLBACK_ENTRY)
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

pub const DEFAULT_LANG: Lang = ENG;

/// How the tokenizer splits apostrophes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApostropheRule {
    /// English clitics: `don't` → `don 't`, `John's` → `John 's`.
    Clitic,
    /// Romance elision: `l'homme` → `l' homme`.
    Elision,
    /// Every apostrophe becomes its own token.
    Split,
}

/// Where the punctuation normalizer moves a closing quote relative to `,` / `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteRule {
    /// `"foo",` → `foo,"` (punctuation inside quotes).
    Inside,
    /// `foo,"` → `foo",` (punctuation outside quotes).
    Outside,
    /// Leave quote placement alone.
    Keep,
}

#[derive(Clone, Copy, Debug)]
pub struct LangEntry {
    /// Words that are followed by a period without ending a sentence (`Mr.`).
    pub nonbreaking_prefixes: &'static [&'static str],
    /// Prefixes that only stay attached when a number follows (`No. 5`).
    pub numeric_only_prefixes: &'static [&'static str],
    pub apostrophe: ApostropheRule,
    pub quotes: QuoteRule,
    /// `1 000` → `1,000` instead of `1.000`.
    pub decimal_comma: bool,
}

impl LangEntry {
    #[inline]
    pub fn is_nonbreaking_prefix(&self, word: &str) -> bool {
        self.nonbreaking_prefixes.contains(&word)
    }

    #[inline]
    pub fn is_numeric_only_prefix(&self, word: &str) -> bool {
        self.numeric_only_prefixes.contains(&word)
    }
}
