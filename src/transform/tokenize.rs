use crate::{
    ENG,
    context::Context,
    lang::{ApostropheRule, Lang, LangEntry},
    testing::transform_contract::TransformTestConfig,
    transform::{
        Rules, StageError, Transform, compile, keep_if_unchanged, pattern, substitute, substitute_all,
    },
};
use phf::{Map, phf_map};
use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s+"));
static ASCII_JUNK: LazyLock<Regex> = LazyLock::new(|| pattern(r"[\x00-\x1F]"));

/// Everything that is not a letter, mark, digit, space, `.`, `'`, `` ` ``,
/// `,` or `-` becomes its own token.
static PAD_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"([^\p{L}\p{M}\p{N}\s.'`,\-])"));

static HYPHEN_BETWEEN_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"([\p{L}\p{M}\p{N}])-([\p{L}\p{M}\p{N}])"));

static MULTI_DOTS: LazyLock<Regex> = LazyLock::new(|| pattern(r"(\.{2,})"));

/// Split commas unless they sit inside a number (`5,300`).
static COMMAS: LazyLock<Rules> = LazyLock::new(|| {
    compile(&[
        (r"([^\p{N}]),", "${1} , "),
        (r",([^\p{N}])", " , ${1}"),
        (r"(\p{N}),$", "${1} , "),
    ])
});

static CLITIC_APOSTROPHES: LazyLock<Rules> = LazyLock::new(|| {
    compile(&[
        (r"([^\p{L}])'([^\p{L}])", "${1} ' ${2}"),
        (r"([^\p{L}\p{N}])'(\p{L})", "${1} ' ${2}"),
        (r"(\p{L})'([^\p{L}])", "${1} ' ${2}"),
        (r"(\p{L})'(\p{L})", "${1} '${2}"),
        (r"(\p{N})'(s)", "${1} '${2}"),
    ])
});

static ELISION_APOSTROPHES: LazyLock<Rules> = LazyLock::new(|| {
    compile(&[
        (r"([^\p{L}])'([^\p{L}])", "${1} ' ${2}"),
        (r"([^\p{L}])'(\p{L})", "${1} ' ${2}"),
        (r"(\p{L})'([^\p{L}])", "${1} ' ${2}"),
        (r"(\p{L})'(\p{L})", "${1}' ${2}"),
    ])
});

static SPLIT_APOSTROPHES: LazyLock<Rules> = LazyLock::new(|| compile(&[("'", " ' ")]));

static TRAILING_DOT_APOSTROPHE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\.' ?$"));

static XML_ESCAPES: Map<char, &'static str> = phf_map! {
    '&' => "&amp;",
    '|' => "&#124;",
    '<' => "&lt;",
    '>' => "&gt;",
    '\'' => "&apos;",
    '"' => "&quot;",
    '[' => "&#91;",
    ']' => "&#93;",
};

#[inline]
fn needs_escape(text: &str) -> bool {
    let b = text.as_bytes();
    memchr::memchr3(b'&', b'|', b'<', b).is_some()
        || memchr::memchr3(b'>', b'\'', b'"', b).is_some()
        || memchr::memchr2(b'[', b']', b).is_some()
}

/// Escape the characters Moses treats as markup.
pub fn escape_xml(text: &str) -> Cow<'_, str> {
    if !needs_escape(text) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        match XML_ESCAPES.get(&c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Moses-style word tokenizer.
///
/// Collapses whitespace, drops ASCII control characters, pads symbols,
/// splits commas outside numbers, splits apostrophes the way the configured
/// language expects and detaches sentence-final periods unless the word is a
/// known non-breaking prefix (`Mr.`) or an abbreviation. Output tokens are
/// joined by single spaces, so the stage stays one line in, one line out.
///
/// ## Options
///
/// | Flag | Effect |
/// |------|--------|
/// | `aggressive_dash_splits` | `well-known` → `well @-@ known` |
/// | `escape` | XML-escape `& \| < > ' " [ ]` (on by default) |
#[derive(Debug, Clone, Copy)]
pub struct Tokenize {
    pub aggressive_dash_splits: bool,
    pub escape: bool,
}

pub const TOKENIZE: Tokenize = Tokenize {
    aggressive_dash_splits: false,
    escape: true,
};

impl Default for Tokenize {
    fn default() -> Self {
        TOKENIZE
    }
}

impl Tokenize {
    pub fn tokenize(&self, text: &str, ctx: &Context) -> String {
        let mut out = substitute(text.to_owned(), &WHITESPACE, " ");
        out = substitute(out, &ASCII_JUNK, "");
        out = out.trim().to_owned();

        out = substitute(out, &PAD_SYMBOLS, " ${1} ");

        if self.aggressive_dash_splits {
            // the pattern consumes the right-hand character, so `a-b-c` needs two passes
            while HYPHEN_BETWEEN_ALNUM.is_match(&out) {
                out = substitute(out, &HYPHEN_BETWEEN_ALNUM, "${1} @-@ ${2}");
            }
        }

        out = substitute(out, &MULTI_DOTS, " ${1} ");
        out = substitute_all(out, &COMMAS);

        out = match ctx.lang_entry.apostrophe {
            ApostropheRule::Clitic => substitute_all(out, &CLITIC_APOSTROPHES),
            ApostropheRule::Elision => substitute_all(out, &ELISION_APOSTROPHES),
            ApostropheRule::Split => substitute_all(out, &SPLIT_APOSTROPHES),
        };

        out = split_final_periods(&out, &ctx.lang_entry);
        out = substitute(out, &TRAILING_DOT_APOSTROPHE, " . ' ");
        out = substitute(out, &WHITESPACE, " ");
        let out = out.trim();

        if self.escape {
            escape_xml(out).into_owned()
        } else {
            out.to_owned()
        }
    }
}

/// Detach a trailing period from every token that does not keep it.
fn split_final_periods(text: &str, entry: &LangEntry) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut out = String::with_capacity(text.len() + 8);

    for (i, &token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let Some(prefix) = token.strip_suffix('.') else {
            out.push_str(token);
            continue;
        };
        let next = tokens.get(i + 1).copied();
        let keeps_period = prefix.is_empty()
            || prefix.chars().all(|c| c == '.')
            || (prefix.contains('.') && prefix.chars().any(char::is_alphabetic))
            || entry.is_nonbreaking_prefix(prefix)
            || next
                .and_then(|n| n.chars().next())
                .is_some_and(char::is_lowercase)
            || (entry.is_numeric_only_prefix(prefix)
                && next
                    .and_then(|n| n.chars().next())
                    .is_some_and(|c| c.is_ascii_digit()));
        out.push_str(if keeps_period { token } else { prefix });
        if !keeps_period {
            out.push_str(" .");
        }
    }
    out
}

impl Transform for Tokenize {
    fn name(&self) -> &'static str {
        "tokenize"
    }

    fn apply<'a>(&self, text: Cow<'a, str>, ctx: &Context) -> Result<Cow<'a, str>, StageError> {
        let out = self.tokenize(&text, ctx);
        Ok(keep_if_unchanged(text, out))
    }
}

impl TransformTestConfig for Tokenize {
    fn should_transform(lang: Lang) -> &'static [(&'static str, &'static str)] {
        if lang == ENG {
            &[
                ("Hello, world!", "Hello , world !"),
                ("This is a test.", "This is a test ."),
                ("Mr. Smith went home.", "Mr. Smith went home ."),
                ("Wait... what", "Wait ... what"),
                ("5,300 people", "5,300 people"),
            ]
        } else {
            &[]
        }
    }

    fn is_idempotent() -> bool {
        // escaping `&` produces `;`, which a second pass pads
        false
    }
}
