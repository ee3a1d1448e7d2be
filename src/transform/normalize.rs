use crate::{
    context::Context,
    lang::{Lang, QuoteRule},
    testing::transform_contract::TransformTestConfig,
    transform::{
        Rules, StageError, Transform, compile, keep_if_unchanged, pattern, substitute, substitute_all,
    },
};
use icu_normalizer::{ComposingNormalizer, ComposingNormalizerBorrowed};
use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

// ── ICU4X ──
static ICU4X_NFKC: LazyLock<ComposingNormalizerBorrowed> =
    LazyLock::new(ComposingNormalizer::new_nfkc);

/// Spacing around brackets and punctuation, then quote / dash unification.
static COMMON: LazyLock<Rules> = LazyLock::new(|| {
    compile(&[
        // extra whitespace
        (r"\r", ""),
        (r"\(", " ("),
        (r"\)", ") "),
        (r" +", " "),
        (r"\) ([.!:?;,])", ")${1}"),
        (r"\( ", "("),
        (r" \)", ")"),
        (r"(\d) %", "${1}%"),
        (r" :", ":"),
        (r" ;", ";"),
        // backticks and doubled single quotes
        (r"`", "'"),
        (r"''", " \" "),
        // unicode quotes and dashes
        ("„", "\""),
        ("“", "\""),
        ("”", "\""),
        ("–", "-"),
        ("—", " - "),
        (r" +", " "),
        ("´", "'"),
        ("([a-zA-Z])‘([a-zA-Z])", "${1}'${2}"),
        ("([a-zA-Z])’([a-zA-Z])", "${1}'${2}"),
        ("‘", "'"),
        ("‚", "'"),
        ("’", "'"),
        (r"''", "\""),
        ("´´", "\""),
        ("…", "..."),
        // french quotes
        ("\u{A0}«\u{A0}", "\""),
        ("«\u{A0}", "\""),
        ("«", "\""),
        ("\u{A0}»\u{A0}", "\""),
        ("\u{A0}»", "\""),
        ("»", "\""),
        // pseudo-spaces
        ("\u{A0}%", "%"),
        ("nº\u{A0}", "nº "),
        ("\u{A0}:", ":"),
        ("\u{A0}ºC", " ºC"),
        ("\u{A0}cm", " cm"),
        ("\u{A0}\\?", "?"),
        ("\u{A0}!", "!"),
        ("\u{A0};", ";"),
        (",\u{A0}", ", "),
        (r" +", " "),
    ])
});

static QUOTE_INSIDE: LazyLock<Rules> =
    LazyLock::new(|| compile(&[(r#""([,.]+)"#, "${1}\"")]));

static QUOTE_OUTSIDE: LazyLock<Rules> = LazyLock::new(|| {
    compile(&[
        (r#",""#, "\","),
        // a period that ends the sentence stays inside
        (r#"(\.+)"(\s*[^<])"#, "\"${1}${2}"),
    ])
});

static DECIMAL_COMMA: LazyLock<Rules> =
    LazyLock::new(|| compile(&[("(\\d)\u{A0}(\\d)", "${1},${2}")]));

static DECIMAL_POINT: LazyLock<Rules> =
    LazyLock::new(|| compile(&[("(\\d)\u{A0}(\\d)", "${1}.${2}")]));

/// CJK and fullwidth punctuation to ASCII.
static UNICODE_PUNCT: LazyLock<Rules> = LazyLock::new(|| {
    compile(&[
        ("，", ","),
        (r"。\s*", ". "),
        ("、", ","),
        ("”", "\""),
        ("“", "\""),
        ("∶", ":"),
        ("：", ":"),
        ("？", "?"),
        ("《", "\""),
        ("》", "\""),
        ("）", ")"),
        ("！", "!"),
        ("（", "("),
        ("；", ";"),
        ("」", "\""),
        ("「", "\""),
        ("０", "0"),
        ("１", "1"),
        ("２", "2"),
        ("３", "3"),
        ("４", "4"),
        ("５", "5"),
        ("６", "6"),
        ("７", "7"),
        ("８", "8"),
        ("９", "9"),
        (r"．\s*", ". "),
        ("～", "~"),
        ("’", "'"),
        ("…", "..."),
        ("━", "-"),
        ("〈", "<"),
        ("〉", ">"),
        ("【", "["),
        ("】", "]"),
        ("％", "%"),
    ])
});

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| pattern(r"\p{C}"));

/// Moses-style punctuation normalizer.
///
/// Fixes spacing around brackets, `%`, `:` and `;`, unifies quotes, dashes
/// and ellipses, turns French guillemets into ASCII quotes and places a
/// closing quote inside (`en`) or outside (`de`, `es`, `fr`) of trailing
/// commas and periods. Numbers split by a no-break space are joined with the
/// language's decimal separator. The result is trimmed.
///
/// ## Options
///
/// | Flag | Effect |
/// |------|--------|
/// | `pre_replace_unicode_punct` | map CJK / fullwidth punctuation (`，`, `。`, `！`, `０`…) to ASCII first |
/// | `post_remove_control_chars` | drop every `\p{C}` character last |
/// | `nfkc` | run Unicode NFKC before everything else |
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizePunct {
    pub pre_replace_unicode_punct: bool,
    pub post_remove_control_chars: bool,
    pub nfkc: bool,
}

pub const NORMALIZE: NormalizePunct = NormalizePunct {
    pre_replace_unicode_punct: false,
    post_remove_control_chars: false,
    nfkc: false,
};

impl NormalizePunct {
    fn normalize(&self, text: &str, ctx: &Context) -> String {
        let mut out = if self.nfkc {
            ICU4X_NFKC.normalize(text).into_owned()
        } else {
            text.to_owned()
        };

        if self.pre_replace_unicode_punct {
            out = substitute_all(out, &UNICODE_PUNCT);
        }

        out = substitute_all(out, &COMMON);

        out = match ctx.lang_entry.quotes {
            QuoteRule::Inside => substitute_all(out, &QUOTE_INSIDE),
            QuoteRule::Outside => substitute_all(out, &QUOTE_OUTSIDE),
            QuoteRule::Keep => out,
        };

        out = if ctx.lang_entry.decimal_comma {
            substitute_all(out, &DECIMAL_COMMA)
        } else {
            substitute_all(out, &DECIMAL_POINT)
        };

        if self.post_remove_control_chars {
            out = substitute(out, &CONTROL_CHARS, "");
        }

        if out.trim().len() == out.len() {
            out
        } else {
            out.trim().to_owned()
        }
    }
}

impl Transform for NormalizePunct {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn apply<'a>(&self, text: Cow<'a, str>, ctx: &Context) -> Result<Cow<'a, str>, StageError> {
        let out = self.normalize(&text, ctx);
        Ok(keep_if_unchanged(text, out))
    }
}

impl TransformTestConfig for NormalizePunct {
    fn should_transform(_lang: Lang) -> &'static [(&'static str, &'static str)] {
        &[
            ("Hello  ( world )", "Hello (world)"),
            ("50 %", "50%"),
            ("“quoted” – text", "\"quoted\" - text"),
            ("Wait…", "Wait..."),
            ("  padded  ", "padded"),
        ]
    }
}
