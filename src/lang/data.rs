use crate::lang::{ApostropheRule, Lang, LangEntry, QuoteRule};

use phf::{Map, phf_map};

/// ---------------------------------------------------------------------------
///    Macro – generates constants, the lookup table and `from_code`
/// ---------------------------------------------------------------------------
macro_rules! define_languages {
    ($(
        $code:ident, $code_str:literal, $name:literal => $entry:expr
    ),* $(,)?) => {
        $(
            pub const $code: Lang = Lang { code: $code_str, name: $name };
        )*

        pub static LANG_TABLE: Map<&'static str, LangEntry> = phf_map! {
            $( $code_str => $entry ),*
        };

        pub static ALL_LANGS: &[Lang] = &[$($code),*];

        pub fn from_code(code: &str) -> Option<Lang> {
            let lower = code.to_ascii_lowercase();
            match lower.as_str() {
                $( $code_str => Some($code), )*
                _ => None,
            }
        }
    };
}

/// Rules used for languages without dedicated data.
pub const FALLBACK_ENTRY: LangEntry = LangEntry {
    nonbreaking_prefixes: &[],
    numeric_only_prefixes: &[],
    apostrophe: ApostropheRule::Split,
    quotes: QuoteRule::Keep,
    decimal_comma: false,
};

const LATIN_INITIALS: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z",
];

const fn plain(apostrophe: ApostropheRule, quotes: QuoteRule, decimal_comma: bool) -> LangEntry {
    LangEntry {
        nonbreaking_prefixes: LATIN_INITIALS,
        numeric_only_prefixes: &[],
        apostrophe,
        quotes,
        decimal_comma,
    }
}

// ---------------------------------------------------------------------------
//    Language definitions
//    Prefix lists are trimmed to the most frequent entries per language.
// ---------------------------------------------------------------------------
define_languages! {
    ENG, "en", "English" => LangEntry {
        nonbreaking_prefixes: &[
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "Adj", "Adm", "Adv", "Asst", "Bart",
            "Bldg", "Brig", "Bros", "Capt", "Cmdr", "Col", "Comdr", "Con", "Corp", "Cpl", "DR",
            "Dr", "Drs", "Ens", "Gen", "Gov", "Hon", "Hr", "Hosp", "Insp", "Lt", "MM", "MR",
            "MRS", "MS", "Maj", "Messrs", "Mlle", "Mme", "Mr", "Mrs", "Ms", "Msgr", "Op", "Ord",
            "Pfc", "Ph", "Prof", "Pvt", "Rep", "Reps", "Res", "Rev", "Rt", "Sen", "Sens", "Sfc",
            "Sgt", "Sr", "St", "Supt", "Surg", "v", "vs", "i.e", "rev", "e.g", "Jan", "Feb",
            "Mar", "Apr", "Jun", "Jul", "Aug", "Sep", "Sept", "Oct", "Nov", "Dec",
        ],
        numeric_only_prefixes: &["No", "Art", "pp", "Nos"],
        apostrophe: ApostropheRule::Clitic,
        quotes: QuoteRule::Inside,
        decimal_comma: false,
    },
    DEU, "de", "German" => LangEntry {
        nonbreaking_prefixes: &[
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "Abs", "Abt", "Bd", "bzw", "ca", "Dr",
            "Dipl", "etc", "evtl", "Fr", "ggf", "Hr", "Hrn", "inkl", "Jh", "Prof", "Str", "usw",
            "vgl", "z.B", "zB", "Jan", "Feb", "Mär", "Apr", "Jun", "Jul", "Aug", "Sep", "Okt",
            "Nov", "Dez",
        ],
        numeric_only_prefixes: &["Nr", "Art", "S"],
        apostrophe: ApostropheRule::Split,
        quotes: QuoteRule::Outside,
        decimal_comma: true,
    },
    FRA, "fr", "French" => LangEntry {
        nonbreaking_prefixes: &[
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "Dr", "Mgr", "Mlle", "Mlles", "Mme",
            "Mmes", "Me", "Pr", "St", "Ste", "av", "bd", "cf", "etc", "janv", "févr", "avr",
            "juil", "sept", "oct", "nov", "déc",
        ],
        numeric_only_prefixes: &["No", "no", "p"],
        apostrophe: ApostropheRule::Elision,
        quotes: QuoteRule::Outside,
        decimal_comma: true,
    },
    ITA, "it", "Italian" => LangEntry {
        nonbreaking_prefixes: &[
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "Dott", "Dr", "Ing", "Prof", "Sig",
            "Sigg", "Sig.ra", "ecc", "pag", "art",
        ],
        numeric_only_prefixes: &["n", "No"],
        apostrophe: ApostropheRule::Elision,
        quotes: QuoteRule::Keep,
        decimal_comma: false,
    },
    SPA, "es", "Spanish" => LangEntry {
        nonbreaking_prefixes: &[
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "Dr", "Dra", "Sr", "Sra", "Srta", "Ud",
            "Uds", "Vd", "Vds", "etc", "pág", "aprox",
        ],
        numeric_only_prefixes: &["No", "núm"],
        apostrophe: ApostropheRule::Split,
        quotes: QuoteRule::Outside,
        decimal_comma: true,
    },
    CES, "cs", "Czech" => plain(ApostropheRule::Split, QuoteRule::Keep, true),
    POR, "pt", "Portuguese" => plain(ApostropheRule::Split, QuoteRule::Keep, false),
    NLD, "nl", "Dutch" => plain(ApostropheRule::Split, QuoteRule::Keep, false),
    FIN, "fi", "Finnish" => plain(ApostropheRule::Split, QuoteRule::Keep, false),
    RUS, "ru", "Russian" => plain(ApostropheRule::Split, QuoteRule::Keep, false),
    TUR, "tr", "Turkish" => plain(ApostropheRule::Split, QuoteRule::Keep, false),
    ZHO, "zh", "Chinese" => FALLBACK_ENTRY,
    JPN, "ja", "Japanese" => FALLBACK_ENTRY,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_constant_is_in_the_table() {
        for lang in ALL_LANGS {
            assert!(LANG_TABLE.contains_key(lang.code()), "{lang:?}");
            assert_eq!(from_code(lang.code()), Some(*lang));
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(from_code("EN"), Some(ENG));
        assert_eq!(from_code("De"), Some(DEU));
        assert_eq!(from_code("xx"), None);
    }

    #[test]
    fn english_prefixes() {
        let e = ENG.entry();
        assert!(e.is_nonbreaking_prefix("Mr"));
        assert!(!e.is_nonbreaking_prefix("house"));
        assert!(e.is_numeric_only_prefix("No"));
    }
}
