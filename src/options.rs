//! Stage options: raw values as given on the command line, and their
//! validated form.
//!
//! Scoping rule: a stage-local value always wins over the global default,
//! which wins over the built-in default. Resolution happens once, when the
//! pipeline is built; nothing is re-resolved while it runs.

use crate::{
    codec::Encoding,
    error::PipelineError,
    lang::{DEFAULT_LANG, Lang},
};
use std::{collections::BTreeSet, num::NonZeroUsize};

pub const LANG: &str = "lang";
pub const ENCODING: &str = "encoding";
pub const JOBS: &str = "jobs";
pub const QUIET: &str = "quiet";

/// Unvalidated option values for one stage (or the global defaults).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOptions {
    pub lang: Option<String>,
    pub encoding: Option<String>,
    pub jobs: Option<String>,
    pub quiet: Option<bool>,
    /// Enabled stage-specific feature flags, by long name.
    pub flags: BTreeSet<String>,
}

impl StageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lang(mut self, code: impl Into<String>) -> Self {
        self.lang = Some(code.into());
        self
    }

    pub fn encoding(mut self, name: impl Into<String>) -> Self {
        self.encoding = Some(name.into());
        self
    }

    pub fn jobs(mut self, jobs: impl ToString) -> Self {
        self.jobs = Some(jobs.to_string());
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }

    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.flags.insert(name.into());
        self
    }

    /// Fill every value this set leaves open from `defaults`.
    /// Feature flags are stage-specific and never inherited.
    pub fn overlay(&self, defaults: &StageOptions) -> StageOptions {
        StageOptions {
            lang: self.lang.clone().or_else(|| defaults.lang.clone()),
            encoding: self.encoding.clone().or_else(|| defaults.encoding.clone()),
            jobs: self.jobs.clone().or_else(|| defaults.jobs.clone()),
            quiet: self.quiet.or(defaults.quiet),
            flags: self.flags.clone(),
        }
    }

    /// Validate into the form a stage is built from.
    pub fn resolve(
        &self,
        stage: &str,
        defaults: &StageOptions,
        known_flags: &[&str],
    ) -> Result<ResolvedOptions, PipelineError> {
        let merged = self.overlay(defaults);
        let invalid = |option: &str, reason: String| PipelineError::StageConfiguration {
            stage: stage.to_owned(),
            option: option.to_owned(),
            reason,
        };

        let lang = match merged.lang.as_deref() {
            None => DEFAULT_LANG,
            Some(code) => Lang::from_code(code)
                .ok_or_else(|| invalid(LANG, format!("unsupported language code `{code}`")))?,
        };

        let encoding = match merged.encoding.as_deref() {
            None => Encoding::default(),
            Some(name) => name
                .parse::<Encoding>()
                .map_err(|e| invalid(ENCODING, e.to_string()))?,
        };

        let parallelism = match merged.jobs.as_deref() {
            None => NonZeroUsize::MIN,
            Some(raw) => parse_jobs(raw).map_err(|reason| invalid(JOBS, reason))?,
        };

        if let Some(unknown) = merged
            .flags
            .iter()
            .find(|f| !known_flags.contains(&f.as_str()))
        {
            return Err(invalid(
                unknown.as_str(),
                "not a feature flag of this stage".to_owned(),
            ));
        }

        Ok(ResolvedOptions {
            lang,
            encoding,
            parallelism,
            quiet: merged.quiet.unwrap_or(false),
            flags: merged.flags,
        })
    }
}

fn parse_jobs(raw: &str) -> Result<NonZeroUsize, String> {
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if n < 1 {
        return Err(format!("worker count must be at least 1, got {n}"));
    }
    usize::try_from(n)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| format!("worker count {n} is out of range"))
}

/// Validated options a stage is constructed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub lang: Lang,
    pub encoding: Encoding,
    pub parallelism: NonZeroUsize,
    pub quiet: bool,
    pub flags: BTreeSet<String>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG,
            encoding: Encoding::default(),
            parallelism: NonZeroUsize::MIN,
            quiet: false,
            flags: BTreeSet::new(),
        }
    }
}

impl ResolvedOptions {
    #[inline]
    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEU, ENG, FRA};

    fn config_error(err: PipelineError) -> (String, String) {
        match err {
            PipelineError::StageConfiguration { stage, option, .. } => (stage, option),
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn built_in_defaults() {
        let r = StageOptions::new().resolve("plus", &StageOptions::new(), &[]).unwrap();
        assert_eq!(r, ResolvedOptions::default());
        assert_eq!(r.lang, ENG);
        assert_eq!(r.parallelism.get(), 1);
    }

    #[test]
    fn local_overrides_global() {
        let global = StageOptions::new().lang("de").jobs(4).quiet(true);
        let local = StageOptions::new().lang("fr");
        let r = local.resolve("tokenize", &global, &[]).unwrap();
        assert_eq!(r.lang, FRA);
        assert_eq!(r.parallelism.get(), 4);
        assert!(r.quiet);

        let r = StageOptions::new().resolve("tokenize", &global, &[]).unwrap();
        assert_eq!(r.lang, DEU);
    }

    #[test]
    fn flags_are_not_inherited() {
        let global = StageOptions::new().flag("nfkc");
        let r = StageOptions::new().resolve("normalize", &global, &["nfkc"]).unwrap();
        assert!(!r.flag("nfkc"));
    }

    #[test]
    fn rejects_bad_worker_counts() {
        for bad in ["0", "-3", "many"] {
            let err = StageOptions::new()
                .jobs(bad)
                .resolve("plus", &StageOptions::new(), &[])
                .unwrap_err();
            assert_eq!(config_error(err), ("plus".to_owned(), JOBS.to_owned()));
        }
    }

    #[test]
    fn rejects_unknown_language_and_encoding() {
        let err = StageOptions::new()
            .lang("klingon")
            .resolve("tokenize", &StageOptions::new(), &[])
            .unwrap_err();
        assert_eq!(config_error(err).1, LANG);

        let err = StageOptions::new()
            .encoding("ebcdic")
            .resolve("tokenize", &StageOptions::new(), &[])
            .unwrap_err();
        assert_eq!(config_error(err).1, ENCODING);
    }

    #[test]
    fn rejects_undeclared_flag() {
        let err = StageOptions::new()
            .flag("turbo")
            .resolve("plus", &StageOptions::new(), &[])
            .unwrap_err();
        assert_eq!(config_error(err), ("plus".to_owned(), "turbo".to_owned()));
    }
}
