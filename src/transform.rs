//! Line transforms: the functions a pipeline stage wraps.
//!
//! A transform maps one line to one line. It never sees the rest of the
//! stream, never knows whether it runs sequentially or on a worker pool, and
//! must therefore be `Send + Sync` and free of per-call mutable state.
//!
//! Two entry points:
//!
//! * `needs_apply(&self, text, ctx)` – cheap pre-check. Returning `Ok(false)`
//!   lets the stage pass the line through without calling `apply`.
//! * `apply(&self, text, ctx)` – the transformation itself. Takes and returns
//!   a `Cow<str>` so transforms that leave a line untouched stay zero-copy.

pub mod normalize;
pub mod suffix;
pub mod tokenize;

use crate::context::Context;
use regex::Regex;
use std::borrow::Cow;
use thiserror::Error;

/// An ordered regex substitution table.
pub(crate) type Rules = Vec<(Regex, &'static str)>;

/// Compile a built-in pattern. Patterns are literals in this crate, so a
/// failure here is a bug, not an input error.
pub(crate) fn pattern(p: &str) -> Regex {
    Regex::new(p).unwrap_or_else(|e| panic!("invalid built-in pattern `{p}`: {e}"))
}

/// Compile a substitution table.
pub(crate) fn compile(table: &[(&str, &'static str)]) -> Rules {
    table.iter().map(|&(p, rep)| (pattern(p), rep)).collect()
}

/// `replace_all` that keeps the existing buffer when nothing matched.
#[inline]
pub(crate) fn substitute(text: String, re: &Regex, rep: &str) -> String {
    let replaced = match re.replace_all(&text, rep) {
        Cow::Borrowed(_) => None,
        Cow::Owned(s) => Some(s),
    };
    replaced.unwrap_or(text)
}

#[inline]
pub(crate) fn substitute_all(text: String, rules: &Rules) -> String {
    rules
        .iter()
        .fold(text, |acc, (re, rep)| substitute(acc, re, rep))
}

/// Hand back the borrowed input when a transform produced identical text.
#[inline]
pub(crate) fn keep_if_unchanged<'a>(original: Cow<'a, str>, out: String) -> Cow<'a, str> {
    if out == original.as_ref() {
        original
    } else {
        Cow::Owned(out)
    }
}

/// Public error type for every transform.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("transform `{0}` failed: {1}")]
    Failed(&'static str, String),

    #[error("transform `{0}` rejected its configuration: {1}")]
    Validation(&'static str, String),
}

/// A single line-to-line transformation.
pub trait Transform: Send + Sync {
    /// Human-readable name – used for logging and error messages.
    fn name(&self) -> &'static str;

    /// Fast pre-check. Returning `Ok(false)` skips `apply` for this line.
    #[inline]
    fn needs_apply(&self, _text: &str, _ctx: &Context) -> Result<bool, StageError> {
        Ok(true)
    }

    /// Allocation-aware transformation. Must always be correct, even when
    /// called on text for which `needs_apply` returned `false`.
    fn apply<'a>(&self, text: Cow<'a, str>, ctx: &Context) -> Result<Cow<'a, str>, StageError>;
}

/// Closures are transforms too; handy for one-off stages and tests.
pub struct FnTransform<F> {
    name: &'static str,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&str) -> Result<String, StageError> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str) -> Result<String, StageError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply<'a>(&self, text: Cow<'a, str>, _ctx: &Context) -> Result<Cow<'a, str>, StageError> {
        (self.f)(&text).map(Cow::Owned)
    }
}

/// Pass-through transform.
pub struct Identity;

impl Transform for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    #[inline(always)]
    fn needs_apply(&self, _: &str, _: &Context) -> Result<bool, StageError> {
        Ok(false)
    }

    #[inline(always)]
    fn apply<'a>(&self, text: Cow<'a, str>, _: &Context) -> Result<Cow<'a, str>, StageError> {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_transform_wraps_closure() {
        let t = FnTransform::new("upper", |s: &str| Ok(s.to_uppercase()));
        let out = t.apply(Cow::Borrowed("abc"), &Context::default()).unwrap();
        assert_eq!(out, "ABC");
        assert_eq!(t.name(), "upper");
    }

    #[test]
    fn fn_transform_propagates_failure() {
        let t = FnTransform::new("boom", |_: &str| Err(StageError::Failed("boom", "nope".into())));
        let err = t.apply(Cow::Borrowed("x"), &Context::default()).unwrap_err();
        assert_eq!(err.to_string(), "transform `boom` failed: nope");
    }

    #[test]
    fn identity_is_zero_copy() {
        let input = "hello";
        let out = Identity.apply(Cow::Borrowed(input), &Context::default()).unwrap();
        assert!(matches!(out, Cow::Borrowed(s) if s.as_ptr() == input.as_ptr()));
    }
}
