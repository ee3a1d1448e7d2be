use crate::{lang::Lang, lang::data::ALL_LANGS, transform::Transform};

/// Trait that transforms implement to opt into the universal test suite.
pub trait TransformTestConfig: Transform + Sized {
    /// Languages the contract is checked in.
    fn languages() -> &'static [Lang] {
        ALL_LANGS
    }

    /// General test samples (may or may not trigger changes).
    fn samples(_lang: Lang) -> &'static [&'static str] {
        &["Hello World 123", " déjà-vu ", "TEST", "a, b. c!", ""]
    }

    /// Samples that must come back unchanged and without allocation.
    fn should_pass_through(_lang: Lang) -> &'static [&'static str] {
        &["hello", "world", "test123", "abc def", ""]
    }

    /// Input/output pairs that verify correct transformations.
    fn should_transform(_lang: Lang) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Whether applying the transform twice equals applying it once.
    fn is_idempotent() -> bool {
        true
    }
}

/// Assert that a transform satisfies every universal contract.
///
/// ### Contracts
/// 1. `zero_copy_when_no_changes` → pass-through samples are returned borrowed
/// 2. `transforms_as_expected` → declared input/output pairs hold
/// 3. `is_deterministic` → same input, same output; parallel stages rely on it
/// 4. `idempotent_if_declared`
/// 5. `needs_apply_is_sound` → `Ok(false)` is only returned when `apply` would not change the text
/// 6. `handles_empty_string`
/// 7. `no_panic_on_mixed_scripts`
#[macro_export]
macro_rules! assert_transform_contract {
    ($transform:expr) => {
        $crate::testing::transform_contract::zero_copy_when_no_changes(&$transform);
        $crate::testing::transform_contract::transforms_as_expected(&$transform);
        $crate::testing::transform_contract::is_deterministic(&$transform);
        $crate::testing::transform_contract::idempotent_if_declared(&$transform);
        $crate::testing::transform_contract::needs_apply_is_sound(&$transform);
        $crate::testing::transform_contract::handles_empty_string(&$transform);
        $crate::testing::transform_contract::no_panic_on_mixed_scripts(&$transform);
    };
}

// ============================================================================
// Universal contract tests
// ============================================================================

#[cfg(test)]
use crate::context::Context;
#[cfg(test)]
use std::borrow::Cow;

/// Run a line the way a stage does: honour `needs_apply`, then `apply`.
#[cfg(test)]
fn run<'a, T: Transform>(t: &T, input: &'a str, ctx: &Context) -> Cow<'a, str> {
    let text = Cow::Borrowed(input);
    if t.needs_apply(&text, ctx).unwrap() {
        t.apply(text, ctx).unwrap()
    } else {
        text
    }
}

#[cfg(test)]
pub fn zero_copy_when_no_changes<T: TransformTestConfig>(t: &T) {
    for &lang in T::languages() {
        let ctx = Context::new(lang);
        for &input in T::should_pass_through(lang) {
            let out = run(t, input, &ctx);
            assert_eq!(out.as_ref(), input, "`{}` changed pass-through sample", t.name());
            assert_eq!(
                input as *const str,
                out.as_ref() as *const str,
                "zero-copy violated for `{}` (lang: {lang}, input: `{input}`)",
                t.name()
            );
        }
    }
}

#[cfg(test)]
pub fn transforms_as_expected<T: TransformTestConfig>(t: &T) {
    for &lang in T::languages() {
        let ctx = Context::new(lang);
        for &(input, expected) in T::should_transform(lang) {
            let out = run(t, input, &ctx);
            assert_eq!(
                out.as_ref(),
                expected,
                "`{}` in {lang} on `{input}`",
                t.name()
            );
        }
    }
}

#[cfg(test)]
pub fn is_deterministic<T: TransformTestConfig>(t: &T) {
    for &lang in T::languages() {
        let ctx = Context::new(lang);
        for &input in T::samples(lang) {
            let a = t.apply(Cow::Borrowed(input), &ctx).unwrap().into_owned();
            let b = t.apply(Cow::Borrowed(input), &ctx).unwrap().into_owned();
            assert_eq!(a, b, "`{}` not deterministic in {lang} on `{input}`", t.name());
        }
    }
}

#[cfg(test)]
pub fn idempotent_if_declared<T: TransformTestConfig>(t: &T) {
    if !T::is_idempotent() {
        return;
    }
    for &lang in T::languages() {
        let ctx = Context::new(lang);
        for &input in T::samples(lang) {
            let once = run(t, input, &ctx).into_owned();
            let twice = run(t, &once, &ctx).into_owned();
            assert_eq!(once, twice, "`{}` not idempotent in {lang} on `{input}`", t.name());
        }
    }
}

#[cfg(test)]
pub fn needs_apply_is_sound<T: TransformTestConfig>(t: &T) {
    for &lang in T::languages() {
        let ctx = Context::new(lang);
        let samples = T::samples(lang).iter().chain(T::should_pass_through(lang));
        for &input in samples {
            if !t.needs_apply(input, &ctx).expect("needs_apply errored") {
                let out = t
                    .apply(Cow::Owned(input.to_owned()), &ctx)
                    .expect("apply errored");
                assert_eq!(
                    out.as_ref(),
                    input,
                    "needs_apply() said `{}` leaves `{input}` alone in {lang}, apply() disagrees",
                    t.name()
                );
            }
        }
    }
}

#[cfg(test)]
pub fn handles_empty_string<T: TransformTestConfig>(t: &T) {
    let ctx = Context::default();
    assert!(t.apply(Cow::Borrowed(""), &ctx).is_ok());
}

#[cfg(test)]
pub fn no_panic_on_mixed_scripts<T: TransformTestConfig>(t: &T) {
    for &lang in T::languages() {
        let ctx = Context::new(lang);
        let _ = t.apply(
            Cow::Borrowed("Hello 世界 русский Türkçe العربية 简体中文 «ça» l'homme ‘q’ …"),
            &ctx,
        );
    }
}
