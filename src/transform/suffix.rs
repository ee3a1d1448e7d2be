use crate::{
    context::Context,
    lang::Lang,
    testing::transform_contract::TransformTestConfig,
    transform::{StageError, Transform},
};
use std::borrow::Cow;

/// Append a fixed literal to every line.
///
/// Backs the `plus` (`" + "`) and `xyz` (`"xyz"`) demo stages, so that
/// `abc` through `plus` then `xyz` becomes `abc + xyz`.
#[derive(Debug, Clone, Copy)]
pub struct AppendSuffix {
    name: &'static str,
    suffix: &'static str,
}

pub const PLUS: AppendSuffix = AppendSuffix::new("plus", " + ");
pub const XYZ: AppendSuffix = AppendSuffix::new("xyz", "xyz");

impl AppendSuffix {
    pub const fn new(name: &'static str, suffix: &'static str) -> Self {
        Self { name, suffix }
    }
}

impl Transform for AppendSuffix {
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    fn needs_apply(&self, _: &str, _: &Context) -> Result<bool, StageError> {
        Ok(!self.suffix.is_empty())
    }

    fn apply<'a>(&self, text: Cow<'a, str>, _: &Context) -> Result<Cow<'a, str>, StageError> {
        if self.suffix.is_empty() {
            return Ok(text);
        }
        let mut out = text.into_owned();
        out.push_str(self.suffix);
        Ok(Cow::Owned(out))
    }
}

impl TransformTestConfig for AppendSuffix {
    fn should_pass_through(_lang: Lang) -> &'static [&'static str] {
        // every line gains the suffix
        &[]
    }

    fn is_idempotent() -> bool {
        false
    }
}
