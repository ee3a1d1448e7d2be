//! Named stages the command line can refer to.
//!
//! Every entry pairs a stage name with its help text, the feature flags it
//! accepts on top of the common options, and a factory that builds the
//! transform from validated options. The registry is fixed once the pipeline
//! is built.

use crate::{
    options::ResolvedOptions,
    transform::{
        StageError, Transform,
        normalize::NormalizePunct,
        suffix::{PLUS, XYZ},
        tokenize::Tokenize,
    },
};
use std::{collections::BTreeMap, fmt, sync::Arc};

pub type TransformFactory =
    Arc<dyn Fn(&ResolvedOptions) -> Result<Arc<dyn Transform>, StageError> + Send + Sync>;

/// A boolean option only one stage understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlag {
    pub name: &'static str,
    pub short: Option<char>,
    pub help: &'static str,
}

#[derive(Clone)]
pub struct StageDescriptor {
    pub name: &'static str,
    pub about: &'static str,
    pub flags: &'static [FeatureFlag],
    factory: TransformFactory,
}

impl fmt::Debug for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl StageDescriptor {
    pub fn new<F>(
        name: &'static str,
        about: &'static str,
        flags: &'static [FeatureFlag],
        factory: F,
    ) -> Self
    where
        F: Fn(&ResolvedOptions) -> Result<Arc<dyn Transform>, StageError> + Send + Sync + 'static,
    {
        Self {
            name,
            about,
            flags,
            factory: Arc::new(factory),
        }
    }

    pub fn flag_names(&self) -> Vec<&'static str> {
        self.flags.iter().map(|f| f.name).collect()
    }

    #[inline]
    pub fn instantiate(&self, options: &ResolvedOptions) -> Result<Arc<dyn Transform>, StageError> {
        (self.factory)(options)
    }
}

pub const AGGRESSIVE_DASH_SPLITS: &str = "aggressive-dash-splits";
pub const NO_ESCAPE: &str = "no-escape";
pub const PRE_REPLACE_UNICODE_PUNCT: &str = "pre-replace-unicode-punct";
pub const POST_REMOVE_CONTROL_CHARS: &str = "post-remove-control-chars";
pub const NFKC: &str = "nfkc";

static TOKENIZE_FLAGS: &[FeatureFlag] = &[
    FeatureFlag {
        name: AGGRESSIVE_DASH_SPLITS,
        short: Some('a'),
        help: "Split hyphens between letters or digits (well-known -> well @-@ known)",
    },
    FeatureFlag {
        name: NO_ESCAPE,
        short: Some('x'),
        help: "Do not escape XML special characters",
    },
];

static NORMALIZE_FLAGS: &[FeatureFlag] = &[
    FeatureFlag {
        name: PRE_REPLACE_UNICODE_PUNCT,
        short: Some('p'),
        help: "Map CJK and fullwidth punctuation to ASCII first",
    },
    FeatureFlag {
        name: POST_REMOVE_CONTROL_CHARS,
        short: Some('c'),
        help: "Remove control characters last",
    },
    FeatureFlag {
        name: NFKC,
        short: Some('u'),
        help: "Apply Unicode NFKC before normalizing",
    },
];

#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: BTreeMap<&'static str, StageDescriptor>,
}

impl StageRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `plus`, `xyz`, `tokenize` and `normalize`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(StageDescriptor::new(
            "plus",
            "Append \" + \" to every line",
            &[],
            |_| Ok(Arc::new(PLUS)),
        ));
        registry.register(StageDescriptor::new(
            "xyz",
            "Append \"xyz\" to every line",
            &[],
            |_| Ok(Arc::new(XYZ)),
        ));
        registry.register(StageDescriptor::new(
            "tokenize",
            "Moses-style word tokenizer",
            TOKENIZE_FLAGS,
            |opts| {
                Ok(Arc::new(Tokenize {
                    aggressive_dash_splits: opts.flag(AGGRESSIVE_DASH_SPLITS),
                    escape: !opts.flag(NO_ESCAPE),
                }))
            },
        ));
        registry.register(StageDescriptor::new(
            "normalize",
            "Moses-style punctuation normalizer",
            NORMALIZE_FLAGS,
            |opts| {
                Ok(Arc::new(NormalizePunct {
                    pre_replace_unicode_punct: opts.flag(PRE_REPLACE_UNICODE_PUNCT),
                    post_remove_control_chars: opts.flag(POST_REMOVE_CONTROL_CHARS),
                    nfkc: opts.flag(NFKC),
                }))
            },
        ));
        registry
    }

    /// Add or replace a stage.
    pub fn register(&mut self, descriptor: StageDescriptor) -> &mut Self {
        self.stages.insert(descriptor.name, descriptor);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&StageDescriptor> {
        self.stages.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDescriptor> + '_ {
        self.stages.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use std::borrow::Cow;

    fn build(registry: &StageRegistry, name: &str, flags: &[&str]) -> Arc<dyn Transform> {
        let mut opts = ResolvedOptions::default();
        opts.flags.extend(flags.iter().map(|f| f.to_string()));
        registry.get(name).unwrap().instantiate(&opts).unwrap()
    }

    #[test]
    fn builtin_names() {
        let registry = StageRegistry::builtin();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["normalize", "plus", "tokenize", "xyz"]
        );
        assert!(registry.contains("plus"));
        assert!(!registry.contains("frobnicate"));
    }

    #[test]
    fn factories_honour_flags() {
        let registry = StageRegistry::builtin();
        let ctx = Context::default();

        let escaped = build(&registry, "tokenize", &[]);
        assert_eq!(escaped.apply(Cow::Borrowed("a&b"), &ctx).unwrap(), "a &amp; b");

        let raw = build(&registry, "tokenize", &[NO_ESCAPE]);
        assert_eq!(raw.apply(Cow::Borrowed("a&b"), &ctx).unwrap(), "a & b");

        let split = build(&registry, "tokenize", &[AGGRESSIVE_DASH_SPLITS]);
        assert_eq!(split.apply(Cow::Borrowed("x-y"), &ctx).unwrap(), "x @-@ y");
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = StageRegistry::builtin();
        registry.register(StageDescriptor::new("plus", "shout", &[], |_| {
            Ok(Arc::new(crate::transform::suffix::AppendSuffix::new("plus", "!")))
        }));
        let plus = build(&registry, "plus", &[]);
        assert_eq!(plus.apply(Cow::Borrowed("hi"), &Context::default()).unwrap(), "hi!");
        assert_eq!(registry.names().count(), 4);
    }

    #[test]
    fn every_declared_flag_has_a_distinct_short() {
        for stage in StageRegistry::builtin().iter() {
            let shorts: Vec<_> = stage.flags.iter().filter_map(|f| f.short).collect();
            let mut dedup = shorts.clone();
            dedup.sort_unstable();
            dedup.dedup();
            assert_eq!(shorts.len(), dedup.len(), "stage {}", stage.name);
            // l, e, j, q belong to the common options
            assert!(shorts.iter().all(|c| !"lejq".contains(*c)), "stage {}", stage.name);
        }
    }
}
