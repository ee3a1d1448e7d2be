//! Line-oriented text pipelines.
//!
//! Named stages are looked up in a [`StageRegistry`], configured from
//! [`StageOptions`] (stage-local values over global defaults) and chained in
//! order into a [`Pipeline`]. Stages with one worker stream; stages with more
//! realize their whole input as a batch and fan it out over a dedicated
//! worker pool, keeping input order.
//!
//! ```no_run
//! use warppipe::{Pipeline, StageOptions, StageRegistry, StageSpec};
//!
//! let registry = StageRegistry::builtin();
//! let pipeline = Pipeline::builder(&registry)
//!     .add_stage(StageSpec::new("normalize"))
//!     .add_stage(StageSpec::new("tokenize").with_options(StageOptions::new().jobs(4)))
//!     .build()?;
//! pipeline.run(std::io::stdin().lock(), std::io::stdout().lock())?;
//! # Ok::<(), warppipe::PipelineError>(())
//! ```

pub mod cli;
pub mod codec;
pub mod context;
pub mod error;
pub mod executor;
pub mod lang;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod stage;
pub mod testing;
pub mod transform;

pub use codec::{Encoding, EncodingError};
pub use context::Context;
pub use error::PipelineError;
pub use executor::RunSummary;
pub use lang::Lang;
pub use lang::data::{CES, DEU, ENG, FIN, FRA, ITA, JPN, NLD, POR, RUS, SPA, TUR, ZHO};
pub use options::{ResolvedOptions, StageOptions};
pub use pipeline::{Pipeline, PipelineBuilder, StageSpec};
pub use registry::{FeatureFlag, StageDescriptor, StageRegistry};
pub use stage::{Batch, Item, ItemStream, Stage};
pub use transform::{FnTransform, Identity, StageError, Transform};
pub use transform::normalize::{NORMALIZE, NormalizePunct};
pub use transform::suffix::{AppendSuffix, PLUS, XYZ};
pub use transform::tokenize::{TOKENIZE, Tokenize};

#[cfg(test)]
mod tests {
    include!("tests/unit.rs");
    include!("tests/integration.rs");
    include!("tests/proptest.rs");
}
