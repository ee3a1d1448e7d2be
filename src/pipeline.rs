use crate::{
    codec::Encoding,
    error::PipelineError,
    executor::{self, RunSummary},
    options::StageOptions,
    registry::StageRegistry,
    stage::Stage,
};
use smallvec::SmallVec;
use std::io::{BufRead, Write};
use tracing::debug;

/// Scope name used when the global defaults themselves fail to validate.
pub const GLOBAL_SCOPE: &str = "(global)";

/// A stage name plus the options given right after it on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub name: String,
    pub options: StageOptions,
}

impl StageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: StageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }
}

/// An ordered, fully configured chain of stages. Order is command-line
/// order. An empty pipeline echoes its input.
#[derive(Debug)]
pub struct Pipeline {
    stages: SmallVec<[Stage; 4]>,
    input_encoding: Encoding,
    output_encoding: Encoding,
}

impl Pipeline {
    pub fn builder(registry: &StageRegistry) -> PipelineBuilder<'_> {
        PipelineBuilder {
            registry,
            defaults: StageOptions::default(),
            specs: Vec::new(),
        }
    }

    /// The echo pipeline.
    pub fn identity(encoding: Encoding) -> Self {
        Self {
            stages: SmallVec::new(),
            input_encoding: encoding,
            output_encoding: encoding,
        }
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Encoding the input is decoded with: the first stage's.
    #[inline]
    pub fn input_encoding(&self) -> Encoding {
        self.input_encoding
    }

    /// Encoding the output is written in: the last stage's.
    #[inline]
    pub fn output_encoding(&self) -> Encoding {
        self.output_encoding
    }

    /// Stream `input` through every stage into `output`. A pipeline runs once.
    pub fn run<R: BufRead, W: Write>(
        self,
        input: R,
        output: W,
    ) -> Result<RunSummary, PipelineError> {
        executor::run(&self, input, output)
    }
}

pub struct PipelineBuilder<'r> {
    registry: &'r StageRegistry,
    defaults: StageOptions,
    specs: Vec<StageSpec>,
}

impl<'r> PipelineBuilder<'r> {
    /// Global option values every stage falls back to.
    pub fn defaults(mut self, defaults: StageOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn add_stage(mut self, spec: StageSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn add_stages(mut self, specs: impl IntoIterator<Item = StageSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Resolve and validate every spec, in order, then instantiate.
    ///
    /// Fails on the first unknown stage name or invalid option; no transform
    /// is built for a stage whose options did not validate.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let Self {
            registry,
            defaults,
            specs,
        } = self;

        if specs.is_empty() {
            let global = defaults.resolve(GLOBAL_SCOPE, &StageOptions::default(), &[])?;
            debug!(encoding = %global.encoding, "empty pipeline, echoing input");
            return Ok(Pipeline::identity(global.encoding));
        }

        let mut stages: SmallVec<[Stage; 4]> = SmallVec::with_capacity(specs.len());
        for spec in specs {
            let descriptor = registry
                .get(&spec.name)
                .ok_or_else(|| PipelineError::UnknownStage(spec.name.clone()))?;

            let options = spec
                .options
                .resolve(&spec.name, &defaults, &descriptor.flag_names())?;

            let transform =
                descriptor
                    .instantiate(&options)
                    .map_err(|e| PipelineError::StageConfiguration {
                        stage: spec.name.clone(),
                        option: "options".to_owned(),
                        reason: e.to_string(),
                    })?;

            debug!(
                position = stages.len(),
                stage = %spec.name,
                lang = %options.lang,
                encoding = %options.encoding,
                jobs = options.parallelism.get(),
                "stage configured"
            );
            stages.push(Stage::new(spec.name, transform, options));
        }

        let (input_encoding, output_encoding) = match (stages.first(), stages.last()) {
            (Some(first), Some(last)) => (first.options().encoding, last.options().encoding),
            _ => (Encoding::default(), Encoding::default()),
        };

        Ok(Pipeline {
            stages,
            input_encoding,
            output_encoding,
        })
    }
}
