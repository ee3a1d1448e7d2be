//! Configured pipeline stages.
//!
//! A [`Stage`] wraps a [`Transform`] with everything it was configured with:
//! the name it was registered under, its language context, and its worker
//! count. The worker count decides how the stage consumes its input:
//!
//! * **streaming** (`parallelism == 1`) – [`Stage::stream`] pulls one item,
//!   yields its transformed form, then pulls the next. Nothing is buffered.
//! * **batch** (`parallelism > 1`) – [`Stage::batch`] realizes the whole
//!   upstream into a [`Batch`] first, fans it out over a dedicated pool of
//!   `parallelism` workers and reassembles the results in input order. The
//!   batch must fit in memory.
//!
//! Streams are single-pass and stop after their first error.

use crate::{
    context::Context,
    error::PipelineError,
    options::ResolvedOptions,
    transform::{StageError, Transform},
};
use rayon::prelude::*;
use std::{
    borrow::Cow,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::{debug, info};

/// One line of text.
pub type Item = String;

/// A fully materialized, ordered run of items.
pub type Batch = Vec<Item>;

/// Lazy, single-pass, non-restartable sequence of items.
pub type ItemStream<'a> = Box<dyn Iterator<Item = Result<Item, PipelineError>> + 'a>;

pub struct Stage {
    name: String,
    transform: Arc<dyn Transform>,
    options: ResolvedOptions,
    ctx: Context,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("transform", &self.transform.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Stage {
    pub fn new(
        name: impl Into<String>,
        transform: Arc<dyn Transform>,
        options: ResolvedOptions,
    ) -> Self {
        let ctx = Context::new(options.lang);
        Self {
            name: name.into(),
            transform,
            options,
            ctx,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parallelism(&self) -> usize {
        self.options.parallelism.get()
    }

    #[inline]
    pub fn quiet(&self) -> bool {
        self.options.quiet
    }

    #[inline]
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// Whether the stage can consume its input one item at a time.
    /// `false` means the executor must hand it a materialized batch.
    #[inline]
    pub fn supports_streaming(&self) -> bool {
        self.parallelism() == 1
    }

    /// Transform the item at `index` of this stage's input.
    fn apply_one(&self, index: usize, item: Item) -> Result<Item, PipelineError> {
        let fail = |source: StageError| PipelineError::TransformFailure {
            stage: self.name.clone(),
            index,
            source,
        };
        if !self.transform.needs_apply(&item, &self.ctx).map_err(fail)? {
            return Ok(item);
        }
        self.transform
            .apply(Cow::Owned(item), &self.ctx)
            .map(Cow::into_owned)
            .map_err(fail)
    }

    /// Lazily transform `input`, one item per pull.
    pub fn stream<'a>(&'a self, input: ItemStream<'a>) -> ItemStream<'a> {
        Box::new(Streaming {
            stage: self,
            input,
            index: 0,
            done: false,
        })
    }

    /// Realize `input` on first pull, then run it through [`Stage::apply_batch`].
    pub fn batch<'a>(&'a self, input: ItemStream<'a>) -> ItemStream<'a> {
        Box::new(BatchStream {
            stage: self,
            state: BatchState::Pending(input),
        })
    }

    /// Transform a whole batch, preserving order.
    ///
    /// Runs inline for a single worker, otherwise on a pool of exactly
    /// `parallelism` threads that lives for this call only. On failure no
    /// item of the batch is returned and the error carries the lowest failing
    /// index; items already handed to workers still run to completion.
    pub fn apply_batch(&self, batch: Batch) -> Result<Batch, PipelineError> {
        let total = batch.len();
        if total == 0 {
            return Ok(batch);
        }

        let workers = self.parallelism();
        if workers == 1 {
            return batch
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.apply_one(i, item))
                .collect();
        }

        let prefix = self.name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("{prefix}-worker-{i}"))
            .build()
            .map_err(|source| PipelineError::WorkerPool {
                stage: self.name.clone(),
                workers,
                source,
            })?;

        debug!(stage = %self.name, workers, items = total, "dispatching batch");
        let progress = Progress::new(&self.name, total, self.quiet());

        let results: Vec<Result<Item, PipelineError>> = pool.install(|| {
            batch
                .into_par_iter()
                .enumerate()
                .map(|(i, item)| {
                    let out = self.apply_one(i, item);
                    progress.tick();
                    out
                })
                .collect()
        });

        // index-ordered, so the first error is the lowest failing index
        results.into_iter().collect()
    }
}

struct Streaming<'a> {
    stage: &'a Stage,
    input: ItemStream<'a>,
    index: usize,
    done: bool,
}

impl Iterator for Streaming<'_> {
    type Item = Result<Item, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.input.next()? {
            Ok(item) => self.stage.apply_one(self.index, item),
            Err(e) => Err(e),
        };
        self.index += 1;
        self.done = result.is_err();
        Some(result)
    }
}

enum BatchState<'a> {
    Pending(ItemStream<'a>),
    Draining(std::vec::IntoIter<Item>),
    Done,
}

struct BatchStream<'a> {
    stage: &'a Stage,
    state: BatchState<'a>,
}

impl Iterator for BatchStream<'_> {
    type Item = Result<Item, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, BatchState::Done) {
                BatchState::Pending(input) => {
                    let batch = match materialize(input) {
                        Ok(batch) => batch,
                        Err(e) => return Some(Err(e)),
                    };
                    debug!(stage = %self.stage.name, items = batch.len(), "materialized batch");
                    match self.stage.apply_batch(batch) {
                        Ok(out) => self.state = BatchState::Draining(out.into_iter()),
                        Err(e) => return Some(Err(e)),
                    }
                }
                BatchState::Draining(mut items) => {
                    let next = items.next();
                    if next.is_some() {
                        self.state = BatchState::Draining(items);
                    }
                    return next.map(Ok);
                }
                BatchState::Done => return None,
            }
        }
    }
}

/// Drain a stream into a batch, stopping at the first error.
pub fn materialize(input: ItemStream<'_>) -> Result<Batch, PipelineError> {
    input.collect()
}

/// Completion counter for a parallel batch; logs every tenth of the way.
struct Progress<'a> {
    stage: &'a str,
    total: usize,
    step: usize,
    done: AtomicUsize,
    quiet: bool,
}

impl<'a> Progress<'a> {
    fn new(stage: &'a str, total: usize, quiet: bool) -> Self {
        Self {
            stage,
            total,
            step: (total / 10).max(1),
            done: AtomicUsize::new(0),
            quiet,
        }
    }

    #[inline]
    fn tick(&self) {
        let n = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.quiet && (n % self.step == 0 || n == self.total) {
            info!(stage = self.stage, done = n, total = self.total, "progress");
        }
    }
}
