//! Runs a built pipeline over a byte source and sink.
//!
//! The input is split into lines and decoded lazily; each stage is chained
//! onto the stream in order. Streaming stages pull from their predecessor one
//! line at a time, batch stages realize everything upstream of them first.
//! Output lines are encoded and written as soon as the last stage yields
//! them, so a failure part-way through leaves the lines already produced in
//! the sink.

use crate::{
    codec::Encoding,
    error::PipelineError,
    pipeline::Pipeline,
    stage::{ItemStream, Stage},
};
use std::{
    borrow::Cow,
    cell::Cell,
    io::{BufRead, Write},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: usize,
    pub lines_written: usize,
}

/// Chain `stage` onto `input`, materializing first if it cannot stream.
pub fn apply_stage<'a>(stage: &'a Stage, input: ItemStream<'a>) -> ItemStream<'a> {
    if stage.supports_streaming() {
        stage.stream(input)
    } else {
        stage.batch(input)
    }
}

pub fn run<R: BufRead, W: Write>(
    pipeline: &Pipeline,
    input: R,
    mut output: W,
) -> Result<RunSummary, PipelineError> {
    for (i, stage) in pipeline.stages().iter().enumerate() {
        debug!(
            position = i,
            stage = stage.name(),
            mode = if stage.supports_streaming() { "stream" } else { "batch" },
            "planned"
        );
    }

    let lines_read = Cell::new(0);
    let mut stream: ItemStream<'_> = Box::new(LineSource::new(
        input,
        pipeline.input_encoding(),
        &lines_read,
    ));
    for stage in pipeline.stages() {
        stream = apply_stage(stage, stream);
    }

    let mut lines_written = 0;
    let drained = drain(
        stream,
        pipeline.output_encoding(),
        &mut output,
        &mut lines_written,
    );
    // flush whatever made it out, even on failure
    let flushed = output.flush().map_err(PipelineError::from);

    let summary = RunSummary {
        lines_read: lines_read.get(),
        lines_written,
    };
    match drained.and(flushed) {
        Ok(()) => {
            debug!(
                lines_read = summary.lines_read,
                lines_written = summary.lines_written,
                "run finished"
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(
                error = %e,
                lines_read = summary.lines_read,
                lines_written = summary.lines_written,
                "run stopped"
            );
            Err(e)
        }
    }
}

fn drain<W: Write>(
    stream: ItemStream<'_>,
    encoding: Encoding,
    output: &mut W,
    written: &mut usize,
) -> Result<(), PipelineError> {
    for item in stream {
        let item = item?;
        let bytes = encoding.encode(&item, *written)?;
        output.write_all(&bytes)?;
        output.write_all(b"\n")?;
        *written += 1;
    }
    Ok(())
}

/// Decoded lines of a reader. Stops after the first error.
struct LineSource<'c, R> {
    reader: R,
    encoding: Encoding,
    buf: Vec<u8>,
    read: &'c Cell<usize>,
    done: bool,
}

impl<'c, R: BufRead> LineSource<'c, R> {
    fn new(reader: R, encoding: Encoding, read: &'c Cell<usize>) -> Self {
        Self {
            reader,
            encoding,
            buf: Vec::with_capacity(256),
            read,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineSource<'_, R> {
    type Item = Result<String, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                let line = self.read.get();
                self.read.set(line + 1);
                let item = self
                    .encoding
                    .decode(&self.buf, line)
                    .map(Cow::into_owned)
                    .map_err(PipelineError::from);
                self.done = item.is_err();
                Some(item)
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        options::StageOptions,
        pipeline::StageSpec,
        registry::StageRegistry,
    };
    use std::io::Cursor;

    fn pipeline(stages: &[&str], defaults: StageOptions) -> Pipeline {
        Pipeline::builder(&StageRegistry::builtin())
            .defaults(defaults)
            .add_stages(stages.iter().map(|s| StageSpec::new(*s)))
            .build()
            .unwrap()
    }

    fn run_bytes(p: &Pipeline, input: &[u8]) -> (Result<RunSummary, PipelineError>, Vec<u8>) {
        let mut out = Vec::new();
        let result = run(p, Cursor::new(input), &mut out);
        (result, out)
    }

    #[test]
    fn splits_lines_and_strips_crlf() {
        let p = pipeline(&["xyz"], StageOptions::default());
        let (summary, out) = run_bytes(&p, b"a\r\nb\nc");
        assert_eq!(out, b"axyz\nbxyz\ncxyz\n");
        assert_eq!(
            summary.unwrap(),
            RunSummary {
                lines_read: 3,
                lines_written: 3
            }
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        let p = pipeline(&["plus"], StageOptions::new().jobs(4));
        let (summary, out) = run_bytes(&p, b"");
        assert!(out.is_empty());
        assert_eq!(summary.unwrap(), RunSummary::default());
    }

    #[test]
    fn blank_lines_are_items() {
        let p = pipeline(&["xyz"], StageOptions::default());
        let (_, out) = run_bytes(&p, b"\n\n");
        assert_eq!(out, b"xyz\nxyz\n");
    }

    #[test]
    fn identity_pipeline_echoes() {
        let p = pipeline(&[], StageOptions::default());
        let (summary, out) = run_bytes(&p, b"one\ntwo");
        assert_eq!(out, b"one\ntwo\n");
        assert_eq!(summary.unwrap().lines_written, 2);
    }

    #[test]
    fn latin1_in_utf8_out() {
        let p = Pipeline::builder(&StageRegistry::builtin())
            .add_stage(StageSpec::new("plus").with_options(StageOptions::new().encoding("latin1")))
            .add_stage(StageSpec::new("xyz"))
            .build()
            .unwrap();
        let (_, out) = run_bytes(&p, b"caf\xE9");
        assert_eq!(out, "café + xyz\n".as_bytes());
    }

    #[test]
    fn decode_error_keeps_earlier_output() {
        let p = pipeline(&["xyz"], StageOptions::default());
        let (result, out) = run_bytes(&p, b"ok\nbad\xFF\nnever");
        assert_eq!(out, b"okxyz\n");
        match result {
            Err(PipelineError::Encoding(e)) => assert_eq!(e.line, 1),
            other => panic!("expected an encoding error, got {other:?}"),
        }
    }

    #[test]
    fn decode_error_before_batch_stage_emits_nothing() {
        let p = pipeline(&["xyz"], StageOptions::new().jobs(2));
        let (result, out) = run_bytes(&p, b"ok\nbad\xFF\n");
        assert!(out.is_empty());
        assert!(matches!(result, Err(PipelineError::Encoding(_))));
    }

    #[test]
    fn unencodable_line_is_not_written() {
        let p = Pipeline::builder(&StageRegistry::builtin())
            .add_stage(StageSpec::new("plus"))
            .add_stage(StageSpec::new("xyz").with_options(StageOptions::new().encoding("ascii")))
            .build()
            .unwrap();
        let (result, out) = run_bytes(&p, "fine\nnaïve\n".as_bytes());
        assert_eq!(out, b"fine + xyz\n");
        match result {
            Err(PipelineError::Encoding(e)) => {
                assert_eq!(e.line, 1);
                assert_eq!(e.direction, crate::codec::Direction::Encode);
            }
            other => panic!("expected an encoding error, got {other:?}"),
        }
    }
}
