//! Command-line surface.
//!
//! ```text
//! warppipe [GLOBAL OPTIONS] <stage> [STAGE OPTIONS] [<stage> [STAGE OPTIONS]]...
//! ```
//!
//! Everything before the first stage name is a global option. After it the
//! argument list is cut into one segment per stage, at every token that is a
//! registered stage name, and each segment is parsed by that stage's own
//! command. A stage name can therefore not be used as an option value. A
//! bare word a segment has no place for is reported as an unknown stage.

use crate::{
    error::PipelineError,
    options::{ENCODING, JOBS, LANG, QUIET, StageOptions},
    pipeline::StageSpec,
    registry::{StageDescriptor, StageRegistry},
};
use clap::{
    Arg, ArgAction, ArgMatches, Command,
    error::{ContextKind, ContextValue, ErrorKind},
};
use std::{ffi::OsString, fmt::Write as _};
use thiserror::Error;

const PIPELINE: &str = "pipeline";
const LIST_STAGES: &str = "list-stages";
const NO_QUIET: &str = "no-quiet";

#[derive(Debug, Error)]
pub enum CliError {
    /// Argument syntax, `--help` and `--version`; clap renders and exits.
    #[error(transparent)]
    Clap(#[from] clap::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// What the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub defaults: StageOptions,
    pub stages: Vec<StageSpec>,
    pub list_stages: bool,
}

fn common_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new(LANG)
            .short('l')
            .long("lang")
            .value_name("CODE")
            .help("Language code [default: en]"),
    )
    .arg(
        Arg::new(ENCODING)
            .short('e')
            .long("encoding")
            .value_name("NAME")
            .help("Text encoding: utf8, latin1 or ascii [default: utf8]"),
    )
    .arg(
        Arg::new(JOBS)
            .short('j')
            .long("jobs")
            .value_name("N")
            .allow_negative_numbers(true)
            .help("Worker count; more than 1 processes the whole input as one batch [default: 1]"),
    )
    .arg(
        Arg::new(QUIET)
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .overrides_with(NO_QUIET)
            .help("Suppress progress reporting"),
    )
    .arg(
        Arg::new(NO_QUIET)
            .long(NO_QUIET)
            .action(ArgAction::SetTrue)
            .overrides_with(QUIET)
            .help("Report progress even if quiet was given globally"),
    )
}

/// The top-level command: global options plus the raw stage list.
pub fn command(registry: &StageRegistry) -> Command {
    let mut stages = String::from("Stages:\n");
    for desc in registry.iter() {
        let _ = writeln!(stages, "  {:<12} {}", desc.name, desc.about);
    }
    stages.push_str("\nRun `warppipe <stage> --help` for a stage's options.");

    common_args(
        Command::new("warppipe")
            .version(clap::crate_version!())
            .about("Compose text transforms into a line-oriented stdin-to-stdout pipeline")
            .after_help(stages),
    )
    .arg(
        Arg::new(LIST_STAGES)
            .long(LIST_STAGES)
            .action(ArgAction::SetTrue)
            .help("List the available stages and exit"),
    )
    .arg(
        Arg::new(PIPELINE)
            .value_name("STAGE [OPTIONS]")
            .num_args(1..)
            .trailing_var_arg(true)
            .allow_hyphen_values(true),
    )
}

/// The command one stage's segment is parsed with.
pub fn stage_command(desc: &StageDescriptor) -> Command {
    let mut cmd = common_args(
        Command::new(desc.name)
            .about(desc.about)
            .no_binary_name(true),
    );
    for flag in desc.flags {
        let mut arg = Arg::new(flag.name)
            .long(flag.name)
            .action(ArgAction::SetTrue)
            .help(flag.help);
        if let Some(short) = flag.short {
            arg = arg.short(short);
        }
        cmd = cmd.arg(arg);
    }
    cmd
}

fn options_from(matches: &ArgMatches) -> StageOptions {
    StageOptions {
        lang: matches.get_one::<String>(LANG).cloned(),
        encoding: matches.get_one::<String>(ENCODING).cloned(),
        jobs: matches.get_one::<String>(JOBS).cloned(),
        quiet: if matches.get_flag(QUIET) {
            Some(true)
        } else if matches.get_flag(NO_QUIET) {
            Some(false)
        } else {
            None
        },
        ..StageOptions::default()
    }
}

/// Parse a full argument vector, binary name included.
pub fn parse<I, T>(args: I, registry: &StageRegistry) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command(registry).try_get_matches_from(args)?;

    let tokens: Vec<String> = matches
        .get_many::<String>(PIPELINE)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let mut stages = Vec::new();
    for (name, args) in split_segments(&tokens, registry)? {
        // split_segments only yields registered names
        let Some(desc) = registry.get(name) else {
            return Err(PipelineError::UnknownStage(name.to_owned()).into());
        };
        let stage_matches = stage_command(desc)
            .try_get_matches_from(args)
            .map_err(unknown_stage_or_syntax)?;
        let mut options = options_from(&stage_matches);
        for flag in desc.flags {
            if stage_matches.get_flag(flag.name) {
                options.flags.insert(flag.name.to_owned());
            }
        }
        stages.push(StageSpec::new(name).with_options(options));
    }

    Ok(Invocation {
        defaults: options_from(&matches),
        stages,
        list_stages: matches.get_flag(LIST_STAGES),
    })
}

/// A stray bare word inside a stage segment is most likely a misspelled stage.
fn unknown_stage_or_syntax(err: clap::Error) -> CliError {
    if err.kind() == ErrorKind::UnknownArgument {
        if let Some(ContextValue::String(token)) = err.get(ContextKind::InvalidArg) {
            if !token.starts_with('-') {
                return PipelineError::UnknownStage(token.clone()).into();
            }
        }
    }
    err.into()
}

/// Cut `tokens` at every registered stage name.
fn split_segments<'t>(
    tokens: &'t [String],
    registry: &StageRegistry,
) -> Result<Vec<(&'t str, &'t [String])>, PipelineError> {
    let mut segments = Vec::new();
    let mut start: Option<usize> = None;

    for (i, token) in tokens.iter().enumerate() {
        if !registry.contains(token) {
            if start.is_none() {
                return Err(PipelineError::UnknownStage(token.clone()));
            }
            continue;
        }
        if let Some(s) = start {
            segments.push((tokens[s].as_str(), &tokens[s + 1..i]));
        }
        start = Some(i);
    }
    if let Some(s) = start {
        segments.push((tokens[s].as_str(), &tokens[s + 1..]));
    }
    Ok(segments)
}

/// Human-readable registry listing for `--list-stages`.
pub fn render_stage_list(registry: &StageRegistry) -> String {
    let mut out = String::new();
    for desc in registry.iter() {
        let _ = writeln!(out, "{:<12} {}", desc.name, desc.about);
        for flag in desc.flags {
            let short = flag.short.map(|c| format!("-{c}, ")).unwrap_or_default();
            let _ = writeln!(out, "    {short}--{:<28} {}", flag.name, flag.help);
        }
    }
    out
}
