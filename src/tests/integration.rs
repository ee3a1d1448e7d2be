#[cfg(test)]
mod integration_tests {

    use crate::{
        Pipeline, PipelineError, StageRegistry,
        cli::{self, CliError, Invocation},
    };
    use std::io::Cursor;

    fn invoke(args: &[&str]) -> Result<Invocation, CliError> {
        cli::parse(
            std::iter::once("warppipe").chain(args.iter().copied()),
            &StageRegistry::builtin(),
        )
    }

    /// Parse, build and run the way the binary does.
    fn warppipe(args: &[&str], input: &[u8]) -> Result<Vec<u8>, PipelineError> {
        let registry = StageRegistry::builtin();
        let invocation = match invoke(args) {
            Ok(inv) => inv,
            Err(CliError::Pipeline(e)) => return Err(e),
            Err(CliError::Clap(e)) => panic!("unexpected syntax error: {e}"),
        };
        let pipeline = Pipeline::builder(&registry)
            .defaults(invocation.defaults)
            .add_stages(invocation.stages)
            .build()?;
        let mut out = Vec::new();
        pipeline.run(Cursor::new(input), &mut out)?;
        Ok(out)
    }

    fn text(args: &[&str], input: &str) -> String {
        String::from_utf8(warppipe(args, input.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn echo_without_stages() {
        assert_eq!(text(&[], "a\nb\n"), "a\nb\n");
        assert_eq!(text(&["-j", "3"], "a\nb"), "a\nb\n");
    }

    #[test]
    fn plus_xyz_from_the_command_line() {
        assert_eq!(text(&["plus", "xyz"], "abc\n"), "abc + xyz\n");
        assert_eq!(text(&["-j", "2", "plus", "xyz", "-j", "1"], "abc\n"), "abc + xyz\n");
    }

    #[test]
    fn normalize_then_tokenize() {
        let out = text(
            &["normalize", "tokenize"],
            "“Hello,” she said… (quietly)\nMr. Smith isn't here.\n",
        );
        assert_eq!(
            out,
            "&quot; Hello , &quot; she said ... ( quietly )\nMr. Smith isn &apos;t here .\n"
        );
    }

    #[test]
    fn stage_language_comes_from_global_or_local() {
        assert_eq!(text(&["-l", "fr", "tokenize", "-x"], "l'homme\n"), "l' homme\n");
        assert_eq!(
            text(&["-l", "fr", "tokenize", "-x", "-l", "en"], "don't\n"),
            "don 't\n"
        );
    }

    #[test]
    fn parallel_tokenize_matches_sequential() {
        let input: String = (0..200)
            .map(|i| format!("Line {i}: a well-known, state-of-the-art test.\n"))
            .collect();
        let sequential = text(&["tokenize", "-a"], &input);
        let parallel = text(&["-q", "tokenize", "-a", "-j", "8"], &input);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.lines().count(), 200);
        assert!(parallel.starts_with("Line 0 : a well @-@ known , state @-@ of @-@ the @-@ art test .\n"));
    }

    #[test]
    fn latin1_input_and_output() {
        let out = warppipe(&["-e", "latin1", "xyz"], b"caf\xE9\n").unwrap();
        assert_eq!(out, b"caf\xE9xyz\n");
    }

    #[test]
    fn unknown_stage_is_reported_before_reading() {
        match warppipe(&["frobnicate", "plus"], b"never read\n") {
            Err(PipelineError::UnknownStage(name)) => assert_eq!(name, "frobnicate"),
            other => panic!("expected an unknown stage, got {other:?}"),
        }
    }

    #[test]
    fn misspelled_stage_after_another_is_unknown() {
        match warppipe(&["plus", "-j", "2", "frobnicate"], b"never read\n") {
            Err(PipelineError::UnknownStage(name)) => assert_eq!(name, "frobnicate"),
            other => panic!("expected an unknown stage, got {other:?}"),
        }
    }

    #[test]
    fn bad_worker_count_is_a_configuration_error() {
        match warppipe(&["plus", "-j", "0"], b"abc\n") {
            Err(PipelineError::StageConfiguration { stage, option, .. }) => {
                assert_eq!(stage, "plus");
                assert_eq!(option, "jobs");
            }
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn bad_language_is_a_configuration_error() {
        assert!(matches!(
            warppipe(&["tokenize", "--lang", "xx"], b"abc\n"),
            Err(PipelineError::StageConfiguration { .. })
        ));
    }
}
