//! CLI argument definitions.

use clap::Parser;

/// Moodcheck - provision, boot and verify the Moodscape backend and client.
///
/// Run from the project root. Settings are read from
/// `.moodcheck/config.yml` or `moodcheck.yml` when present; a JSON report
/// is written for every run and the exit code is 0 only when every check
/// passed.
#[derive(Debug, Parser)]
#[command(name = "moodcheck")]
#[command(author, version, about, long_about)]
pub struct Cli {}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_parse() {
        assert!(Cli::try_parse_from(["moodcheck"]).is_ok());
    }

    #[test]
    fn behavioural_flags_are_rejected() {
        assert!(Cli::try_parse_from(["moodcheck", "--verbose"]).is_err());
        assert!(Cli::try_parse_from(["moodcheck", "run"]).is_err());
    }
}
