use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "lc3objcheck",
    version,
    about = "Check an LC-3 object file against an expected-result fixture"
)]
pub struct Args {
    /// List header fields and decoded label/linking tables.
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Only report failures and advisories.
    #[arg(long = "quiet", short = 'z')]
    pub quiet: bool,

    /// Fixture (TOML with `Origin` and base64 `Payload`).
    #[arg(value_name = "FIXTURE")]
    pub fixture: PathBuf,

    #[arg(value_name = "OBJECT")]
    pub object: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn parses_positional_paths_and_flags() {
        let args = Args::parse_from(["lc3objcheck", "-v", "case.toml", "case.obj"]);
        assert!(args.verbose);
        assert!(!args.quiet);
        assert_eq!(args.fixture.to_str(), Some("case.toml"));
        assert_eq!(args.object.to_str(), Some("case.obj"));
    }

    #[test]
    fn requires_both_paths() {
        assert!(Args::try_parse_from(["lc3objcheck", "case.toml"]).is_err());
    }
}
