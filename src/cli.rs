use clap::{Parser, ValueEnum};

use crate::app::POLL_INTERVAL_DEFAULT;
use crate::filter::LevelFilter;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    All,
    Warnings,
    Errors,
}

impl From<LevelArg> for LevelFilter {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::All => Self::All,
            LevelArg::Warnings => Self::Warnings,
            LevelArg::Errors => Self::Errors,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ghlv", version = VERSION, about = "GitHub Actions log viewer TUI")]
pub struct Cli {
    /// Workflow run id to view
    pub run: u64,

    /// Repository in owner/repo format (auto-detected from cwd)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Only show the log of this job id
    #[arg(short, long)]
    pub job: Option<u64>,

    /// Poll interval in seconds while the run is active
    #[arg(short, long, default_value_t = POLL_INTERVAL_DEFAULT)]
    pub interval: u64,

    /// Initial level filter
    #[arg(short, long, value_enum, default_value_t = LevelArg::All)]
    pub level: LevelArg,

    /// Initial search term
    #[arg(short, long)]
    pub search: Option<String>,

    /// Treat the search term as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Match the search term case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Start with auto-scroll disabled
    #[arg(long)]
    pub no_follow: bool,

    /// Render without colors (also enabled by a non-empty NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// Disable desktop notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Write debug logs to $XDG_STATE_HOME/ghlv/debug.log
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_required() {
        assert!(Cli::try_parse_from(["ghlv"]).is_err());
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["ghlv", "123"]).unwrap();
        assert_eq!(cli.run, 123);
        assert_eq!(cli.interval, 5);
        assert_eq!(cli.level, LevelArg::All);
        assert!(cli.search.is_none());
        assert!(!cli.regex && !cli.case_sensitive && !cli.no_follow && !cli.verbose);
        assert!(!cli.no_color);
    }

    #[test]
    fn filter_flags() {
        let cli = Cli::try_parse_from([
            "ghlv",
            "42",
            "--repo",
            "o/r",
            "--job",
            "7",
            "--level",
            "errors",
            "--search",
            "fail(ed)?",
            "--regex",
            "--case-sensitive",
        ])
        .unwrap();
        assert_eq!(cli.repo.as_deref(), Some("o/r"));
        assert_eq!(cli.job, Some(7));
        assert_eq!(LevelFilter::from(cli.level), LevelFilter::Errors);
        assert_eq!(cli.search.as_deref(), Some("fail(ed)?"));
        assert!(cli.regex && cli.case_sensitive);
    }
}
