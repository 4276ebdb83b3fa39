//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};

/// Build tool for `.wpy` mini program pages
#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Keep watching the source tree after the build
    #[arg(short, long, global = true)]
    pub watch: bool,

    /// Print version
    #[arg(short = 'v', long)]
    pub version: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Deletes the output directory and rebuilds every source file
    Build,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wpyc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_build() {
        let cli = parse(&["build"]);
        assert_eq!(cli.command, Some(Commands::Build));
        assert!(!cli.watch);
    }

    #[test]
    fn test_watch_flag_either_side() {
        assert!(parse(&["build", "--watch"]).watch);
        assert!(parse(&["-w", "build"]).watch);
    }

    #[test]
    fn test_version_flag() {
        let cli = parse(&["-v"]);
        assert!(cli.version);
        assert_eq!(cli.command, None);
        assert!(parse(&["--version"]).version);
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["wpyc", "serve"]).is_err());
    }
}
