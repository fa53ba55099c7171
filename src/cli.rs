use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(short, long, global = true, help = "Config file (default ~/.upload-once/config.json)")]
    pub config: Option<PathBuf>,
    #[clap(short, long, global = true, help = "Debug logging, mirrored to stderr")]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[clap(about = "Upload every matching file not uploaded before (default)", display_order = 1)]
    Run {
        #[clap(long, help = "Directory to scan instead of the configured one")]
        source_dir: Option<PathBuf>,
        #[clap(long, help = "File name glob instead of the configured one")]
        pattern: Option<String>,
    },
    #[clap(about = "List matching files that have not been uploaded yet", display_order = 2)]
    Pending {},
    #[clap(about = "Print the names recorded as uploaded", name = "ledger", display_order = 3)]
    Ledger {},
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["upload-once", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "upload-once",
            "run",
            "--pattern",
            "L*.BIN",
            "--source-dir",
            "/srv/billing",
            "-c",
            "/etc/upload-once.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/upload-once.json")));
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                source_dir: Some(PathBuf::from("/srv/billing")),
                pattern: Some("L*.BIN".to_string()),
            })
        );
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["upload-once", "forget", "L1.BIN"]).is_err());
    }
}
