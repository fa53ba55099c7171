use clap::Parser;

use upload_once::app;
use upload_once::cli::{Cli, Commands};
use upload_once::config::Config;
use upload_once::ledger::Ledger;

fn main() {
    let cli = Cli::parse();
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("upload-once: {:#}", e);
            app::EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::read_from(&config_path)?;

    match cli.command.unwrap_or(Commands::Run { source_dir: None, pattern: None }) {
        Commands::Run { source_dir, pattern } => {
            if let Some(dir) = source_dir {
                config.source_dir = dir;
            }
            if let Some(p) = pattern {
                config.pattern = p;
            }
            // the guard must outlive the run so buffered lines are flushed before exit
            let _guard = upload_once::logging::init_logging(&config.log_path, cli.verbose)?;
            Ok(app::run(&config))
        }
        Commands::Pending {} => {
            for candidate in app::pending_files(&config)? {
                println!("{}", candidate.path.display());
            }
            Ok(app::EXIT_OK)
        }
        Commands::Ledger {} => {
            let ledger = Ledger::load(&config.ledger_path)?;
            for name in ledger.iter() {
                println!("{}", name);
            }
            Ok(app::EXIT_OK)
        }
    }
}
