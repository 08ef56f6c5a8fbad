use std::path::PathBuf;

use clap::Parser;
use rt2zammad::config;
use rt2zammad::error::MigrateError;

#[derive(Parser)]
#[command(
    name = "rt2zammad",
    version,
    about = "Migrate Request Tracker tickets into Zammad"
)]
struct Cli {
    /// Path to the migration configuration file
    #[arg(long, default_value = "rt2zammad.json")]
    config: PathBuf,
    /// Path to the extraction snapshot cache
    #[arg(long, default_value = "rt2zammad.cache")]
    cache: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = rt2zammad::migrate::run(&cli.config, &cli.cache) {
        if let MigrateError::ConfigMissing(path) = &e {
            println!("Missing {}!", path.display());
            println!("Create one based on the following template:");
            println!("{}", config::TEMPLATE);
        } else {
            eprintln!("error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
