use std::path::Path;

use colored::Colorize;

use crate::cache::Snapshot;
use crate::config::Config;
use crate::error::{MigrateError, Result};
use crate::extract;
use crate::identity::UserDirectory;
use crate::replay;
use crate::rt::RtClient;
use crate::zammad::ZammadClient;

pub fn run(config_path: &Path, cache_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;

    let mut target = ZammadClient::new(&config);
    target.me()?;

    let source = RtClient::new(&config)?;
    if !source.login()? {
        return Err(MigrateError::SourceLogin);
    }

    // A cache file gates re-extraction wholesale: once it exists it is
    // trusted as-is, so an interrupted load can rerun without touching
    // the source tracker again.
    let snapshot = if cache_path.exists() {
        let snapshot = Snapshot::load(cache_path)?;
        println!(
            "{}",
            format!(
                "Using cached snapshot from {} ({} tickets, {} users)",
                snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
                snapshot.tickets.len(),
                snapshot.users.len()
            )
            .bold()
        );
        snapshot
    } else {
        let snapshot = extract::extract(&source, config.rt_start, config.rt_end)?;
        snapshot.save(cache_path)?;
        println!(
            "{}",
            format!(
                "Extracted {} tickets; snapshot written to {}",
                snapshot.tickets.len(),
                cache_path.display()
            )
            .bold()
        );
        snapshot
    };

    let mut directory = UserDirectory::new(&config);
    directory.preload(&mut target)?;
    replay::load(&mut target, &mut directory, &snapshot, &config.rt_url)?;

    println!(
        "{}",
        format!("Imported {} tickets", snapshot.tickets.len()).bold()
    );
    Ok(())
}
