use libquilter_core::config::Config;
use libquilter_core::CacheStore;
use libquilter_git::GitError;

use crate::cli::CacheCommand;

pub fn run(config: &Config, cmd: &CacheCommand) -> Result<(), GitError> {
    match cmd {
        CacheCommand::Clear => {
            let cache = CacheStore::new(&config.quilter.state_directory);
            cache.clear()?;
            println!("cache cleared");
            Ok(())
        }
    }
}
