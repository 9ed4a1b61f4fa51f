use tracing::error;

use libquilter_core::config::Config;
use libquilter_core::tracker::{GerritClient, RedmineClient};
use libquilter_core::QuilterError;
use libquilter_git::{GitError, Refresher};

pub fn run(config: &Config, only: Option<&str>, clear: bool) -> Result<(), GitError> {
    let names: Vec<&str> = match only {
        Some(name) => {
            if !config.repo.contains_key(name) {
                return Err(QuilterError::ConfigInvalid(format!(
                    "unknown repository '{}'",
                    name
                ))
                .into());
            }
            vec![name]
        }
        None => config.repo_names(),
    };

    let redmine = RedmineClient::new(&config.redmine)?;
    let gerrit = GerritClient::new(&config.gerrit)?;
    let mut refresher = Refresher::new(config, redmine, gerrit)?;

    if clear {
        refresher.cache().clear()?;
    }

    let total = names.len();
    let mut failed = 0;
    for name in names {
        // Names come from the config map, so the lookup cannot miss
        let Some(repo) = config.repo.get(name) else {
            continue;
        };
        match refresher.refresh_repo(name, repo) {
            Ok(report) => {
                println!(
                    "{}: {} patches, {} activity events",
                    name,
                    report.patches.len(),
                    report.activities.len()
                );
            }
            // Auth and unexpected tracker errors abort the whole run
            Err(e @ GitError::Core(QuilterError::TrackerAuth(_))) => return Err(e),
            Err(e @ GitError::Core(QuilterError::TrackerUnknown(_))) => return Err(e),
            Err(e) => {
                error!(repo = name, error = %e, "refresh failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(GitError::RefreshIncomplete { failed, total });
    }
    Ok(())
}
