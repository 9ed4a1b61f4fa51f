use chrono::Utc;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use libquilter_core::config::Config;
use libquilter_core::types::report::{is_stale, RepoReport};
use libquilter_core::{CacheStore, QuilterError};
use libquilter_git::GitError;

pub fn run(config: &Config, repo: &str) -> Result<(), GitError> {
    let cache = CacheStore::new(&config.quilter.state_directory);

    let report: RepoReport = match cache.read(repo) {
        Ok(report) => report,
        Err(QuilterError::CacheMiss(_)) => {
            println!("{}: not yet refreshed; run `quilter refresh`", repo);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if is_stale(
        cache.last_updated_at(repo),
        Utc::now(),
        config.quilter.stale_secs,
    ) {
        eprintln!(
            "warning: report for '{}' is older than {}s; run `quilter refresh`",
            repo, config.quilter.stale_secs
        );
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "#", "Patch", "Author", "Date", "Category", "Files", "Lines", "Issues", "Reviews",
        ]);
    for patch in &report.patches {
        let idx = patch.idx.map(|i| i.to_string()).unwrap_or_default();
        let date = patch
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let issues = refs_cell(&patch.issues);
        let reviews = refs_cell(&patch.reviews);
        table.add_row(vec![
            idx,
            patch.filename.clone(),
            patch.author.clone().unwrap_or_default(),
            date,
            patch.category().unwrap_or("-").to_string(),
            patch.file_count().to_string(),
            patch.line_count.to_string(),
            issues,
            reviews,
        ]);
    }
    println!("{}", table);

    let counts = report.overview_counts();
    println!(
        "{}: {} patches, {} files, {} lines, {} reviews",
        report.name, counts.num_patches, counts.num_files, counts.num_lines, counts.num_reviews
    );

    let authors = report.author_counts();
    if !authors.is_empty() {
        let listed: Vec<String> = authors
            .iter()
            .map(|(author, count)| format!("{} ({})", author, count))
            .collect();
        println!("authors: {}", listed.join(", "));
    }

    println!("refreshed at {}", report.refreshed_at.to_rfc3339());
    Ok(())
}

/// One cell's worth of references: "label title" lines
fn refs_cell(refs: &[libquilter_core::types::reference::ExternalReference]) -> String {
    refs.iter()
        .map(|r| format!("{} {}", r.label(), r.title()))
        .collect::<Vec<_>>()
        .join("\n")
}
