//! First-run handling and legacy option migration

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prefs::lifecycle::{adjust_first_run, migrate_options};
use prefs::options::{AUTO_SORT, SORT_ORDER_OPTIONS, SORT_TOOLBAR};
use std::path::Path;

/// Run the startup lifecycle against the preference file and save the result
pub async fn run(prefs_path: &Path, install: bool) -> Result<()> {
    let store = util::open_prefs(prefs_path)?;

    let first_run = adjust_first_run(&store).context("Failed to update first-run marker")?;
    let report = migrate_options(&store, install);
    adjust_first_run(&store).context("Failed to update first-run marker")?;
    util::save_prefs(&store, prefs_path)?;

    if !first_run {
        println!("{}", "Not a first run, nothing to migrate".dimmed());
        return Ok(());
    }
    if !report.ran {
        println!("{} Fresh install, automatic sorting is off", "✓".green());
        return Ok(());
    }

    for failure in &report.failures {
        println!("{} {}", "✗".red(), failure);
    }
    if report.is_clean() {
        println!("{} Legacy options migrated", "✓".green());
    } else {
        println!(
            "{} Legacy options migrated with {} failed step(s)",
            "!".yellow(),
            report.failures.len()
        );
    }

    for option in [AUTO_SORT, SORT_TOOLBAR].iter().chain(SORT_ORDER_OPTIONS.iter()) {
        if let Some(value) = store.get(&prefs::option_name(option)) {
            println!("  {} = {}", option.cyan(), value);
        }
    }
    Ok(())
}
