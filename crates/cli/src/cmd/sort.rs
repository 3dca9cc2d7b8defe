//! One-shot sort of a bookmark file

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prefs::options::{INVERSE, SORT_BY, THEN_INVERSE, THEN_SORT_BY};
use sort_core::{CriteriaConfigurator, SortEngine, TreeSorter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Sort every enabled root of `tree_path` with the current options
pub async fn run(prefs_path: &Path, tree_path: &Path) -> Result<()> {
    let prefs = util::open_prefs(prefs_path)?;
    let tree = util::open_tree(tree_path)?;

    let criteria = CriteriaConfigurator::default()
        .build(
            prefs.option_int(SORT_BY)?,
            prefs.option_bool(INVERSE)?,
            prefs.option_int(THEN_SORT_BY)?,
            prefs.option_bool(THEN_INVERSE)?,
        )
        .context("Invalid sort criteria options")?;
    let scope = prefs.sort_scope()?;

    let sorter = TreeSorter::new(Arc::clone(&tree));
    sorter.set_criteria(criteria);
    sorter.set_scope(scope);

    let start = Instant::now();
    sorter.sort_all().context("Sort failed")?;
    let elapsed = start.elapsed();
    util::save_tree(&tree, tree_path)?;

    info!(%criteria, ?elapsed, "sorted {}", tree_path.display());
    println!(
        "{} Sorted {} by {} {}",
        "✓".green(),
        tree_path.display(),
        criteria,
        format!("({:.1?})", elapsed).dimmed()
    );
    Ok(())
}
