//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use prefs::options::{
    declare_options, option_name, set_preference_minimum_maximum, short_name, FIRST_RUN, OPTIONS,
};
use prefs::{PrefStore, PrefValue};
use sort_core::TreeStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `<config dir>/autosort/prefs.toml`
pub fn default_prefs_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("autosort").join("prefs.toml"))
}

/// Declare every option, register bounds and merge the preference file
pub fn open_prefs(path: &Path) -> Result<Arc<PrefStore>> {
    let store = PrefStore::new();
    declare_options(&store);
    set_preference_minimum_maximum(&store).context("Failed to register option bounds")?;
    store
        .load(path)
        .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
    Ok(Arc::new(store))
}

pub fn save_prefs(store: &PrefStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("Failed to write preferences to {}", path.display()))
}

pub fn open_tree(path: &Path) -> Result<Arc<TreeStore>> {
    let tree = TreeStore::load(path)
        .with_context(|| format!("Failed to load bookmarks from {}", path.display()))?;
    Ok(Arc::new(tree))
}

pub fn save_tree(tree: &TreeStore, path: &Path) -> Result<()> {
    tree.save(path)
        .with_context(|| format!("Failed to write bookmarks to {}", path.display()))
}

/// Full preference name for a short or full option name
pub fn resolve_option(key: &str) -> Result<String> {
    let short = short_name(key).unwrap_or(key);
    let known = short == FIRST_RUN || OPTIONS.iter().any(|option| option.name == short);
    if !known {
        anyhow::bail!(
            "Unknown option: {}. Use 'abs config list' to see available options.",
            key
        );
    }
    Ok(option_name(short))
}

/// Parse `raw` as the declared type of `name`
pub fn parse_value(store: &PrefStore, name: &str, raw: &str) -> Result<PrefValue> {
    let ty = store
        .declared_type(name)
        .with_context(|| format!("Option {} is not declared", name))?;
    PrefValue::from(raw)
        .coerce(ty)
        .with_context(|| format!("Invalid value for {}: expected {}", name, ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefs::options::{AUTO_SORT, DELAY, FOLDER_DELAY};
    use tempfile::TempDir;

    #[test]
    fn test_resolve_short_and_full_names() {
        assert_eq!(resolve_option(DELAY).unwrap(), option_name(DELAY));
        assert_eq!(
            resolve_option(&option_name(AUTO_SORT)).unwrap(),
            option_name(AUTO_SORT)
        );
        assert!(resolve_option("sort_everything").is_err());
    }

    #[test]
    fn test_parse_value_follows_declared_type() {
        let dir = TempDir::new().unwrap();
        let store = open_prefs(&dir.path().join("prefs.toml")).unwrap();

        assert_eq!(
            parse_value(&store, &option_name(AUTO_SORT), "TRUE").unwrap(),
            PrefValue::Bool(true)
        );
        assert_eq!(
            parse_value(&store, &option_name(DELAY), " 12 ").unwrap(),
            PrefValue::Int(12)
        );
        assert!(parse_value(&store, &option_name(DELAY), "soon").is_err());
    }

    #[test]
    fn test_open_prefs_clamps_file_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(
            &path,
            format!("\"{}\" = 1\n", option_name(FOLDER_DELAY)),
        )
        .unwrap();

        let store = open_prefs(&path).unwrap();
        assert_eq!(store.option_int(FOLDER_DELAY).unwrap(), 3);
    }
}
