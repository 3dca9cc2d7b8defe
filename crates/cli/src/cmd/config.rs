//! Option management command
//!
//! Reads and writes the preference file through the same store, bounds and type
//! checks the auto sorter uses.

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use prefs::options::{option_name, OPTIONS, OPTION_BRANCH};
use prefs::Bounds;
use std::path::Path;

/// List every option with its current value
pub async fn run_list(prefs_path: &Path) -> Result<()> {
    let store = util::open_prefs(prefs_path)?;

    println!("{}", "Autosort Options".bold());
    println!(
        "{}: {}\n",
        "Location".dimmed(),
        prefs_path.display().dimmed()
    );
    println!("[{}]", OPTION_BRANCH.trim_end_matches('.').yellow());

    for option in OPTIONS {
        let name = option_name(option.name);
        let value = store
            .get(&name)
            .with_context(|| format!("Option {} has no value", name))?;
        let origin = if store.user_value(&name).is_some() {
            String::new()
        } else {
            " (default)".dimmed().to_string()
        };
        let range = store
            .guard()
            .bounds(&name)
            .map(|bounds| format!(" {}", describe_bounds(&bounds).dimmed()))
            .unwrap_or_default();

        println!(
            "  {} = {}{}{}",
            option.name.cyan(),
            value,
            origin,
            range
        );
        println!("    {}", option.description.dimmed());
    }

    Ok(())
}

/// Print one option
pub async fn run_get(prefs_path: &Path, key: &str) -> Result<()> {
    let name = util::resolve_option(key)?;
    let store = util::open_prefs(prefs_path)?;

    match store.get(&name) {
        Some(value) => println!("{}", value),
        None => println!("{}", "(unset)".dimmed()),
    }
    Ok(())
}

/// Change one option and print the accepted value
pub async fn run_set(prefs_path: &Path, key: &str, raw: &str) -> Result<()> {
    let name = util::resolve_option(key)?;
    let store = util::open_prefs(prefs_path)?;

    let value = util::parse_value(&store, &name, raw)?;
    let accepted = store
        .set(&name, value.clone())
        .with_context(|| format!("Failed to set {}", name))?;
    util::save_prefs(&store, prefs_path)?;

    if accepted != value {
        println!(
            "{} {} = {} {}",
            "✓".green(),
            key.cyan(),
            accepted,
            format!("(clamped from {})", value).yellow()
        );
    } else {
        println!("{} {} = {}", "✓".green(), key.cyan(), accepted);
    }
    Ok(())
}

/// Return one option to its default
pub async fn run_reset(prefs_path: &Path, key: &str) -> Result<()> {
    let name = util::resolve_option(key)?;
    let store = util::open_prefs(prefs_path)?;

    store.reset(&name);
    util::save_prefs(&store, prefs_path)?;

    match store.get(&name) {
        Some(value) => println!("{} {} = {} {}", "✓".green(), key.cyan(), value, "(default)".dimmed()),
        None => println!("{} {} {}", "✓".green(), key.cyan(), "(unset)".dimmed()),
    }
    Ok(())
}

/// Print the preference file location
pub async fn run_path(prefs_path: &Path) -> Result<()> {
    println!("{}", prefs_path.display());
    Ok(())
}

fn describe_bounds(bounds: &Bounds) -> String {
    match (bounds.min, bounds.max) {
        (Some(min), Some(max)) => format!("[{}-{}]", min, max),
        (Some(min), None) => format!("[>= {}]", min),
        (None, Some(max)) => format!("[<= {}]", max),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_bounds() {
        let both = Bounds {
            min: Some(1),
            max: Some(4),
        };
        assert_eq!(describe_bounds(&both), "[1-4]");
        let min = Bounds {
            min: Some(3),
            max: None,
        };
        assert_eq!(describe_bounds(&min), "[>= 3]");
        assert_eq!(describe_bounds(&Bounds::default()), "");
    }
}
