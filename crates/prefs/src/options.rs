//! Option schema for the `extensions.autosortbookmarks.` namespace

use crate::store::PrefStore;
use crate::value::PrefValue;
use crate::Result;
use sort_core::{RootSet, SortScope};
use std::time::Duration;

/// Prefix shared by every current option
pub const OPTION_BRANCH: &str = "extensions.autosortbookmarks.";

pub const AUTO_SORT: &str = "auto_sort";
pub const SORT_MENU: &str = "sort_menu";
pub const SORT_TOOLBAR: &str = "sort_toolbar";
pub const SORT_UNSORTED: &str = "sort_unsorted";
pub const FOLDER_SORT_ORDER: &str = "folder_sort_order";
pub const LIVEMARK_SORT_ORDER: &str = "livemark_sort_order";
pub const SMART_BOOKMARK_SORT_ORDER: &str = "smart_bookmark_sort_order";
pub const BOOKMARK_SORT_ORDER: &str = "bookmark_sort_order";
pub const SORT_BY: &str = "sort_by";
pub const INVERSE: &str = "inverse";
pub const THEN_SORT_BY: &str = "then_sort_by";
pub const THEN_INVERSE: &str = "then_inverse";
pub const DELAY: &str = "delay";
pub const FOLDER_DELAY: &str = "folder_delay";
/// Hidden marker, never declared
pub const FIRST_RUN: &str = "firstrun";

/// Options that rank item kinds, bounded to [1, 4]
pub const SORT_ORDER_OPTIONS: [&str; 4] = [
    FOLDER_SORT_ORDER,
    LIVEMARK_SORT_ORDER,
    SMART_BOOKMARK_SORT_ORDER,
    BOOKMARK_SORT_ORDER,
];

/// Options that feed the sort criteria
pub const CRITERIA_OPTIONS: [&str; 4] = [SORT_BY, INVERSE, THEN_SORT_BY, THEN_INVERSE];

/// Options that select roots
pub const ROOT_OPTIONS: [&str; 3] = [SORT_MENU, SORT_TOOLBAR, SORT_UNSORTED];

const MIN_SORT_ORDER: i64 = 1;
const MAX_SORT_ORDER: i64 = 4;
const MIN_FOLDER_DELAY: i64 = 3;

/// A declared option
pub struct OptionSpec {
    pub name: &'static str,
    pub default: OptionDefault,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum OptionDefault {
    Bool(bool),
    Int(i64),
}

impl From<OptionDefault> for PrefValue {
    fn from(default: OptionDefault) -> Self {
        match default {
            OptionDefault::Bool(b) => PrefValue::Bool(b),
            OptionDefault::Int(i) => PrefValue::Int(i),
        }
    }
}

pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: AUTO_SORT,
        default: OptionDefault::Bool(false),
        description: "Sort automatically when bookmarks change",
    },
    OptionSpec {
        name: SORT_MENU,
        default: OptionDefault::Bool(true),
        description: "Sort the bookmarks menu",
    },
    OptionSpec {
        name: SORT_TOOLBAR,
        default: OptionDefault::Bool(true),
        description: "Sort the bookmarks toolbar",
    },
    OptionSpec {
        name: SORT_UNSORTED,
        default: OptionDefault::Bool(true),
        description: "Sort unsorted bookmarks",
    },
    OptionSpec {
        name: FOLDER_SORT_ORDER,
        default: OptionDefault::Int(1),
        description: "Rank of folders among siblings (1-4)",
    },
    OptionSpec {
        name: LIVEMARK_SORT_ORDER,
        default: OptionDefault::Int(2),
        description: "Rank of livemarks among siblings (1-4)",
    },
    OptionSpec {
        name: SMART_BOOKMARK_SORT_ORDER,
        default: OptionDefault::Int(3),
        description: "Rank of smart bookmarks among siblings (1-4)",
    },
    OptionSpec {
        name: BOOKMARK_SORT_ORDER,
        default: OptionDefault::Int(4),
        description: "Rank of bookmarks among siblings (1-4)",
    },
    OptionSpec {
        name: SORT_BY,
        default: OptionDefault::Int(0),
        description: "Primary sort key index",
    },
    OptionSpec {
        name: INVERSE,
        default: OptionDefault::Bool(false),
        description: "Reverse the primary key",
    },
    OptionSpec {
        name: THEN_SORT_BY,
        default: OptionDefault::Int(1),
        description: "Secondary sort key index",
    },
    OptionSpec {
        name: THEN_INVERSE,
        default: OptionDefault::Bool(false),
        description: "Reverse the secondary key",
    },
    OptionSpec {
        name: DELAY,
        default: OptionDefault::Int(3),
        description: "Seconds to wait after an item change",
    },
    OptionSpec {
        name: FOLDER_DELAY,
        default: OptionDefault::Int(30),
        description: "Seconds to wait after a folder is added or moved",
    },
];

/// Full preference name of an option
pub fn option_name(name: &str) -> String {
    format!("{}{}", OPTION_BRANCH, name)
}

/// Short option name when `full` lives under the namespace
pub fn short_name(full: &str) -> Option<&str> {
    full.strip_prefix(OPTION_BRANCH)
}

/// Declare every option with its default
pub fn declare_options(store: &PrefStore) {
    for option in OPTIONS {
        store.declare(&option_name(option.name), option.default);
    }
}

/// Bound the sort-order options to [1, 4] and `folder_delay` to at least 3
pub fn set_preference_minimum_maximum(store: &PrefStore) -> Result<()> {
    for name in SORT_ORDER_OPTIONS {
        store.set_option_minimum(name, MIN_SORT_ORDER)?;
        store.set_option_maximum(name, MAX_SORT_ORDER)?;
    }
    store.set_option_minimum(FOLDER_DELAY, MIN_FOLDER_DELAY)
}

impl PrefStore {
    pub fn option_bool(&self, name: &str) -> Result<bool> {
        self.get_bool(&option_name(name))
    }

    pub fn option_int(&self, name: &str) -> Result<i64> {
        self.get_int(&option_name(name))
    }

    pub fn option_string(&self, name: &str) -> Result<String> {
        self.get_string(&option_name(name))
    }

    pub fn set_option(&self, name: &str, value: impl Into<PrefValue>) -> Result<PrefValue> {
        self.set(&option_name(name), value)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.has(&option_name(name))
    }

    pub fn reset_option(&self, name: &str) {
        self.reset(&option_name(name))
    }

    pub fn set_option_minimum(&self, name: &str, min: i64) -> Result<()> {
        self.set_minimum(&option_name(name), min)
    }

    pub fn set_option_maximum(&self, name: &str, max: i64) -> Result<()> {
        self.set_maximum(&option_name(name), max)
    }

    /// An option holding whole seconds; negative values count as zero
    pub fn option_seconds(&self, name: &str) -> Result<Duration> {
        let seconds = self.option_int(name)?.max(0);
        Ok(Duration::from_secs(seconds as u64))
    }

    /// Roots and kind ranks from the scope options
    pub fn sort_scope(&self) -> Result<SortScope> {
        Ok(SortScope {
            roots: RootSet {
                menu: self.option_bool(SORT_MENU)?,
                toolbar: self.option_bool(SORT_TOOLBAR)?,
                unsorted: self.option_bool(SORT_UNSORTED)?,
            },
            folder_rank: self.option_int(FOLDER_SORT_ORDER)?,
            livemark_rank: self.option_int(LIVEMARK_SORT_ORDER)?,
            smart_group_rank: self.option_int(SMART_BOOKMARK_SORT_ORDER)?,
            bookmark_rank: self.option_int(BOOKMARK_SORT_ORDER)?,
        })
    }
}
