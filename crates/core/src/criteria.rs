//! Sort criteria and sort scope
//!
//! Preferences encode sort keys as integer positions in a fixed key list.
//! `CriteriaConfigurator` keeps that mapping in one place.

use crate::error::ConfigurationError;
use crate::tree::{ItemKind, RootFolder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute a folder's children can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    Url,
    Description,
    Keyword,
    DateAdded,
    LastModified,
    LastVisited,
    AccessCount,
}

impl SortKey {
    /// Keys in preference-index order
    pub const ALL: [SortKey; 8] = [
        SortKey::Title,
        SortKey::Url,
        SortKey::Description,
        SortKey::Keyword,
        SortKey::DateAdded,
        SortKey::LastModified,
        SortKey::LastVisited,
        SortKey::AccessCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Url => "url",
            SortKey::Description => "description",
            SortKey::Keyword => "keyword",
            SortKey::DateAdded => "dateAdded",
            SortKey::LastModified => "lastModified",
            SortKey::LastVisited => "lastVisited",
            SortKey::AccessCount => "accessCount",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Two-level ordering specification handed to the sort engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCriteria {
    pub primary: SortKey,
    pub primary_inverse: bool,
    pub secondary: SortKey,
    pub secondary_inverse: bool,
}

impl Default for SortCriteria {
    fn default() -> Self {
        Self {
            primary: SortKey::Title,
            primary_inverse: false,
            secondary: SortKey::Url,
            secondary_inverse: false,
        }
    }
}

impl fmt::Display for SortCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = |inverse: bool| if inverse { "desc" } else { "asc" };
        write!(
            f,
            "{} {}, then {} {}",
            self.primary,
            direction(self.primary_inverse),
            self.secondary,
            direction(self.secondary_inverse)
        )
    }
}

/// Maps integer key positions onto an enumerated key list
#[derive(Debug, Clone)]
pub struct CriteriaConfigurator {
    keys: Vec<SortKey>,
}

impl Default for CriteriaConfigurator {
    fn default() -> Self {
        Self::new(SortKey::ALL.to_vec())
    }
}

impl CriteriaConfigurator {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Resolve one key position
    pub fn key(&self, index: i64) -> Result<SortKey, ConfigurationError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.keys.get(i).copied())
            .ok_or(ConfigurationError::SortKeyOutOfRange {
                index,
                len: self.keys.len(),
            })
    }

    /// Build criteria from the four preference values
    pub fn build(
        &self,
        primary_index: i64,
        primary_inverse: bool,
        secondary_index: i64,
        secondary_inverse: bool,
    ) -> Result<SortCriteria, ConfigurationError> {
        Ok(SortCriteria {
            primary: self.key(primary_index)?,
            primary_inverse,
            secondary: self.key(secondary_index)?,
            secondary_inverse,
        })
    }
}

/// Roots the user wants kept in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootSet {
    pub menu: bool,
    pub toolbar: bool,
    pub unsorted: bool,
}

impl Default for RootSet {
    fn default() -> Self {
        Self {
            menu: true,
            toolbar: true,
            unsorted: true,
        }
    }
}

impl RootSet {
    pub fn contains(&self, root: RootFolder) -> bool {
        match root {
            RootFolder::Menu => self.menu,
            RootFolder::Toolbar => self.toolbar,
            RootFolder::Unsorted => self.unsorted,
        }
    }
}

/// Which roots get sorted and how item kinds are grouped before key comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortScope {
    pub roots: RootSet,
    pub folder_rank: i64,
    pub livemark_rank: i64,
    pub smart_group_rank: i64,
    pub bookmark_rank: i64,
}

impl Default for SortScope {
    fn default() -> Self {
        Self {
            roots: RootSet::default(),
            folder_rank: 1,
            livemark_rank: 2,
            smart_group_rank: 3,
            bookmark_rank: 4,
        }
    }
}

impl SortScope {
    /// Rank of a kind; lower ranks sort first
    pub fn rank(&self, kind: ItemKind) -> i64 {
        match kind {
            ItemKind::Folder => self.folder_rank,
            ItemKind::Livemark => self.livemark_rank,
            ItemKind::SmartGroup => self.smart_group_rank,
            ItemKind::Bookmark => self.bookmark_rank,
            // Separators never share a group with other items
            ItemKind::Separator => i64::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_maps_indices_to_keys() {
        let criteria = CriteriaConfigurator::default().build(0, false, 7, true).unwrap();
        assert_eq!(criteria.primary, SortKey::Title);
        assert!(!criteria.primary_inverse);
        assert_eq!(criteria.secondary, SortKey::AccessCount);
        assert!(criteria.secondary_inverse);
    }

    #[test]
    fn test_out_of_range_index_is_configuration_error() {
        let configurator = CriteriaConfigurator::default();
        assert_eq!(
            configurator.build(8, false, 0, false),
            Err(ConfigurationError::SortKeyOutOfRange { index: 8, len: 8 })
        );
        assert_eq!(
            configurator.build(0, false, -1, false),
            Err(ConfigurationError::SortKeyOutOfRange { index: -1, len: 8 })
        );
    }

    #[test]
    fn test_custom_key_list() {
        let configurator = CriteriaConfigurator::new(vec![SortKey::LastVisited, SortKey::Title]);
        let criteria = configurator.build(1, true, 0, false).unwrap();
        assert_eq!(criteria.primary, SortKey::Title);
        assert_eq!(criteria.secondary, SortKey::LastVisited);
        assert!(configurator.key(2).is_err());
    }

    #[test]
    fn test_key_names_match_preference_vocabulary() {
        let names: Vec<_> = SortKey::ALL.iter().map(|key| key.name()).collect();
        assert_eq!(
            names,
            [
                "title",
                "url",
                "description",
                "keyword",
                "dateAdded",
                "lastModified",
                "lastVisited",
                "accessCount"
            ]
        );
    }

    #[test]
    fn test_scope_ranks_and_roots() {
        let scope = SortScope {
            roots: RootSet {
                menu: true,
                toolbar: false,
                unsorted: true,
            },
            ..SortScope::default()
        };
        assert!(scope.rank(ItemKind::Folder) < scope.rank(ItemKind::Bookmark));
        assert!(!scope.roots.contains(RootFolder::Toolbar));
        assert!(scope.roots.contains(RootFolder::Menu));
    }
}
