//! The sort engine seam
//!
//! The reaction layer decides *when* and *what* to sort; implementations of
//! `SortEngine` decide *how*.

use crate::criteria::{SortCriteria, SortScope};
use crate::tree::FolderId;
use anyhow::Result;

/// Something that can reorder folders of the bookmark tree
pub trait SortEngine: Send + Sync {
    /// Reorder the children of one folder
    fn sort_folder(&self, folder: FolderId) -> Result<()>;

    /// Reorder every folder of every enabled root
    fn sort_all(&self) -> Result<()>;

    /// Replace the active criteria; used by every sort that runs afterwards
    fn set_criteria(&self, criteria: SortCriteria);

    /// Replace the active scope (enabled roots, kind ranks)
    fn set_scope(&self, _scope: SortScope) {}

    /// Resume after `stop`
    fn start(&self) {}

    /// Pause while the tree is inside a bulk mutation
    fn stop(&self) {}
}
