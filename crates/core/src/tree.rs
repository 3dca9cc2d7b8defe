//! Tree representation for bookmark hierarchies

use crate::error::TreeError;
use crate::Result;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of any node in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

/// Identifier of a node known to be a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub u64);

impl From<FolderId> for ItemId {
    fn from(folder: FolderId) -> Self {
        ItemId(folder.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    /// Regular bookmark
    Bookmark,
    /// Folder owning an ordered list of children
    Folder,
    /// Separator line; splits its folder into independently sorted groups
    Separator,
    /// Live bookmark (feed)
    Livemark,
    /// Saved query ("smart bookmark")
    SmartGroup,
}

impl ItemKind {
    pub fn is_folder(self) -> bool {
        self == ItemKind::Folder
    }
}

/// Hidden root holding the three Places roots
pub const PLACES_ROOT: FolderId = FolderId(1);

/// Top-level folders users can choose to keep sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootFolder {
    Menu,
    Toolbar,
    Unsorted,
}

impl RootFolder {
    pub const ALL: [RootFolder; 3] = [RootFolder::Menu, RootFolder::Toolbar, RootFolder::Unsorted];

    pub fn id(self) -> FolderId {
        match self {
            RootFolder::Menu => FolderId(2),
            RootFolder::Toolbar => FolderId(3),
            RootFolder::Unsorted => FolderId(4),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RootFolder::Menu => "Bookmarks Menu",
            RootFolder::Toolbar => "Bookmarks Toolbar",
            RootFolder::Unsorted => "Other Bookmarks",
        }
    }

    pub fn from_id(id: ItemId) -> Option<Self> {
        Self::ALL.into_iter().find(|root| ItemId::from(root.id()) == id)
    }
}

/// A node of the bookmark tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Containing folder (lookup only; `None` for the hidden root)
    pub parent: Option<FolderId>,
    pub title: String,
    pub url: Option<String>,
    pub keyword: Option<String>,
    pub description: Option<String>,
    /// Unix milliseconds
    pub date_added: u64,
    pub last_modified: u64,
    /// Unix milliseconds of the last visit, 0 when never visited
    pub last_visited: u64,
    pub access_count: u64,
    children: Vec<ItemId>,
    /// Folder created and not yet changed
    fresh: bool,
}

impl Item {
    /// Folder containing this item
    pub fn folder(&self) -> Option<FolderId> {
        self.parent
    }

    /// Ordered children (empty for non-folders)
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }
}

/// Attributes of an item about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub kind: ItemKind,
    pub title: String,
    pub url: Option<String>,
    pub keyword: Option<String>,
    pub description: Option<String>,
}

impl NewItem {
    fn with_kind(kind: ItemKind, title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            url,
            keyword: None,
            description: None,
        }
    }

    pub fn bookmark(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(ItemKind::Bookmark, title, Some(url.into()))
    }

    pub fn folder(title: impl Into<String>) -> Self {
        Self::with_kind(ItemKind::Folder, title, None)
    }

    pub fn separator() -> Self {
        Self::with_kind(ItemKind::Separator, "", None)
    }

    pub fn livemark(title: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self::with_kind(ItemKind::Livemark, title, Some(feed_url.into()))
    }

    pub fn smart_group(title: impl Into<String>, query: impl Into<String>) -> Self {
        Self::with_kind(ItemKind::SmartGroup, title, Some(query.into()))
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Attribute edits; `None` leaves the attribute unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The complete bookmark hierarchy
///
/// Items live in a flat map; folders keep the ordered ids of their children.
#[derive(Debug, Clone)]
pub struct BookmarkTree {
    items: AHashMap<ItemId, Item>,
    next_id: u64,
}

impl Default for BookmarkTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkTree {
    /// Create a tree holding only the Places roots
    pub fn new() -> Self {
        let mut items = AHashMap::new();
        let root_children = RootFolder::ALL
            .iter()
            .map(|root| ItemId::from(root.id()))
            .collect();

        items.insert(
            PLACES_ROOT.into(),
            blank_item(PLACES_ROOT.into(), ItemKind::Folder, None, String::new(), root_children),
        );
        for root in RootFolder::ALL {
            items.insert(
                root.id().into(),
                blank_item(
                    root.id().into(),
                    ItemKind::Folder,
                    Some(PLACES_ROOT),
                    root.title().to_string(),
                    Vec::new(),
                ),
            );
        }

        Self { items, next_id: 5 }
    }

    /// Get an item by id
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of user items (roots excluded)
    pub fn len(&self) -> usize {
        self.items.len() - 1 - RootFolder::ALL.len()
    }

    /// Check if the tree holds no user items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered children of a folder
    pub fn children(&self, folder: FolderId) -> Result<&[ItemId]> {
        Ok(self.folder(folder)?.children())
    }

    /// Folder containing `id`
    pub fn folder_of(&self, id: ItemId) -> Result<FolderId> {
        let item = self.items.get(&id).ok_or(TreeError::UnknownItem(id))?;
        item.parent.ok_or(TreeError::ProtectedRoot(id))
    }

    /// Places root that `id` lives under, if any
    pub fn root_of(&self, id: ItemId) -> Option<RootFolder> {
        let mut current = id;
        loop {
            if let Some(root) = RootFolder::from_id(current) {
                return Some(root);
            }
            current = self.items.get(&current)?.parent?.into();
        }
    }

    /// `folder` and every folder below it, parents before children
    pub fn folders_under(&self, folder: FolderId) -> Vec<FolderId> {
        let mut found = Vec::new();
        let mut stack = vec![ItemId::from(folder)];
        while let Some(id) = stack.pop() {
            let Some(item) = self.items.get(&id) else {
                continue;
            };
            if !item.kind.is_folder() {
                continue;
            }
            found.push(FolderId(id.0));
            stack.extend(item.children.iter().rev().copied());
        }
        found
    }

    /// Check whether `id` is `ancestor` or lives below it
    pub fn is_within(&self, id: ItemId, ancestor: FolderId) -> bool {
        let mut current = Some(id);
        while let Some(cursor) = current {
            if cursor == ItemId::from(ancestor) {
                return true;
            }
            current = self.items.get(&cursor).and_then(|item| item.parent.map(ItemId::from));
        }
        false
    }

    /// Insert a new item into `parent` at `index` (appended when `None` or past the end)
    pub fn insert(
        &mut self,
        parent: FolderId,
        index: Option<usize>,
        new: NewItem,
        now_ms: u64,
    ) -> Result<ItemId> {
        self.folder(parent)?;

        let id = ItemId(self.next_id);
        self.next_id += 1;

        let mut item = blank_item(id, new.kind, Some(parent), new.title, Vec::new());
        item.url = new.url;
        item.keyword = new.keyword;
        item.description = new.description;
        item.date_added = now_ms;
        item.last_modified = now_ms;
        item.fresh = new.kind.is_folder();
        self.items.insert(id, item);

        let children = &mut self.folder_mut(parent)?.children;
        let at = index.unwrap_or(children.len()).min(children.len());
        children.insert(at, id);

        Ok(id)
    }

    /// Move an item to `parent` at `index`
    pub fn relocate(
        &mut self,
        id: ItemId,
        parent: FolderId,
        index: Option<usize>,
        now_ms: u64,
    ) -> Result<()> {
        let old_parent = self.movable_parent(id)?;
        self.folder(parent)?;
        if self.is_within(parent.into(), FolderId(id.0)) {
            return Err(TreeError::InvalidMove { item: id, target: parent });
        }

        self.folder_mut(old_parent)?.children.retain(|child| *child != id);
        let children = &mut self.folder_mut(parent)?.children;
        let at = index.unwrap_or(children.len()).min(children.len());
        children.insert(at, id);

        if let Some(item) = self.items.get_mut(&id) {
            item.parent = Some(parent);
            item.last_modified = now_ms;
        }
        Ok(())
    }

    /// Remove an item and, for folders, everything below it
    pub fn detach(&mut self, id: ItemId) -> Result<Item> {
        let parent = self.movable_parent(id)?;
        self.folder_mut(parent)?.children.retain(|child| *child != id);

        let mut stack: Vec<ItemId> = self
            .items
            .get(&id)
            .map(|item| item.children.clone())
            .unwrap_or_default();
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.items.remove(&child) {
                stack.extend(removed.children);
            }
        }

        self.items.remove(&id).ok_or(TreeError::UnknownItem(id))
    }

    /// Apply attribute edits; returns whether this was the first change of a new folder
    pub fn apply_change(&mut self, id: ItemId, change: ItemChange, now_ms: u64) -> Result<bool> {
        let item = self.items.get_mut(&id).ok_or(TreeError::UnknownItem(id))?;
        if let Some(title) = change.title {
            item.title = title;
        }
        if let Some(url) = change.url {
            item.url = Some(url);
        }
        if let Some(keyword) = change.keyword {
            item.keyword = Some(keyword);
        }
        if let Some(description) = change.description {
            item.description = Some(description);
        }
        item.last_modified = now_ms;
        Ok(std::mem::replace(&mut item.fresh, false))
    }

    /// Record a visit to a bookmark
    pub fn record_visit(&mut self, id: ItemId, now_ms: u64) -> Result<()> {
        let item = self.items.get_mut(&id).ok_or(TreeError::UnknownItem(id))?;
        item.last_visited = now_ms;
        item.access_count += 1;
        Ok(())
    }

    /// Rewrite the order of a folder's children in place
    ///
    /// The closure must return a permutation of the ids it was given.
    pub(crate) fn reorder_children<F>(&mut self, folder: FolderId, reorder: F) -> Result<()>
    where
        F: FnOnce(&Self, &mut Vec<ItemId>),
    {
        let mut children = std::mem::take(&mut self.folder_mut(folder)?.children);
        reorder(self, &mut children);
        self.folder_mut(folder)?.children = children;
        Ok(())
    }

    /// Convert to the nested on-disk document
    pub fn to_document(&self) -> TreeDocument {
        let export = |root: RootFolder| -> Vec<NodeDocument> {
            self.items
                .get(&root.id().into())
                .map(|item| item.children.iter().filter_map(|id| self.export_node(*id)).collect())
                .unwrap_or_default()
        };
        TreeDocument {
            menu: export(RootFolder::Menu),
            toolbar: export(RootFolder::Toolbar),
            unsorted: export(RootFolder::Unsorted),
        }
    }

    /// Build a tree from the nested on-disk document
    pub fn from_document(document: TreeDocument) -> Result<Self> {
        let mut tree = Self::new();
        for (root, nodes) in [
            (RootFolder::Menu, document.menu),
            (RootFolder::Toolbar, document.toolbar),
            (RootFolder::Unsorted, document.unsorted),
        ] {
            for node in nodes {
                tree.import_node(root.id(), node)?;
            }
        }
        Ok(tree)
    }

    fn export_node(&self, id: ItemId) -> Option<NodeDocument> {
        let item = self.items.get(&id)?;
        Some(NodeDocument {
            kind: Some(item.kind),
            title: item.title.clone(),
            url: item.url.clone(),
            keyword: item.keyword.clone(),
            description: item.description.clone(),
            date_added: item.date_added,
            last_modified: item.last_modified,
            last_visited: item.last_visited,
            access_count: item.access_count,
            children: item.children.iter().filter_map(|child| self.export_node(*child)).collect(),
        })
    }

    fn import_node(&mut self, parent: FolderId, node: NodeDocument) -> Result<()> {
        let kind = node.inferred_kind();
        let new = NewItem {
            kind,
            title: node.title,
            url: node.url,
            keyword: node.keyword,
            description: node.description,
        };
        let id = self.insert(parent, None, new, node.date_added)?;
        if let Some(item) = self.items.get_mut(&id) {
            item.last_modified = node.last_modified;
            item.last_visited = node.last_visited;
            item.access_count = node.access_count;
            item.fresh = false;
        }
        if kind.is_folder() {
            for child in node.children {
                self.import_node(FolderId(id.0), child)?;
            }
        }
        Ok(())
    }

    fn folder(&self, folder: FolderId) -> Result<&Item> {
        let id = ItemId::from(folder);
        let item = self.items.get(&id).ok_or(TreeError::UnknownItem(id))?;
        if !item.kind.is_folder() {
            return Err(TreeError::NotAFolder(id));
        }
        Ok(item)
    }

    fn folder_mut(&mut self, folder: FolderId) -> Result<&mut Item> {
        let id = ItemId::from(folder);
        let item = self.items.get_mut(&id).ok_or(TreeError::UnknownItem(id))?;
        if !item.kind.is_folder() {
            return Err(TreeError::NotAFolder(id));
        }
        Ok(item)
    }

    /// Parent of a user item; roots are protected
    fn movable_parent(&self, id: ItemId) -> Result<FolderId> {
        if id == ItemId::from(PLACES_ROOT) || RootFolder::from_id(id).is_some() {
            return Err(TreeError::ProtectedRoot(id));
        }
        self.folder_of(id)
    }
}

fn blank_item(
    id: ItemId,
    kind: ItemKind,
    parent: Option<FolderId>,
    title: String,
    children: Vec<ItemId>,
) -> Item {
    Item {
        id,
        kind,
        parent,
        title,
        url: None,
        keyword: None,
        description: None,
        date_added: 0,
        last_modified: 0,
        last_visited: 0,
        access_count: 0,
        children,
        fresh: false,
    }
}

/// Current time in Unix milliseconds
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Nested JSON form of a bookmark tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub menu: Vec<NodeDocument>,
    #[serde(default)]
    pub toolbar: Vec<NodeDocument>,
    #[serde(default)]
    pub unsorted: Vec<NodeDocument>,
}

/// One node of a `TreeDocument`
///
/// `kind` may be omitted: a node with a url is a bookmark, one with neither url nor
/// title is a separator, anything else is a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ItemKind>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub date_added: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_modified: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_visited: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub access_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDocument>,
}

impl NodeDocument {
    fn inferred_kind(&self) -> ItemKind {
        match (self.kind, &self.url) {
            (Some(kind), _) => kind,
            (None, Some(_)) => ItemKind::Bookmark,
            (None, None) if self.title.is_empty() && self.children.is_empty() => ItemKind::Separator,
            (None, None) => ItemKind::Folder,
        }
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> FolderId {
        RootFolder::Menu.id()
    }

    #[test]
    fn test_new_tree_has_places_roots() {
        let tree = BookmarkTree::new();
        assert!(tree.is_empty());
        for root in RootFolder::ALL {
            assert_eq!(tree.folder_of(root.id().into()).unwrap(), PLACES_ROOT);
            assert_eq!(tree.root_of(root.id().into()), Some(root));
        }
    }

    #[test]
    fn test_insert_appends_and_clamps_index() {
        let mut tree = BookmarkTree::new();
        let a = tree.insert(menu(), None, NewItem::bookmark("a", "https://a"), 1).unwrap();
        let b = tree.insert(menu(), Some(99), NewItem::bookmark("b", "https://b"), 2).unwrap();
        let c = tree.insert(menu(), Some(0), NewItem::bookmark("c", "https://c"), 3).unwrap();

        assert_eq!(tree.children(menu()).unwrap(), &[c, a, b]);
        assert_eq!(tree.folder_of(a).unwrap(), menu());
        assert_eq!(tree.get(a).unwrap().date_added, 1);
    }

    #[test]
    fn test_insert_into_non_folder_fails() {
        let mut tree = BookmarkTree::new();
        let a = tree.insert(menu(), None, NewItem::bookmark("a", "https://a"), 1).unwrap();
        let err = tree.insert(FolderId(a.0), None, NewItem::separator(), 2).unwrap_err();
        assert!(matches!(err, TreeError::NotAFolder(id) if id == a));
    }

    #[test]
    fn test_relocate_rejects_cycles_and_roots() {
        let mut tree = BookmarkTree::new();
        let outer = tree.insert(menu(), None, NewItem::folder("outer"), 1).unwrap();
        let inner = tree.insert(FolderId(outer.0), None, NewItem::folder("inner"), 1).unwrap();

        let err = tree.relocate(outer, FolderId(inner.0), None, 2).unwrap_err();
        assert!(matches!(err, TreeError::InvalidMove { .. }));

        let err = tree
            .relocate(RootFolder::Toolbar.id().into(), menu(), None, 2)
            .unwrap_err();
        assert!(matches!(err, TreeError::ProtectedRoot(_)));

        tree.relocate(inner, RootFolder::Toolbar.id(), None, 3).unwrap();
        assert_eq!(tree.root_of(inner), Some(RootFolder::Toolbar));
        assert!(tree.children(FolderId(outer.0)).unwrap().is_empty());
    }

    #[test]
    fn test_detach_removes_subtree() {
        let mut tree = BookmarkTree::new();
        let folder = tree.insert(menu(), None, NewItem::folder("f"), 1).unwrap();
        let child = tree
            .insert(FolderId(folder.0), None, NewItem::bookmark("x", "https://x"), 1)
            .unwrap();

        let removed = tree.detach(folder).unwrap();
        assert_eq!(removed.kind, ItemKind::Folder);
        assert!(!tree.contains(child));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_first_change_of_new_folder_is_reported_once() {
        let mut tree = BookmarkTree::new();
        let folder = tree.insert(menu(), None, NewItem::folder("New Folder"), 1).unwrap();
        let rename = ItemChange {
            title: Some("Recipes".into()),
            ..ItemChange::default()
        };

        assert!(tree.apply_change(folder, rename.clone(), 2).unwrap());
        assert!(!tree.apply_change(folder, rename, 3).unwrap());
        assert_eq!(tree.get(folder).unwrap().title, "Recipes");
    }

    #[test]
    fn test_document_preserves_structure() {
        let json = r#"{
            "menu": [
                {"title": "News", "children": [
                    {"title": "LWN", "url": "https://lwn.net", "access_count": 4}
                ]},
                {},
                {"title": "Rust", "url": "https://rust-lang.org", "keyword": "rs"}
            ],
            "toolbar": [{"kind": "livemark", "title": "Feed", "url": "https://feed"}]
        }"#;
        let document: TreeDocument = serde_json::from_str(json).unwrap();
        let tree = BookmarkTree::from_document(document).unwrap();

        let top = tree.children(menu()).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(tree.get(top[0]).unwrap().kind, ItemKind::Folder);
        assert_eq!(tree.get(top[1]).unwrap().kind, ItemKind::Separator);
        assert_eq!(tree.get(top[2]).unwrap().keyword.as_deref(), Some("rs"));

        let exported = tree.to_document();
        assert_eq!(exported.menu[0].children[0].access_count, 4);
        assert_eq!(exported.toolbar[0].kind, Some(ItemKind::Livemark));
        assert!(exported.unsorted.is_empty());
    }
}
