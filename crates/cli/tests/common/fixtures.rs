//! Temporary preference and bookmark files for CLI tests

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway directory holding `prefs.toml`, `bookmarks.json` and scripts
pub struct TestProfile {
    dir: TempDir,
    pub prefs: String,
    pub tree: String,
}

impl TestProfile {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let prefs = dir.path().join("prefs.toml").display().to_string();
        let tree = dir.path().join("bookmarks.json").display().to_string();
        Self { dir, prefs, tree }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the preference file verbatim
    pub fn write_prefs(&self, toml: &str) {
        std::fs::write(&self.prefs, toml).expect("Failed to write prefs");
    }

    pub fn read_prefs(&self) -> String {
        std::fs::read_to_string(&self.prefs).unwrap_or_default()
    }

    /// Write a bookmark document with the given root contents
    pub fn write_tree(&self, menu: Value, toolbar: Value, unsorted: Value) {
        let document = json!({ "menu": menu, "toolbar": toolbar, "unsorted": unsorted });
        std::fs::write(&self.tree, serde_json::to_vec_pretty(&document).unwrap())
            .expect("Failed to write bookmarks");
    }

    /// Write a JSON-lines script and return its path
    pub fn write_ops(&self, ops: &[Value]) -> String {
        let path: PathBuf = self.dir.path().join("ops.jsonl");
        let lines: Vec<String> = ops.iter().map(Value::to_string).collect();
        std::fs::write(&path, lines.join("\n")).expect("Failed to write ops");
        path.display().to_string()
    }

    /// Titles directly under one root of the saved tree
    pub fn titles(&self, root: &str) -> Vec<String> {
        let contents = std::fs::read_to_string(&self.tree).expect("Failed to read bookmarks");
        let document: Value = serde_json::from_str(&contents).expect("Invalid bookmarks");
        document[root]
            .as_array()
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|node| node["title"].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A bookmark node
pub fn bookmark(title: &str, url: &str) -> Value {
    json!({ "title": title, "url": url })
}

/// A folder node
pub fn folder(title: &str, children: Vec<Value>) -> Value {
    json!({ "kind": "folder", "title": title, "children": children })
}
