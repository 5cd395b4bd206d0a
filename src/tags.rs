//! Tag-to-reference-count cache (spec.md §4.3).
//!
//! The Segmented Store's interval set is ground truth; `TagIndex` is a
//! cache that can always be rebuilt from it. The on-disk sidecar is a
//! single JSON object keyed by tag name, value `{"count": <uint>, ...}`,
//! with unknown keys in each tag object preserved round-trip.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::atomic;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    pub count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct TagIndex {
    path: PathBuf,
    entries: BTreeMap<String, TagInfo>,
    dirty: bool,
}

impl TagIndex {
    /// Load the sidecar at `path`. On a missing file or a parse failure,
    /// logs to stderr and rebuilds from `lines` (every serialized
    /// interval line currently recorded in the Segmented Store), then
    /// writes the fresh sidecar atomically. On a clean parse, the dirty
    /// flag starts clear so the sidecar isn't rewritten without cause.
    pub fn open<'a, I>(path: &Path, lines: I) -> Result<TagIndex>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match Self::load(path) {
            Ok(entries) => Ok(TagIndex {
                path: path.to_path_buf(),
                entries,
                dirty: false,
            }),
            Err(reason) => {
                eprintln!(
                    "tag index at {:?} unreadable ({}), rebuilding from stored intervals",
                    path, reason
                );
                let mut index = TagIndex {
                    path: path.to_path_buf(),
                    entries: BTreeMap::new(),
                    dirty: true,
                };
                index.rebuild(lines)?;
                index.flush()?;
                eprintln!("tag index rebuilt: {} tag(s)", index.entries.len());
                Ok(index)
            }
        }
    }

    /// Cheap existence+parse check used by [crate::store::Store::open] to
    /// decide whether it needs to force-load every datafile for a
    /// rebuild, or can leave them lazily unloaded.
    pub fn probe(path: &Path) -> bool {
        Self::load(path).is_ok()
    }

    fn load(path: &Path) -> std::result::Result<BTreeMap<String, TagInfo>, String> {
        if !atomic::exists(path) {
            return Err("file does not exist".to_string());
        }
        let text = atomic::read_to_string(path).map_err(|e| e.to_string())?;
        let raw: Map<String, Value> = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        let mut entries = BTreeMap::new();
        for (tag, value) in raw {
            let info: TagInfo = serde_json::from_value(value)
                .map_err(|e| format!("tag {:?}: {}", tag, e))?;
            entries.insert(tag, info);
        }
        Ok(entries)
    }

    fn rebuild<'a, I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.entries.clear();
        for line in lines {
            let iv = crate::interval::Interval::from_line(line)?;
            for tag in iv.tags {
                self.increment_tag(&tag);
            }
        }
        Ok(())
    }

    pub fn add(&mut self, tag: &str, info: TagInfo) {
        self.entries.insert(tag.to_string(), info);
        self.dirty = true;
    }

    /// Increment `tag`'s count. Returns the previous count, or `-1` if
    /// the tag was previously absent.
    pub fn increment_tag(&mut self, tag: &str) -> i64 {
        self.dirty = true;
        match self.entries.get_mut(tag) {
            Some(info) => {
                let prev = info.count as i64;
                info.count += 1;
                prev
            }
            None => {
                self.entries.insert(tag.to_string(), TagInfo { count: 1, extra: Map::new() });
                -1
            }
        }
    }

    /// Decrement `tag`'s count, clamped at zero. The entry is retained
    /// (with count zero) rather than removed -- spec.md §3: "tags with
    /// count zero are retained, removal is explicit".
    pub fn decrement_tag(&mut self, tag: &str) {
        self.dirty = true;
        match self.entries.get_mut(tag) {
            Some(info) => info.count = info.count.saturating_sub(1),
            None => {
                self.entries.insert(tag.to_string(), TagInfo::default());
            }
        }
    }

    pub fn count(&self, tag: &str) -> u64 {
        self.entries.get(tag).map_or(0, |info| info.count)
    }

    pub fn tags(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    pub fn clear_modified(&mut self) {
        self.dirty = false;
    }

    pub fn to_json(&self) -> Result<String> {
        let mut obj = Map::new();
        for (tag, info) in &self.entries {
            let value = serde_json::to_value(info).map_err(|e| {
                Error::InvalidFile(format!("{:?}", self.path), e.to_string())
            })?;
            obj.insert(tag.clone(), value);
        }
        serde_json::to_string_pretty(&obj)
            .map_err(|e| Error::InvalidFile(format!("{:?}", self.path), e.to_string()))
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let json = self.to_json()?;
        atomic::write_atomic(&self.path, json.as_bytes())?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tags_test.rs"]
mod tags_test;
