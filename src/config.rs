//! Store-level configuration (spec.md §6).
//!
//! Parsing a human-authored config *file* format remains an external
//! collaborator's job (spec.md §1's non-goals); what belongs here is the
//! handful of settings the store itself interprets, and the directory
//! layout resolution (`$TIMEWARRIORDB`, falling back to `~/.timewarrior`)
//! that every other component in this crate is rooted under.

use std::{env, path::PathBuf};

/// Default journal bound, matching spec.md §6's "a few thousand
/// transactions".
pub const DEFAULT_JOURNAL_SIZE: i64 = 2_000;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root of the `data/` directory tree. See [StoreConfig::resolve_location].
    pub location: PathBuf,
    /// `journal.size`: bounds the undo log (0 = unbounded, negative =
    /// disable persistence).
    pub journal_size: i64,
    /// `verbose`: controls whether `Store::add_interval` reports
    /// newly-seen tags in its structured result.
    pub verbose: bool,
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            location: Self::resolve_location(),
            journal_size: DEFAULT_JOURNAL_SIZE,
            verbose: false,
        }
    }
}

impl StoreConfig {
    /// `$TIMEWARRIORDB` if set, otherwise `~/.timewarrior`.
    pub fn resolve_location() -> PathBuf {
        if let Some(dir) = env::var_os("TIMEWARRIORDB") {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".timewarrior")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.location.join("data")
    }

    pub fn tags_path(&self) -> PathBuf {
        self.data_dir().join("tags.data")
    }

    pub fn undo_path(&self) -> PathBuf {
        self.data_dir().join("undo.data")
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
