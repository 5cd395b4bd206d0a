//! `intervaldb` is the persistent interval store behind a personal
//! time-tracking tool: month-sharded datafiles, a tag-to-count cache
//! rebuildable from scratch, and a write-ahead undo journal with
//! transactional grouping, all written through a shared write-temp-
//! then-rename primitive.
//!
//! The store is single-threaded, cooperative, synchronous -- there is
//! no internal task scheduler and no locking across processes; the
//! documented deployment is one user, one process, at a time.
//!
//! Interval validation policy (overlap detection, chunk-splitting
//! across exclusion windows), command-line parsing, and human-readable
//! report rendering are external collaborators' concerns and live
//! outside this crate.

pub mod atomic;
pub mod config;
pub mod datafile;
pub mod error;
pub mod interval;
pub mod journal;
pub mod store;
pub mod tags;
mod util;

pub use crate::config::StoreConfig;
pub use crate::datafile::Datafile;
pub use crate::error::{Error, Result};
pub use crate::interval::{Interval, Range};
pub use crate::journal::{ActionKind, Journal, UndoRecord};
pub use crate::store::{AddOutcome, Iter, Store, TagChange};
pub use crate::tags::{TagIndex, TagInfo};
