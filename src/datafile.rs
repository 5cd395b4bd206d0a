//! One calendar month's worth of interval lines (spec.md §4.1).
//!
//! A `Datafile` mirrors a single `data/YYYY-MM.data` file: its name
//! pins its month range, and its line list is loaded from disk at most
//! once, on first access, and held in memory from then on. The file
//! is rewritten in full -- through [crate::atomic::write_atomic] -- only
//! when it is dirty.
//!
//! The line cache lives behind a `RefCell` so a load can happen through
//! a shared `&self` borrow: [crate::store::Store]'s two-level iterator
//! walks datafiles through `&self.files` and must be able to trigger
//! the first load of whichever file the outer cursor currently sits on
//! without requiring `&mut Store` the whole time it's live.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::atomic;
use crate::error::{Error, Result};
use crate::interval::{compare_for_sort, Interval, Range};
use crate::util;

pub struct Datafile {
    name: String,
    path: PathBuf,
    range: Range,
    lines: RefCell<Option<Vec<String>>>,
    dirty: bool,
}

impl Datafile {
    /// Construct a `Datafile` for the month starting at `month_start`,
    /// rooted under `dir`. Does not touch disk.
    pub fn new(dir: &Path, month_start: chrono::DateTime<chrono::Utc>) -> Datafile {
        let name = format!("{}.data", util::month_stem(month_start));
        let path = dir.join(&name);
        let range = Range::new(month_start, Some(util::next_month_start(month_start)));
        Datafile {
            name,
            path,
            range,
            lines: RefCell::new(None),
            dirty: false,
        }
    }

    /// Parse a `YYYY-MM.data` file name discovered on disk into a
    /// `Datafile`. A name that doesn't match the expected pattern is
    /// not a datafile at all and is ignored by the caller (spec.md
    /// §4.1's "a file whose name does not match ... is ignored at
    /// discovery time").
    pub fn from_name(dir: &Path, file_name: &str) -> Option<Datafile> {
        let stem = file_name.strip_suffix(".data")?;
        let month_start = util::parse_month_stem(stem)?;
        Some(Datafile::new(dir, month_start))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Ordered sequence of serialized interval lines, loading from disk
    /// on first call. Takes `&self`, not `&mut self`: the load populates
    /// a `RefCell`, so a caller holding only a shared borrow of the
    /// datafile (e.g. the store's iterator, mid-traversal) can still
    /// trigger the one-time read.
    pub fn all_lines(&self) -> Result<std::cell::Ref<'_, [String]>> {
        self.ensure_loaded()?;
        Ok(std::cell::Ref::map(self.lines.borrow(), |opt| {
            opt.as_deref().unwrap()
        }))
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.lines.borrow().is_some() {
            return Ok(());
        }
        let lines = if atomic::exists(&self.path) {
            let text = atomic::read_to_string(&self.path)?;
            text.lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| l.to_string())
                .collect()
        } else {
            vec![]
        };
        *self.lines.borrow_mut() = Some(lines);
        Ok(())
    }

    /// Insert `iv`'s serialized line at its sorted position. The caller
    /// has already confirmed `iv.start` lies within `range()`. Returns
    /// `true` iff the line list actually changed (the identical line
    /// wasn't already present).
    pub fn add_interval(&mut self, iv: &Interval) -> Result<bool> {
        self.ensure_loaded()?;
        let line = iv.to_line();
        let mut lines = self.lines.borrow_mut();
        let lines = lines.as_mut().unwrap();

        let idx = binary_search_insertion_point(lines, iv, &line);
        match idx {
            Ok(_) => Ok(false), // identical line already present
            Err(pos) => {
                lines.insert(pos, line);
                self.dirty = true;
                Ok(true)
            }
        }
    }

    /// Remove `iv`'s serialized line. Absence is tolerated and reported
    /// via `false`.
    pub fn delete_interval(&mut self, iv: &Interval) -> Result<bool> {
        self.ensure_loaded()?;
        let line = iv.to_line();
        let mut lines = self.lines.borrow_mut();
        let lines = lines.as_mut().unwrap();

        match binary_search_insertion_point(lines, iv, &line) {
            Ok(pos) => {
                lines.remove(pos);
                self.dirty = true;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Flush the full line list atomically if dirty, then clear the
    /// dirty flag.
    pub fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.ensure_loaded()?;
        let lines = self.lines.borrow();
        let lines = lines.as_ref().unwrap();
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        atomic::write_atomic(&self.path, content.as_bytes())?;
        drop(lines);
        self.dirty = false;
        Ok(())
    }

    pub fn dump(&self) -> String {
        format!(
            "{} range=[{}, {:?}) lines={} dirty={}",
            self.name,
            self.range.start,
            self.range.end,
            self.lines.borrow().as_ref().map_or(0, |l| l.len()),
            self.dirty,
        )
    }
}

/// Binary search over already-loaded lines for `iv`/`line`'s sorted
/// position, per spec.md §4.1's ordering policy. `Ok(idx)` means the
/// byte-identical line is already present at `idx`; `Err(idx)` is the
/// insertion point.
fn binary_search_insertion_point(
    lines: &[String],
    iv: &Interval,
    line: &str,
) -> std::result::Result<usize, usize> {
    lines.binary_search_by(|existing| {
        // A malformed existing line can't happen in practice (we wrote
        // every line ourselves), but don't panic on it either -- sort
        // it last so a corrupt line doesn't wedge the search.
        match Interval::from_line(existing) {
            Ok(existing_iv) => compare_for_sort(&existing_iv, existing, iv, line),
            Err(_) => std::cmp::Ordering::Less,
        }
    })
}

pub fn invariant_start_in_range(iv: &Interval, range: &Range) -> Result<()> {
    if range.contains_instant(iv.start) {
        Ok(())
    } else {
        Err(Error::InvariantViolation(format!(
            "interval start {} outside datafile range [{}, {:?})",
            iv.start, range.start, range.end
        )))
    }
}

#[cfg(test)]
#[path = "datafile_test.rs"]
mod datafile_test;
