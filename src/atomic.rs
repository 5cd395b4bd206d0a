//! Write-temp-then-rename primitive shared by every persistent writer in
//! this crate (spec.md §4.5).
//!
//! `write_atomic` never leaves a torn file at `path`: it writes the full
//! content to a sibling `.tmp` file, flushes it, and renames it into
//! place. A failure before the rename removes the temp file and leaves
//! `path` untouched. Since the store documents itself as single process
//! / single writer (spec.md §5), a fixed `.tmp` suffix is enough --
//! there is no concurrent writer to collide with.

use std::{
    ffi::OsString,
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use crate::error::Result;
use crate::err_at;

pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    let result = (|| -> Result<()> {
        if let Some(parent) = path.parent() {
            err_at!(IO, parent, fs::create_dir_all(parent))?;
        }
        let mut file = err_at!(IO, &tmp, fs::File::create(&tmp))?;
        err_at!(IO, &tmp, file.write_all(content))?;
        err_at!(IO, &tmp, file.sync_all())?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            err_at!(IO, path, fs::rename(&tmp, path))?;
            Ok(())
        }
        Err(err) => {
            fs::remove_file(&tmp).ok();
            Err(err)
        }
    }
}

/// Buffered whole-file read, used by every component that loads its
/// state back from disk (Datafile, Tag Index, Undo Journal).
pub fn read_to_string(path: &Path) -> Result<String> {
    let mut file = err_at!(IO, path, fs::File::open(path))?;
    let mut out = String::new();
    err_at!(IO, path, file.read_to_string(&mut out))?;
    Ok(out)
}

pub fn exists(path: &Path) -> bool {
    path.is_file()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "atomic_test.rs"]
mod atomic_test;
