//! Crate wide error type.
//!
//! Every fallible operation in this crate returns [Result], which is a
//! type alias over [Error]. Use the [err_at] macro at call sites that
//! convert a foreign error (mostly [std::io::Error]) into one of our
//! variants -- it stamps the originating `file:line` onto the message so
//! failures reported by a caller several layers up can still be traced
//! back to the exact propagation point.

use std::{fmt, io, result};

use crate::interval::Interval;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// A data file failed to read or parse. Carries the file name and a
    /// human readable reason.
    InvalidFile(String, String),
    /// `delete_interval` could not find the datafile expected to own the
    /// interval's start instant.
    NotFound(Interval),
    /// Undo journal persistence failed because the configured bound is
    /// unusable or the write itself failed.
    JournalFull(String),
    /// Generic disk failure surfaced by the atomic writer, tagged with
    /// the path that was being read or written.
    IO(String, io::Error),
    /// An internal invariant was violated -- a bug, not a data problem.
    InvariantViolation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidFile(path, reason) => {
                write!(f, "invalid data file {:?}: {}", path, reason)
            }
            Error::NotFound(iv) => write!(f, "no datafile covers interval start {}", iv.start),
            Error::JournalFull(reason) => write!(f, "undo journal unavailable: {}", reason),
            Error::IO(path, err) => write!(f, "I/O error on {:?}: {}", path, err),
            Error::InvariantViolation(desc) => write!(f, "invariant violation: {}", desc),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(_, err) => Some(err),
            _ => None,
        }
    }
}

/// Tag a foreign `Result`/expression with file:line and fold it into one
/// of our `Error` variants.
///
/// ```ignore
/// let f = err_at!(IO, path, fs::File::open(&path))?;
/// err_at!(InvariantViolation, msg: "bad state for {}", name)?;
/// ```
#[macro_export]
macro_rules! err_at {
    (IO, $path:expr, $e:expr) => {
        $e.map_err(|err: std::io::Error| {
            $crate::error::Error::IO(format!("{:?}", $path), err)
        })
    };
    (InvalidFile, $path:expr, $reason:expr) => {
        Err($crate::error::Error::InvalidFile(
            format!("{:?}", $path),
            $reason.to_string(),
        ))
    };
    (InvariantViolation, msg: $($arg:tt)+) => {
        Err($crate::error::Error::InvariantViolation(format!(
            "{} ({}:{})",
            format!($($arg)+),
            file!(),
            line!()
        )))
    };
    (JournalFull, msg: $($arg:tt)+) => {
        Err($crate::error::Error::JournalFull(format!(
            "{} ({}:{})",
            format!($($arg)+),
            file!(),
            line!()
        )))
    };
}
