//! The data model: [Interval] and [Range].
//!
//! An `Interval` is a half-open `[start, end)` span of wall-clock time,
//! tagged with zero or more tag strings and an optional free-text
//! annotation. `end == None` means the interval is still running --
//! spec.md's "0-epoch" sentinel, represented here as `Option::None`
//! rather than a magic timestamp because the type system already makes
//! "still running" a distinct, unrepresentable-as-garbage state. See
//! DESIGN.md for the open-question writeup.
//!
//! Intervals round-trip through a single line of text, documented below,
//! which is the crate's on-disk canonical form (spec.md §3, §4.1).
//!
//! ```text
//! inc <start> [- <end>] [# <tag> ...] [:: <annotation>]
//! ```
//!
//! * `<start>`/`<end>` use `YYYYMMDDTHHMMSSZ` (always UTC).
//! * an absent `- <end>` means the interval is open.
//! * tags are whitespace separated; a tag containing whitespace or a
//!   double quote is wrapped in quotes, with `\` and `"` backslash
//!   escaped inside.
//! * `:: <annotation>` is optional free text, always last, and is not
//!   itself escaped (everything after the `:: ` marker is taken
//!   verbatim).

use std::{cmp::Ordering, collections::BTreeSet, fmt};

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{Error, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    /// `None` means the interval has no end yet -- still running.
    pub end: Option<DateTime<Utc>>,
    pub tags: BTreeSet<String>,
    pub annotation: Option<String>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Interval {
        Interval {
            start,
            end,
            tags: BTreeSet::new(),
            annotation: None,
        }
    }

    pub fn with_tags<I: IntoIterator<Item = String>>(mut self, tags: I) -> Interval {
        self.tags = tags.into_iter().collect();
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Interval {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Reject an interval whose end does not strictly follow its start.
    /// Mutators call this before touching any on-disk state (spec.md §7,
    /// `InvariantViolation`).
    pub fn validate(&self) -> Result<()> {
        match self.end {
            Some(end) if end <= self.start => Err(Error::InvariantViolation(format!(
                "interval end {} must be strictly after start {}",
                end, self.start
            ))),
            _ => Ok(()),
        }
    }

    /// Half-open overlap test against `range`, matching spec.md §3's
    /// `Range::intersects`.
    pub fn intersects(&self, range: &Range) -> bool {
        range.overlaps(self.start, self.end)
    }

    /// True iff `self.start` falls within `other`'s half-open span.
    pub fn starts_within(&self, other: &Range) -> bool {
        other.contains_instant(self.start)
    }

    pub fn to_line(&self) -> String {
        let mut s = format!("inc {}", self.start.format(TIMESTAMP_FORMAT));
        if let Some(end) = self.end {
            s.push_str(&format!(" - {}", end.format(TIMESTAMP_FORMAT)));
        }
        if !self.tags.is_empty() {
            s.push_str(" #");
            for tag in &self.tags {
                s.push(' ');
                s.push_str(&escape_tag(tag));
            }
        }
        if let Some(ann) = &self.annotation {
            s.push_str(" :: ");
            s.push_str(ann);
        }
        s
    }

    pub fn from_line(line: &str) -> Result<Interval> {
        parse_line(line)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_line())
    }
}

/// Ordering used by [crate::datafile::Datafile] to keep its line list
/// sorted: by start, then by end (open sorts after any closed end
/// sharing the same start), then by the raw serialized line as the
/// final, total tie-break.
pub fn compare_for_sort(a: &Interval, a_line: &str, b: &Interval, b_line: &str) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| match (a.end, b.end) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a_line.cmp(b_line))
}

fn escape_tag(tag: &str) -> String {
    if tag.chars().any(|c| c.is_whitespace() || c == '"') {
        let escaped = tag.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        tag.to_string()
    }
}

fn unescape_tag(tag: &str) -> String {
    tag.replace("\\\"", "\"").replace("\\\\", "\\")
}

fn header_re() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^inc\s+(?P<start>\S+)(?:\s+-\s+(?P<end>\S+))?(?:\s+#(?P<tags>.*))?$").unwrap()
    })
}

fn parse_timestamp(path: &str, s: &str) -> Result<DateTime<Utc>> {
    Utc.datetime_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| Error::InvalidFile(path.to_string(), format!("bad timestamp {:?}: {}", s, e)))
}

fn split_tags(s: &str) -> Result<Vec<String>> {
    let mut tags = vec![];
    let mut chars = s.trim().chars().peekable();
    while chars.peek().is_some() {
        while chars.peek().map_or(false, |c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }
        let mut tok = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(c) => tok.push(c),
                        None => {
                            return Err(Error::InvalidFile(
                                "<line>".to_string(),
                                "unterminated escape in tag".to_string(),
                            ))
                        }
                    },
                    Some('"') => break,
                    Some(c) => tok.push(c),
                    None => {
                        return Err(Error::InvalidFile(
                            "<line>".to_string(),
                            "unterminated quoted tag".to_string(),
                        ))
                    }
                }
            }
        } else {
            while chars.peek().map_or(false, |c| !c.is_whitespace()) {
                tok.push(chars.next().unwrap());
            }
        }
        tags.push(tok);
    }
    Ok(tags)
}

fn parse_line(line: &str) -> Result<Interval> {
    let (header, annotation) = match line.find(" :: ") {
        Some(idx) => (&line[..idx], Some(line[idx + 4..].to_string())),
        None => (line, None),
    };

    let caps = header_re().captures(header.trim_end()).ok_or_else(|| {
        Error::InvalidFile(line.to_string(), "does not match interval line form".to_string())
    })?;

    let start = parse_timestamp(line, &caps["start"])?;
    let end = match caps.name("end") {
        Some(m) => Some(parse_timestamp(line, m.as_str())?),
        None => None,
    };
    if let Some(end) = end {
        if end <= start {
            return Err(Error::InvalidFile(
                line.to_string(),
                "end must be strictly after start".to_string(),
            ));
        }
    }

    let tags: BTreeSet<String> = match caps.name("tags") {
        Some(m) => split_tags(m.as_str())?.into_iter().map(|t| unescape_tag(&t)).collect(),
        None => BTreeSet::new(),
    };

    Ok(Interval {
        start,
        end,
        tags,
        annotation,
    })
}

/// `[start, end)` half-open span used for month ranges and reporting
/// queries. `end == None` means open-ended (spec.md's 0-epoch sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Range {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Range {
        Range { start, end }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains_instant(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && self.end.map_or(true, |end| t < end)
    }

    /// Half-open overlap between `self` and `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
        let before_self_ends = self.end.map_or(true, |se| start < se);
        let after_other_ends = end.map_or(true, |oe| self.start < oe);
        before_self_ends && after_other_ends
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.overlaps(other.start, other.end)
    }

    /// True iff `self.start` lies within `other`.
    pub fn starts_within(&self, other: &Range) -> bool {
        other.contains_instant(self.start)
    }
}

#[cfg(test)]
#[path = "interval_test.rs"]
mod interval_test;
