//! BibTeX identifier extraction for `.bib` input files.
//!
//! Entries are consumed lazily, one `@...{...}` record at a time, and each
//! record is treated as a flat key-value block: keys are case-insensitive,
//! values may be wrapped in `{...}` or `"..."`, and inner newlines collapse
//! to spaces. The identifier is taken in preference order doi → url → pmid;
//! records carrying none of the three are silently dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Identifier, SourceError};

/// Identifier fields checked on each entry, in preference order.
const IDENTIFIER_KEYS: [&str; 3] = ["doi", "url", "pmid"];

/// Lazy iterator over identifiers in a `.bib` file.
///
/// The file is read line by line and entries are delimited by lines starting
/// with `@`, so large bibliographies are never loaded as a single in-memory
/// batch. Re-opening the path restarts the sequence.
#[derive(Debug)]
pub struct BibIdentifiers {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    /// Text of the entry currently being accumulated.
    pending: String,
    done: bool,
}

impl BibIdentifiers {
    /// Opens `path` for iteration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::FileRead`] when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            pending: String::new(),
            done: false,
        })
    }

    /// Reads lines until the next entry boundary, returning the finished
    /// entry text, or `None` at end of input.
    fn next_entry(&mut self) -> Option<Result<String, SourceError>> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if line.trim_start().starts_with('@') && !self.pending.trim().is_empty() {
                        let entry = std::mem::take(&mut self.pending);
                        self.pending.push_str(&line);
                        self.pending.push(' ');
                        return Some(Ok(entry));
                    }
                    self.pending.push_str(&line);
                    self.pending.push(' ');
                }
                Some(Err(source)) => {
                    self.done = true;
                    return Some(Err(SourceError::FileRead {
                        path: self.path.clone(),
                        source,
                    }));
                }
                None => {
                    self.done = true;
                    let entry = std::mem::take(&mut self.pending);
                    if entry.trim().is_empty() {
                        return None;
                    }
                    return Some(Ok(entry));
                }
            }
        }
    }
}

impl Iterator for BibIdentifiers {
    type Item = Result<Identifier, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_entry()? {
                Ok(entry) => {
                    if let Some(id) = identifier_from_entry(&entry) {
                        return Some(Ok(id));
                    }
                    debug!(
                        path = %self.path.display(),
                        "skipping BibTeX entry without doi/url/pmid"
                    );
                }
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Extracts the preferred identifier from one entry's text.
fn identifier_from_entry(entry: &str) -> Option<Identifier> {
    let trimmed = entry.trim();
    if !trimmed.starts_with('@') {
        return None;
    }
    // Field list starts after the citation key, i.e. after the first
    // top-level comma inside the braces.
    let body = trimmed.split_once('{').map(|(_, rest)| rest)?;
    let body = body.split_once(',').map_or(body, |(_, rest)| rest);

    let fields = parse_fields(body);
    IDENTIFIER_KEYS
        .iter()
        .find_map(|key| fields.get(*key))
        .map(Identifier::new)
}

/// Splits a field block on top-level commas and collects `key = value`
/// pairs, first value wins.
fn parse_fields(input: &str) -> HashMap<String, String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '{' if !in_quotes => {
                depth += 1;
                current.push(ch);
            }
            '}' if !in_quotes => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if !in_quotes && depth == 0 => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    segments.push(current);

    let mut fields = HashMap::new();
    for segment in segments {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = strip_value(value);
        if value.is_empty() {
            continue;
        }
        fields.entry(key).or_insert(value);
    }
    fields
}

/// Unwraps `{...}`/`"..."` delimiters, trims trailing commas/braces/quotes,
/// and collapses inner whitespace runs (including newlines) to single spaces.
///
/// Delimiters and whitespace are trimmed together: when the entry's closing
/// brace sits on its own line the last segment ends in `} }`, and the inner
/// space must not shield the value's own delimiter from trimming.
fn strip_value(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_end_matches(|c: char| matches!(c, ',' | '}' | '"') || c.is_whitespace())
        .trim_start_matches(|c: char| matches!(c, '{' | '"') || c.is_whitespace());
    trimmed.to_string()
}
