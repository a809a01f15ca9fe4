//! Line-oriented `.txt` identifier lists.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use super::{Identifier, SourceError};

/// Lazy iterator over identifiers in a `.txt` file, one per line.
///
/// Blank lines are skipped. The file is read incrementally so large lists
/// are never held in memory as one batch; re-opening the path restarts the
/// sequence.
#[derive(Debug)]
pub struct TxtIdentifiers {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl TxtIdentifiers {
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
        })
    }
}

impl Iterator for TxtIdentifiers {
    type Item = Result<Identifier, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(Ok(Identifier::new(trimmed)));
                }
                Err(source) => {
                    return Some(Err(SourceError::FileRead {
                        path: self.path.clone(),
                        source,
                    }));
                }
            }
        }
    }
}
