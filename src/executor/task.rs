//! Download task model: one article to fetch, with its target file name and
//! the warning label used for missing-log lines.

use crate::metadata::WorkRecord;
use crate::source::Identifier;

/// One unit of download work.
///
/// Built either from a bare identifier (identifier mode) or from a Crossref
/// work record (journal mode); the executor treats both identically.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// The identifier resolved against the mirror.
    pub identifier: Identifier,
    /// Target file name inside the batch directory.
    pub file_name: String,
    /// Label written to the missing log when this task fails.
    pub warning: String,
}

impl DownloadTask {
    /// Builds a task from a bare identifier.
    ///
    /// The file name is the flattened identifier plus `.pdf`; the warning
    /// label is the identifier itself.
    #[must_use]
    pub fn from_identifier(identifier: Identifier) -> Self {
        let file_name = format!("{}.pdf", identifier.file_stem());
        let warning = identifier.as_str().to_string();
        Self {
            identifier,
            file_name,
            warning,
        }
    }

    /// Builds a task from a Crossref work record in journal mode.
    ///
    /// Returns `None` when the record carries neither a DOI nor a URL (such
    /// records are normally dropped during grouping already).
    #[must_use]
    pub fn from_work(record: &WorkRecord, issn: &str, year: u16) -> Option<Self> {
        let raw = record.identifier()?;
        let identifier = Identifier::new(raw);
        let volume = record.volume.as_deref().unwrap_or("NA");
        let issue = record.issue.as_deref().unwrap_or("NA");
        let file_name = format!("{}_{}.pdf", volume, identifier.file_stem());
        let warning = format!("{raw}:{issn}_{year}_vol{volume}_issue{issue}");
        Some(Self {
            identifier,
            file_name,
            warning,
        })
    }
}
