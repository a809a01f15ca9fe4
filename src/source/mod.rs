//! Identifier source resolution: CLI query tokens into ordered identifier lists.
//!
//! A query is either journal mode (ISSN plus a year range, validated here and
//! resolved to DOIs later by the metadata paginator) or a list of tokens
//! where each token is a path to a `.txt`/`.bib` file (expanded through a
//! lazy, restartable iterator) or a literal identifier kept as-is.
//!
//! Source order is preserved and nothing is deduplicated: a duplicate
//! identifier simply re-resolves and is short-circuited by the executor's
//! file-exists check.

mod bib;
mod txt;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use thiserror::Error;

pub use bib::BibIdentifiers;
pub use txt::TxtIdentifiers;

#[allow(clippy::expect_used)]
static ISSN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{3}[\dXx]$").expect("ISSN regex is valid"));

/// Journals did not exist before this year; the range lower bound is exclusive.
const MIN_YEAR: u16 = 1666;

/// Errors raised while resolving a query into identifiers.
///
/// All variants are usage errors: they are reported before any network
/// activity and terminate the process with a non-zero exit code.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The ISSN does not match `NNNN-NNN[N|X]`.
    #[error("invalid ISSN `{issn}` (expected e.g. 0002-9602)")]
    InvalidIssn {
        /// The rejected value.
        issn: String,
    },

    /// The year range is empty, in the future, or before journals existed.
    #[error("invalid year range {start}..{end} (need {MIN_YEAR} < FROM <= TO <= {current})")]
    InvalidYearRange {
        /// Requested start year.
        start: u16,
        /// Requested end year.
        end: u16,
        /// Current calendar year at validation time.
        current: u16,
    },

    /// An identifier list file could not be opened or read.
    #[error("cannot read identifier file {path}: {source}")]
    FileRead {
        /// The file that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// A single article identifier: DOI, URL, PMID, or arXiv tag.
///
/// Immutable once resolved from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    /// Wraps a raw identifier string, trimming surrounding whitespace.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for arXiv-style tags (`arXiv:2101.00001`).
    #[must_use]
    pub fn is_arxiv(&self) -> bool {
        self.0.starts_with("arXiv:")
    }

    /// Returns the bare arXiv id (the part after `arXiv:`), if any.
    #[must_use]
    pub fn arxiv_id(&self) -> Option<&str> {
        self.0.strip_prefix("arXiv:")
    }

    /// Flat file stem for this identifier: slashes and colons become dashes
    /// so a DOI like `10.1000/abc` lands at `10.1000-abc.pdf`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0.replace(['/', ':'], "-")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated journal-mode query: ISSN plus an inclusive year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalQuery {
    /// Journal ISSN in `NNNN-NNN[N|X]` form.
    pub issn: String,
    /// First year, inclusive.
    pub year_start: u16,
    /// Last year, inclusive.
    pub year_end: u16,
}

impl JournalQuery {
    /// Validates and builds a journal query.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidIssn`] or [`SourceError::InvalidYearRange`]
    /// when the arguments fall outside the accepted shapes.
    pub fn new(issn: &str, year_start: u16, year_end: u16) -> Result<Self, SourceError> {
        if !is_issn(issn) {
            return Err(SourceError::InvalidIssn {
                issn: issn.to_string(),
            });
        }
        validate_years(year_start, year_end)?;
        Ok(Self {
            issn: issn.to_string(),
            year_start,
            year_end,
        })
    }

    /// Iterates the inclusive year range.
    pub fn years(&self) -> impl Iterator<Item = u16> + use<> {
        self.year_start..=self.year_end
    }
}

/// Returns true if `value` matches the ISSN pattern `NNNN-NNN[N|X]`.
#[must_use]
pub fn is_issn(value: &str) -> bool {
    ISSN_PATTERN.is_match(value)
}

/// Validates `1666 < start <= end <= current_year`.
///
/// # Errors
///
/// Returns [`SourceError::InvalidYearRange`] when the bounds are violated.
pub fn validate_years(start: u16, end: u16) -> Result<(), SourceError> {
    let current = u16::try_from(chrono::Utc::now().year()).unwrap_or(u16::MAX);
    if start <= MIN_YEAR || start > end || end > current {
        return Err(SourceError::InvalidYearRange {
            start,
            end,
            current,
        });
    }
    Ok(())
}

/// Expands query tokens into an ordered identifier list.
///
/// Tokens ending in `.txt` or `.bib` are parsed as identifier list files via
/// the restartable iterators in this module; every other token is taken as a
/// literal identifier. Order is preserved; nothing is deduplicated.
///
/// # Errors
///
/// Returns [`SourceError::FileRead`] when a referenced file cannot be read.
pub fn expand_identifiers<I, S>(tokens: I) -> Result<Vec<Identifier>, SourceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut identifiers = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        let lower = token.to_ascii_lowercase();
        if lower.ends_with(".txt") {
            for id in TxtIdentifiers::open(Path::new(token))? {
                identifiers.push(id?);
            }
        } else if lower.ends_with(".bib") {
            for id in BibIdentifiers::open(Path::new(token))? {
                identifiers.push(id?);
            }
        } else if !token.trim().is_empty() {
            identifiers.push(Identifier::new(token));
        }
    }
    Ok(identifiers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_is_issn_accepts_valid_forms() {
        assert!(is_issn("0002-9602"));
        assert!(is_issn("1234-567X"));
        assert!(is_issn("1234-567x"));
        assert!(is_issn("0028-0836"));
    }

    #[test]
    fn test_is_issn_rejects_invalid_forms() {
        assert!(!is_issn("00029602"));
        assert!(!is_issn("0002-96020"));
        assert!(!is_issn("002-9602"));
        assert!(!is_issn("abcd-efgh"));
        assert!(!is_issn("0002 9602"));
        assert!(!is_issn(""));
    }

    #[test]
    fn test_validate_years_accepts_valid_range() {
        assert!(validate_years(2010, 2012).is_ok());
        assert!(validate_years(1667, 1667).is_ok());
        let current = u16::try_from(chrono::Utc::now().year()).unwrap();
        assert!(validate_years(current, current).is_ok());
    }

    #[test]
    fn test_validate_years_rejects_bad_ranges() {
        // start after end
        assert!(validate_years(2012, 2010).is_err());
        // lower bound is exclusive
        assert!(validate_years(1666, 1700).is_err());
        assert!(validate_years(1500, 1600).is_err());
        // not a time machine
        let current = u16::try_from(chrono::Utc::now().year()).unwrap();
        assert!(validate_years(current, current + 1).is_err());
    }

    #[test]
    fn test_journal_query_valid() {
        let query = JournalQuery::new("0002-9602", 2010, 2012).unwrap();
        assert_eq!(query.issn, "0002-9602");
        assert_eq!(query.years().collect::<Vec<_>>(), vec![2010, 2011, 2012]);
    }

    #[test]
    fn test_journal_query_rejects_bad_issn() {
        assert!(matches!(
            JournalQuery::new("nope", 2010, 2012),
            Err(SourceError::InvalidIssn { .. })
        ));
    }

    #[test]
    fn test_identifier_file_stem_flattens_separators() {
        assert_eq!(Identifier::new("10.1000/abc").file_stem(), "10.1000-abc");
        assert_eq!(
            Identifier::new("arXiv:2101.00001").file_stem(),
            "arXiv-2101.00001"
        );
    }

    #[test]
    fn test_identifier_arxiv_detection() {
        let id = Identifier::new("arXiv:2101.00001");
        assert!(id.is_arxiv());
        assert_eq!(id.arxiv_id(), Some("2101.00001"));
        assert!(!Identifier::new("10.1000/abc").is_arxiv());
    }

    #[test]
    fn test_expand_identifiers_literals_preserve_order() {
        let ids = expand_identifiers(["10.1/a", "10.2/b", "10.1/a"]).unwrap();
        let values: Vec<_> = ids.iter().map(Identifier::as_str).collect();
        // duplicates are kept; the executor's exists-check handles reruns
        assert_eq!(values, vec!["10.1/a", "10.2/b", "10.1/a"]);
    }

    #[test]
    fn test_expand_identifiers_mixes_files_and_literals() {
        let mut txt = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(txt, "10.5/from-file").unwrap();
        txt.flush().unwrap();

        let tokens = vec!["10.1/literal".to_string(), txt.path().display().to_string()];
        let ids = expand_identifiers(&tokens).unwrap();
        let values: Vec<_> = ids.iter().map(Identifier::as_str).collect();
        assert_eq!(values, vec!["10.1/literal", "10.5/from-file"]);
    }

    #[test]
    fn test_expand_identifiers_missing_file_is_error() {
        let result = expand_identifiers(["/no/such/file.txt"]);
        assert!(matches!(result, Err(SourceError::FileRead { .. })));
    }
}
