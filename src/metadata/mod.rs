//! Bibliographic metadata lookup for journal-mode queries.

mod crossref;

pub use crossref::{CrossrefClient, JournalWorks, MetadataError, WorkRecord};
