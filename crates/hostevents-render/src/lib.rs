//! Inline text rendering for notebooklet results.
//!
//! Formats pivot tables, expanded event tables and the account-management
//! timeline as aligned plain-text blocks suitable for notebook cell output
//! or a terminal.

pub mod table;
pub mod timeline;

pub use hostevents_core as core;
