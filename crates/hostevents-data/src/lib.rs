//! Data layer for the Windows host security events notebooklet.
//!
//! Provides the query-provider abstraction (plus a JSONL file provider for
//! exported event logs) and the reshaping pipeline: taxonomy-driven
//! filtering, account normalization, the Activity × Account pivot and XML
//! payload expansion.

pub mod expand;
pub mod filter;
pub mod normalize;
pub mod pivot;
pub mod provider;

pub use hostevents_core as core;
